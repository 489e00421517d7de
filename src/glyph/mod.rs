//! Text rasterization into cropped, coloured content bitmaps.

pub mod cache;
pub mod fill;
pub mod layout;
pub mod morphology;
pub mod pixel_font;
pub mod source;

pub use cache::BitmapCache;
pub use fill::{Fill, Gradient};
pub use layout::{is_complex_script, layout_line, LineLayout, Placement};
pub use morphology::{AlphaMap, Bounds};
pub use pixel_font::PixelFont;
pub use source::{FontBook, FontdueSource, GlyphSource, RasterGlyph};

use crate::core::{Canvas, Color};

/// Alpha below this is treated as empty when cropping and remapping
pub const ALPHA_THRESHOLD: u8 = 16;
/// Exponent applied to coverage for on-screen preview
pub const ALPHA_GAMMA: f32 = 1.3;
/// Alpha of outline pixels in device bitmaps; covered interior pixels are opaque
pub const DEVICE_EDGE_ALPHA: u8 = 128;

/// Size used when the requested size is not a positive number
const DEFAULT_TEXT_SIZE: f32 = 17.0;
/// Padding around the temporary glyph surface
const PAD: f32 = 4.0;

/// How coverage is turned into output alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaPolicy {
    /// Gamma-smoothed edges for on-screen preview
    Preview,
    /// Near-binary alpha for the panel: 0 below the threshold, 255 inside
    /// strokes, [`DEVICE_EDGE_ALPHA`] on pixels touching empty space
    Device,
}

impl AlphaPolicy {
    /// Alpha for a single coverage value with no neighbourhood to inspect
    pub fn coverage_alpha(self, a: u8) -> u8 {
        match self {
            AlphaPolicy::Preview => {
                let v = (a as f32 / 255.0).powf(ALPHA_GAMMA) * 255.0;
                if v < ALPHA_THRESHOLD as f32 {
                    0
                } else {
                    v.round().min(255.0) as u8
                }
            }
            AlphaPolicy::Device if a < ALPHA_THRESHOLD => 0,
            AlphaPolicy::Device => 255,
        }
    }

    fn remap(self, map: &AlphaMap, x: u32, y: u32) -> u8 {
        let a = map.get(x, y);
        match self {
            AlphaPolicy::Preview => self.coverage_alpha(a),
            AlphaPolicy::Device => {
                if a < ALPHA_THRESHOLD {
                    0
                } else if map.is_edge(x, y, ALPHA_THRESHOLD) {
                    DEVICE_EDGE_ALPHA
                } else {
                    255
                }
            }
        }
    }
}

/// Everything that affects how a string is drawn
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub family: String,
    pub size: f32,
    /// Extra pixels between characters, may be negative
    pub gap: i32,
    pub fill: Fill,
    /// Rounds of 3x3 dilation
    pub thickness: u32,
    /// Use the raw gap for spaces too
    pub flat: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            family: "pixel".to_string(),
            size: 16.0,
            gap: 1,
            fill: Fill::default(),
            thickness: 0,
            flat: false,
        }
    }
}

impl TextStyle {
    fn effective_size(&self) -> f32 {
        if self.size.is_finite() && self.size > 0.0 {
            self.size
        } else {
            DEFAULT_TEXT_SIZE
        }
    }
}

/// Identity of a built bitmap; equal keys always produce equal bitmaps
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    pub text: String,
    pub style: TextStyle,
    pub policy: AlphaPolicy,
}

impl CacheKey {
    pub fn new(text: &str, style: &TextStyle, policy: AlphaPolicy) -> Self {
        Self {
            text: text.to_string(),
            style: style.clone(),
            policy,
        }
    }
}

/// Rasterized string cropped to its visible pixels
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBitmap {
    canvas: Canvas,
}

impl ContentBitmap {
    /// 1x1 transparent bitmap for strings with nothing visible
    pub fn empty() -> Self {
        Self {
            canvas: Canvas::new(1, 1),
        }
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn is_blank(&self) -> bool {
        self.canvas.pixels().iter().all(|p| p.a == 0)
    }
}

/// Rasterize `text` onto a coverage map padded on every side
fn rasterize_line(source: &dyn GlyphSource, text: &str, style: &TextStyle) -> AlphaMap {
    let px = style.effective_size();
    let placement = Placement::for_text(text, &style.family, style.flat);
    let line = layout_line(source, text, px, style.gap, placement);

    let width = (line.width.ceil() + 2.0 * PAD).max(1.0) as u32;
    let height = (px * 1.2 + 8.0).ceil().max(1.0) as u32;
    let baseline = px.floor() as i32;

    let mut map = AlphaMap::new(width, height);
    for &(ch, pen_x) in &line.glyphs {
        let glyph = source.rasterize(ch, px);
        let ox = (PAD + pen_x).round() as i32 + glyph.left;
        let oy = baseline + glyph.top;
        for row in 0..glyph.height {
            for col in 0..glyph.width {
                let value = glyph.coverage[(row * glyph.width + col) as usize];
                if value > 0 {
                    map.stamp(ox + col as i32, oy + row as i32, value);
                }
            }
        }
    }
    map
}

/// Build the cropped, coloured bitmap for `text`.
///
/// Never fails: an empty string or one with no visible pixels yields
/// [`ContentBitmap::empty`].
pub fn build_bitmap(
    source: &dyn GlyphSource,
    text: &str,
    style: &TextStyle,
    policy: AlphaPolicy,
) -> ContentBitmap {
    let map = rasterize_line(source, text, style).dilate(style.thickness);
    let Some(bounds) = map.bounds(ALPHA_THRESHOLD) else {
        log::trace!("no visible pixels in {text:?}");
        return ContentBitmap::empty();
    };

    let mut canvas = Canvas::new(bounds.width, bounds.height);
    for y in 0..bounds.height {
        for x in 0..bounds.width {
            let alpha = policy.remap(&map, bounds.x + x, bounds.y + y);
            if alpha == 0 {
                continue;
            }
            let color: Color = style.fill.color_at(x, bounds.width);
            canvas.put(x as i32, y as i32, color.with_alpha(alpha));
        }
    }
    ContentBitmap { canvas }
}

/// Rows above and below the baseline covered by the visible characters
/// of `text`; `(0, 0)` when nothing is visible
pub fn vertical_extent(source: &dyn GlyphSource, text: &str, px: f32) -> (i32, i32) {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| source.rasterize(c, px))
        .filter(|g| g.height > 0)
        .fold((0, 0), |(above, below), g| {
            (above.max(-g.top), below.max(g.top + g.height as i32))
        })
}

/// Draw one character straight onto `canvas` with its pen at `(x, baseline)`.
///
/// For layouts that place characters individually; whole strings go
/// through [`build_bitmap`].
pub fn stamp_glyph(
    canvas: &mut Canvas,
    glyph: &RasterGlyph,
    x: i32,
    baseline: i32,
    color: Color,
    policy: AlphaPolicy,
) {
    let ox = x + glyph.left;
    let oy = baseline + glyph.top;
    for row in 0..glyph.height {
        for col in 0..glyph.width {
            let alpha = policy.coverage_alpha(glyph.coverage[(row * glyph.width + col) as usize]);
            if alpha > 0 {
                canvas.blend_pixel(ox + col as i32, oy + row as i32, color.with_alpha(alpha));
            }
        }
    }
}
