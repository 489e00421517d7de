use super::pixel_font::PixelFont;
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

/// Coverage bitmap of one character, positioned relative to the pen
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGlyph {
    pub width: u32,
    pub height: u32,
    /// Horizontal offset from the pen position to the first column
    pub left: i32,
    /// Vertical offset from the baseline to the first row (negative = above)
    pub top: i32,
    /// Pen advance in pixels
    pub advance: f32,
    pub coverage: Vec<u8>,
}

impl RasterGlyph {
    pub fn blank(advance: f32) -> Self {
        Self {
            width: 0,
            height: 0,
            left: 0,
            top: 0,
            advance,
            coverage: Vec::new(),
        }
    }
}

/// Anything that can turn characters into coverage bitmaps
pub trait GlyphSource {
    /// Family name used in cache keys and script detection
    fn family(&self) -> &str;

    fn rasterize(&self, ch: char, px: f32) -> RasterGlyph;

    /// Pen advance without rasterizing
    fn advance(&self, ch: char, px: f32) -> f32 {
        self.rasterize(ch, px).advance
    }
}

/// TrueType/OpenType font rasterized with fontdue
pub struct FontdueSource {
    family: String,
    font: fontdue::Font,
}

impl FontdueSource {
    pub fn from_bytes(family: &str, bytes: &[u8]) -> Result<Self> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| anyhow!("failed to parse font {family}: {e}"))?;
        Ok(Self {
            family: family.to_string(),
            font,
        })
    }

    pub fn load(family: &str, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font file {}", path.display()))?;
        Self::from_bytes(family, &bytes)
    }
}

impl GlyphSource for FontdueSource {
    fn family(&self) -> &str {
        &self.family
    }

    fn rasterize(&self, ch: char, px: f32) -> RasterGlyph {
        let (metrics, coverage) = self.font.rasterize(ch, px);
        RasterGlyph {
            width: metrics.width as u32,
            height: metrics.height as u32,
            left: metrics.xmin,
            // fontdue's ymin is the bitmap bottom measured upwards from the baseline
            top: -(metrics.height as i32 + metrics.ymin),
            advance: metrics.advance_width,
            coverage,
        }
    }

    fn advance(&self, ch: char, px: f32) -> f32 {
        self.font.metrics(ch, px).advance_width
    }
}

/// Registry of loaded font families.
///
/// Lookups never fail: unknown families and fonts that failed to load
/// resolve to the built-in pixel font.
pub struct FontBook {
    families: HashMap<String, Rc<dyn GlyphSource>>,
    fallback: Rc<dyn GlyphSource>,
}

impl FontBook {
    pub fn new() -> Self {
        Self {
            families: HashMap::new(),
            fallback: Rc::new(PixelFont),
        }
    }

    /// Register a font file under `family`. A load failure is logged and
    /// leaves the family unresolved so it falls back to the pixel font.
    pub fn register_file(&mut self, family: &str, path: &Path) -> bool {
        match FontdueSource::load(family, path) {
            Ok(source) => {
                log::info!("loaded font {family} from {}", path.display());
                self.families.insert(family.to_lowercase(), Rc::new(source));
                true
            }
            Err(e) => {
                log::warn!("{e:#}; using built-in pixel font for {family}");
                false
            }
        }
    }

    pub fn register(&mut self, family: &str, source: Rc<dyn GlyphSource>) {
        self.families.insert(family.to_lowercase(), source);
    }

    pub fn resolve(&self, family: &str) -> Rc<dyn GlyphSource> {
        self.families
            .get(&family.to_lowercase())
            .cloned()
            .unwrap_or_else(|| Rc::clone(&self.fallback))
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}
