use super::source::{GlyphSource, RasterGlyph};
use embedded_graphics::mono_font::ascii::FONT_5X7;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use std::convert::Infallible;

/// Design height the `px` size is divided by to pick an integer scale
const CELL_HEIGHT: f32 = 8.0;

/// One character cell the mono font draws into
struct GlyphCell {
    size: Size,
    lit: Vec<bool>,
}

impl GlyphCell {
    fn new(size: Size) -> Self {
        Self {
            size,
            lit: vec![false; (size.width * size.height) as usize],
        }
    }

    fn is_lit(&self, x: u32, y: u32) -> bool {
        self.lit[(y * self.size.width + x) as usize]
    }
}

impl OriginDimensions for GlyphCell {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for GlyphCell {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if color != BinaryColor::On || point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < self.size.width && y < self.size.height {
                self.lit[(y * self.size.width + x) as usize] = true;
            }
        }
        Ok(())
    }
}

/// Built-in 5x7 LED matrix font from embedded-graphics, integer-scaled to
/// the requested pixel size.
///
/// Used when no TTF is configured or a font file fails to load, so the
/// compositor always has something to draw with.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelFont;

impl PixelFont {
    pub fn font() -> &'static MonoFont<'static> {
        &FONT_5X7
    }

    pub fn scale_for(px: f32) -> u32 {
        ((px / CELL_HEIGHT).round() as u32).max(1)
    }

    /// Characters the font covers; dashes fold onto the ASCII hyphen
    fn printable(ch: char) -> Option<char> {
        let ch = match ch {
            '\u{2012}'..='\u{2015}' | '\u{2212}' => '-',
            other => other,
        };
        ('!'..='~').contains(&ch).then_some(ch)
    }

    fn draw_cell(ch: char) -> GlyphCell {
        let font = Self::font();
        let mut cell = GlyphCell::new(font.character_size);
        let mut buf = [0u8; 4];
        let style = MonoTextStyle::new(font, BinaryColor::On);
        let text = Text::with_baseline(ch.encode_utf8(&mut buf), Point::zero(), style, Baseline::Top);
        match text.draw(&mut cell) {
            Ok(_) => {}
            Err(never) => match never {},
        }
        cell
    }
}

impl GlyphSource for PixelFont {
    fn family(&self) -> &str {
        "pixel"
    }

    fn rasterize(&self, ch: char, px: f32) -> RasterGlyph {
        let font = Self::font();
        let scale = Self::scale_for(px);
        let advance = ((font.character_size.width + font.character_spacing) * scale) as f32;
        let Some(ch) = Self::printable(ch) else {
            return RasterGlyph::blank(advance);
        };

        let cell = Self::draw_cell(ch);
        let width = font.character_size.width * scale;
        let height = font.character_size.height * scale;
        let mut coverage = vec![0u8; (width * height) as usize];
        for y in 0..height {
            for x in 0..width {
                if cell.is_lit(x / scale, y / scale) {
                    coverage[(y * width + x) as usize] = 255;
                }
            }
        }

        RasterGlyph {
            width,
            height,
            left: 0,
            top: -(((font.baseline + 1) * scale) as i32),
            advance,
            coverage,
        }
    }
}
