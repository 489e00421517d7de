use crate::core::{Canvas, DisplayContext, Layer};
use crate::glyph::ContentBitmap;
use std::rc::Rc;

/// Downward bias of the text centre line
const TEXT_BIAS_Y: i32 = 2;

/// Top edge that vertically centres a bitmap of height `h`
pub fn text_top(panel_h: u32, h: u32) -> i32 {
    (panel_h / 2) as i32 + TEXT_BIAS_Y - (h / 2) as i32
}

/// Left edge for a still text line; lines wider than the panel are
/// shifted so their middle is shown
pub fn static_left(panel_w: u32, w: u32) -> i32 {
    if w <= panel_w {
        ((panel_w - w) / 2) as i32
    } else {
        -(((w as f32 / 2.0) - (panel_w as f32 / 2.0)).floor() as i32).max(0)
    }
}

/// A content bitmap stamped at one or more horizontal positions
pub struct BitmapLayer {
    pub bitmap: Rc<ContentBitmap>,
    pub xs: Vec<i32>,
    pub y: i32,
}

impl BitmapLayer {
    /// Centred still placement
    pub fn centered(bitmap: Rc<ContentBitmap>, context: &DisplayContext) -> Self {
        let x = static_left(context.width, bitmap.width());
        let y = text_top(context.height, bitmap.height());
        Self {
            bitmap,
            xs: vec![x],
            y,
        }
    }

    /// One copy per scroll head
    pub fn scrolling(bitmap: Rc<ContentBitmap>, heads: &[i32], context: &DisplayContext) -> Self {
        let y = text_top(context.height, bitmap.height());
        Self {
            bitmap,
            xs: heads.to_vec(),
            y,
        }
    }
}

impl Layer for BitmapLayer {
    fn draw(&self, canvas: &mut Canvas, context: &DisplayContext) {
        let w = self.bitmap.width() as i32;
        for &x in &self.xs {
            // copies entirely off the panel are skipped
            if x < -w || x > context.width as i32 {
                continue;
            }
            canvas.draw_canvas(self.bitmap.canvas(), x, self.y);
        }
    }
}
