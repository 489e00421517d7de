use crate::core::{Canvas, Color, DisplayContext, DrawOp, Layer};
use crate::glyph::{layout_line, GlyphSource, Placement, TextStyle};

const ICON_RED: Color = Color::rgb(255, 0, 0);
const ICON_GAP: i32 = 6;
const MARGIN: f32 = 8.0;
const START_SIZE: f32 = 28.0;
pub const MIN_TEXT_SIZE: f32 = 10.0;
const SIZE_STEP: f32 = 2.0;
const MIN_ICON_HEIGHT: i32 = 10;

/// Shown until the first subscriber count arrives
pub const PLACEHOLDER: &str = "\u{2014}";

#[inline]
fn round_half_up(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

/// Icon size clamped between 10px and 90% of the panel height
pub fn icon_size(requested: u32, panel_height: u32) -> (u32, u32) {
    let max_h = round_half_up(panel_height as f32 * 0.9).max(MIN_ICON_HEIGHT);
    let h = (requested as i32).clamp(MIN_ICON_HEIGHT, max_h);
    (round_half_up(h as f32 * 1.6) as u32, h as u32)
}

/// Largest font size from 28 down in steps of 2 at which icon, gap and
/// text fit inside the panel less an 8px margin; stops at 10, where a very
/// long count is allowed to overflow.
///
/// The text is measured with the gap, placement and outline `style` will
/// be drawn with.
pub fn fit_text_size(source: &dyn GlyphSource, text: &str, style: &TextStyle, icon_w: u32, panel_w: u32) -> f32 {
    let budget = panel_w as f32 - MARGIN;
    let placement = Placement::for_text(text, &style.family, style.flat);
    let width = |size: f32| {
        layout_line(source, text, size, style.gap, placement).width + 2.0 * style.thickness as f32
    };
    let mut size = START_SIZE;
    while icon_w as f32 + ICON_GAP as f32 + width(size) > budget && size > MIN_TEXT_SIZE {
        size -= SIZE_STEP;
    }
    size
}

/// Left edge of the icon+text group, centred on the panel
pub fn group_origin(panel_w: u32, icon_w: u32, text_w: u32) -> i32 {
    let group = icon_w as f32 + ICON_GAP as f32 + text_w as f32;
    round_half_up((panel_w as f32 - group) / 2.0)
}

/// Red rounded rectangle with a white play triangle, centred at (cx, cy)
pub fn icon_ops(cx: i32, cy: i32, h: u32) -> Vec<DrawOp> {
    let hf = h as f32;
    let w = round_half_up(hf * 1.6);
    let r = round_half_up(hf / 5.0);
    let x = round_half_up(cx as f32 - w as f32 / 2.0);
    let y = round_half_up(cy as f32 - hf / 2.0);

    let tri_w = round_half_up(hf * 0.6) as f32;
    let tri_h = round_half_up(hf * 0.5) as f32;
    let left = cx - round_half_up(tri_w * 0.35);
    let half = round_half_up(tri_h / 2.0);
    vec![
        DrawOp::RoundedRect {
            x,
            y,
            width: w as u32,
            height: h,
            radius: r as u32,
            color: ICON_RED,
        },
        DrawOp::Triangle {
            points: [
                (left, cy - half),
                (left, cy + half),
                (cx + round_half_up(tri_w * 0.65), cy),
            ],
            color: Color::WHITE,
        },
    ]
}

/// Logo icon drawn as content next to the counter text
pub struct IconLayer {
    pub center: (i32, i32),
    pub height: u32,
}

impl Layer for IconLayer {
    fn draw(&self, canvas: &mut Canvas, _context: &DisplayContext) {
        for op in icon_ops(self.center.0, self.center.1, self.height) {
            canvas.apply(&op);
        }
    }
}
