use super::clock::{format_time, TimeFormat};
use crate::core::{Canvas, Color, DisplayContext, DrawOp, Layer};
use crate::glyph::{layout_line, stamp_glyph, vertical_extent, AlphaPolicy, GlyphSource, Placement};
use chrono::{NaiveDate, NaiveTime};
use std::rc::Rc;

/// Width of the date column, separator included
pub const DATE_COLUMN_W: u32 = 44;
const PAD: i32 = 3;
/// Extra drop of the date column below the top padding
const DATE_DROP: i32 = 3;
const DATE_INDENT: i32 = 2;
const DATE_GAP: i32 = 1;
const DATE_MAX_SIZE: f32 = 14.0;
const DATE_MIN_SIZE: f32 = 9.0;

const TIME_START_SIZE: f32 = 26.0;
const TIME_MIN_SIZE: f32 = 12.0;
const TIME_TOP: i32 = 5;

pub const EQ_BARS: usize = 8;
pub const EQ_HEIGHT: u32 = 14;
/// Bars change height every this many milliseconds
pub const EQ_STEP_MS: f64 = 500.0;
const EQ_COLOR: Color = Color::rgb(0x00, 0xFF, 0x90);
const EQ_INSET: i32 = 2;
const EQ_MIN_BAR: u32 = 2;

/// Day, `dd/mm`, and year for the date column
pub fn date_rows(date: NaiveDate) -> [String; 3] {
    [
        date.format("%a").to_string().to_uppercase(),
        date.format("%d/%m").to_string(),
        date.format("%Y").to_string(),
    ]
}

/// Height of each date row
fn row_pitch(panel_h: u32) -> f32 {
    let top = PAD + DATE_DROP;
    (panel_h as i32 - top - PAD).max(1) as f32 / 3.0
}

fn row_width(source: &dyn GlyphSource, text: &str, px: f32) -> f32 {
    layout_line(source, text, px, DATE_GAP, Placement::Flat).width.ceil()
}

/// One size for all three date rows: the row pitch less one, held in
/// 9..=14, shrunk until the widest row fits the column
pub fn date_size(source: &dyn GlyphSource, rows: &[String; 3], panel_h: u32) -> f32 {
    let room = (DATE_COLUMN_W as i32 - 2 * PAD) as f32;
    let mut size = (row_pitch(panel_h).floor() - 1.0).clamp(DATE_MIN_SIZE, DATE_MAX_SIZE);
    while size > DATE_MIN_SIZE && rows.iter().any(|r| row_width(source, r, size) > room) {
        size -= 1.0;
    }
    size
}

/// Largest size from 26 down to 12 at which the time fits `room`
pub fn time_size(source: &dyn GlyphSource, text: &str, room: u32) -> f32 {
    let mut size = TIME_START_SIZE;
    while size > TIME_MIN_SIZE && layout_line(source, text, size, 0, Placement::Flat).width > room as f32 {
        size -= 1.0;
    }
    size
}

/// Equalizer bar heights at `time_ms`
pub fn bar_heights(time_ms: f64) -> [u32; EQ_BARS] {
    let step = (time_ms / EQ_STEP_MS).floor();
    let mut heights = [0; EQ_BARS];
    for (i, h) in heights.iter_mut().enumerate() {
        let phase = (step + i as f64 * 3.0) * 0.9;
        let scale = 0.2 + 0.8 * phase.sin().abs();
        *h = ((EQ_HEIGHT as f64 * scale).floor() as u32).max(EQ_MIN_BAR);
    }
    heights
}

/// Bars anchored to the bottom of the right panel, equal widths and gaps
pub fn bar_ops(context: &DisplayContext, time_ms: f64) -> Vec<DrawOp> {
    let right_x = DATE_COLUMN_W as i32;
    let right_w = context.width as i32 - right_x - PAD;
    let usable = (right_w - 2 * EQ_INSET).max(1) as f64;
    let unit = usable / (2 * EQ_BARS - 1) as f64;
    let bottom = (context.height as i32 - 1).max(EQ_HEIGHT as i32);
    bar_heights(time_ms)
        .iter()
        .enumerate()
        .map(|(i, &h)| DrawOp::Rect {
            x: (right_x as f64 + EQ_INSET as f64 + i as f64 * 2.0 * unit).round() as i32,
            y: bottom - h as i32,
            width: (unit.round() as u32).max(1),
            height: h,
            color: EQ_COLOR,
        })
        .collect()
}

/// Date column, outline and separator, right-aligned time, equalizer
pub struct DashboardLayer {
    pub source: Rc<dyn GlyphSource>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub time_ms: f64,
    pub policy: AlphaPolicy,
}

impl DashboardLayer {
    /// Characters placed one by one from `x`, each advancing by its
    /// rounded-up width plus `gap`, stopping once past `limit`
    #[allow(clippy::too_many_arguments)]
    fn draw_row(&self, canvas: &mut Canvas, text: &str, px: f32, x: i32, top: i32, gap: i32, limit: i32) {
        let (ascent, _) = vertical_extent(self.source.as_ref(), text, px);
        let mut pen = x;
        for ch in text.chars() {
            let glyph = self.source.rasterize(ch, px);
            stamp_glyph(canvas, &glyph, pen, top + ascent, Color::WHITE, self.policy);
            pen += glyph.advance.ceil() as i32 + gap;
            if pen > limit {
                break;
            }
        }
    }
}

impl Layer for DashboardLayer {
    fn draw(&self, canvas: &mut Canvas, context: &DisplayContext) {
        let (w, h) = (context.width, context.height);
        canvas.clear(Color::BLACK);

        let rows = date_rows(self.date);
        let size = date_size(self.source.as_ref(), &rows, h);
        let pitch = row_pitch(h);
        let top = (PAD + DATE_DROP) as f32;
        let limit = DATE_COLUMN_W as i32 - PAD;
        for (i, row) in rows.iter().enumerate() {
            let y = (top + i as f32 * pitch).floor() as i32;
            self.draw_row(canvas, row, size, PAD + DATE_INDENT, y, DATE_GAP, limit);
        }

        let right_x = DATE_COLUMN_W as i32;
        canvas.apply(&DrawOp::StrokeRect {
            x: 0,
            y: 0,
            width: w,
            height: h,
            color: Color::WHITE,
        });
        canvas.apply(&DrawOp::VLine {
            x: right_x - 1,
            y: 0,
            length: h,
            color: Color::WHITE,
        });

        let text = format_time(self.time, TimeFormat::H24);
        let room = (w as i32 - right_x - PAD).max(0) as u32;
        let size = time_size(self.source.as_ref(), &text, room);
        let width = layout_line(self.source.as_ref(), &text, size, 0, Placement::Flat).width.round() as i32;
        let x = right_x + room as i32 - width;
        self.draw_row(canvas, &text, size, x, TIME_TOP, 0, i32::MAX);

        for op in bar_ops(context, self.time_ms) {
            canvas.apply(&op);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::test_font::BarFont;
    use crate::glyph::PixelFont;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rows_are_day_date_year() {
        assert_eq!(date_rows(day(2025, 3, 3)), ["MON", "03/03", "2025"]);
        assert_eq!(date_rows(day(2024, 12, 29)), ["SUN", "29/12", "2024"]);
    }

    #[test]
    fn date_size_shrinks_to_the_column() {
        // 55px of rows on a 64px panel: pitch 18.3, start at 14
        let rows = date_rows(day(2025, 3, 3));
        let size = date_size(&BarFont, &rows, 64);
        let widest = rows.iter().map(|r| row_width(&BarFont, r, size)).fold(0.0, f32::max);
        assert!(size >= DATE_MIN_SIZE && size <= DATE_MAX_SIZE);
        assert!(widest <= 38.0 || size == DATE_MIN_SIZE, "{widest} at {size}");
    }

    #[test]
    fn time_shrinks_but_not_below_twelve() {
        assert_eq!(time_size(&BarFont, "12:34:56", 1000), TIME_START_SIZE);
        let fitted = time_size(&BarFont, "12:34:56", 100);
        assert!(fitted < TIME_START_SIZE);
        assert!(layout_line(&BarFont, "12:34:56", fitted, 0, Placement::Flat).width <= 100.0);
        assert_eq!(time_size(&BarFont, "12:34:56", 5), TIME_MIN_SIZE);
    }

    #[test]
    fn bars_hold_between_steps_and_stay_in_range() {
        assert_eq!(bar_heights(0.0), bar_heights(499.0));
        assert_ne!(bar_heights(0.0), bar_heights(500.0));
        for t in (0..20).map(|i| i as f64 * EQ_STEP_MS) {
            assert!(bar_heights(t).iter().all(|&h| (EQ_MIN_BAR..=EQ_HEIGHT).contains(&h)));
        }
        // step 0, bar 0: sin(0) = 0 keeps the minimum fifth
        assert_eq!(bar_heights(0.0)[0], 2);
    }

    #[test]
    fn bars_fit_the_right_panel() {
        let ops = bar_ops(&DisplayContext::PANEL, 0.0);
        assert_eq!(ops.len(), EQ_BARS);
        for op in ops {
            let DrawOp::Rect { x, y, width, height, .. } = op else {
                panic!("bar is not a rect");
            };
            assert!(x >= DATE_COLUMN_W as i32 + EQ_INSET);
            assert!(x + width as i32 <= 128 - PAD);
            assert_eq!(y + height as i32, 63);
        }
    }

    #[test]
    fn layer_draws_outline_separator_and_text() {
        let layer = DashboardLayer {
            source: Rc::new(PixelFont),
            date: day(2025, 3, 3),
            time: NaiveTime::from_hms_opt(12, 34, 56).unwrap(),
            time_ms: 0.0,
            policy: AlphaPolicy::Device,
        };
        let ctx = DisplayContext::PANEL;
        let mut canvas = Canvas::new(128, 64);
        layer.draw(&mut canvas, &ctx);
        assert_eq!(canvas.get(0, 0), Some(Color::WHITE));
        assert_eq!(canvas.get(127, 63), Some(Color::WHITE));
        assert_eq!(canvas.get(DATE_COLUMN_W as i32 - 1, 30), Some(Color::WHITE));
        let lit = |x0: i32, x1: i32, y0: i32, y1: i32| {
            (y0..y1).any(|y| (x0..x1).any(|x| canvas.get(x, y) == Some(Color::WHITE)))
        };
        // date ink inside the column, time ink in the upper right
        assert!(lit(2, 42, 2, 62));
        assert!(lit(45, 126, 2, 40));
        // first bar starts two pixels right of the separator
        assert_eq!(canvas.get(47, 62), Some(EQ_COLOR));
    }
}
