use crate::core::layer::DECORATION;
use crate::core::{Canvas, Color, DisplayContext, DrawOp, Layer};
use crate::glyph::{layout_line, stamp_glyph, vertical_extent, AlphaPolicy, GlyphSource, Placement, TextStyle};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

pub const MIN_COUNTDOWN_SIZE: f32 = 8.0;
const SIDE_ROOM: f32 = 8.0;
const HEIGHT_ROOM: f32 = 4.0;
/// Lift of the baseline above the optical centre
const BASELINE_SHIFT: i32 = -2;

/// `mm:ss` of the whole seconds left in `ms`; minutes keep counting past 99
pub fn format_countdown(ms: f64) -> String {
    let secs = (ms.max(0.0) / 1000.0).floor() as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Trees along the bottom edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeMode {
    #[default]
    None,
    /// Always full grown
    Static,
    /// Grow with study progress, full grown during breaks
    Animated,
}

/// Widths of every cell of the icon and time group at one size
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownLayout {
    pub size: f32,
    pub icon_w: f32,
    pub join_gap: f32,
    /// Cell width of each time character; every digit shares the widest
    pub cells: Vec<f32>,
    pub gap: f32,
    pub total_w: f32,
}

impl CountdownLayout {
    fn measure(source: &dyn GlyphSource, icon: &str, time: &str, px: f32, gap: i32) -> Self {
        let digit = ('0'..='9')
            .map(|d| source.advance(d, px))
            .fold(0.0f32, f32::max)
            .ceil()
            .max(1.0);
        let cells: Vec<f32> = time
            .chars()
            .map(|c| if c.is_ascii_digit() { digit } else { source.advance(c, px).ceil().max(1.0) })
            .collect();
        let gap = gap as f32;
        let time_w = cells.iter().sum::<f32>() + cells.len().saturating_sub(1) as f32 * gap;
        let icon_w = layout_line(source, icon, px, 0, Placement::Flat).width;
        let join_gap = if icon.is_empty() { 0.0 } else { gap };
        Self {
            size: px,
            icon_w,
            join_gap,
            cells,
            gap,
            total_w: icon_w + join_gap + time_w,
        }
    }

    /// Start at `desired` and step down by one until the group fits the
    /// panel less 8px across and the size fits its height less 4px;
    /// never below 8
    pub fn fit(source: &dyn GlyphSource, icon: &str, time: &str, desired: f32, gap: i32, pw: u32, ph: u32) -> Self {
        let mut size = desired.floor();
        while size > MIN_COUNTDOWN_SIZE {
            let layout = Self::measure(source, icon, time, size, gap);
            if layout.total_w <= pw as f32 - SIDE_ROOM && size <= ph as f32 - HEIGHT_ROOM {
                return layout;
            }
            size -= 1.0;
        }
        Self::measure(source, icon, time, size.max(MIN_COUNTDOWN_SIZE), gap)
    }
}

fn fract(v: f64) -> f64 {
    v - v.floor()
}

/// Pseudo-random but stable per tree
fn tree_noise(i: u32) -> f64 {
    fract((i as f64 * 12.9898 + 78.233).sin() * 43758.5453)
}

/// A centred row of small green trees; `growth` 0 draws seedlings, 1 full trees
pub fn tree_ops(context: &DisplayContext, growth: f32) -> Vec<DrawOp> {
    const SPACING: i32 = 12;
    const MARGIN: i32 = 8;
    const MIN_H: f64 = 4.0;
    const MAX_H: f64 = 13.0;
    const MIN_HALF_W: f64 = 1.0;
    const MAX_HALF_W: f64 = 6.0;

    let (pw, ph) = (context.width as i32, context.height as i32);
    let ground = ph - 2;
    let usable = (pw - 2 * MARGIN).max(0);
    let count = (usable / SPACING).max(1);
    let spacing = if count > 1 { usable / (count - 1) } else { 0 };
    let first = (pw as f64 / 2.0 - ((count - 1) * spacing) as f64 / 2.0).round() as i32;
    let t = growth.clamp(0.0, 1.0) as f64;

    let mut ops = Vec::with_capacity(2 * count as usize);
    for i in 0..count {
        let x = first + i * spacing;
        let r = tree_noise(i as u32);
        let full_h = MIN_H + (r * (MAX_H - MIN_H)).round();
        let tree_h = (MIN_H + (full_h - MIN_H) * t).round().max(2.0) as i32;
        let full_half = MIN_HALF_W + (fract(r * 9.17) * (MAX_HALF_W - MIN_HALF_W)).round();
        let half_w = (MIN_HALF_W + (full_half - MIN_HALF_W) * t).round().max(1.0) as i32;
        let shade = 180 + (fract(r * 5.3) * 75.0).round() as u8;
        let color = Color::rgb(0, shade, 0);

        ops.push(DrawOp::Triangle {
            points: [(x, ground - tree_h), (x - half_w, ground - 4), (x + half_w, ground - 4)],
            color,
        });
        let trunk = (2.0 + (tree_h as f64 - MIN_H) * 0.15).round().clamp(2.0, 4.0) as u32;
        ops.push(DrawOp::Rect {
            x: x - 1,
            y: ground - trunk as i32,
            width: 2,
            height: trunk,
            color,
        });
    }
    ops
}

/// Tree row drawn over the countdown
pub struct TreeLayer {
    pub growth: f32,
}

impl Layer for TreeLayer {
    fn draw(&self, canvas: &mut Canvas, context: &DisplayContext) {
        for op in tree_ops(context, self.growth) {
            canvas.apply(&op);
        }
    }

    fn priority(&self) -> i32 {
        DECORATION
    }
}

/// Icon and `mm:ss` centred as one group, digits in fixed cells so the
/// group does not jitter as the seconds change
pub struct CountdownLayer {
    pub source: Rc<dyn GlyphSource>,
    pub icon: String,
    pub time: String,
    pub style: TextStyle,
    pub policy: AlphaPolicy,
}

impl CountdownLayer {
    /// Baseline that centres the group's ink on the panel midline
    fn baseline(&self, px: f32, panel_h: u32) -> i32 {
        let text = format!("{}{}", self.icon, self.time);
        let (above, below) = vertical_extent(self.source.as_ref(), &text, px);
        let total = if above + below > 0 { (above + below) as f32 } else { px };
        (panel_h as f32 / 2.0 + (above as f32 - total / 2.0)).round() as i32 + BASELINE_SHIFT
    }
}

impl Layer for CountdownLayer {
    fn draw(&self, canvas: &mut Canvas, context: &DisplayContext) {
        let source = self.source.as_ref();
        let layout = CountdownLayout::fit(
            source,
            &self.icon,
            &self.time,
            self.style.size,
            self.style.gap,
            context.width,
            context.height,
        );
        let px = layout.size;
        let baseline = self.baseline(px, context.height);
        let start = (context.width as f32 / 2.0 - layout.total_w / 2.0).round() as i32;
        let span = layout.total_w.ceil().max(1.0) as u32;
        let color_at = |x: i32| self.style.fill.color_at((x - start).max(0) as u32, span);

        let line = layout_line(source, &self.icon, px, 0, Placement::Flat);
        for &(ch, pen) in &line.glyphs {
            let x = start + pen.round() as i32;
            stamp_glyph(canvas, &source.rasterize(ch, px), x, baseline, color_at(x), self.policy);
        }

        // each character centred in its cell
        let mut x = start as f32 + layout.icon_w + layout.join_gap;
        for (ch, cell) in self.time.chars().zip(&layout.cells) {
            let glyph = source.rasterize(ch, px);
            let cx = (x + (cell - glyph.advance) / 2.0).round() as i32;
            stamp_glyph(canvas, &glyph, cx, baseline, color_at(cx), self.policy);
            x += cell + layout.gap;
        }
    }
}
