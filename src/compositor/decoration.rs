use crate::core::{Canvas, Color, DisplayContext, DrawOp, Layer};
use serde::{Deserialize, Serialize};

/// Decorative outline around the panel edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStyle {
    #[default]
    None,
    /// One pixel outline on the outermost ring
    Border,
    /// Outline plus fading inner glow rings
    Neon,
}

/// (inset, alpha) of the glow rings inside a neon outline
const NEON_RINGS: [(u32, u8); 3] = [(1, 89), (2, 51), (3, 26)];

impl FrameStyle {
    /// Draw operations for this style, outermost first
    pub fn ops(self, color: Color, context: &DisplayContext) -> Vec<DrawOp> {
        let (w, h) = (context.width, context.height);
        let ring = |inset: u32, color: Color| DrawOp::StrokeRect {
            x: inset as i32,
            y: inset as i32,
            width: w.saturating_sub(2 * inset),
            height: h.saturating_sub(2 * inset),
            color,
        };
        let edge = color.with_alpha(255);
        match self {
            FrameStyle::None => Vec::new(),
            FrameStyle::Border => vec![ring(0, edge)],
            FrameStyle::Neon => std::iter::once(ring(0, edge))
                .chain(NEON_RINGS.iter().map(|&(inset, a)| ring(inset, color.with_alpha(a))))
                .collect(),
        }
    }
}

/// Frame decoration; its priority decides whether it sits under or over content
pub struct FrameLayer {
    pub style: FrameStyle,
    pub color: Color,
    pub priority: i32,
}

impl Layer for FrameLayer {
    fn draw(&self, canvas: &mut Canvas, context: &DisplayContext) {
        for op in self.style.ops(self.color, context) {
            canvas.apply(&op);
        }
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
