//! User-supplied animated content behind a fixed capability interface.

pub mod declarative;

pub use declarative::{DeclarativeTheme, Element, ThemeSettings};

use crate::core::Canvas;
use anyhow::Result;

/// Persistent per-theme state handed back to every render call
pub type ThemeState = serde_json::Value;

pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 30;
pub const DEFAULT_FPS: u32 = 1;

/// Clamp a requested theme frame rate into the supported range
pub fn clamp_fps(fps: Option<u32>) -> u32 {
    fps.unwrap_or(DEFAULT_FPS).clamp(MIN_FPS, MAX_FPS)
}

/// Preview period in whole milliseconds for a theme frame rate
pub fn frame_period_ms(fps: u32) -> f64 {
    (1000.0 / fps.clamp(MIN_FPS, MAX_FPS) as f64).round()
}

/// Animated content source
pub trait ThemeRenderer {
    fn name(&self) -> &str;

    /// Frames per second, already clamped
    fn fps(&self) -> u32;

    /// Fresh state for a new run
    fn init(&self) -> ThemeState;

    /// Draw one frame; an error leaves the previous frame on screen
    fn render(
        &self,
        canvas: &mut Canvas,
        width: u32,
        height: u32,
        state: &mut ThemeState,
        timestamp_ms: f64,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_is_clamped() {
        assert_eq!(clamp_fps(None), 1);
        assert_eq!(clamp_fps(Some(0)), 1);
        assert_eq!(clamp_fps(Some(12)), 12);
        assert_eq!(clamp_fps(Some(99)), 30);
    }

    #[test]
    fn period_rounds() {
        assert_eq!(frame_period_ms(1), 1000.0);
        assert_eq!(frame_period_ms(30), 33.0);
        assert_eq!(frame_period_ms(7), 143.0);
    }
}
