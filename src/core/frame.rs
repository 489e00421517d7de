use super::canvas::Canvas;
use super::color::Color;
use super::display_context::DisplayContext;

/// One composed panel image - produced by a render pass, never mutated
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub number: u64,
    pub time_ms: f64,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl Frame {
    pub fn new(number: u64, time_ms: f64, canvas: Canvas) -> Self {
        let (width, height) = canvas.dimensions();
        Self {
            number,
            time_ms,
            width,
            height,
            pixels: canvas.into_pixels(),
        }
    }

    /// Opaque black frame of the given size
    pub fn blank(context: &DisplayContext) -> Self {
        let mut canvas = Canvas::new(context.width, context.height);
        canvas.clear(Color::BLACK);
        Self::new(0, 0.0, canvas)
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Tightly packed RGBA8 bytes
    pub fn rgba_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Reopen as a canvas, used when a render pass falls back to this frame
    pub fn to_canvas(&self) -> Canvas {
        Canvas::from_rgba_bytes(self.width, self.height, self.rgba_bytes())
            .unwrap_or_else(|| Canvas::new(self.width, self.height))
    }
}

/// Tick metadata - frame number and timing in milliseconds
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    pub number: u64,
    pub time_ms: f64,
    pub delta_ms: f64,
}

impl FrameInfo {
    pub fn new(number: u64, time_ms: f64, delta_ms: f64) -> Self {
        Self { number, time_ms, delta_ms }
    }
}

/// Infinite iterator pacing the display-refresh loop.
/// Use this in a loop: `for tick in FrameIterator::with_rate(60.0) { ... }`
pub struct FrameIterator {
    frame_number: u64,
    start_time: std::time::Instant,
    last_frame_time: std::time::Instant,
    period: std::time::Duration,
}

impl FrameIterator {
    pub fn with_rate(hz: f64) -> Self {
        let now = std::time::Instant::now();
        Self {
            frame_number: 0,
            start_time: now,
            last_frame_time: now,
            period: std::time::Duration::from_secs_f64(1.0 / hz.max(1.0)),
        }
    }
}

impl Default for FrameIterator {
    fn default() -> Self {
        Self::with_rate(60.0)
    }
}

impl Iterator for FrameIterator {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        if self.frame_number > 0 {
            let due = self.last_frame_time + self.period;
            let now = std::time::Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
        }

        let now = std::time::Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f64() * 1000.0;
        let time = now.duration_since(self.start_time).as_secs_f64() * 1000.0;

        let info = FrameInfo::new(self.frame_number, time, delta);

        self.frame_number += 1;
        self.last_frame_time = now;

        Some(info)
    }
}
