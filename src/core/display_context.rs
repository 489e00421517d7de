/// Panel geometry - every compositing step targets one of these
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayContext {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl DisplayContext {
    /// The 128x64 HUB75 panel pair the device drives
    pub const PANEL: DisplayContext = DisplayContext::new(128, 64);

    /// Create new display context
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for DisplayContext {
    fn default() -> Self {
        Self::PANEL
    }
}
