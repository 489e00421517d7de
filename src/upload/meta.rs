use crate::compositor::BgMode;
use crate::core::Color;
use crate::scheduler::ScrollDirection;

/// Device-side scroll step range in ms
pub const SPEED_RANGE: (u32, u32) = (2, 50);
/// Device-side gap range between scrolling copies in px
pub const INTERVAL_RANGE: (u32, u32) = (1, 25);
pub const MAX_BRIGHTNESS: u8 = 100;

/// On-device scrolling parameters for an overlay upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    pub direction: ScrollDirection,
    pub speed_ms: u32,
    pub interval: u32,
}

impl Motion {
    /// Values clamped into what the firmware accepts
    pub fn new(direction: ScrollDirection, speed_ms: u32, interval: u32) -> Self {
        Self {
            direction,
            speed_ms: speed_ms.clamp(SPEED_RANGE.0, SPEED_RANGE.1),
            interval: interval.clamp(INTERVAL_RANGE.0, INTERVAL_RANGE.1),
        }
    }
}

/// Plain form fields sent next to an `/upload` image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadMeta {
    pub bg: Color,
    pub bg_mode: BgMode,
    pub offset: (i32, i32),
    pub motion: Option<Motion>,
    pub brightness: Option<u8>,
}

impl UploadMeta {
    /// A still frame over a solid background
    pub fn still(bg: Color) -> Self {
        Self {
            bg,
            bg_mode: BgMode::Color,
            offset: (0, 0),
            motion: None,
            brightness: None,
        }
    }

    pub fn with_bg_mode(mut self, bg_mode: BgMode) -> Self {
        self.bg_mode = bg_mode;
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness.min(MAX_BRIGHTNESS));
        self
    }

    /// Field names and values in wire order
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("bg", self.bg.to_hex()),
            ("bgMode", self.bg_mode.as_str().to_string()),
            ("offx", self.offset.0.to_string()),
            ("offy", self.offset.1.to_string()),
        ];
        match self.motion {
            Some(m) => fields.extend([
                ("animate", "1".to_string()),
                ("dir", m.direction.as_str().to_string()),
                ("speed", m.speed_ms.to_string()),
                ("interval", m.interval.to_string()),
            ]),
            None => fields.extend([
                ("animate", "0".to_string()),
                ("dir", "none".to_string()),
                ("speed", "0".to_string()),
                ("interval", "0".to_string()),
            ]),
        }
        if let Some(b) = self.brightness {
            fields.push(("brightness", b.to_string()));
        }
        fields
    }
}
