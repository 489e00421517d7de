//! Timing for every animated mode: scroll stepping, preview cadence,
//! upload throttling, and the single active loop.

pub mod controller;
pub mod loops;
pub mod scroll;
pub mod speed;
pub mod study;

pub use controller::{PreviewController, SessionState};
pub use loops::{
    ClockLoop, ContentLoop, DashboardLoop, LoopEnv, TextLoop, ThemeLoop, TimerLoop, UploadSlot, VideoLoop, YouTubeLoop,
};
pub use scroll::{ScrollDirection, ScrollHeads};
pub use speed::{device_speed_ms, ms_per_px};
pub use study::{Phase, StudyTimer};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The mutually exclusive things the panel can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    Text,
    Clock,
    Video,
    Theme,
    YouTube,
    Dashboard,
    Timer,
}

impl ContentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentMode::Text => "text",
            ContentMode::Clock => "clock",
            ContentMode::Video => "video",
            ContentMode::Theme => "theme",
            ContentMode::YouTube => "youtube",
            ContentMode::Dashboard => "dashboard",
            ContentMode::Timer => "timer",
        }
    }
}

impl fmt::Display for ContentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
