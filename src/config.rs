// config.rs - Session file: everything the user picks, with defaults for the rest
use crate::compositor::{Backdrop, BgMode, FrameStyle, ImageFit, TimeFormat, TreeMode};
use crate::core::{Color, DisplayContext};
use crate::glyph::{Fill, Gradient, TextStyle};
use crate::scheduler::{Phase, ScrollDirection};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Panel root URL, e.g. `http://192.168.4.1`; preview only when unset
    pub url: Option<String>,
    pub timeout_ms: u64,
    /// 0..100
    pub brightness: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: 10_000,
            brightness: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: DisplayContext::PANEL.width,
            height: DisplayContext::PANEL.height,
        }
    }
}

impl PanelConfig {
    pub fn context(&self) -> DisplayContext {
        DisplayContext::new(self.width, self.height)
    }
}

/// A font file registered under a family name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontEntry {
    pub family: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub color: Color,
    pub mode: BgMode,
    pub image: Option<PathBuf>,
    pub fit: ImageFit,
    pub frame: FrameStyle,
    pub frame_color: Color,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            mode: BgMode::Color,
            image: None,
            fit: ImageFit::Fit,
            frame: FrameStyle::None,
            frame_color: Color::WHITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub text: String,
    pub font: String,
    pub size: f32,
    /// Pixels between characters
    pub gap: i32,
    pub color: Color,
    pub gradient: Option<Gradient>,
    pub thickness: u32,
    pub animate: bool,
    pub direction: ScrollDirection,
    /// Scroll speed in percent, mapped through the speed curve
    pub speed: u32,
    /// Pixels between scrolling copies
    pub interval: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: "pixel".to_string(),
            size: 16.0,
            gap: 1,
            color: Color::WHITE,
            gradient: None,
            thickness: 0,
            animate: false,
            direction: ScrollDirection::Left,
            speed: 80,
            interval: 5,
        }
    }
}

impl TextConfig {
    pub fn style(&self) -> TextStyle {
        TextStyle {
            family: self.font.clone(),
            size: self.size,
            gap: self.gap,
            fill: match self.gradient {
                Some(g) => Fill::Gradient(g),
                None => Fill::Solid(self.color),
            },
            thickness: self.thickness,
            flat: false,
        }
    }

    /// Whether the text scrolls rather than standing still
    pub fn scrolls(&self) -> bool {
        self.animate && !self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub font: String,
    pub size: f32,
    /// May be zero or negative for tight faces
    pub gap: i32,
    pub color: Color,
    pub format: TimeFormat,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            font: "pixel".to_string(),
            size: 16.0,
            gap: 0,
            color: Color::WHITE,
            format: TimeFormat::H24,
        }
    }
}

impl ClockConfig {
    pub fn style(&self) -> TextStyle {
        TextStyle {
            family: self.font.clone(),
            size: self.size,
            gap: self.gap,
            fill: Fill::Solid(self.color),
            thickness: 0,
            flat: true,
        }
    }
}

pub const MIN_VIDEO_FPS: u32 = 1;
pub const MAX_VIDEO_FPS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Animated GIF, still image, or a directory of frames
    pub source: Option<PathBuf>,
    /// Upload rate, 1..30
    pub fps: u32,
    pub fit: ImageFit,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            source: None,
            fps: 10,
            fit: ImageFit::Fit,
        }
    }
}

impl VideoConfig {
    pub fn upload_interval_ms(&self) -> f64 {
        1000.0 / self.fps.clamp(MIN_VIDEO_FPS, MAX_VIDEO_FPS) as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub path: Option<PathBuf>,
    /// Push rendered frames to the panel while previewing
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    pub channel: Option<String>,
    /// Fixed figure to show instead of polling, e.g. for offline previews
    pub count: Option<String>,
    pub icon_size: u32,
    pub font: String,
    pub color: Color,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            channel: None,
            count: None,
            icon_size: 32,
            font: "pixel".to_string(),
            color: Color::WHITE,
        }
    }
}

impl YouTubeConfig {
    pub fn style(&self) -> TextStyle {
        TextStyle {
            family: self.font.clone(),
            fill: Fill::Solid(self.color),
            ..TextStyle::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub font: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            font: "pixel".to_string(),
        }
    }
}

/// Study/break countdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub study_minutes: u32,
    pub break_minutes: u32,
    /// Drawn before the time while studying; needs a font with the glyph
    pub study_icon: String,
    pub break_icon: String,
    pub font: String,
    /// Starting size, shrunk until the group fits
    pub size: f32,
    /// Pixels between time characters, and between icon and time
    pub gap: i32,
    pub color: Color,
    pub background: Color,
    /// Drawn in the text colour
    pub frame: FrameStyle,
    pub trees: TreeMode,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            study_minutes: 25,
            break_minutes: 5,
            study_icon: String::new(),
            break_icon: String::new(),
            font: "pixel".to_string(),
            size: 26.0,
            gap: 3,
            color: Color::WHITE,
            background: Color::BLACK,
            frame: FrameStyle::None,
            trees: TreeMode::None,
        }
    }
}

impl TimerConfig {
    pub fn style(&self) -> TextStyle {
        TextStyle {
            family: self.font.clone(),
            size: self.size,
            gap: self.gap,
            fill: Fill::Solid(self.color),
            thickness: 0,
            flat: true,
        }
    }

    pub fn backdrop(&self) -> Backdrop<'static> {
        Backdrop {
            frame: self.frame,
            frame_color: self.color,
            ..Backdrop::solid(self.background)
        }
    }

    pub fn icon(&self, phase: Phase) -> &str {
        match phase {
            Phase::Study => &self.study_icon,
            Phase::Break => &self.break_icon,
        }
    }

    /// Tree growth for the current phase, `None` when trees are off
    pub fn tree_growth(&self, phase: Phase, progress: f32) -> Option<f32> {
        match (self.trees, phase) {
            (TreeMode::None, _) => None,
            (TreeMode::Animated, Phase::Study) => Some(progress),
            _ => Some(1.0),
        }
    }
}

/// Whole session; partial files fill the rest from defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub device: DeviceConfig,
    pub panel: PanelConfig,
    pub fonts: Vec<FontEntry>,
    pub background: BackgroundConfig,
    pub text: TextConfig,
    pub clock: ClockConfig,
    pub video: VideoConfig,
    pub theme: ThemeConfig,
    pub youtube: YouTubeConfig,
    pub dashboard: DashboardConfig,
    pub timer: TimerConfig,
}

impl SessionConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let mut config: SessionConfig = serde_json::from_str(text).context("parsing session file")?;
        config.sanitize();
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading session file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing session")
    }

    /// Pull out-of-range values back to something drawable
    pub fn sanitize(&mut self) {
        let defaults = SessionConfig::default();
        if self.panel.width == 0 || self.panel.height == 0 {
            log::warn!(
                "panel size {}x{} is empty, using {}x{}",
                self.panel.width,
                self.panel.height,
                defaults.panel.width,
                defaults.panel.height
            );
            self.panel = defaults.panel;
        }
        if self.device.brightness > 100 {
            log::warn!("brightness {} capped at 100", self.device.brightness);
            self.device.brightness = 100;
        }
        let fps = self.video.fps.clamp(MIN_VIDEO_FPS, MAX_VIDEO_FPS);
        if fps != self.video.fps {
            log::warn!("video fps {} out of range, using {fps}", self.video.fps);
            self.video.fps = fps;
        }
        if !(1..=100).contains(&self.text.speed) {
            log::warn!("text speed {}% out of range", self.text.speed);
            self.text.speed = self.text.speed.clamp(1, 100);
        }
        if self.text.interval == 0 {
            log::warn!("scroll interval 0, using 1");
            self.text.interval = 1;
        }
        if self.timer.study_minutes == 0 || self.timer.break_minutes == 0 {
            log::warn!("timer durations must be at least a minute");
            self.timer.study_minutes = self.timer.study_minutes.max(1);
            self.timer.break_minutes = self.timer.break_minutes.max(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config = SessionConfig::from_json(r##"{"text": {"text": "HI", "color": "#ff0000"}}"##).unwrap();
        assert_eq!(config.text.text, "HI");
        assert_eq!(config.text.color, Color::RED);
        assert_eq!(config.text.size, 16.0);
        assert_eq!(config.panel.context().width, 128);
        assert_eq!(config.video.fit, ImageFit::Fit);
    }

    #[test]
    fn enums_use_lowercase_names() {
        let config = SessionConfig::from_json(
            r#"{"background": {"fit": "original", "frame": "neon", "mode": "image"},
                "text": {"direction": "right", "gradient": "ocean"},
                "clock": {"format": "12"}}"#,
        )
        .unwrap();
        assert_eq!(config.background.fit, ImageFit::Original);
        assert_eq!(config.background.frame, FrameStyle::Neon);
        assert_eq!(config.background.mode, BgMode::Image);
        assert_eq!(config.text.direction, ScrollDirection::Right);
        assert_eq!(config.text.style().fill, Fill::Gradient(Gradient::Ocean));
        assert_eq!(config.clock.format, TimeFormat::H12);
    }

    #[test]
    fn out_of_range_values_are_pulled_back() {
        let config = SessionConfig::from_json(
            r#"{"video": {"fps": 90}, "device": {"brightness": 200},
                "panel": {"width": 0}, "text": {"interval": 0, "speed": 0}}"#,
        )
        .unwrap();
        assert_eq!(config.video.fps, 30);
        assert_eq!(config.device.brightness, 100);
        assert_eq!(config.panel.width, 128);
        assert_eq!(config.text.interval, 1);
        assert_eq!(config.text.speed, 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(SessionConfig::from_json("{\"text\": 5}").is_err());
        assert!(SessionConfig::from_json("{\"background\": {\"color\": \"blue\"}}").is_err());
    }

    #[test]
    fn timer_section_reads_and_sanitizes() {
        let config = SessionConfig::from_json(
            r##"{"timer": {"study_minutes": 0, "break_minutes": 10, "trees": "animated",
                "frame": "border", "color": "#00ff00", "break_icon": "B"}}"##,
        )
        .unwrap();
        let timer = &config.timer;
        assert_eq!((timer.study_minutes, timer.break_minutes), (1, 10));
        assert_eq!(timer.icon(Phase::Study), "");
        assert_eq!(timer.icon(Phase::Break), "B");
        assert_eq!(timer.tree_growth(Phase::Study, 0.25), Some(0.25));
        assert_eq!(timer.tree_growth(Phase::Break, 0.25), Some(1.0));
        let backdrop = timer.backdrop();
        assert_eq!(backdrop.frame, FrameStyle::Border);
        assert_eq!(backdrop.frame_color, Color::rgb(0, 255, 0));
        assert_eq!(TimerConfig::default().tree_growth(Phase::Study, 0.5), None);
    }

    #[test]
    fn clock_style_is_flat() {
        let style = ClockConfig::default().style();
        assert!(style.flat);
        assert_eq!(style.gap, 0);
    }

    #[test]
    fn round_trips_through_json() {
        let config = SessionConfig::default();
        let again = SessionConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, again);
    }
}
