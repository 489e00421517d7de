use super::scroll::ScrollHeads;
use super::speed::ms_per_px;
use super::study::StudyTimer;
use super::ContentMode;
use crate::codec;
use crate::compositor::{format_countdown, Backdrop, BgMode, Compositor, Scene, TextMotion};
use crate::config::{BackgroundConfig, SessionConfig};
use crate::core::{Canvas, Color, Frame, PlaybackClock, Throttled, WallClock};
use crate::glyph::{AlphaPolicy, TextStyle};
use crate::media::VideoClip;
use crate::theme::{frame_period_ms, ThemeRenderer, ThemeState};
use crate::upload::{DeviceClient, Dispatcher, UploadMeta, CLOCK_UPLOAD_TIMEOUT};
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Preview redraw spacing for the clock
pub const CLOCK_PREVIEW_MS: f64 = 100.0;
/// Minimum spacing of clock uploads
pub const CLOCK_UPLOAD_MS: f64 = 1000.0;
/// Minimum spacing of streamed theme frames
pub const THEME_STREAM_MS: f64 = 1000.0;
/// How often the subscriber count is refreshed
pub const YOUTUBE_POLL_MS: f64 = 5000.0;
/// Redraw and upload spacing of the dashboard
pub const DASHBOARD_PERIOD_MS: f64 = 1000.0;
/// Redraw spacing of the countdown; uploads follow the shown seconds
pub const TIMER_PREVIEW_MS: f64 = 200.0;

/// Everything a loop may read or draw with during one tick
pub struct LoopEnv<'a> {
    pub compositor: &'a mut Compositor,
    pub config: &'a SessionConfig,
    pub background: Option<&'a Canvas>,
    pub video: Option<&'a VideoClip>,
    pub theme: Option<&'a dyn ThemeRenderer>,
    pub wall_clock: &'a dyn WallClock,
    pub youtube_count: &'a mut Option<String>,
}

impl<'a> LoopEnv<'a> {
    /// Configured background, with the picture only when image mode is on
    pub fn backdrop(&self) -> Backdrop<'a> {
        backdrop(&self.config.background, self.background)
    }
}

pub fn backdrop<'a>(config: &BackgroundConfig, image: Option<&'a Canvas>) -> Backdrop<'a> {
    let image = match (config.mode, image) {
        (BgMode::Image, Some(image)) => Some((image, config.fit)),
        _ => None,
    };
    Backdrop {
        color: config.color,
        image,
        frame: config.frame,
        frame_color: config.frame_color,
    }
}

/// Upload access for one loop run.
///
/// Jobs carry the generation they were issued under and are dropped
/// unstarted once the controller has moved on to another loop.
#[derive(Clone)]
pub struct UploadSlot {
    dispatcher: Dispatcher,
    current: Arc<AtomicU64>,
    generation: u64,
}

impl UploadSlot {
    pub fn new(dispatcher: Dispatcher, current: Arc<AtomicU64>) -> Self {
        let generation = current.load(Ordering::Acquire);
        Self {
            dispatcher,
            current,
            generation,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }

    /// Hand `job` to the dispatcher; false when one is already in flight
    pub fn send<F>(&self, label: &'static str, job: F) -> bool
    where
        F: FnOnce(&DeviceClient) -> Result<()> + Send + 'static,
    {
        if !self.is_current() {
            return false;
        }
        let current = Arc::clone(&self.current);
        let generation = self.generation;
        self.dispatcher.try_dispatch(label, move |client| {
            if current.load(Ordering::Acquire) != generation {
                log::debug!("{label}: mode changed before send, dropped");
                return Ok(());
            }
            job(client)
        })
    }
}

/// One mode's scheduler, driven by [`crate::scheduler::PreviewController`]
pub trait ContentLoop {
    fn mode(&self) -> ContentMode;

    /// Advance to `now_ms`; returns a preview frame when one was drawn
    fn tick(&mut self, now_ms: f64, env: &mut LoopEnv<'_>) -> Option<Frame>;

    /// Uploads handed to the dispatcher so far
    fn uploads_sent(&self) -> u64 {
        0
    }
}

/// Still or scrolling text preview; device upload is a one-shot apply
pub struct TextLoop {
    heads: Option<ScrollHeads>,
    playback: PlaybackClock,
    step_ms: f64,
    drawn: bool,
}

impl TextLoop {
    pub fn new(env: &mut LoopEnv<'_>) -> Self {
        let text = &env.config.text;
        let heads = if text.scrolls() {
            let bitmap = env
                .compositor
                .text_bitmap(&text.text, &text.style(), AlphaPolicy::Preview);
            let heads = ScrollHeads::new(
                env.compositor.context().width,
                bitmap.width(),
                text.interval as i32,
                text.direction,
            );
            log::debug!(
                "scrolling {} copies, spacing {}",
                heads.heads().len(),
                heads.spacing()
            );
            Some(heads)
        } else {
            None
        };
        Self {
            heads,
            playback: PlaybackClock::new(),
            step_ms: ms_per_px(text.speed as f64),
            drawn: false,
        }
    }

    pub fn heads(&self) -> Option<&ScrollHeads> {
        self.heads.as_ref()
    }

    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }
}

impl ContentLoop for TextLoop {
    fn mode(&self) -> ContentMode {
        ContentMode::Text
    }

    fn tick(&mut self, now_ms: f64, env: &mut LoopEnv<'_>) -> Option<Frame> {
        let motion = match &mut self.heads {
            None if self.drawn => return None,
            None => TextMotion::Static,
            Some(heads) => {
                self.playback.advance(now_ms);
                let steps = self.playback.take_steps(self.step_ms);
                if steps == 0 && self.drawn {
                    return None;
                }
                heads.step(steps);
                TextMotion::Scrolling(heads.heads())
            }
        };
        self.drawn = true;

        let backdrop = env.backdrop();
        let text = &env.config.text;
        let style = text.style();
        Some(env.compositor.render_frame(
            Scene::Text {
                backdrop,
                text: &text.text,
                style: &style,
                motion,
            },
            now_ms,
        ))
    }
}

/// Smooth preview, uploads at most once a second
pub struct ClockLoop {
    preview: Throttled,
    upload: Throttled,
    slot: Option<UploadSlot>,
    sent: u64,
}

impl ClockLoop {
    pub fn new(slot: Option<UploadSlot>) -> Self {
        Self {
            preview: Throttled::new(CLOCK_PREVIEW_MS),
            upload: Throttled::new(CLOCK_UPLOAD_MS),
            slot,
            sent: 0,
        }
    }

    fn scene<'s>(env: &LoopEnv<'s>, style: &'s TextStyle) -> Scene<'s> {
        Scene::Clock {
            backdrop: env.backdrop(),
            style,
            format: env.config.clock.format,
            clock: env.wall_clock,
        }
    }
}

impl ContentLoop for ClockLoop {
    fn mode(&self) -> ContentMode {
        ContentMode::Clock
    }

    fn tick(&mut self, now_ms: f64, env: &mut LoopEnv<'_>) -> Option<Frame> {
        let style = env.config.clock.style();
        let preview = if self.preview.try_fire(now_ms) {
            let scene = Self::scene(env, &style);
            Some(env.compositor.render_frame(scene, now_ms))
        } else {
            None
        };

        if let Some(slot) = &self.slot {
            if self.upload.try_fire(now_ms) {
                let scene = Self::scene(env, &style);
                let frame = env.compositor.render_device_frame(scene, now_ms);
                let payload = codec::encode_opaque(&frame);
                let meta = UploadMeta::still(env.config.background.color);
                let accepted = slot.send("clock", move |client| {
                    client.upload_with_timeout("clock.rgb565", &payload, &meta, Some(CLOCK_UPLOAD_TIMEOUT))
                });
                if accepted {
                    self.sent += 1;
                }
            }
        }
        preview
    }

    fn uploads_sent(&self) -> u64 {
        self.sent
    }
}

/// Decoded clip preview every tick, uploads paced by the configured fps
pub struct VideoLoop {
    start_ms: Option<f64>,
    upload: Throttled,
    slot: Option<UploadSlot>,
    sent: u64,
}

impl VideoLoop {
    pub fn new(env: &LoopEnv<'_>, slot: Option<UploadSlot>) -> Self {
        if env.video.is_none() {
            log::warn!("no video loaded, showing background only");
        }
        Self {
            start_ms: None,
            upload: Throttled::new(env.config.video.upload_interval_ms()),
            slot,
            sent: 0,
        }
    }

    fn scene<'s>(env: &LoopEnv<'s>, image: Option<&'s Canvas>) -> Scene<'s> {
        Scene::Video {
            backdrop: env.backdrop(),
            frame: image,
            fit: env.config.video.fit,
        }
    }
}

impl ContentLoop for VideoLoop {
    fn mode(&self) -> ContentMode {
        ContentMode::Video
    }

    fn tick(&mut self, now_ms: f64, env: &mut LoopEnv<'_>) -> Option<Frame> {
        let start = *self.start_ms.get_or_insert(now_ms);
        let image = env.video.map(|clip| clip.frame_at(now_ms - start));
        let scene = Self::scene(env, image);
        let preview = env.compositor.render_frame(scene, now_ms);

        if let Some(slot) = &self.slot {
            // a busy link skips this slot without resetting the pacing
            if image.is_some() && !slot.is_busy() && self.upload.try_fire(now_ms) {
                let scene = Self::scene(env, image);
                let frame = env.compositor.render_device_frame(scene, now_ms);
                let payload = codec::encode_opaque(&frame);
                let meta = UploadMeta::still(env.config.background.color);
                if slot.send("video", move |client| client.upload("video.rgb565", &payload, &meta)) {
                    self.sent += 1;
                }
            }
        }
        Some(preview)
    }

    fn uploads_sent(&self) -> u64 {
        self.sent
    }
}

/// Theme frames at the theme's own rate, optionally streamed to the panel
pub struct ThemeLoop {
    state: ThemeState,
    start_ms: Option<f64>,
    preview: Throttled,
    stream: Throttled,
    slot: Option<UploadSlot>,
    sent: u64,
}

impl ThemeLoop {
    pub fn new(env: &mut LoopEnv<'_>, slot: Option<UploadSlot>) -> Result<Self> {
        let Some(theme) = env.theme else {
            bail!("no theme loaded");
        };
        env.compositor.reset_theme();
        let period = frame_period_ms(theme.fps());
        log::info!("theme {} at {} fps ({period} ms)", theme.name(), theme.fps());
        Ok(Self {
            state: theme.init(),
            start_ms: None,
            preview: Throttled::new(period),
            stream: Throttled::new(THEME_STREAM_MS),
            slot: slot.filter(|_| env.config.theme.stream),
            sent: 0,
        })
    }

    pub fn state(&self) -> &ThemeState {
        &self.state
    }
}

impl ContentLoop for ThemeLoop {
    fn mode(&self) -> ContentMode {
        ContentMode::Theme
    }

    fn tick(&mut self, now_ms: f64, env: &mut LoopEnv<'_>) -> Option<Frame> {
        let renderer = env.theme?;
        if !self.preview.try_fire(now_ms) {
            return None;
        }
        let start = *self.start_ms.get_or_insert(now_ms);
        let frame = env.compositor.render_frame(
            Scene::Theme {
                renderer,
                state: &mut self.state,
            },
            now_ms - start,
        );

        if let Some(slot) = &self.slot {
            if !slot.is_busy() && self.stream.try_fire(now_ms) {
                let payload = codec::encode_with_alpha(&frame);
                let meta = UploadMeta::still(env.config.background.color)
                    .with_brightness(env.config.device.brightness);
                if slot.send("theme", move |client| client.upload("theme.rgb565", &payload, &meta)) {
                    self.sent += 1;
                }
            }
        }
        Some(frame)
    }

    fn uploads_sent(&self) -> u64 {
        self.sent
    }
}

/// Counter preview; polls the device for fresh figures and re-uploads on change
pub struct YouTubeLoop {
    poll: Throttled,
    counts: Receiver<String>,
    sender: Sender<String>,
    slot: Option<UploadSlot>,
    dirty: bool,
    sent: u64,
}

impl YouTubeLoop {
    pub fn new(env: &mut LoopEnv<'_>, slot: Option<UploadSlot>) -> Self {
        if let Some(fixed) = &env.config.youtube.count {
            *env.youtube_count = Some(fixed.clone());
        }
        let (sender, counts) = mpsc::channel();
        Self {
            poll: Throttled::new(YOUTUBE_POLL_MS),
            counts,
            sender,
            slot,
            dirty: env.youtube_count.is_some(),
            sent: 0,
        }
    }

    /// Feed a figure as if it came back from a poll
    pub fn sender(&self) -> Sender<String> {
        self.sender.clone()
    }

    fn scene<'s>(env: &LoopEnv<'s>, style: &'s TextStyle, count: Option<&'s str>) -> Scene<'s> {
        Scene::YouTube {
            backdrop: env.backdrop(),
            count,
            icon_size: env.config.youtube.icon_size,
            style,
        }
    }
}

impl ContentLoop for YouTubeLoop {
    fn mode(&self) -> ContentMode {
        ContentMode::YouTube
    }

    fn tick(&mut self, now_ms: f64, env: &mut LoopEnv<'_>) -> Option<Frame> {
        if let (Some(slot), Some(channel)) = (&self.slot, &env.config.youtube.channel) {
            if env.config.youtube.count.is_none() && !slot.is_busy() && self.poll.try_fire(now_ms) {
                let channel = channel.clone();
                let sender = self.sender.clone();
                slot.send("yt-stats", move |client| {
                    if let Some(count) = client.yt_stats(&channel)? {
                        // the loop may be gone already
                        sender.send(count).ok();
                    }
                    Ok(())
                });
            }
        }

        while let Ok(count) = self.counts.try_recv() {
            if env.youtube_count.as_deref() != Some(count.as_str()) {
                log::info!("subscriber count now {count}");
                *env.youtube_count = Some(count);
                self.dirty = true;
            }
        }

        let style = env.config.youtube.style();
        let count = env.youtube_count.clone();
        let scene = Self::scene(env, &style, count.as_deref());
        let preview = env.compositor.render_frame(scene, now_ms);

        if let Some(slot) = &self.slot {
            if self.dirty && !slot.is_busy() {
                let scene = Self::scene(env, &style, count.as_deref());
                let frame = env.compositor.render_device_frame(scene, now_ms);
                let payload = codec::encode_opaque(&frame);
                let meta = UploadMeta::still(env.config.background.color);
                if slot.send("youtube", move |client| client.upload("yt.rgb565", &payload, &meta)) {
                    self.dirty = false;
                    self.sent += 1;
                }
            }
        }
        Some(preview)
    }

    fn uploads_sent(&self) -> u64 {
        self.sent
    }
}

/// Date, time and equalizer, drawn and uploaded once a second
pub struct DashboardLoop {
    period: Throttled,
    slot: Option<UploadSlot>,
    sent: u64,
}

impl DashboardLoop {
    pub fn new(slot: Option<UploadSlot>) -> Self {
        Self {
            period: Throttled::new(DASHBOARD_PERIOD_MS),
            slot,
            sent: 0,
        }
    }

    fn scene<'s>(env: &LoopEnv<'s>) -> Scene<'s> {
        Scene::Dashboard {
            family: &env.config.dashboard.font,
            clock: env.wall_clock,
        }
    }
}

impl ContentLoop for DashboardLoop {
    fn mode(&self) -> ContentMode {
        ContentMode::Dashboard
    }

    fn tick(&mut self, now_ms: f64, env: &mut LoopEnv<'_>) -> Option<Frame> {
        if !self.period.try_fire(now_ms) {
            return None;
        }
        let preview = env.compositor.render_frame(Self::scene(env), now_ms);

        if let Some(slot) = &self.slot {
            let frame = env.compositor.render_device_frame(Self::scene(env), now_ms);
            let payload = codec::encode_opaque(&frame);
            let meta = UploadMeta::still(Color::BLACK);
            if slot.send("dashboard", move |client| client.upload("template.rgb565", &payload, &meta)) {
                self.sent += 1;
            }
        }
        Some(preview)
    }

    fn uploads_sent(&self) -> u64 {
        self.sent
    }
}

/// Study/break countdown; uploads whenever the shown seconds change
pub struct TimerLoop {
    timer: StudyTimer,
    preview: Throttled,
    slot: Option<UploadSlot>,
    last_sent: Option<u64>,
    sent: u64,
}

impl TimerLoop {
    pub fn new(env: &LoopEnv<'_>, slot: Option<UploadSlot>) -> Self {
        let config = &env.config.timer;
        log::info!(
            "timer: {} min study, {} min break",
            config.study_minutes,
            config.break_minutes
        );
        Self {
            timer: StudyTimer::new(config.study_minutes, config.break_minutes),
            preview: Throttled::new(TIMER_PREVIEW_MS),
            slot,
            last_sent: None,
            sent: 0,
        }
    }

    fn scene<'s>(&self, env: &LoopEnv<'s>, time: &'s str, style: &'s TextStyle) -> Scene<'s> {
        let config = &env.config.timer;
        let phase = self.timer.phase();
        Scene::Countdown {
            backdrop: config.backdrop(),
            icon: config.icon(phase),
            time,
            style,
            trees: config.tree_growth(phase, self.timer.progress()),
        }
    }
}

impl ContentLoop for TimerLoop {
    fn mode(&self) -> ContentMode {
        ContentMode::Timer
    }

    fn tick(&mut self, now_ms: f64, env: &mut LoopEnv<'_>) -> Option<Frame> {
        if let Some(phase) = self.timer.tick(now_ms) {
            log::info!("{phase} phase started");
        }
        let time = format_countdown(self.timer.remaining_ms());
        let style = env.config.timer.style();

        let preview = if self.preview.try_fire(now_ms) {
            let scene = self.scene(env, &time, &style);
            Some(env.compositor.render_frame(scene, now_ms))
        } else {
            None
        };

        if let Some(slot) = &self.slot {
            let shown = self.timer.shown_seconds();
            if self.last_sent != Some(shown) && !slot.is_busy() {
                let scene = self.scene(env, &time, &style);
                let frame = env.compositor.render_device_frame(scene, now_ms);
                let payload = codec::encode_opaque(&frame);
                let meta = UploadMeta::still(env.config.timer.background);
                if slot.send("timer", move |client| client.upload("timer.rgb565", &payload, &meta)) {
                    self.last_sent = Some(shown);
                    self.sent += 1;
                }
            }
        }
        preview
    }

    fn uploads_sent(&self) -> u64 {
        self.sent
    }
}
