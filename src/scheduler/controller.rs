use super::loops::{
    backdrop, ClockLoop, ContentLoop, DashboardLoop, LoopEnv, TextLoop, ThemeLoop, TimerLoop, UploadSlot, VideoLoop,
    YouTubeLoop,
};
use super::speed::device_speed_ms;
use super::ContentMode;
use crate::codec;
use crate::compositor::{BgMode, Compositor, FrameStyle, Scene, TextMotion};
use crate::config::SessionConfig;
use crate::core::{Canvas, Frame, LocalClock, WallClock};
use crate::glyph::{AlphaPolicy, FontBook};
use crate::media::{load_image, VideoClip};
use crate::theme::{DeclarativeTheme, ThemeRenderer};
use crate::upload::{DeviceClient, Dispatcher, Motion, UploadMeta};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Everything one session works with, owned by the controller
pub struct SessionState {
    pub config: SessionConfig,
    pub background: Option<Canvas>,
    pub video: Option<VideoClip>,
    pub theme: Option<Box<dyn ThemeRenderer>>,
    pub wall_clock: Box<dyn WallClock>,
    /// Last known subscriber count, kept across mode switches
    pub youtube_count: Option<String>,
}

impl SessionState {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            background: None,
            video: None,
            theme: None,
            wall_clock: Box::new(LocalClock),
            youtube_count: None,
        }
    }

    /// Load the background, clip, and theme named in the config.
    /// Unreadable media is logged and left out; a malformed theme is an error.
    pub fn load_resources(&mut self, fonts: &FontBook) -> Result<()> {
        self.background = self.config.background.image.as_deref().and_then(|path| {
            load_image(path)
                .map_err(|e| log::warn!("background unavailable: {e:#}"))
                .ok()
        });
        self.video = self.config.video.source.as_deref().and_then(|path| {
            VideoClip::load(path)
                .map_err(|e| log::warn!("video unavailable: {e:#}"))
                .ok()
        });
        if let Some(path) = &self.config.theme.path {
            let glyphs = fonts.resolve(&self.config.text.font);
            let theme = DeclarativeTheme::load(path)?.with_glyphs(glyphs);
            self.theme = Some(Box::new(theme));
        }
        Ok(())
    }

    pub fn with_wall_clock(mut self, clock: Box<dyn WallClock>) -> Self {
        self.wall_clock = clock;
        self
    }
}

/// Borrow the pieces of a session a loop works with
fn loop_env<'a>(session: &'a mut SessionState, compositor: &'a mut Compositor) -> LoopEnv<'a> {
    LoopEnv {
        compositor,
        config: &session.config,
        background: session.background.as_ref(),
        video: session.video.as_ref(),
        theme: session.theme.as_deref(),
        wall_clock: session.wall_clock.as_ref(),
        youtube_count: &mut session.youtube_count,
    }
}

/// Runs at most one content loop and owns everything it draws with.
///
/// Activating a mode drops the previous loop before the new one is built
/// and bumps the generation, so uploads queued by the old loop never start.
pub struct PreviewController {
    session: SessionState,
    compositor: Compositor,
    dispatcher: Option<Dispatcher>,
    generation: Arc<AtomicU64>,
    active: Option<Box<dyn ContentLoop>>,
}

impl PreviewController {
    pub fn new(session: SessionState, fonts: FontBook, dispatcher: Option<Dispatcher>) -> Self {
        let context = session.config.panel.context();
        Self {
            session,
            compositor: Compositor::new(context, fonts),
            dispatcher,
            generation: Arc::new(AtomicU64::new(0)),
            active: None,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Changes take effect on the next [`activate`](Self::activate)
    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn client(&self) -> Option<&DeviceClient> {
        self.dispatcher.as_ref().map(|d| d.client())
    }

    pub fn dispatcher(&self) -> Option<&Dispatcher> {
        self.dispatcher.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn active_mode(&self) -> Option<ContentMode> {
        self.active.as_ref().map(|l| l.mode())
    }

    pub fn active_loop(&self) -> Option<&dyn ContentLoop> {
        self.active.as_deref()
    }

    /// Stop whatever runs now and start `mode`
    pub fn activate(&mut self, mode: ContentMode) -> Result<()> {
        self.deactivate();
        let slot = self
            .dispatcher
            .clone()
            .map(|d| UploadSlot::new(d, Arc::clone(&self.generation)));

        let mut env = loop_env(&mut self.session, &mut self.compositor);
        let next: Box<dyn ContentLoop> = match mode {
            ContentMode::Text => Box::new(TextLoop::new(&mut env)),
            ContentMode::Clock => Box::new(ClockLoop::new(slot)),
            ContentMode::Video => Box::new(VideoLoop::new(&env, slot)),
            ContentMode::Theme => Box::new(ThemeLoop::new(&mut env, slot)?),
            ContentMode::YouTube => Box::new(YouTubeLoop::new(&mut env, slot)),
            ContentMode::Dashboard => Box::new(DashboardLoop::new(slot)),
            ContentMode::Timer => Box::new(TimerLoop::new(&env, slot)),
        };
        log::info!("{mode} loop started (generation {})", self.generation());
        self.active = Some(next);
        Ok(())
    }

    /// Stop the active loop, if any
    pub fn deactivate(&mut self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(stopped) = self.active.take() {
            log::debug!(
                "{} loop stopped after {} uploads (generation {generation})",
                stopped.mode(),
                stopped.uploads_sent()
            );
        }
    }

    /// Drive the active loop; returns a preview frame when one was drawn
    pub fn tick(&mut self, now_ms: f64) -> Option<Frame> {
        let active = self.active.as_mut()?;
        let mut env = loop_env(&mut self.session, &mut self.compositor);
        active.tick(now_ms, &mut env)
    }

    /// Push the configured text to the panel once.
    ///
    /// Still text goes up as one opaque frame. Scrolling text goes up as
    /// that frame, then the background layer when one is set, then the
    /// cropped text overlay the firmware scrolls on its own.
    pub fn apply_text(&mut self) -> Result<()> {
        let client = self
            .client()
            .cloned()
            .context("no device configured")?;
        let config = &self.session.config;
        let text = &config.text;
        let style = text.style();
        let back = backdrop(&config.background, self.session.background.as_ref());
        let brightness = config.device.brightness;

        let combined = self.compositor.render_device_frame(
            Scene::Text {
                backdrop: back,
                text: &text.text,
                style: &style,
                motion: TextMotion::Static,
            },
            0.0,
        );
        let still = UploadMeta::still(config.background.color).with_brightness(brightness);
        client.upload("img.rgb565", &codec::encode_opaque(&combined), &still)?;
        if !text.scrolls() {
            return Ok(());
        }

        let layered = back.image.is_some() || back.frame != FrameStyle::None;
        if layered {
            let bg_only = self.compositor.render_device_frame(
                Scene::Text {
                    backdrop: back,
                    text: "",
                    style: &style,
                    motion: TextMotion::Static,
                },
                0.0,
            );
            client.upload_bg(&codec::encode_opaque(&bg_only))?;
        }

        let overlay = self
            .compositor
            .text_bitmap(&text.text, &style, AlphaPolicy::Device);
        let canvas = overlay.canvas();
        let payload = codec::encode_pixels_with_alpha(canvas.width(), canvas.height(), canvas.pixels());
        let meta = UploadMeta::still(config.background.color)
            .with_bg_mode(if layered { BgMode::Image } else { config.background.mode })
            .with_motion(Motion::new(
                text.direction,
                device_speed_ms(text.speed as f64),
                text.interval,
            ))
            .with_brightness(brightness);
        client.upload("img.rgb565", &payload, &meta)?;
        log::info!("scrolling text applied ({}x{})", canvas.width(), canvas.height());
        Ok(())
    }

    /// Store the configured theme file on the panel for standalone playback
    pub fn upload_theme_file(&self) -> Result<()> {
        let client = self.client().context("no device configured")?;
        let path = self
            .session
            .config
            .theme
            .path
            .as_deref()
            .context("no theme file configured")?;
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("theme.json");
        client.upload_theme(name, &bytes)
    }
}

impl Drop for PreviewController {
    fn drop(&mut self) {
        self.deactivate();
    }
}
