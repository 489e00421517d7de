//! Per-tick frame composition for every content mode.

pub mod background;
pub mod clock;
pub mod countdown;
pub mod dashboard;
pub mod decoration;
pub mod text;
pub mod youtube;

pub use background::{draw_fitted, BackgroundLayer, BgMode, ImageFit, PictureLayer};
pub use clock::{format_time, TimeFormat};
pub use countdown::{format_countdown, CountdownLayer, TreeLayer, TreeMode};
pub use dashboard::DashboardLayer;
pub use decoration::{FrameLayer, FrameStyle};
pub use text::BitmapLayer;

use crate::core::layer::{DECORATION, UNDERLAY};
use crate::core::{Canvas, Color, DisplayContext, Frame, LayerStack, WallClock};
use crate::glyph::{AlphaPolicy, BitmapCache, ContentBitmap, FontBook, TextStyle};
use crate::theme::{ThemeRenderer, ThemeState};
use std::rc::Rc;

/// Background and decoration shared by the text, clock, video and counter modes
#[derive(Clone, Copy)]
pub struct Backdrop<'a> {
    pub color: Color,
    pub image: Option<(&'a Canvas, ImageFit)>,
    pub frame: FrameStyle,
    pub frame_color: Color,
}

impl<'a> Backdrop<'a> {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            image: None,
            frame: FrameStyle::None,
            frame_color: Color::WHITE,
        }
    }

    fn layers(&self, frame_priority: i32) -> LayerStack<'a> {
        LayerStack::new()
            .with_layer(Box::new(BackgroundLayer {
                color: self.color,
                image: self.image,
            }))
            .with_layer(Box::new(FrameLayer {
                style: self.frame,
                color: self.frame_color,
                priority: frame_priority,
            }))
    }
}

/// Still or scrolling text placement
#[derive(Debug, Clone, Copy)]
pub enum TextMotion<'a> {
    Static,
    /// Left edge of every copy
    Scrolling(&'a [i32]),
}

/// What to draw this tick
pub enum Scene<'a> {
    Text {
        backdrop: Backdrop<'a>,
        text: &'a str,
        style: &'a TextStyle,
        motion: TextMotion<'a>,
    },
    Clock {
        backdrop: Backdrop<'a>,
        style: &'a TextStyle,
        format: TimeFormat,
        clock: &'a dyn WallClock,
    },
    Video {
        backdrop: Backdrop<'a>,
        frame: Option<&'a Canvas>,
        fit: ImageFit,
    },
    Theme {
        renderer: &'a dyn ThemeRenderer,
        state: &'a mut ThemeState,
    },
    YouTube {
        backdrop: Backdrop<'a>,
        count: Option<&'a str>,
        icon_size: u32,
        style: &'a TextStyle,
    },
    /// Date column, time, and equalizer on black
    Dashboard {
        family: &'a str,
        clock: &'a dyn WallClock,
    },
    /// Study/break countdown; `trees` is the growth of the tree row, if shown
    Countdown {
        backdrop: Backdrop<'a>,
        icon: &'a str,
        time: &'a str,
        style: &'a TextStyle,
        trees: Option<f32>,
    },
}

/// Owns the bitmap caches and produces one panel frame per call
pub struct Compositor {
    context: DisplayContext,
    fonts: FontBook,
    text_cache: BitmapCache,
    clock_cache: BitmapCache,
    count_cache: BitmapCache,
    frames: u64,
    last_theme_frame: Option<Frame>,
}

impl Compositor {
    pub fn new(context: DisplayContext, fonts: FontBook) -> Self {
        Self {
            context,
            fonts,
            text_cache: BitmapCache::new(),
            clock_cache: BitmapCache::new(),
            count_cache: BitmapCache::new(),
            frames: 0,
            last_theme_frame: None,
        }
    }

    pub fn context(&self) -> &DisplayContext {
        &self.context
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Cached text bitmap, shared with the scroll scheduler for sizing
    pub fn text_bitmap(&mut self, text: &str, style: &TextStyle, policy: AlphaPolicy) -> Rc<ContentBitmap> {
        let source = self.fonts.resolve(&style.family);
        self.text_cache.get_or_build(source.as_ref(), text, style, policy)
    }

    /// How many times the text bitmap has been rebuilt
    pub fn text_rebuilds(&self) -> u64 {
        self.text_cache.rebuilds()
    }

    /// Forget the last good theme frame, e.g. when a new theme is loaded
    pub fn reset_theme(&mut self) {
        self.last_theme_frame = None;
    }

    /// Frame for on-screen preview
    pub fn render_frame(&mut self, scene: Scene<'_>, time_ms: f64) -> Frame {
        self.render(scene, time_ms, AlphaPolicy::Preview)
    }

    /// Frame for upload, with crisp device alpha on text
    pub fn render_device_frame(&mut self, scene: Scene<'_>, time_ms: f64) -> Frame {
        self.render(scene, time_ms, AlphaPolicy::Device)
    }

    fn render(&mut self, scene: Scene<'_>, time_ms: f64, policy: AlphaPolicy) -> Frame {
        let context = self.context;
        let mut canvas = Canvas::new(context.width, context.height);

        let stack = match scene {
            Scene::Theme { renderer, state } => {
                return self.render_theme(renderer, state, canvas, time_ms);
            }
            Scene::Text {
                backdrop,
                text,
                style,
                motion,
            } => {
                let stack = backdrop.layers(UNDERLAY);
                let bitmap = self.text_bitmap(text, style, policy);
                match motion {
                    TextMotion::Scrolling(heads) if !text.is_empty() => {
                        stack.with_layer(Box::new(BitmapLayer::scrolling(bitmap, heads, &context)))
                    }
                    _ => stack.with_layer(Box::new(BitmapLayer::centered(bitmap, &context))),
                }
            }
            Scene::Clock {
                backdrop,
                style,
                format,
                clock: wall,
            } => {
                let text = format_time(wall.now(), format);
                let style = TextStyle {
                    flat: true,
                    ..style.clone()
                };
                let source = self.fonts.resolve(&style.family);
                let bitmap = self
                    .clock_cache
                    .get_or_build(source.as_ref(), &text, &style, policy);
                let (x, y) = clock::clock_origin(
                    context.width,
                    context.height,
                    bitmap.width(),
                    bitmap.height(),
                    style.size,
                );
                backdrop.layers(UNDERLAY).with_layer(Box::new(BitmapLayer {
                    bitmap,
                    xs: vec![x],
                    y,
                }))
            }
            Scene::Video {
                backdrop,
                frame,
                fit,
            } => {
                let stack = backdrop.layers(UNDERLAY);
                match frame {
                    Some(image) => stack.with_layer(Box::new(PictureLayer { image, fit })),
                    None => {
                        log::trace!("no video frame decoded yet");
                        stack
                    }
                }
            }
            Scene::YouTube {
                backdrop,
                count,
                icon_size,
                style,
            } => {
                let text = count.unwrap_or(youtube::PLACEHOLDER);
                let (icon_w, icon_h) = youtube::icon_size(icon_size, context.height);
                let source = self.fonts.resolve(&style.family);
                let mut style = TextStyle {
                    flat: true,
                    ..style.clone()
                };
                style.size = youtube::fit_text_size(source.as_ref(), text, &style, icon_w, context.width);
                let bitmap = self
                    .count_cache
                    .get_or_build(source.as_ref(), text, &style, policy);

                let x0 = youtube::group_origin(context.width, icon_w, bitmap.width());
                let cy = (context.height as f32 / 2.0).round() as i32;
                let icon_cx = x0 + (icon_w as f32 / 2.0).round() as i32;
                let text_y = cy - (bitmap.height() / 2) as i32;
                backdrop
                    .layers(DECORATION)
                    .with_layer(Box::new(youtube::IconLayer {
                        center: (icon_cx, cy),
                        height: icon_h,
                    }))
                    .with_layer(Box::new(BitmapLayer {
                        bitmap,
                        xs: vec![x0 + icon_w as i32 + 6],
                        y: text_y,
                    }))
            }
            Scene::Dashboard { family, clock: wall } => LayerStack::new().with_layer(Box::new(DashboardLayer {
                source: self.fonts.resolve(family),
                date: wall.today(),
                time: wall.now(),
                time_ms,
                policy,
            })),
            Scene::Countdown {
                backdrop,
                icon,
                time,
                style,
                trees,
            } => {
                let stack = backdrop.layers(UNDERLAY).with_layer(Box::new(CountdownLayer {
                    source: self.fonts.resolve(&style.family),
                    icon: icon.to_string(),
                    time: time.to_string(),
                    style: style.clone(),
                    policy,
                }));
                match trees {
                    Some(growth) => stack.with_layer(Box::new(TreeLayer { growth })),
                    None => stack,
                }
            }
        };

        stack.render(&mut canvas, &context);
        Frame::new(self.next_number(), time_ms, canvas)
    }

    fn render_theme(
        &mut self,
        renderer: &dyn ThemeRenderer,
        state: &mut ThemeState,
        mut canvas: Canvas,
        time_ms: f64,
    ) -> Frame {
        let (w, h) = (self.context.width, self.context.height);
        canvas.clear(Color::BLACK);
        match renderer.render(&mut canvas, w, h, state, time_ms) {
            Ok(()) => {
                let frame = Frame::new(self.next_number(), time_ms, canvas);
                self.last_theme_frame = Some(frame.clone());
                frame
            }
            Err(e) => {
                log::warn!("theme {} failed to render: {e:#}", renderer.name());
                let previous = match &self.last_theme_frame {
                    Some(frame) => frame.to_canvas(),
                    None => Frame::blank(&self.context).to_canvas(),
                };
                Frame::new(self.next_number(), time_ms, previous)
            }
        }
    }

    fn next_number(&mut self) -> u64 {
        let n = self.frames;
        self.frames += 1;
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedClock;
    use anyhow::{bail, Result};
    use chrono::NaiveTime;
    use std::cell::Cell;

    fn compositor() -> Compositor {
        Compositor::new(DisplayContext::PANEL, FontBook::new())
    }

    fn lit_columns(frame: &Frame, bg: Color) -> (u32, u32) {
        let mut min = u32::MAX;
        let mut max = 0;
        for y in 0..frame.height {
            for x in 0..frame.width {
                if frame.pixel(x, y) != Some(bg) {
                    min = min.min(x);
                    max = max.max(x);
                }
            }
        }
        (min, max)
    }

    #[test]
    fn static_text_is_reused_from_cache() {
        let mut comp = compositor();
        let style = TextStyle::default();
        for _ in 0..3 {
            comp.render_frame(
                Scene::Text {
                    backdrop: Backdrop::solid(Color::BLACK),
                    text: "HI",
                    style: &style,
                    motion: TextMotion::Static,
                },
                0.0,
            );
        }
        assert_eq!(comp.text_rebuilds(), 1);
    }

    #[test]
    fn scrolling_copies_are_drawn_at_heads() {
        let mut comp = compositor();
        let style = TextStyle {
            size: 8.0,
            ..TextStyle::default()
        };
        let heads = [10, 60, 300];
        let frame = comp.render_frame(
            Scene::Text {
                backdrop: Backdrop::solid(Color::BLACK),
                text: "I",
                style: &style,
                motion: TextMotion::Scrolling(&heads),
            },
            0.0,
        );
        // 'I' crops to 3 columns
        assert_eq!(lit_columns(&frame, Color::BLACK), (10, 62));
    }

    #[test]
    fn frame_sits_under_text_and_over_background() {
        let mut comp = compositor();
        let style = TextStyle::default();
        let backdrop = Backdrop {
            frame: FrameStyle::Border,
            frame_color: Color::RED,
            ..Backdrop::solid(Color::BLACK)
        };
        let frame = comp.render_frame(
            Scene::Text {
                backdrop,
                text: "",
                style: &style,
                motion: TextMotion::Static,
            },
            0.0,
        );
        assert_eq!(frame.pixel(0, 0), Some(Color::RED));
        assert_eq!(frame.pixel(5, 5), Some(Color::BLACK));
    }

    #[test]
    fn clock_reads_wall_clock_each_render() {
        let mut comp = compositor();
        let style = TextStyle::default();
        let morning = FixedClock::at(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let evening = FixedClock::at(NaiveTime::from_hms_opt(20, 0, 0).unwrap());

        let a = comp.render_frame(
            Scene::Clock {
                backdrop: Backdrop::solid(Color::BLACK),
                style: &style,
                format: TimeFormat::H24,
                clock: &morning,
            },
            0.0,
        );
        let b = comp.render_frame(
            Scene::Clock {
                backdrop: Backdrop::solid(Color::BLACK),
                style: &style,
                format: TimeFormat::H24,
                clock: &evening,
            },
            100.0,
        );
        assert_ne!(a.pixels, b.pixels);
    }

    #[test]
    fn video_without_frame_shows_backdrop() {
        let mut comp = compositor();
        let frame = comp.render_frame(
            Scene::Video {
                backdrop: Backdrop::solid(Color::rgb(0, 0, 40)),
                frame: None,
                fit: ImageFit::Fit,
            },
            0.0,
        );
        assert!(frame.pixels().iter().all(|&p| p == Color::rgb(0, 0, 40)));
    }

    struct Flaky {
        fail_after: Cell<u32>,
    }

    impl ThemeRenderer for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fps(&self) -> u32 {
            10
        }

        fn init(&self) -> ThemeState {
            serde_json::json!({})
        }

        fn render(&self, canvas: &mut Canvas, _w: u32, _h: u32, _s: &mut ThemeState, ts: f64) -> Result<()> {
            let left = self.fail_after.get();
            if left == 0 {
                canvas.clear(Color::RED);
                bail!("boom at {ts}");
            }
            self.fail_after.set(left - 1);
            canvas.clear(Color::WHITE);
            Ok(())
        }
    }

    #[test]
    fn theme_error_keeps_previous_frame() {
        let mut comp = compositor();
        let theme = Flaky {
            fail_after: Cell::new(1),
        };
        let mut state = theme.init();
        let good = comp.render_frame(
            Scene::Theme {
                renderer: &theme,
                state: &mut state,
            },
            0.0,
        );
        let after = comp.render_frame(
            Scene::Theme {
                renderer: &theme,
                state: &mut state,
            },
            100.0,
        );
        assert_eq!(good.pixels, after.pixels);
        assert_eq!(after.time_ms, 100.0);
    }

    #[test]
    fn theme_error_without_history_is_blank() {
        let mut comp = compositor();
        let theme = Flaky {
            fail_after: Cell::new(0),
        };
        let mut state = theme.init();
        let frame = comp.render_frame(
            Scene::Theme {
                renderer: &theme,
                state: &mut state,
            },
            0.0,
        );
        assert!(frame.pixels().iter().all(|&p| p == Color::BLACK));
    }

    #[test]
    fn youtube_counter_centres_icon_and_text() {
        let mut comp = compositor();
        let style = TextStyle::default();
        let frame = comp.render_frame(
            Scene::YouTube {
                backdrop: Backdrop::solid(Color::BLACK),
                count: Some("42"),
                icon_size: 25,
                style: &style,
            },
            0.0,
        );
        let (left, right) = lit_columns(&frame, Color::BLACK);
        let slack = (left as i32 - (127 - right as i32)).abs();
        assert!(slack <= 2, "group off centre: {left}..{right}");
        assert_eq!(frame.pixel(left + 5, 32).map(|p| p.r), Some(255));
    }

    #[test]
    fn dashboard_reads_date_and_time() {
        let mut comp = compositor();
        let date = chrono::NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let monday = FixedClock::new(date, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let tuesday = FixedClock::new(date.succ_opt().unwrap(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let a = comp.render_frame(Scene::Dashboard { family: "pixel", clock: &monday }, 0.0);
        let b = comp.render_frame(Scene::Dashboard { family: "pixel", clock: &tuesday }, 0.0);
        assert_ne!(a.pixels, b.pixels);
        assert_eq!(a.pixel(0, 0), Some(Color::WHITE));
    }

    #[test]
    fn countdown_trees_draw_over_the_backdrop() {
        let mut comp = compositor();
        let style = TextStyle::default();
        let scene = |trees| Scene::Countdown {
            backdrop: Backdrop::solid(Color::BLACK),
            icon: "",
            time: "25:00",
            style: &style,
            trees,
        };
        let bare = comp.render_frame(scene(None), 0.0);
        let forest = comp.render_frame(scene(Some(1.0)), 0.0);
        let green = |f: &Frame| (0..128).filter(|&x| f.pixel(x, 61).map_or(false, |p| p.g > 150 && p.r == 0)).count();
        assert_eq!(green(&bare), 0);
        assert!(green(&forest) >= 9);
    }

    #[test]
    fn frame_numbers_increase() {
        let mut comp = compositor();
        let a = comp.render_frame(
            Scene::Video {
                backdrop: Backdrop::solid(Color::BLACK),
                frame: None,
                fit: ImageFit::Fill,
            },
            0.0,
        );
        let b = comp.render_device_frame(
            Scene::Video {
                backdrop: Backdrop::solid(Color::BLACK),
                frame: None,
                fit: ImageFit::Fill,
            },
            16.0,
        );
        assert!(b.number > a.number);
    }
}
