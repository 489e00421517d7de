mod common;

use chrono::{Local, NaiveTime, Timelike};
use common::{dispatcher, RecordingLink};
use matrix_composer::compositor::{format_time, youtube, Backdrop, BgMode, Compositor, Scene, TextMotion, TimeFormat};
use matrix_composer::config::SessionConfig;
use matrix_composer::core::{FixedClock, LocalClock, WallClock};
use matrix_composer::glyph::{FontBook, TextStyle};
use matrix_composer::scheduler::{ContentMode, PreviewController, SessionState, UploadSlot};
use matrix_composer::media::VideoClip;
use matrix_composer::theme::DeclarativeTheme;
use matrix_composer::{Canvas, Color, DisplayContext, Frame};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

const IDLE: Duration = Duration::from_secs(2);

fn noon() -> Box<dyn WallClock> {
    Box::new(FixedClock::at(NaiveTime::from_hms_opt(12, 0, 0).unwrap()))
}

fn controller(config: SessionConfig, link: Option<Arc<RecordingLink>>) -> PreviewController {
    let session = SessionState::new(config).with_wall_clock(noon());
    PreviewController::new(session, FontBook::new(), link.map(dispatcher))
}

/// Tick every `step` ms over `0..=until`, letting each upload finish
fn run(ctl: &mut PreviewController, step: f64, until: f64) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut now = 0.0;
    while now <= until {
        if let Some(frame) = ctl.tick(now) {
            frames.push(frame);
        }
        if let Some(d) = ctl.dispatcher() {
            assert!(d.wait_idle(IDLE));
        }
        now += step;
    }
    frames
}

fn lit_box(frame: &Frame, bg: Color) -> (u32, u32, u32, u32) {
    let (mut x0, mut y0, mut x1, mut y1) = (u32::MAX, u32::MAX, 0, 0);
    for y in 0..frame.height {
        for x in 0..frame.width {
            if frame.pixel(x, y) != Some(bg) {
                x0 = x0.min(x);
                y0 = y0.min(y);
                x1 = x1.max(x);
                y1 = y1.max(y);
            }
        }
    }
    (x0, y0, x1, y1)
}

// ============================================================================
// Still text
// ============================================================================

#[test]
fn test_still_hello_is_centred_white_on_black() {
    let mut comp = Compositor::new(DisplayContext::PANEL, FontBook::new());
    let style = TextStyle {
        size: 20.0,
        ..TextStyle::default()
    };
    let render = |comp: &mut Compositor| {
        comp.render_frame(
            Scene::Text {
                backdrop: Backdrop::solid(Color::BLACK),
                text: "HELLO",
                style: &style,
                motion: TextMotion::Static,
            },
            0.0,
        )
    };
    let frame = render(&mut comp);
    assert_eq!((frame.width, frame.height), (128, 64));
    assert!(frame
        .pixels()
        .iter()
        .all(|&p| p == Color::BLACK || p == Color::WHITE));

    let (x0, y0, x1, y1) = lit_box(&frame, Color::BLACK);
    let (left, right) = (x0 as i32, 127 - x1 as i32);
    let (top, bottom) = (y0 as i32, 63 - y1 as i32);
    assert!((left - right).abs() <= 1, "horizontal {left} vs {right}");
    // the text line sits a couple of pixels low
    assert!((top - bottom).abs() <= 6, "vertical {top} vs {bottom}");

    let again = render(&mut comp);
    assert_eq!(frame.pixels, again.pixels);
    assert_eq!(comp.text_rebuilds(), 1);
}

#[test]
fn test_wide_still_text_shows_its_middle() {
    let mut comp = Compositor::new(DisplayContext::PANEL, FontBook::new());
    let style = TextStyle::default();
    let frame = comp.render_frame(
        Scene::Text {
            backdrop: Backdrop::solid(Color::BLACK),
            text: "WWWWWWWWWWWWWWWWWWWW",
            style: &style,
            motion: TextMotion::Static,
        },
        0.0,
    );
    let (x0, _, x1, _) = lit_box(&frame, Color::BLACK);
    // cropped on both sides, not pinned to the left edge
    assert!(x0 <= 6 && x1 >= 121, "{x0}..{x1}");
}

// ============================================================================
// Clock
// ============================================================================

#[test]
fn test_clock_string_follows_system_time() {
    let shown = format_time(LocalClock.now(), TimeFormat::H24);
    let bytes = shown.as_bytes();
    assert_eq!(bytes.len(), 8, "{shown}");
    for (i, b) in bytes.iter().enumerate() {
        if i == 2 || i == 5 {
            assert_eq!(*b, b':');
        } else {
            assert!(b.is_ascii_digit(), "{shown}");
        }
    }

    let now = Local::now().time();
    let shown_secs = NaiveTime::parse_from_str(&shown, "%H:%M:%S")
        .unwrap()
        .num_seconds_from_midnight() as i64;
    let diff = (now.num_seconds_from_midnight() as i64 - shown_secs).rem_euclid(86_400);
    assert!(diff <= 1 || diff == 86_399, "{shown} vs {now}");
}

#[test]
fn test_clock_uploads_once_a_second_at_any_preview_rate() {
    for step in [16.0, 50.0, 250.0] {
        let link = Arc::new(RecordingLink::default());
        let mut ctl = controller(SessionConfig::default(), Some(link.clone()));
        ctl.activate(ContentMode::Clock).unwrap();
        let frames = run(&mut ctl, step, 4999.0);
        assert!(!frames.is_empty());

        let uploads = link.uploads_named("clock.rgb565");
        assert!(uploads <= 5, "{uploads} uploads at {step} ms ticks");
        assert!(uploads >= 4, "{uploads} uploads at {step} ms ticks");
        let post = &link.posts()[0];
        assert_eq!(post.path, "/upload");
        assert!(post.contains("name=\"bgMode\"\r\n\r\ncolor\r\n"));
    }
}

// ============================================================================
// Upload pipeline
// ============================================================================

#[test]
fn test_busy_dispatcher_skips_instead_of_queueing() {
    let link = Arc::new(RecordingLink::with_latency(Duration::from_millis(150)));
    let d = dispatcher(link.clone());
    assert!(d.try_dispatch("first", |c| c.upload_bg(&[1, 0, 1, 0, 0, 0])));
    assert!(!d.try_dispatch("second", |c| c.upload_bg(&[1, 0, 1, 0, 0, 0])));
    assert!(d.wait_idle(IDLE));
    assert_eq!(link.posts().len(), 1);
    assert!(d.try_dispatch("third", |c| c.upload_bg(&[1, 0, 1, 0, 0, 0])));
    assert!(d.wait_idle(IDLE));
    assert_eq!(link.posts().len(), 2);
}

#[test]
fn test_slow_device_drops_video_frames() {
    let mut config = SessionConfig::default();
    config.video.fps = 30;
    let link = Arc::new(RecordingLink::with_latency(Duration::from_millis(100)));
    let mut ctl = controller(config, Some(link.clone()));
    let mut still = Canvas::new(8, 8);
    still.clear(Color::RED);
    ctl.session_mut().video = Some(VideoClip::from_frames(vec![(still, 100.0)]).unwrap());
    ctl.activate(ContentMode::Video).unwrap();

    // real-time-ish ticks so requests overlap
    for i in 0..30 {
        ctl.tick(i as f64 * 34.0);
        std::thread::sleep(Duration::from_millis(10));
    }
    let sent = ctl.active_loop().unwrap().uploads_sent();
    ctl.deactivate();
    assert!(ctl.dispatcher().unwrap().wait_idle(IDLE));
    assert!(sent >= 1);
    assert!(sent < 30, "every frame was sent");
    assert!(link.uploads_named("video.rgb565") as u64 <= sent);
}

#[test]
fn test_mode_switch_stops_old_uploads() {
    let link = Arc::new(RecordingLink::default());
    let mut ctl = controller(SessionConfig::default(), Some(link.clone()));
    ctl.activate(ContentMode::Clock).unwrap();
    run(&mut ctl, 100.0, 0.0);
    assert_eq!(link.uploads_named("clock.rgb565"), 1);

    ctl.activate(ContentMode::Text).unwrap();
    run(&mut ctl, 100.0, 3000.0);
    assert_eq!(link.uploads_named("clock.rgb565"), 1);
}

#[test]
fn test_stale_slot_never_sends() {
    let link = Arc::new(RecordingLink::default());
    let generation = Arc::new(AtomicU64::new(7));
    let slot = UploadSlot::new(dispatcher(link.clone()), Arc::clone(&generation));
    assert!(slot.is_current());
    generation.fetch_add(1, std::sync::atomic::Ordering::AcqRel);
    assert!(!slot.send("stale", |c| c.upload_bg(&[1, 0, 1, 0, 0, 0])));
    std::thread::sleep(Duration::from_millis(20));
    assert!(link.posts().is_empty());
}

// ============================================================================
// Text apply
// ============================================================================

#[test]
fn test_apply_scrolling_text_over_picture() {
    let mut config = SessionConfig::default();
    config.text.text = "HI".to_string();
    config.text.animate = true;
    config.text.speed = 100;
    config.background.mode = BgMode::Image;
    let link = Arc::new(RecordingLink::default());
    let mut ctl = controller(config, Some(link.clone()));
    ctl.session_mut().background = Some(Canvas::new(4, 4));

    ctl.apply_text().unwrap();
    let posts = link.posts();
    let paths: Vec<&str> = posts.iter().map(|p| p.path.as_str()).collect();
    assert_eq!(paths, ["/upload", "/upload_bg", "/upload"]);
    assert_eq!(posts[1].filename().as_deref(), Some("bg.rgb565"));

    let overlay = &posts[2];
    assert!(overlay.contains("name=\"animate\"\r\n\r\n1\r\n"));
    assert!(overlay.contains("name=\"dir\"\r\n\r\nleft\r\n"));
    assert!(overlay.contains("name=\"speed\"\r\n\r\n2\r\n"));
    assert!(overlay.contains("name=\"bgMode\"\r\n\r\nimage\r\n"));
    assert!(overlay.contains("name=\"brightness\"\r\n\r\n80\r\n"));
}

#[test]
fn test_apply_still_text_is_one_upload() {
    let mut config = SessionConfig::default();
    config.text.text = "HI".to_string();
    let link = Arc::new(RecordingLink::default());
    let mut ctl = controller(config, Some(link.clone()));
    ctl.apply_text().unwrap();
    let posts = link.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].filename().as_deref(), Some("img.rgb565"));
    assert!(posts[0].contains("name=\"animate\"\r\n\r\n0\r\n"));
}

// ============================================================================
// Themes and counter
// ============================================================================

const SLOW_RAINBOW: &str = r#"{"name":"slow","fps":4,"elements":[{"type":"rainbow","period_ms":1000}]}"#;

#[test]
fn test_theme_runs_at_its_own_rate_and_streams_once_a_second() {
    let mut config = SessionConfig::default();
    config.theme.stream = true;
    let link = Arc::new(RecordingLink::default());
    let mut ctl = controller(config, Some(link.clone()));
    ctl.session_mut().theme = Some(Box::new(DeclarativeTheme::from_json(SLOW_RAINBOW).unwrap()));
    ctl.activate(ContentMode::Theme).unwrap();

    let frames = run(&mut ctl, 10.0, 2000.0);
    // 0, 250, ..., 2000
    assert_eq!(frames.len(), 9);
    assert_eq!(link.uploads_named("theme.rgb565"), 3);
    let post = &link.posts()[0];
    assert!(post.contains("name=\"brightness\"\r\n\r\n80\r\n"));
}

#[test]
fn test_theme_preview_without_stream_stays_local() {
    let link = Arc::new(RecordingLink::default());
    let mut ctl = controller(SessionConfig::default(), Some(link.clone()));
    ctl.session_mut().theme = Some(Box::new(DeclarativeTheme::from_json(SLOW_RAINBOW).unwrap()));
    ctl.activate(ContentMode::Theme).unwrap();
    assert_eq!(run(&mut ctl, 10.0, 990.0).len(), 4);
    assert!(link.posts().is_empty());
}

#[test]
fn test_counts_shrink_to_fit_the_panel() {
    let mut comp = Compositor::new(DisplayContext::PANEL, FontBook::new());
    let style = TextStyle::default();
    let mut render = |count: &str| {
        comp.render_frame(
            Scene::YouTube {
                backdrop: Backdrop::solid(Color::BLACK),
                count: Some(count),
                icon_size: 25,
                style: &style,
            },
            0.0,
        )
    };
    for count in ["7", "12.3K", "123456", "1,234,567"] {
        let (x0, _, x1, _) = lit_box(&render(count), Color::BLACK);
        // icon, gap and text stay inside the 4px margins
        assert!(x0 >= 4 && x1 <= 123, "{count}: {x0}..{x1}");
    }

    // at the minimum size a very long count may run off the panel
    let long = "1,234,567,890,123";
    let fonts = FontBook::new();
    let count_style = TextStyle { flat: true, ..TextStyle::default() };
    let (icon_w, _) = youtube::icon_size(25, 64);
    let size = youtube::fit_text_size(fonts.resolve("pixel").as_ref(), long, &count_style, icon_w, 128);
    assert_eq!(size, youtube::MIN_TEXT_SIZE);
    assert!(render(long).pixels().iter().any(|p| p.r == 255 && p.g == 0));
}

#[test]
fn test_polled_count_is_shown_and_uploaded() {
    let mut config = SessionConfig::default();
    config.youtube.channel = Some("UC42".to_string());
    let link = Arc::new(RecordingLink::default());
    link.reply("/yt_stats", r#"{"subscriberCount":1234}"#);
    let mut ctl = controller(config, Some(link.clone()));
    ctl.activate(ContentMode::YouTube).unwrap();

    run(&mut ctl, 16.0, 100.0);
    assert_eq!(ctl.session().youtube_count.as_deref(), Some("1234"));
    assert_eq!(link.uploads_named("yt.rgb565"), 1);
    let gets = link.gets.lock().unwrap();
    assert_eq!(gets[0].0, "/yt_stats");
    assert_eq!(gets[0].1, vec![("id".to_string(), "UC42".to_string())]);
}

// ============================================================================
// Dashboard and study timer
// ============================================================================

#[test]
fn test_dashboard_streams_once_a_second() {
    let link = Arc::new(RecordingLink::default());
    let mut ctl = controller(SessionConfig::default(), Some(link.clone()));
    ctl.activate(ContentMode::Dashboard).unwrap();
    let frames = run(&mut ctl, 16.0, 4999.0);

    assert_eq!(frames.len(), 5);
    assert_eq!(link.uploads_named("template.rgb565"), 5);
    let post = &link.posts()[0];
    assert!(post.contains("name=\"bgMode\"\r\n\r\ncolor\r\n"));
    assert!(post.contains("name=\"bg\"\r\n\r\n#000000\r\n"));
    // white outline on the outermost ring
    assert_eq!(frames[0].pixel(0, 0), Some(Color::WHITE));
    assert_eq!(frames[0].pixel(127, 63), Some(Color::WHITE));
}

#[test]
fn test_timer_uploads_when_the_seconds_change() {
    let mut config = SessionConfig::default();
    config.timer.study_minutes = 1;
    let link = Arc::new(RecordingLink::default());
    let mut ctl = controller(config, Some(link.clone()));
    ctl.activate(ContentMode::Timer).unwrap();

    // 60 at 0 ms, then 59, 58 and 57 as each second passes
    run(&mut ctl, 100.0, 3000.0);
    assert_eq!(link.uploads_named("timer.rgb565"), 4);
}

#[test]
fn test_timer_shows_the_break_icon_after_study() {
    let mut config = SessionConfig::default();
    config.timer.study_minutes = 1;
    config.timer.break_icon = "B".to_string();
    config.timer.size = 16.0;
    let mut ctl = controller(config, None);
    ctl.activate(ContentMode::Timer).unwrap();

    let frames = run(&mut ctl, 200.0, 61_000.0);
    let (first, _, _, _) = lit_box(&frames[0], Color::BLACK);
    let (last, _, _, _) = lit_box(frames.last().unwrap(), Color::BLACK);
    // the icon widens the centred group on both sides
    assert!(last + 4 < first, "{last} vs {first}");
}
