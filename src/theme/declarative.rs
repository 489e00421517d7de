use super::{clamp_fps, ThemeRenderer, ThemeState};
use crate::compositor::clock::{format_time_with, TimeFormat};
use crate::core::{hsv_to_rgb, Canvas, Color, DrawOp, LocalClock, WallClock};
use crate::glyph::{build_bitmap, AlphaPolicy, Fill, GlyphSource, PixelFont, TextStyle};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::f64::consts::TAU;
use std::path::Path;
use std::rc::Rc;

/// Font sizes the clock element offers
const FONT_SIZES: [u32; 4] = [15, 20, 35, 60];
const DEFAULT_FONT_SIZE: u32 = 20;
/// Coordinates and lengths further out than this are rejected at load
const GEOMETRY_LIMIT: i64 = 4096;
/// Largest text element, two panels tall
const MAX_TEXT_SIZE: u32 = 128;

/// Knobs a theme exposes; elements reference colours as `$textColor` / `$bgColor`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeSettings {
    pub text_color: Color,
    pub bg_color: Color,
    pub time_format: TimeFormat,
    pub show_seconds: bool,
    pub pulse_animation: bool,
    pub font_size: u32,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            text_color: Color::WHITE,
            bg_color: Color::BLACK,
            time_format: TimeFormat::H24,
            show_seconds: true,
            pulse_animation: true,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl ThemeSettings {
    fn color(&self, reference: &str) -> Result<Color> {
        match reference.strip_prefix('$') {
            Some("textColor") => Ok(self.text_color),
            Some("bgColor") => Ok(self.bg_color),
            Some(other) => bail!("unknown colour setting ${other}"),
            None => Color::from_hex(reference),
        }
    }
}

/// One drawing step, evaluated in order every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Fill {
        color: String,
    },
    /// Full-panel hue cycle
    Rainbow {
        #[serde(default = "default_period")]
        period_ms: f64,
        #[serde(default = "one")]
        saturation: f32,
        #[serde(default = "one")]
        value: f32,
    },
    Rect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: String,
        #[serde(default = "yes")]
        filled: bool,
    },
    Circle {
        cx: i32,
        cy: i32,
        radius: u32,
        color: String,
        #[serde(default = "yes")]
        filled: bool,
    },
    Line {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: String,
    },
    /// Filled circle whose radius breathes while `pulseAnimation` is on
    Pulse {
        cx: i32,
        cy: i32,
        radius: u32,
        #[serde(default)]
        amplitude: u32,
        #[serde(default = "default_period")]
        period_ms: f64,
        color: String,
    },
    /// Text line; `x` omitted centres it horizontally
    Text {
        text: String,
        #[serde(default)]
        x: Option<i32>,
        y: i32,
        #[serde(default)]
        size: Option<u32>,
        color: String,
    },
    /// Local time in the theme's format; `y` omitted centres it vertically
    Clock {
        #[serde(default)]
        y: Option<i32>,
        color: String,
    },
}

fn default_period() -> f64 {
    2000.0
}

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

impl Element {
    fn color_refs(&self) -> Vec<&str> {
        match self {
            Element::Rainbow { .. } => Vec::new(),
            Element::Fill { color }
            | Element::Rect { color, .. }
            | Element::Circle { color, .. }
            | Element::Line { color, .. }
            | Element::Pulse { color, .. }
            | Element::Text { color, .. }
            | Element::Clock { color, .. } => vec![color.as_str()],
        }
    }

    fn check_geometry(&self) -> Result<()> {
        let (coords, lengths): (Vec<i32>, Vec<u32>) = match self {
            Element::Fill { .. } | Element::Rainbow { .. } => (vec![], vec![]),
            Element::Rect { x, y, width, height, .. } => (vec![*x, *y], vec![*width, *height]),
            Element::Circle { cx, cy, radius, .. } => (vec![*cx, *cy], vec![*radius]),
            Element::Line { x1, y1, x2, y2, .. } => (vec![*x1, *y1, *x2, *y2], vec![]),
            Element::Pulse { cx, cy, radius, amplitude, .. } => {
                (vec![*cx, *cy], vec![radius.saturating_add(*amplitude)])
            }
            Element::Text { x, y, size, .. } => {
                if size.is_some_and(|s| s > MAX_TEXT_SIZE) {
                    bail!("text size above {MAX_TEXT_SIZE}");
                }
                (x.iter().chain([y]).copied().collect(), vec![])
            }
            Element::Clock { y, .. } => (y.iter().copied().collect(), vec![]),
        };
        if let Some(v) = coords.iter().find(|v| (**v as i64).abs() > GEOMETRY_LIMIT) {
            bail!("coordinate {v} outside ±{GEOMETRY_LIMIT}");
        }
        if let Some(v) = lengths.iter().find(|v| **v as i64 > GEOMETRY_LIMIT) {
            bail!("size {v} above {GEOMETRY_LIMIT}");
        }
        Ok(())
    }
}

/// On-disk theme document
#[derive(Debug, Deserialize)]
struct ThemeFile {
    name: String,
    #[serde(default)]
    fps: Option<u32>,
    #[serde(default)]
    settings: ThemeSettings,
    elements: Vec<Element>,
}

/// Theme described as data: settings plus an ordered element list
pub struct DeclarativeTheme {
    name: String,
    fps: u32,
    settings: ThemeSettings,
    elements: Vec<Element>,
    glyphs: Rc<dyn GlyphSource>,
    clock: Box<dyn WallClock>,
}

impl std::fmt::Debug for DeclarativeTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeclarativeTheme")
            .field("name", &self.name)
            .field("fps", &self.fps)
            .field("elements", &self.elements.len())
            .finish()
    }
}

impl DeclarativeTheme {
    /// Parse and validate a theme document
    pub fn from_json(text: &str) -> Result<Self> {
        let file: ThemeFile = serde_json::from_str(text).context("malformed theme")?;
        if file.elements.is_empty() {
            bail!("theme {:?} has no elements", file.name);
        }

        let mut settings = file.settings;
        if !FONT_SIZES.contains(&settings.font_size) {
            log::warn!(
                "theme font size {} not one of {FONT_SIZES:?}, using {DEFAULT_FONT_SIZE}",
                settings.font_size
            );
            settings.font_size = DEFAULT_FONT_SIZE;
        }
        for (i, element) in file.elements.iter().enumerate() {
            element
                .check_geometry()
                .with_context(|| format!("element {i} of theme {:?}", file.name))?;
            for reference in element.color_refs() {
                settings
                    .color(reference)
                    .with_context(|| format!("element {i} of theme {:?}", file.name))?;
            }
        }

        let fps = clamp_fps(file.fps);
        log::info!("loaded theme {:?} at {fps} fps", file.name);
        Ok(Self {
            name: file.name,
            fps,
            settings,
            elements: file.elements,
            glyphs: Rc::new(PixelFont),
            clock: Box::new(LocalClock),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read theme {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("failed to load theme {}", path.display()))
    }

    pub fn with_glyphs(mut self, glyphs: Rc<dyn GlyphSource>) -> Self {
        self.glyphs = glyphs;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn WallClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &ThemeSettings {
        &self.settings
    }

    /// Draw a text line; a missing coordinate centres it on that axis
    fn draw_text(
        &self,
        canvas: &mut Canvas,
        text: &str,
        (x, y): (Option<i32>, Option<i32>),
        size: u32,
        color: Color,
    ) {
        let style = TextStyle {
            family: self.glyphs.family().to_string(),
            size: size as f32,
            gap: 1,
            fill: Fill::Solid(color),
            thickness: 0,
            flat: true,
        };
        let bitmap = build_bitmap(self.glyphs.as_ref(), text, &style, AlphaPolicy::Preview);
        let x = x.unwrap_or_else(|| (canvas.width() as i32 - bitmap.width() as i32).div_euclid(2));
        let y = y.unwrap_or_else(|| (canvas.height() as i32 - bitmap.height() as i32).div_euclid(2));
        canvas.draw_canvas(bitmap.canvas(), x, y);
    }

    fn draw_element(
        &self,
        canvas: &mut Canvas,
        element: &Element,
        settings: &ThemeSettings,
        timestamp_ms: f64,
    ) -> Result<()> {
        match element {
            Element::Fill { color } => canvas.clear(settings.color(color)?),
            Element::Rainbow {
                period_ms,
                saturation,
                value,
            } => {
                let hue = (timestamp_ms / period_ms.max(1.0)).rem_euclid(1.0) as f32;
                canvas.clear(hsv_to_rgb(hue, *saturation, *value));
            }
            Element::Rect {
                x,
                y,
                width,
                height,
                color,
                filled,
            } => {
                let (x, y, width, height, color) = (*x, *y, *width, *height, settings.color(color)?);
                canvas.apply(&if *filled {
                    DrawOp::Rect { x, y, width, height, color }
                } else {
                    DrawOp::StrokeRect { x, y, width, height, color }
                });
            }
            Element::Circle {
                cx,
                cy,
                radius,
                color,
                filled,
            } => {
                let (cx, cy, radius, color) = (*cx, *cy, *radius, settings.color(color)?);
                canvas.apply(&if *filled {
                    DrawOp::FilledCircle { cx, cy, radius, color }
                } else {
                    DrawOp::Circle { cx, cy, radius, color }
                });
            }
            Element::Line { x1, y1, x2, y2, color } => canvas.apply(&DrawOp::Line {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
                color: settings.color(color)?,
            }),
            Element::Pulse {
                cx,
                cy,
                radius,
                amplitude,
                period_ms,
                color,
            } => {
                let swing = if settings.pulse_animation {
                    let phase = TAU * timestamp_ms / period_ms.max(1.0);
                    (*amplitude as f64 * (0.5 + 0.5 * phase.sin())).round() as u32
                } else {
                    0
                };
                canvas.apply(&DrawOp::FilledCircle {
                    cx: *cx,
                    cy: *cy,
                    radius: radius.saturating_add(swing),
                    color: settings.color(color)?,
                });
            }
            Element::Text {
                text,
                x,
                y,
                size,
                color,
            } => {
                let size = size.unwrap_or(settings.font_size);
                self.draw_text(canvas, text, (*x, Some(*y)), size, settings.color(color)?);
            }
            Element::Clock { y, color } => {
                let text = format_time_with(
                    self.clock.now(),
                    settings.time_format,
                    settings.show_seconds,
                );
                let color = settings.color(color)?;
                self.draw_text(canvas, &text, (None, *y), settings.font_size, color);
            }
        }
        Ok(())
    }
}

impl ThemeRenderer for DeclarativeTheme {
    fn name(&self) -> &str {
        &self.name
    }

    fn fps(&self) -> u32 {
        self.fps
    }

    fn init(&self) -> ThemeState {
        json!({
            "frame": 0,
            "settings": self.settings,
        })
    }

    fn render(
        &self,
        canvas: &mut Canvas,
        width: u32,
        height: u32,
        state: &mut ThemeState,
        timestamp_ms: f64,
    ) -> Result<()> {
        if canvas.dimensions() != (width, height) {
            bail!("canvas is {:?}, theme asked for {width}x{height}", canvas.dimensions());
        }
        let mut settings = match state.get("settings") {
            Some(value) => ThemeSettings::deserialize(value).context("bad theme settings in state")?,
            None => self.settings.clone(),
        };
        if !FONT_SIZES.contains(&settings.font_size) {
            settings.font_size = DEFAULT_FONT_SIZE;
        }
        for element in &self.elements {
            self.draw_element(canvas, element, &settings, timestamp_ms)?;
        }

        let frame = state.get("frame").and_then(|f| f.as_u64()).unwrap_or(0);
        state
            .as_object_mut()
            .ok_or_else(|| anyhow!("theme state is not an object"))?
            .insert("frame".into(), json!(frame + 1));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedClock;
    use chrono::NaiveTime;

    const CLOCK_THEME: &str = r##"{
        "name": "Digital",
        "fps": 5,
        "settings": { "textColor": "#00ff90", "fontSize": 15 },
        "elements": [
            { "type": "fill", "color": "$bgColor" },
            { "type": "clock", "color": "$textColor" }
        ]
    }"##;

    fn fixed(theme: DeclarativeTheme) -> DeclarativeTheme {
        theme.with_clock(Box::new(FixedClock::at(NaiveTime::from_hms_opt(10, 20, 30).unwrap())))
    }

    #[test]
    fn loads_settings_and_fps() {
        let theme = DeclarativeTheme::from_json(CLOCK_THEME).unwrap();
        assert_eq!(theme.name(), "Digital");
        assert_eq!(theme.fps(), 5);
        assert_eq!(theme.settings().text_color, Color::rgb(0, 255, 0x90));
        assert_eq!(theme.settings().bg_color, Color::BLACK);
    }

    #[test]
    fn fps_defaults_and_clamps() {
        let no_fps = r##"{"name":"x","elements":[{"type":"fill","color":"#000"}]}"##;
        assert_eq!(DeclarativeTheme::from_json(no_fps).unwrap().fps(), 1);
        let fast = r##"{"name":"x","fps":120,"elements":[{"type":"fill","color":"#000"}]}"##;
        assert_eq!(DeclarativeTheme::from_json(fast).unwrap().fps(), 30);
    }

    #[test]
    fn odd_font_size_falls_back() {
        let text = r##"{"name":"x","settings":{"fontSize":17},"elements":[{"type":"fill","color":"#000"}]}"##;
        assert_eq!(DeclarativeTheme::from_json(text).unwrap().settings().font_size, 20);
    }

    #[test]
    fn malformed_themes_fail_to_load() {
        assert!(DeclarativeTheme::from_json("not json").is_err());
        assert!(DeclarativeTheme::from_json(r#"{"name":"x","elements":[]}"#).is_err());
        let bad_colour = r#"{"name":"x","elements":[{"type":"fill","color":"$accent"}]}"#;
        assert!(DeclarativeTheme::from_json(bad_colour).is_err());
        let bad_kind = r#"{"name":"x","elements":[{"type":"sparkle"}]}"#;
        assert!(DeclarativeTheme::from_json(bad_kind).is_err());
    }

    #[test]
    fn renders_clock_and_counts_frames() {
        let theme = fixed(DeclarativeTheme::from_json(CLOCK_THEME).unwrap());
        let mut state = theme.init();
        let mut canvas = Canvas::new(128, 64);
        theme.render(&mut canvas, 128, 64, &mut state, 0.0).unwrap();
        theme.render(&mut canvas, 128, 64, &mut state, 200.0).unwrap();

        assert_eq!(state["frame"], 2);
        let lit = canvas
            .pixels()
            .iter()
            .filter(|p| p.g == 255 && p.r == 0)
            .count();
        assert!(lit > 0);
        assert_eq!(canvas.get(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn state_settings_override_loaded_ones() {
        let theme = fixed(DeclarativeTheme::from_json(CLOCK_THEME).unwrap());
        let mut state = theme.init();
        state["settings"]["bgColor"] = json!("#ff0000");
        let mut canvas = Canvas::new(128, 64);
        theme.render(&mut canvas, 128, 64, &mut state, 0.0).unwrap();
        assert_eq!(canvas.get(0, 0), Some(Color::RED));
    }

    #[test]
    fn corrupted_state_is_a_render_error() {
        let theme = fixed(DeclarativeTheme::from_json(CLOCK_THEME).unwrap());
        let mut state = theme.init();
        state["settings"]["textColor"] = json!("nope");
        let mut canvas = Canvas::new(128, 64);
        assert!(theme.render(&mut canvas, 128, 64, &mut state, 0.0).is_err());
    }

    #[test]
    fn pulse_breathes_only_when_enabled() {
        let text = r##"{"name":"p","elements":[
            {"type":"fill","color":"#000000"},
            {"type":"pulse","cx":10,"cy":10,"radius":2,"amplitude":4,"period_ms":1000,"color":"#ffffff"}
        ]}"##;
        let theme = DeclarativeTheme::from_json(text).unwrap();
        let mut state = theme.init();
        let mut canvas = Canvas::new(32, 32);
        // sin peaks a quarter period in
        theme.render(&mut canvas, 32, 32, &mut state, 250.0).unwrap();
        assert_eq!(canvas.get(15, 10), Some(Color::WHITE));

        state["settings"]["pulseAnimation"] = json!(false);
        theme.render(&mut canvas, 32, 32, &mut state, 250.0).unwrap();
        assert_eq!(canvas.get(15, 10), Some(Color::BLACK));
    }

    #[test]
    fn rainbow_cycles_hue() {
        let text = r#"{"name":"r","elements":[{"type":"rainbow","period_ms":1000}]}"#;
        let theme = DeclarativeTheme::from_json(text).unwrap();
        let mut state = theme.init();
        let mut canvas = Canvas::new(4, 4);
        theme.render(&mut canvas, 4, 4, &mut state, 0.0).unwrap();
        assert_eq!(canvas.get(0, 0), Some(Color::RED));
        theme.render(&mut canvas, 4, 4, &mut state, 1000.0 / 3.0).unwrap();
        assert_eq!(canvas.get(0, 0).map(|c| c.g), Some(255));
    }

    #[test]
    fn oversized_geometry_is_rejected_at_load() {
        let wide = r##"{"name":"w","elements":[
            {"type":"rect","x":10,"y":0,"width":2147483647,"height":4,"color":"#ff0000"}]}"##;
        assert!(DeclarativeTheme::from_json(wide).is_err());
        let huge = r##"{"name":"c","elements":[
            {"type":"circle","cx":64,"cy":32,"radius":50000,"color":"#ff0000"}]}"##;
        assert!(DeclarativeTheme::from_json(huge).is_err());
        let far = r##"{"name":"l","elements":[
            {"type":"line","x1":-2147483648,"y1":0,"x2":2147483647,"y2":0,"color":"#fff"}]}"##;
        assert!(DeclarativeTheme::from_json(far).is_err());
        let big_text = r##"{"name":"t","elements":[
            {"type":"text","text":"x","y":0,"size":4000,"color":"#fff"}]}"##;
        assert!(DeclarativeTheme::from_json(big_text).is_err());
    }

    #[test]
    fn large_in_range_shapes_still_render() {
        let text = r##"{"name":"big","elements":[
            {"type":"circle","cx":64,"cy":32,"radius":4096,"color":"#ff0000"},
            {"type":"pulse","cx":-4096,"cy":4096,"radius":4000,"amplitude":96,"period_ms":1000,"color":"#00ff00"}
        ]}"##;
        let theme = DeclarativeTheme::from_json(text).unwrap();
        let mut state = theme.init();
        let mut canvas = Canvas::new(128, 64);
        theme.render(&mut canvas, 128, 64, &mut state, 250.0).unwrap();
        assert_eq!(canvas.get(64, 32), Some(Color::RED));
    }

    #[test]
    fn odd_font_size_in_state_falls_back() {
        let theme = fixed(DeclarativeTheme::from_json(CLOCK_THEME).unwrap());
        let mut state = theme.init();
        state["settings"]["fontSize"] = json!(100_000);
        let mut canvas = Canvas::new(128, 64);
        theme.render(&mut canvas, 128, 64, &mut state, 0.0).unwrap();
    }
}
