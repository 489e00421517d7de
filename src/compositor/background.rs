use crate::core::layer::BACKGROUND;
use crate::core::{Canvas, Color, DisplayContext, Layer};
use serde::{Deserialize, Serialize};

/// How a still image or video frame is sized onto the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    /// Stretch to the panel, ignoring aspect ratio
    Fill,
    /// Largest aspect-preserving size inside the panel
    #[default]
    Fit,
    /// Native size, capped to the panel
    Original,
}

impl ImageFit {
    /// Destination size for a `w`x`h` source on the panel
    pub fn size(self, context: &DisplayContext, w: u32, h: u32) -> (u32, u32) {
        let (pw, ph) = (context.width, context.height);
        match self {
            ImageFit::Fill => (pw, ph),
            ImageFit::Fit => {
                if w == 0 || h == 0 {
                    return (1, 1);
                }
                let s = (pw as f64 / w as f64).min(ph as f64 / h as f64);
                (
                    ((w as f64 * s).floor() as u32).max(1),
                    ((h as f64 * s).floor() as u32).max(1),
                )
            }
            ImageFit::Original => (pw.min(w), ph.min(h)),
        }
    }

    /// Centred destination rectangle `(x, y, w, h)`
    pub fn placement(self, context: &DisplayContext, w: u32, h: u32) -> (i32, i32, u32, u32) {
        let (dw, dh) = self.size(context, w, h);
        let dx = (context.width as f64 * 0.5 - dw as f64 / 2.0).floor() as i32;
        let dy = (context.height as f64 * 0.5 - dh as f64 / 2.0).floor() as i32;
        (dx, dy, dw, dh)
    }
}

/// Whether the background is a flat colour or the loaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BgMode {
    #[default]
    Color,
    Image,
}

impl BgMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BgMode::Color => "color",
            BgMode::Image => "image",
        }
    }
}

/// Scale `image` per `fit` and blend it centred on the canvas
pub fn draw_fitted(canvas: &mut Canvas, context: &DisplayContext, image: &Canvas, fit: ImageFit) {
    let (dx, dy, dw, dh) = fit.placement(context, image.width(), image.height());
    canvas.draw_canvas_scaled(image, dx, dy, dw, dh);
}

/// Solid colour, optionally overlaid with a fitted image
pub struct BackgroundLayer<'a> {
    pub color: Color,
    pub image: Option<(&'a Canvas, ImageFit)>,
}

impl Layer for BackgroundLayer<'_> {
    fn draw(&self, canvas: &mut Canvas, context: &DisplayContext) {
        canvas.clear(self.color.with_alpha(255));
        if let Some((image, fit)) = self.image {
            draw_fitted(canvas, context, image, fit);
        }
    }

    fn priority(&self) -> i32 {
        BACKGROUND
    }
}

/// A fitted picture drawn as content, used for video frames
pub struct PictureLayer<'a> {
    pub image: &'a Canvas,
    pub fit: ImageFit,
}

impl Layer for PictureLayer<'_> {
    fn draw(&self, canvas: &mut Canvas, context: &DisplayContext) {
        draw_fitted(canvas, context, self.image, self.fit);
    }
}
