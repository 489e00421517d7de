//! Decoding of background stills and frame sequences into canvases.

use crate::core::Canvas;
use anyhow::{bail, Context, Result};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage};
use std::fs;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

/// Frame delay used for stills and frames without timing
pub const DEFAULT_FRAME_MS: f64 = 100.0;

fn to_canvas(image: DynamicImage) -> Result<Canvas> {
    let rgba = image.to_rgba8();
    let (w, h) = rgba.dimensions();
    Canvas::from_rgba_bytes(w, h, rgba.as_raw()).context("decoded image has an odd buffer size")
}

/// Decode a still image from bytes
pub fn decode_image(bytes: &[u8]) -> Result<Canvas> {
    let image = image::load_from_memory(bytes).context("decoding image")?;
    to_canvas(image)
}

/// Load a still image, e.g. the background picture
pub fn load_image(path: &Path) -> Result<Canvas> {
    let image = image::open(path).with_context(|| format!("opening image {}", path.display()))?;
    to_canvas(image)
}

/// Looping sequence of timed frames standing in for a playing video
#[derive(Debug, Clone)]
pub struct VideoClip {
    frames: Vec<(Canvas, f64)>,
    duration_ms: f64,
}

impl VideoClip {
    /// Frames with their display time in ms; zero delays count as the default
    pub fn from_frames(frames: Vec<(Canvas, f64)>) -> Result<Self> {
        if frames.is_empty() {
            bail!("clip has no frames");
        }
        let frames: Vec<(Canvas, f64)> = frames
            .into_iter()
            .map(|(canvas, ms)| (canvas, if ms > 0.0 { ms } else { DEFAULT_FRAME_MS }))
            .collect();
        let duration_ms = frames.iter().map(|(_, ms)| ms).sum();
        Ok(Self { frames, duration_ms })
    }

    /// Animated GIF, any still format, or a directory of numbered frames
    pub fn load(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Self::load_dir(path);
        }
        let is_gif = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("gif"));
        if is_gif {
            let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            Self::decode_gif(&bytes).with_context(|| format!("in {}", path.display()))
        } else {
            Self::from_frames(vec![(load_image(path)?, DEFAULT_FRAME_MS)])
        }
    }

    pub fn decode_gif(bytes: &[u8]) -> Result<Self> {
        let decoder = GifDecoder::new(BufReader::new(Cursor::new(bytes))).context("reading GIF header")?;
        let mut frames = Vec::new();
        for frame in decoder.into_frames() {
            let frame = frame.context("decoding GIF frame")?;
            let (numer, denom) = frame.delay().numer_denom_ms();
            let ms = numer as f64 / denom.max(1) as f64;
            let canvas = to_canvas(DynamicImage::from(frame.into_buffer()))?;
            frames.push((canvas, ms));
        }
        Self::from_frames(frames)
    }

    fn load_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("listing {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            match load_image(&path) {
                Ok(canvas) => frames.push((canvas, DEFAULT_FRAME_MS)),
                Err(e) => log::warn!("skipping frame: {e:#}"),
            }
        }
        Self::from_frames(frames).with_context(|| format!("no readable frames in {}", dir.display()))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// Frame showing `ms` after playback started, looping forever
    pub fn frame_at(&self, ms: f64) -> &Canvas {
        let mut t = if ms.is_finite() && ms > 0.0 {
            ms % self.duration_ms
        } else {
            0.0
        };
        for (canvas, delay) in &self.frames {
            if t < *delay {
                return canvas;
            }
            t -= delay;
        }
        &self.frames[self.frames.len() - 1].0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Color;

    fn solid(color: Color) -> Canvas {
        let mut c = Canvas::new(2, 2);
        c.clear(color);
        c
    }

    #[test]
    fn clip_loops_by_delay() {
        let clip = VideoClip::from_frames(vec![
            (solid(Color::RED), 100.0),
            (solid(Color::WHITE), 50.0),
        ])
        .unwrap();
        assert_eq!(clip.duration_ms(), 150.0);
        assert_eq!(clip.frame_at(0.0).get(0, 0), Some(Color::RED));
        assert_eq!(clip.frame_at(120.0).get(0, 0), Some(Color::WHITE));
        assert_eq!(clip.frame_at(160.0).get(0, 0), Some(Color::RED));
        assert_eq!(clip.frame_at(-5.0).get(0, 0), Some(Color::RED));
    }

    #[test]
    fn zero_delay_uses_default() {
        let clip = VideoClip::from_frames(vec![(solid(Color::RED), 0.0)]).unwrap();
        assert_eq!(clip.duration_ms(), DEFAULT_FRAME_MS);
    }

    #[test]
    fn empty_clip_is_rejected() {
        assert!(VideoClip::from_frames(Vec::new()).is_err());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(decode_image(b"not an image").is_err());
        assert!(VideoClip::decode_gif(b"GIF89a").is_err());
    }

    #[test]
    fn png_round_trip() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let canvas = decode_image(&png).unwrap();
        assert_eq!(canvas.dimensions(), (3, 2));
        assert_eq!(canvas.get(2, 1), Some(Color::rgb(10, 20, 30)));
    }
}
