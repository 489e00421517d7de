//! Local views of composed frames: PNG snapshots and a terminal mirror.

use crate::codec::{decode_rgb565, rgb565};
use crate::core::{Color, Frame};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Write a frame as an RGBA PNG
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba_bytes().to_vec())
        .context("frame buffer does not match its size")?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))
}

/// What the panel would show, after RGB565 truncation
fn panel_rgb(c: Color) -> (u8, u8, u8) {
    decode_rgb565(rgb565(c.r, c.g, c.b))
}

/// Mirrors frames in a true-colour terminal, two panel rows per text line.
///
/// Frames identical to the last one drawn are skipped.
#[derive(Debug, Default)]
pub struct TerminalPreview {
    last: Option<Vec<u16>>,
    drawn: u64,
}

impl TerminalPreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames actually written so far
    pub fn drawn(&self) -> u64 {
        self.drawn
    }

    /// ANSI text for `frame`, or `None` when the panel would look the same
    pub fn render(&mut self, frame: &Frame) -> Option<String> {
        let words: Vec<u16> = frame.pixels().iter().map(|c| rgb565(c.r, c.g, c.b)).collect();
        if self.last.as_ref() == Some(&words) {
            return None;
        }
        self.last = Some(words);
        self.drawn += 1;

        let mut out = String::with_capacity((frame.width * frame.height * 20) as usize);
        // home the cursor so successive frames overwrite each other
        out.push_str("\x1b[H");
        for y in (0..frame.height).step_by(2) {
            for x in 0..frame.width {
                let top = frame.pixel(x, y).map(panel_rgb).unwrap_or((0, 0, 0));
                let bottom = frame.pixel(x, y + 1).map(panel_rgb).unwrap_or((0, 0, 0));
                let _ = write!(
                    out,
                    "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m\u{2580}",
                    top.0, top.1, top.2, bottom.0, bottom.1, bottom.2
                );
            }
            out.push_str("\x1b[0m\n");
        }
        Some(out)
    }

    /// Render and write in one go; returns whether anything was written
    pub fn draw(&mut self, frame: &Frame, out: &mut impl Write) -> Result<bool> {
        match self.render(frame) {
            Some(text) => {
                out.write_all(text.as_bytes()).context("writing terminal preview")?;
                out.flush().context("flushing terminal preview")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
