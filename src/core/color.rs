use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Straight (non-premultiplied) RGBA colour, laid out exactly like one
/// pixel of an RGBA8 buffer so pixel slices can be viewed as bytes.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, bytemuck::Pod, bytemuck::Zeroable,
    Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same colour with a different alpha
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional)
    pub fn from_hex(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            bail!("bad colour {s:?}: not hex");
        }
        let digit = |i: usize| -> Result<u8> {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| anyhow!("bad colour {s:?}: {e}"))
        };

        match hex.len() {
            3 => {
                let mut c = [0u8; 3];
                for (i, ch) in hex.chars().enumerate() {
                    let v = ch
                        .to_digit(16)
                        .ok_or_else(|| anyhow!("bad colour {s:?}"))? as u8;
                    c[i] = v * 17;
                }
                Ok(Self::rgb(c[0], c[1], c[2]))
            }
            6 => Ok(Self::rgb(digit(0)?, digit(2)?, digit(4)?)),
            8 => Ok(Self::rgba(digit(0)?, digit(2)?, digit(4)?, digit(6)?)),
            _ => bail!("bad colour {s:?}: expected #RRGGBB"),
        }
    }

    /// Lowercase `#rrggbb` form used in device form fields
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation per channel, `t` in [0, 1]
    pub fn lerp(a: Color, b: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
        Color::rgba(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> String {
        c.to_hex()
    }
}

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Color {
    let c = v * s;
    let h_prime = (h.rem_euclid(1.0) * 6.0) % 6.0;
    let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h_prime as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_u8 = |f: f32| ((f + m).clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::rgb(to_u8(r), to_u8(g), to_u8(b))
}
