//! Device wire format.
//!
//! Every payload starts with a 4-byte header `[w_lo, w_hi, h_lo, h_hi]`
//! followed by either RGB565 little-endian words (opaque layers) or
//! `[alpha, lo, hi]` triplets (the text layer the firmware composites
//! itself). Quantisation truncates with bit masks to match the firmware.

use crate::core::{Color, Frame};
use anyhow::{bail, Result};

/// Size of the `[w, h]` header
pub const HEADER_LEN: usize = 4;

/// Pack 8-bit channels into RGB565 by truncation
#[inline]
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    (((r as u16) & 0xF8) << 8) | (((g as u16) & 0xFC) << 3) | ((b as u16) >> 3)
}

/// Unpack RGB565 to 8-bit channels with the low bits left at zero
#[inline]
pub const fn decode_rgb565(v: u16) -> (u8, u8, u8) {
    (((v >> 8) & 0xF8) as u8, ((v >> 3) & 0xFC) as u8, ((v << 3) & 0xF8) as u8)
}

/// Pixel layout of a device payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 2 bytes per pixel
    Rgb565,
    /// 3 bytes per pixel, alpha first
    A8Rgb565,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::A8Rgb565 => 3,
        }
    }
}

fn header(width: u32, height: u32) -> [u8; HEADER_LEN] {
    let w = (width as u16).to_le_bytes();
    let h = (height as u16).to_le_bytes();
    [w[0], w[1], h[0], h[1]]
}

/// Encode raw pixels without alpha
pub fn encode_pixels_opaque(width: u32, height: u32, pixels: &[Color]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + pixels.len() * 2);
    buf.extend_from_slice(&header(width, height));
    for p in pixels {
        buf.extend_from_slice(&rgb565(p.r, p.g, p.b).to_le_bytes());
    }
    buf
}

/// Encode raw pixels with a leading alpha byte each
pub fn encode_pixels_with_alpha(width: u32, height: u32, pixels: &[Color]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + pixels.len() * 3);
    buf.extend_from_slice(&header(width, height));
    for p in pixels {
        let [lo, hi] = rgb565(p.r, p.g, p.b).to_le_bytes();
        buf.extend_from_slice(&[p.a, lo, hi]);
    }
    buf
}

/// RGB565 payload for a full frame
pub fn encode_opaque(frame: &Frame) -> Vec<u8> {
    encode_pixels_opaque(frame.width, frame.height, frame.pixels())
}

/// A8+RGB565 payload for a full frame
pub fn encode_with_alpha(frame: &Frame) -> Vec<u8> {
    encode_pixels_with_alpha(frame.width, frame.height, frame.pixels())
}

/// Read back the `[w, h]` header and check the payload length agrees
pub fn parse_header(bytes: &[u8], format: PixelFormat) -> Result<(u32, u32)> {
    if bytes.len() < HEADER_LEN {
        bail!("payload shorter than header: {} bytes", bytes.len());
    }
    let w = u16::from_le_bytes([bytes[0], bytes[1]]) as u32;
    let h = u16::from_le_bytes([bytes[2], bytes[3]]) as u32;
    let expected = HEADER_LEN + (w * h) as usize * format.bytes_per_pixel();
    if bytes.len() != expected {
        bail!("size mismatch: {w}x{h} needs {expected} bytes, got {}", bytes.len());
    }
    Ok((w, h))
}
