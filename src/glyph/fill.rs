use crate::core::Color;
use serde::{Deserialize, Serialize};

/// Named left-to-right gradient palettes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gradient {
    Rainbow,
    Sunset,
    Ocean,
    Forest,
    Fire,
    Purple,
}

const RAINBOW: [Color; 6] = [
    Color::rgb(0xFF, 0x6B, 0x6B),
    Color::rgb(0x4E, 0xCD, 0xC4),
    Color::rgb(0x45, 0xB7, 0xD1),
    Color::rgb(0x96, 0xCE, 0xB4),
    Color::rgb(0xFF, 0xEA, 0xA7),
    Color::rgb(0xDD, 0xA0, 0xDD),
];
const SUNSET: [Color; 2] = [Color::rgb(0xFF, 0x51, 0x2F), Color::rgb(0xF0, 0x98, 0x19)];
const OCEAN: [Color; 2] = [Color::rgb(0x2E, 0x31, 0x92), Color::rgb(0x1B, 0xFF, 0xFF)];
const FOREST: [Color; 2] = [Color::rgb(0x13, 0x4E, 0x5E), Color::rgb(0x71, 0xB2, 0x80)];
const FIRE: [Color; 2] = [Color::rgb(0xFF, 0x41, 0x6C), Color::rgb(0xFF, 0x4B, 0x2B)];
const PURPLE: [Color; 2] = [Color::rgb(0x66, 0x7E, 0xEA), Color::rgb(0x76, 0x4B, 0xA2)];

impl Gradient {
    pub const ALL: [Gradient; 6] = [
        Gradient::Rainbow,
        Gradient::Sunset,
        Gradient::Ocean,
        Gradient::Forest,
        Gradient::Fire,
        Gradient::Purple,
    ];

    /// Stops, evenly spaced from 0 to 1
    pub fn stops(self) -> &'static [Color] {
        match self {
            Gradient::Rainbow => &RAINBOW,
            Gradient::Sunset => &SUNSET,
            Gradient::Ocean => &OCEAN,
            Gradient::Forest => &FOREST,
            Gradient::Fire => &FIRE,
            Gradient::Purple => &PURPLE,
        }
    }

    /// Colour at position `t` in [0, 1]
    pub fn sample(self, t: f32) -> Color {
        let stops = self.stops();
        let segments = (stops.len() - 1) as f32;
        let pos = t.clamp(0.0, 1.0) * segments;
        let i = (pos.floor() as usize).min(stops.len() - 2);
        Color::lerp(stops[i], stops[i + 1], pos - i as f32)
    }

    pub fn name(self) -> &'static str {
        match self {
            Gradient::Rainbow => "rainbow",
            Gradient::Sunset => "sunset",
            Gradient::Ocean => "ocean",
            Gradient::Forest => "forest",
            Gradient::Fire => "fire",
            Gradient::Purple => "purple",
        }
    }
}

/// How the glyph bitmap is coloured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fill {
    Solid(Color),
    Gradient(Gradient),
}

impl Fill {
    /// Colour for column `x` of a bitmap `width` pixels wide
    pub fn color_at(&self, x: u32, width: u32) -> Color {
        match *self {
            Fill::Solid(c) => c,
            Fill::Gradient(g) => g.sample((x as f32 + 0.5) / width.max(1) as f32),
        }
    }
}

impl Default for Fill {
    fn default() -> Self {
        Fill::Solid(Color::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_palette_has_at_least_two_stops() {
        for g in Gradient::ALL {
            assert!(g.stops().len() >= 2, "{}", g.name());
        }
    }

    #[test]
    fn sample_hits_end_stops() {
        assert_eq!(Gradient::Ocean.sample(0.0), Color::rgb(0x2E, 0x31, 0x92));
        assert_eq!(Gradient::Ocean.sample(1.0), Color::rgb(0x1B, 0xFF, 0xFF));
        assert_eq!(Gradient::Rainbow.sample(0.4), Color::rgb(0x45, 0xB7, 0xD1));
    }

    #[test]
    fn gradient_runs_left_to_right() {
        let fill = Fill::Gradient(Gradient::Sunset);
        let left = fill.color_at(0, 100);
        let right = fill.color_at(99, 100);
        assert!(left.g < right.g);
    }

    #[test]
    fn gradient_names_deserialize() {
        let g: Gradient = serde_json::from_str("\"forest\"").unwrap();
        assert_eq!(g, Gradient::Forest);
    }
}
