use serde::{Deserialize, Serialize};

/// Which way scrolling copies travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    #[default]
    Left,
    Right,
}

impl ScrollDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }

    fn sign(self) -> i32 {
        match self {
            ScrollDirection::Left => -1,
            ScrollDirection::Right => 1,
        }
    }
}

/// Positions of every scrolling copy of one bitmap.
///
/// Consecutive heads are always exactly `spacing` apart. A head that leaves
/// the panel on the trailing side is moved one `spacing` past the far end
/// of the ring, so the loop never shows a gap or an overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollHeads {
    heads: Vec<i32>,
    spacing: i32,
    text_w: i32,
    panel_w: i32,
    direction: ScrollDirection,
    steps: u64,
}

impl ScrollHeads {
    pub fn new(panel_w: u32, text_w: u32, gap: i32, direction: ScrollDirection) -> Self {
        let (pw, tw) = (panel_w as i32, text_w as i32);
        let spacing = (tw + gap).max(1);
        let copies = (((pw + 2 * tw) as f64 / spacing as f64).ceil() as usize + 1).max(2);

        let heads = (0..copies as i32)
            .map(|i| match direction {
                ScrollDirection::Left => pw + i * spacing,
                ScrollDirection::Right => -tw - i * spacing,
            })
            .collect();

        Self {
            heads,
            spacing,
            text_w: tw,
            panel_w: pw,
            direction,
            steps: 0,
        }
    }

    /// Move every head `n` pixels, recycling heads that left the panel
    pub fn step(&mut self, n: u64) {
        let sign = self.direction.sign();
        for _ in 0..n {
            for head in &mut self.heads {
                *head += sign;
            }
            self.recycle();
        }
        self.steps += n;
    }

    fn recycle(&mut self) {
        for i in 0..self.heads.len() {
            match self.direction {
                ScrollDirection::Left if self.heads[i] + self.text_w <= 0 => {
                    let far = self.heads.iter().copied().max().unwrap_or(self.panel_w);
                    self.heads[i] = far + self.spacing;
                }
                ScrollDirection::Right if self.heads[i] >= self.panel_w => {
                    let far = self.heads.iter().copied().min().unwrap_or(-self.text_w);
                    self.heads[i] = far - self.spacing;
                }
                _ => {}
            }
        }
    }

    pub fn heads(&self) -> &[i32] {
        &self.heads
    }

    /// Heads in ascending order
    pub fn sorted(&self) -> Vec<i32> {
        let mut sorted = self.heads.clone();
        sorted.sort_unstable();
        sorted
    }

    pub fn spacing(&self) -> i32 {
        self.spacing
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Total 1 px steps applied since creation
    pub fn steps(&self) -> u64 {
        self.steps
    }
}
