/// Single-channel coverage map of a rendered text line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Pixel rectangle, inclusive origin and exclusive extent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AlphaMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height) as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    /// Max-combine coverage at (x, y); out of bounds is ignored
    pub fn stamp(&mut self, x: i32, y: i32, value: u8) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = y as usize * self.width as usize + x as usize;
        self.data[i] = self.data[i].max(value);
    }

    /// One round of 3x3 max filter; the neighbourhood is clipped at edges
    pub fn dilate_once(&self) -> AlphaMap {
        let (w, h) = (self.width as i32, self.height as i32);
        let mut out = vec![0u8; self.data.len()];
        for y in 0..h {
            for x in 0..w {
                let mut m = 0u8;
                for yy in (y - 1).max(0)..=(y + 1).min(h - 1) {
                    for xx in (x - 1).max(0)..=(x + 1).min(w - 1) {
                        m = m.max(self.data[(yy * w + xx) as usize]);
                    }
                }
                out[(y * w + x) as usize] = m;
            }
        }
        AlphaMap {
            width: self.width,
            height: self.height,
            data: out,
        }
    }

    /// `rounds` dilations; zero rounds returns the map unchanged
    pub fn dilate(self, rounds: u32) -> AlphaMap {
        (0..rounds).fold(self, |map, _| map.dilate_once())
    }

    /// Tight box around pixels with alpha >= threshold
    pub fn bounds(&self, threshold: u8) -> Option<Bounds> {
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);
        let mut found = false;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) >= threshold {
                    found = true;
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);
                }
            }
        }
        found.then(|| Bounds {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }

    /// True when (x, y) is at or above threshold and touches a pixel below it
    pub fn is_edge(&self, x: u32, y: u32, threshold: u8) -> bool {
        if self.get(x, y) < threshold {
            return false;
        }
        let (w, h) = (self.width as i32, self.height as i32);
        let (x, y) = (x as i32, y as i32);
        for yy in (y - 1).max(0)..=(y + 1).min(h - 1) {
            for xx in (x - 1).max(0)..=(x + 1).min(w - 1) {
                if self.data[(yy * w + xx) as usize] < threshold {
                    return true;
                }
            }
        }
        false
    }
}
