use super::color::Color;

/// 2D drawing operations for canvas
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Fill entire canvas with color, replacing whatever is there
    Clear(Color),

    /// Blend a single pixel
    Pixel { x: i32, y: i32, color: Color },

    /// Horizontal line from (x, y) with length
    HLine { x: i32, y: i32, length: u32, color: Color },

    /// Vertical line from (x, y) with length
    VLine { x: i32, y: i32, length: u32, color: Color },

    /// Filled rectangle
    Rect { x: i32, y: i32, width: u32, height: u32, color: Color },

    /// One pixel wide rectangle outline
    StrokeRect { x: i32, y: i32, width: u32, height: u32, color: Color },

    /// Filled rectangle with rounded corners
    RoundedRect { x: i32, y: i32, width: u32, height: u32, radius: u32, color: Color },

    /// Circle outline at (cx, cy)
    Circle { cx: i32, cy: i32, radius: u32, color: Color },

    /// Filled circle at (cx, cy)
    FilledCircle { cx: i32, cy: i32, radius: u32, color: Color },

    /// Line from (x1, y1) to (x2, y2)
    Line { x1: i32, y1: i32, x2: i32, y2: i32, color: Color },

    /// Filled triangle
    Triangle { points: [(i32, i32); 3], color: Color },
}

/// RGBA pixel surface with source-over blending.
///
/// Every compositing step in the crate draws into one of these: the panel
/// frame, the temporary glyph surface and the cropped content bitmap.
#[derive(Clone, PartialEq)]
pub struct Canvas {
    pixels: Vec<Color>,
    /// Pending draw operations
    operations: Vec<DrawOp>,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pending_ops", &self.operations.len())
            .finish()
    }
}

impl Canvas {
    /// Create fully transparent canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![Color::TRANSPARENT; (width * height) as usize],
            operations: Vec::new(),
            width,
            height,
        }
    }

    /// Build from a tightly packed RGBA8 buffer
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != (width * height * 4) as usize {
            return None;
        }
        Some(Self {
            pixels: bytemuck::cast_slice(bytes).to_vec(),
            operations: Vec::new(),
            width,
            height,
        })
    }

    /// Add draw operation - functional style
    pub fn draw(mut self, op: DrawOp) -> Self {
        self.operations.push(op);
        self
    }

    /// Execute all pending operations
    pub fn execute_ops(mut self) -> Self {
        let ops = std::mem::take(&mut self.operations);
        for op in &ops {
            self.apply(op);
        }
        self
    }

    /// Execute a single draw operation immediately
    pub fn apply(&mut self, op: &DrawOp) {
        match *op {
            DrawOp::Clear(color) => self.clear(color),
            DrawOp::Pixel { x, y, color } => self.blend_pixel(x, y, color),
            DrawOp::HLine { x, y, length, color } => self.fill_rect(x, y, length, 1, color),
            DrawOp::VLine { x, y, length, color } => self.fill_rect(x, y, 1, length, color),
            DrawOp::Rect { x, y, width, height, color } => self.fill_rect(x, y, width, height, color),
            DrawOp::StrokeRect { x, y, width, height, color } => {
                self.stroke_rect(x, y, width, height, color)
            }
            DrawOp::RoundedRect { x, y, width, height, radius, color } => {
                self.fill_rounded_rect(x, y, width, height, radius, color)
            }
            DrawOp::Circle { cx, cy, radius, color } => self.draw_circle(cx, cy, radius, color),
            DrawOp::FilledCircle { cx, cy, radius, color } => {
                self.draw_filled_circle(cx, cy, radius, color)
            }
            DrawOp::Line { x1, y1, x2, y2, color } => self.draw_line(x1, y1, x2, y2, color),
            DrawOp::Triangle { points, color } => self.fill_triangle(points, color),
        }
    }

    /// Overwrite every pixel
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Read pixel, `None` outside the canvas
    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Write pixel without blending
    pub fn put(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Source-over blend of one pixel; out of bounds writes are dropped
    pub fn blend_pixel(&mut self, x: i32, y: i32, src: Color) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        self.pixels[i] = blend(self.pixels[i], src);
    }

    /// Columns or rows of a span that land on the canvas, computed wide so
    /// far-off geometry cannot overflow
    fn clip_span(start: i64, len: i64, limit: u32) -> std::ops::Range<i32> {
        let lo = start.clamp(0, limit as i64);
        let hi = start.saturating_add(len).clamp(lo, limit as i64);
        lo as i32..hi as i32
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        let cols = Self::clip_span(x as i64, width as i64, self.width);
        for py in Self::clip_span(y as i64, height as i64, self.height) {
            for px in cols.clone() {
                self.blend_pixel(px, py, color);
            }
        }
    }

    fn stroke_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        if width == 0 || height == 0 {
            return;
        }
        let right = (x as i64 + width as i64 - 1).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        let bottom = (y as i64 + height as i64 - 1).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        self.fill_rect(x, y, width, 1, color);
        if height > 1 {
            self.fill_rect(x, bottom, width, 1, color);
        }
        if height > 2 {
            self.fill_rect(x, y.saturating_add(1), 1, height - 2, color);
            if width > 1 {
                self.fill_rect(right, y.saturating_add(1), 1, height - 2, color);
            }
        }
    }

    fn fill_rounded_rect(&mut self, x: i32, y: i32, width: u32, height: u32, radius: u32, color: Color) {
        let r = radius.min(width / 2).min(height / 2) as i64;
        let (w, h) = (width as i64, height as i64);
        let cols = Self::clip_span(x as i64, w, self.width);
        for py in Self::clip_span(y as i64, h, self.height) {
            let dy = py as i64 - y as i64;
            for px in cols.clone() {
                let dx = px as i64 - x as i64;
                // nearest point on the inner rectangle shrunk by r
                let cx = dx.clamp(r, (w - 1 - r).max(r));
                let cy = dy.clamp(r, (h - 1 - r).max(r));
                let (ex, ey) = (dx - cx, dy - cy);
                if ex * ex + ey * ey <= r * r {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Midpoint circle algorithm
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: u32, color: Color) {
        let (cx, cy, r) = (cx as i64, cy as i64, radius as i64);
        // rings that enclose the whole canvas or miss it entirely draw nothing
        let far_x = cx.abs().max((self.width as i64 - 1 - cx).abs()) as f64;
        let far_y = cy.abs().max((self.height as i64 - 1 - cy).abs()) as f64;
        let near_x = (-cx).max(cx - (self.width as i64 - 1)).max(0) as f64;
        let near_y = (-cy).max(cy - (self.height as i64 - 1)).max(0) as f64;
        if r as f64 - 1.0 > far_x.hypot(far_y) || r as f64 + 1.0 < near_x.hypot(near_y) {
            return;
        }

        let (mut x, mut y) = (r, 0i64);
        let mut p = 1 - r;
        while x >= y {
            let points = [
                (cx + x, cy + y), (cx - x, cy + y),
                (cx + x, cy - y), (cx - x, cy - y),
                (cx + y, cy + x), (cx - y, cy + x),
                (cx + y, cy - x), (cx - y, cy - x),
            ];
            for (px, py) in points {
                self.blend_wide(px, py, color);
            }
            y += 1;

            if p <= 0 {
                p += 2 * y + 1;
            } else {
                x -= 1;
                p += 2 * (y - x) + 1;
            }
        }
    }

    fn draw_filled_circle(&mut self, cx: i32, cy: i32, radius: u32, color: Color) {
        let r = radius as i64;
        let r_sq = r * r;
        let cols = Self::clip_span(cx as i64 - r, 2 * r + 1, self.width);
        for py in Self::clip_span(cy as i64 - r, 2 * r + 1, self.height) {
            let dy = py as i64 - cy as i64;
            for px in cols.clone() {
                let dx = px as i64 - cx as i64;
                if dx * dx + dy * dy <= r_sq {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Bresenham's line algorithm
    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        let (w, h) = (self.width as i32, self.height as i32);
        if (x1 < 0 && x2 < 0) || (y1 < 0 && y2 < 0) || (x1 >= w && x2 >= w) || (y1 >= h && y2 >= h) {
            return;
        }
        let (x2, y2) = (x2 as i64, y2 as i64);
        let (mut x, mut y) = (x1 as i64, y1 as i64);
        let dx = (x2 - x).abs();
        let dy = -(y2 - y).abs();
        let sx = if x < x2 { 1 } else { -1 };
        let sy = if y < y2 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.blend_wide(x, y, color);

            if x == x2 && y == y2 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    #[inline]
    fn blend_wide(&mut self, x: i64, y: i64, color: Color) {
        if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
            self.blend_pixel(x, y, color);
        }
    }

    /// Scanline fill using edge functions over the bounding box
    fn fill_triangle(&mut self, points: [(i32, i32); 3], color: Color) {
        let [(x0, y0), (x1, y1), (x2, y2)] = points;
        let edge = |ax: i32, ay: i32, bx: i32, by: i32, px: i32, py: i32| {
            (bx - ax) as i64 * (py - ay) as i64 - (by - ay) as i64 * (px - ax) as i64
        };
        let area = edge(x0, y0, x1, y1, x2, y2);
        if area == 0 {
            return;
        }
        let min_x = x0.min(x1).min(x2).max(0);
        let max_x = x0.max(x1).max(x2).min(self.width as i32 - 1);
        let min_y = y0.min(y1).min(y2).max(0);
        let max_y = y0.max(y1).max(y2).min(self.height as i32 - 1);

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let w0 = edge(x1, y1, x2, y2, px, py);
                let w1 = edge(x2, y2, x0, y0, px, py);
                let w2 = edge(x0, y0, x1, y1, px, py);
                let inside = if area > 0 {
                    w0 >= 0 && w1 >= 0 && w2 >= 0
                } else {
                    w0 <= 0 && w1 <= 0 && w2 <= 0
                };
                if inside {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Blend another canvas with its top-left corner at (x, y)
    pub fn draw_canvas(&mut self, src: &Canvas, x: i32, y: i32) {
        let cols = Self::clip_span(x as i64, src.width as i64, self.width);
        for py in Self::clip_span(y as i64, src.height as i64, self.height) {
            for px in cols.clone() {
                let s = src.pixels[((py as i64 - y as i64) as u32 * src.width + (px as i64 - x as i64) as u32) as usize];
                if s.a != 0 {
                    self.blend_pixel(px, py, s);
                }
            }
        }
    }

    /// Blend `src` stretched into the rectangle (dx, dy, dw, dh) with
    /// nearest-neighbour sampling, keeping LED pixels crisp
    pub fn draw_canvas_scaled(&mut self, src: &Canvas, dx: i32, dy: i32, dw: u32, dh: u32) {
        if dw == 0 || dh == 0 || src.width == 0 || src.height == 0 {
            return;
        }
        let cols = Self::clip_span(dx as i64, dw as i64, self.width);
        for py in Self::clip_span(dy as i64, dh as i64, self.height) {
            let sy = ((py as i64 - dy as i64) as u64 * src.height as u64 / dh as u64) as u32;
            for px in cols.clone() {
                let sx = ((px as i64 - dx as i64) as u64 * src.width as u64 / dw as u64) as u32;
                let s = src.pixels[(sy * src.width + sx) as usize];
                self.blend_pixel(px, py, s);
            }
        }
    }

    /// Get pixel buffer
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Pixel buffer as tightly packed RGBA8 bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Get canvas dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn into_pixels(self) -> Vec<Color> {
        self.pixels
    }
}

/// Source-over compositing of straight-alpha colours
#[inline]
pub fn blend(dst: Color, src: Color) -> Color {
    match src.a {
        0 => dst,
        255 => src,
        _ => {
            let sa = src.a as u32;
            let da = dst.a as u32 * (255 - sa) / 255;
            let out_a = sa + da;
            if out_a == 0 {
                return Color::TRANSPARENT;
            }
            let mix = |s: u8, d: u8| ((s as u32 * sa + d as u32 * da + out_a / 2) / out_a) as u8;
            Color::rgba(mix(src.r, dst.r), mix(src.g, dst.g), mix(src.b, dst.b), out_a as u8)
        }
    }
}
