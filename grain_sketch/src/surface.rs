//! The drawing surface: a persistent ARGB bitmap the size of the drawing
//! region.  Ink accumulates until [`DrawingSurface::clear`]; the visualizer
//! composites it over the canvas every frame.

// ════════════════════════════════════════════════════════════════════════════
// Colors
// ════════════════════════════════════════════════════════════════════════════

/// Fully transparent.  The visualizer skips these pixels.
pub const BLANK: u32 = 0x0000_0000;

/// Spring green, HSV(150°, 100 %, 100 %).
pub const FIXED_INK: u32 = 0xFF00_FF7F;

pub const BORDER_INSET:  usize = 10;
pub const DEFAULT_WIDTH: u32   = 2;
pub const DEFAULT_HUE_STEP: f32 = 5.0;

/// Convert HSV (h in degrees, s and v in 0..=1) to an opaque ARGB pixel.
pub fn hsv_to_argb(h: f32, s: f32, v: f32) -> u32 {
    let h  = h.rem_euclid(360.0);
    let hi = (h / 60.0) as u32;
    let f  = h / 60.0 - hi as f32;
    let p  = v * (1.0 - s);
    let q  = v * (1.0 - s * f);
    let t  = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let ri = (r * 255.0) as u32;
    let gi = (g * 255.0) as u32;
    let bi = (b * 255.0) as u32;
    0xFF000000 | (ri << 16) | (gi << 8) | bi
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Fixed,
    CyclingHue,
}

// ════════════════════════════════════════════════════════════════════════════
// DrawingSurface
// ════════════════════════════════════════════════════════════════════════════

pub struct DrawingSurface {
    width:    usize,
    height:   usize,
    pixels:   Vec<u32>,
    mode:     ColorMode,
    /// Current hue in degrees; only advances in [`ColorMode::CyclingHue`].
    hue:      f32,
    hue_step: f32,
}

impl DrawingSurface {
    pub fn new(width: usize, height: usize) -> Self {
        let mut surface = DrawingSurface {
            width,
            height,
            pixels:   vec![BLANK; width * height],
            mode:     ColorMode::Fixed,
            hue:      0.0,
            hue_step: DEFAULT_HUE_STEP,
        };
        surface.clear();
        surface
    }

    pub fn with_hue_step(mut self, step: f32) -> Self {
        self.hue_step = step;
        self
    }

    pub fn width(&self)  -> usize     { self.width }
    pub fn height(&self) -> usize     { self.height }
    pub fn mode(&self)   -> ColorMode { self.mode }
    pub fn hue(&self)    -> f32       { self.hue }
    pub fn pixels(&self) -> &[u32]    { &self.pixels }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Erase all ink and redraw the decorative border.
    pub fn clear(&mut self) {
        self.pixels.fill(BLANK);
        if self.width <= 2 * BORDER_INSET || self.height <= 2 * BORDER_INSET {
            return;
        }
        let (x0, y0) = (BORDER_INSET as i32, BORDER_INSET as i32);
        let x1 = (self.width  - BORDER_INSET - 1) as i32;
        let y1 = (self.height - BORDER_INSET - 1) as i32;
        self.line((x0, y0), (x1, y0), FIXED_INK, DEFAULT_WIDTH);
        self.line((x1, y0), (x1, y1), FIXED_INK, DEFAULT_WIDTH);
        self.line((x1, y1), (x0, y1), FIXED_INK, DEFAULT_WIDTH);
        self.line((x0, y1), (x0, y0), FIXED_INK, DEFAULT_WIDTH);
    }

    /// Switching modes only affects segments drawn afterwards.
    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.mode = mode;
    }

    pub fn toggle_color_mode(&mut self) -> ColorMode {
        self.mode = match self.mode {
            ColorMode::Fixed      => ColorMode::CyclingHue,
            ColorMode::CyclingHue => ColorMode::Fixed,
        };
        self.mode
    }

    /// Ink for the next segment.  Advances the hue in cycling mode.
    pub fn next_color(&mut self) -> u32 {
        match self.mode {
            ColorMode::Fixed => FIXED_INK,
            ColorMode::CyclingHue => {
                self.hue = (self.hue + self.hue_step).rem_euclid(360.0);
                hsv_to_argb(self.hue, 1.0, 1.0)
            }
        }
    }

    /// Connect `from` to `to` in surface-local pixels.  Nothing is drawn
    /// without a previous sample.
    pub fn append_segment(
        &mut self,
        from:  Option<(f32, f32)>,
        to:    (f32, f32),
        color: u32,
        width: u32,
    ) {
        let Some(from) = from else { return };
        let a = (from.0.round() as i32, from.1.round() as i32);
        let b = (to.0.round() as i32, to.1.round() as i32);
        self.line(a, b, color, width);
    }

    // ── Rasterization ─────────────────────────────────────────────────────

    /// Bresenham, stamping a `width`-sized square at every step.
    fn line(&mut self, (mut x0, mut y0): (i32, i32), (x1, y1): (i32, i32), color: u32, width: u32) {
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.stamp(x0, y0, color, width);
            if x0 == x1 && y0 == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x0 += sx; }
            if e2 <= dx { err += dx; y0 += sy; }
        }
    }

    fn stamp(&mut self, cx: i32, cy: i32, color: u32, width: u32) {
        let w    = width.max(1) as i32;
        let half = w / 2;
        for y in cy - half..cy - half + w {
            for x in cx - half..cx - half + w {
                self.put_pixel(x, y, color);
            }
        }
    }

    fn put_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x < 0 || y < 0 { return; }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height { return; }
        self.pixels[y * self.width + x] = color;
    }
}
