//! Software-rendered window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────────┐
//! │  [ CLEAR ]   │                                                  │
//! │  [ MODE  ]   │   drawing region                                 │
//! │              │   (persistent ink, bordered)                     │
//! │  status      │                                                  │
//! │              │                                                  │
//! │  pos: 0.00   │                                                  │
//! │  pitch: 0.500│                                                  │
//! └──────────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! While audio permission is pending, a dimmed overlay with an
//! ENABLE AUDIO button covers the whole window.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::app::DebugReadout;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::gesture::{InputEvent, PointerEvent, PointerTracker, UserCommand};
use crate::region::DrawingRegion;
use crate::surface::{ColorMode, DrawingSurface, BLANK};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const CANVAS_BG:    u32   = 0xFFF0F0F0;
const TOOL_BG:      u32   = 0xFFDCDCDC;
const BUTTON_BG:    u32   = 0xFFFAFAFA;
const BUTTON_EDGE:  u32   = 0xFF808080;
const TEXT_COLOR:   u32   = 0xFF000000;
const STATUS_COLOR: u32   = 0xFF404040;
const OVERLAY_DIM:  f32   = 0.6;
const TEXT_SCALE:   usize = 2;
const BUTTON_H:     usize = 24;
const PROMPT_W:     usize = 200;
const PROMPT_H:     usize = 44;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Rect {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
}

impl Rect {
    fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x as f32
            && px < (self.x + self.w) as f32
            && py >= self.y as f32
            && py < (self.y + self.h) as f32
    }
}

/// Screen placement of every hit target, derived from the window size.
#[derive(Clone, Copy, Debug)]
struct Layout {
    width:  usize,
    height: usize,
    tools:  usize,
    clear:  Rect,
    mode:   Rect,
    prompt: Rect,
}

impl Layout {
    fn new(width: usize, height: usize, tools: usize) -> Self {
        let button_w = tools.saturating_sub(20);
        Layout {
            width,
            height,
            tools,
            clear:  Rect { x: 10, y: 10, w: button_w, h: BUTTON_H },
            mode:   Rect { x: 10, y: 40, w: button_w, h: BUTTON_H },
            prompt: Rect {
                x: width.saturating_sub(PROMPT_W) / 2,
                y: height.saturating_sub(PROMPT_H) / 2,
                w: PROMPT_W,
                h: PROMPT_H,
            },
        }
    }

    /// What a click at (x, y) means, if anything, besides drawing.
    fn command_at(&self, x: f32, y: f32, prompt_visible: bool) -> Option<UserCommand> {
        if prompt_visible {
            return self.prompt.contains(x, y).then_some(UserCommand::GrantAudioPermission);
        }
        if self.clear.contains(x, y) {
            Some(UserCommand::ClearDrawing)
        } else if self.mode.contains(x, y) {
            Some(UserCommand::ToggleColorMode)
        } else {
            None
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:   Window,
    buf:      Vec<u32>,
    layout:   Layout,
    origin:   (usize, usize),
    pointer:  PointerTracker,
    input_tx: Sender<InputEvent>,
}

impl Visualizer {
    pub fn new(cfg: &AppConfig, region: DrawingRegion, input_tx: Sender<InputEvent>) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Grain Sketch",
            cfg.width, cfg.height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        let (ox, oy) = region.origin();
        Ok(Visualizer {
            window,
            buf:      vec![CANVAS_BG; cfg.width * cfg.height],
            layout:   Layout::new(cfg.width, cfg.height, cfg.tool_width),
            origin:   (ox as usize, oy as usize),
            pointer:  PointerTracker::new(),
            input_tx,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard and mouse and translate them to [`InputEvent`]s.
    /// While the permission prompt is up, presses only reach the prompt.
    pub fn poll_input(&mut self, prompt_visible: bool) -> bool {
        if !self.window.is_open() { return false; }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            let _ = self.input_tx.send(InputEvent::Quit);
            return false;
        }
        if one_shot(Key::C) {
            let _ = self.input_tx.send(InputEvent::Command(UserCommand::ClearDrawing));
        }
        if one_shot(Key::M) {
            let _ = self.input_tx.send(InputEvent::Command(UserCommand::ToggleColorMode));
        }
        if one_shot(Key::Enter) {
            let _ = self.input_tx.send(InputEvent::Command(UserCommand::GrantAudioPermission));
        }

        let pos  = self.window.get_mouse_pos(MouseMode::Pass);
        let down = self.window.get_mouse_down(MouseButton::Left);
        match self.pointer.update(pos, down) {
            Some(PointerEvent::Press(p)) => {
                if let Some(cmd) = self.layout.command_at(p.x, p.y, prompt_visible) {
                    let _ = self.input_tx.send(InputEvent::Command(cmd));
                }
                if !prompt_visible {
                    let _ = self.input_tx.send(InputEvent::Pointer(PointerEvent::Press(p)));
                }
            }
            Some(event) => {
                let _ = self.input_tx.send(InputEvent::Pointer(event));
            }
            None => {}
        }

        true
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        surface:        &DrawingSurface,
        readout:        &DebugReadout,
        status:         &str,
        prompt_visible: bool,
    ) {
        let Layout { width, height, tools, clear, mode, .. } = self.layout;

        // Clear
        self.buf.fill(CANVAS_BG);

        // ── Drawing region ────────────────────────────────────────────────
        self.blit_surface(surface);

        // ── Tool strip ────────────────────────────────────────────────────
        self.fill_rect(0, 0, tools, height, TOOL_BG);
        self.draw_button(clear, "CLEAR");
        let mode_label = match surface.mode() {
            ColorMode::Fixed      => "INK: FIXED",
            ColorMode::CyclingHue => "INK: RAINBOW",
        };
        self.draw_button(mode, mode_label);

        // ── Status (wrapped to the strip) ─────────────────────────────────
        let cols = (tools.saturating_sub(20) / 4).max(1);
        for (i, line) in wrap(status, cols).iter().enumerate().take(8) {
            self.draw_label(line, 10, 80 + i * 8, STATUS_COLOR, 1);
        }

        // ── Debug readout ─────────────────────────────────────────────────
        let line_h = 5 * TEXT_SCALE;
        self.draw_label(&readout.pos_line(),   10, height.saturating_sub(25 + line_h), TEXT_COLOR, TEXT_SCALE);
        self.draw_label(&readout.pitch_line(), 10, height.saturating_sub(10 + line_h), TEXT_COLOR, TEXT_SCALE);

        // ── Permission prompt ─────────────────────────────────────────────
        if prompt_visible {
            for px in self.buf.iter_mut() {
                *px = blend(*px, 0xFF000000, OVERLAY_DIM);
            }
            let prompt = self.layout.prompt;
            self.draw_button(prompt, "ENABLE AUDIO");
        }

        self.window.update_with_buffer(&self.buf, width, height).ok();
    }

    // ── Drawing region ────────────────────────────────────────────────────

    fn blit_surface(&mut self, surface: &DrawingSurface) {
        let (ox, oy) = self.origin;
        for y in 0..surface.height() {
            let row = &surface.pixels()[y * surface.width()..(y + 1) * surface.width()];
            for (x, &px) in row.iter().enumerate() {
                if px != BLANK {
                    self.set_pixel(ox + x, oy + y, px);
                }
            }
        }
    }

    // ── Widgets ───────────────────────────────────────────────────────────

    fn draw_button(&mut self, r: Rect, label: &str) {
        self.fill_rect(r.x, r.y, r.w, r.h, BUTTON_BG);
        self.draw_border(r.x, r.y, r.w, r.h, BUTTON_EDGE);
        let text_w = label.chars().count() * 4 * TEXT_SCALE;
        let lx = r.x + r.w.saturating_sub(text_w) / 2;
        let ly = r.y + r.h.saturating_sub(5 * TEXT_SCALE) / 2;
        self.draw_label(label, lx, ly, TEXT_COLOR, TEXT_SCALE);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        let (width, height) = (self.layout.width, self.layout.height);
        for row in y..(y + h).min(height) {
            for col in x..(x + w).min(width) {
                self.buf[row * width + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..x + w {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..y + h {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        let (width, height) = (self.layout.width, self.layout.height);
        if x < width && y < height {
            self.buf[y * width + x] = color;
        }
    }

    /// Minimal bitmap font, 3×5 glyphs drawn at an integer scale.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        for dy in 0..scale {
                            for dx in 0..scale {
                                self.set_pixel(cx + col * scale + dx, y + row * scale + dy, color);
                            }
                        }
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > self.layout.width { break; }
        }
    }
}

/// Greedy word wrap to `cols` characters; words longer than a line are split.
fn wrap(text: &str, cols: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line  = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > cols {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let split = word.char_indices().nth(cols).map(|(i, _)| i).unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
        let needed = if line.is_empty() { word.len() } else { line.len() + 1 + word.len() };
        if needed > cols && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() { line.push(' '); }
        line.push_str(word);
    }
    if !line.is_empty() { lines.push(line); }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_map_to_commands() {
        let layout = Layout::new(800, 600, 150);
        assert_eq!(layout.command_at(20.0, 20.0, false), Some(UserCommand::ClearDrawing));
        assert_eq!(layout.command_at(20.0, 50.0, false), Some(UserCommand::ToggleColorMode));
        assert_eq!(layout.command_at(400.0, 300.0, false), None);
    }

    #[test]
    fn prompt_swallows_tool_buttons() {
        let layout = Layout::new(800, 600, 150);
        assert_eq!(layout.command_at(20.0, 20.0, true), None);
        assert_eq!(layout.command_at(400.0, 300.0, true), Some(UserCommand::GrantAudioPermission));
    }

    #[test]
    fn wrap_respects_columns() {
        assert_eq!(wrap("Audio setup failed: 1 of 2", 12),
                   vec!["Audio setup", "failed: 1 of", "2"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap("", 10).is_empty());
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFFFFFFFF, 0xFF000000, 0.0), 0xFFFFFFFF);
        assert_eq!(blend(0xFFFFFFFF, 0xFF000000, 1.0), 0xFF000000);
    }
}
