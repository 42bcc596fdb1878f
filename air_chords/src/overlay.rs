//! Software-rendered overlay using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  mode                                                    │
//! │   LEFT HAND                       RIGHT HAND             │
//! │   [T][I][M][R][P]                 [T][I][M][R][P]        │
//! │                                                          │
//! │                    chord label                           │
//! │  status bar                                              │
//! │  key legend                                              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Hands the detector reports with a bounding box are also outlined where it
//! saw them.
//!
//! The window also stands in for the hand detector: held number keys become
//! raised fingers, sent to [`SimPoseSource`](crate::pose::SimPoseSource) as a
//! [`KeySnapshot`] every frame.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use finger_state::{Finger, FingerSet, Hand};

use crate::pose::{BoundingBox, KeySnapshot, SimInput};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:        usize = 720;
pub const WIN_H:        usize = 360;
const PANEL_Y:          usize = 60;
const BOX_W:            usize = 48;
const BOX_H:            usize = 90;
const BOX_GAP:          usize = 10;
const LEFT_PANEL_X:     usize = 40;
const RIGHT_PANEL_X:    usize = WIN_W / 2 + 20;
const LABEL_Y:          usize = PANEL_Y + BOX_H + 40;
const LABEL_SCALE:      usize = 6;
const STATUS_Y:         usize = WIN_H - 44;
const BG_COLOR:         u32   = 0xFF1A1A2E;
const RAISED_COLOR:     u32   = 0xFFFFD700;  // gold
const LOWERED_COLOR:    u32   = 0xFF3A3A5A;
const ABSENT_COLOR:     u32   = 0xFF24243A;
const TEXT_BG:          u32   = 0xFF0F3460;
const BBOX_COLOR:       u32   = 0xFF55DD88;

/// Key for each finger slot, thumb first.
const LEFT_KEYS:  [Key; 5] = [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5];
const RIGHT_KEYS: [Key; 5] = [Key::Key6, Key::Key7, Key::Key8, Key::Key9, Key::Key0];

// ════════════════════════════════════════════════════════════════════════════
// SessionView: what one frame shows
// ════════════════════════════════════════════════════════════════════════════

/// Snapshot of session state for one rendered frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionView {
    pub mode:    String,
    /// Stored finger vectors, left then right.
    pub fingers: [FingerSet; 2],
    /// Hands seen in the latest frame.
    pub present: [bool; 2],
    /// Where the detector saw each hand, when it reports that.
    pub bboxes:  [Option<BoundingBox>; 2],
    /// Chord label or song hint, while fresh.
    pub label:   Option<String>,
    pub status:  String,
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay
// ════════════════════════════════════════════════════════════════════════════

pub struct Overlay {
    window: Window,
    buf:    Vec<u32>,
    sim_tx: Sender<SimInput>,
}

impl Overlay {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, String> {
        let mut window = Window::new(
            "Air Chords — raise fingers to play",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Overlay {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Sample the keyboard and forward it as a [`KeySnapshot`].
    /// Returns false when the user asked to quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }
        if self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_down(Key::Escape)
        {
            return false;
        }

        let held = |keys: &[Key; 5]| {
            let mut raised = FingerSet::LOWERED;
            for (finger, key) in Finger::ALL.iter().zip(keys) {
                raised.set(*finger, self.window.is_key_down(*key));
            }
            raised
        };

        let snapshot = KeySnapshot {
            left:          held(&LEFT_KEYS),
            right:         held(&RIGHT_KEYS),
            left_present:  self.window.is_key_down(Key::LeftShift),
            right_present: self.window.is_key_down(Key::RightShift),
        };
        let _ = self.sim_tx.send(SimInput::Keys(snapshot));
        true
    }

    /// Render one frame.
    pub fn render(&mut self, view: &SessionView) {
        self.buf.fill(BG_COLOR);

        self.draw_label(&view.mode, 10, 10, 0xFFAADDFF, 2);

        for hand in Hand::ALL {
            let x = match hand {
                Hand::Left  => LEFT_PANEL_X,
                Hand::Right => RIGHT_PANEL_X,
            };
            let i = hand.index();
            self.draw_hand(x, view.fingers[i], view.present[i]);
            let title = format!("{} hand", hand);
            let color = if view.present[i] { 0xFFEEEEEE } else { 0xFF777777 };
            self.draw_label(&title, x, PANEL_Y - 16, color, 2);

            if let Some(bbox) = view.bboxes[i] {
                let (bx, by, bw, bh) = bbox_rect(bbox);
                self.draw_border(bx, by, bw, bh, BBOX_COLOR);
                self.draw_label(hand.name(), bx + 2, by + 2, BBOX_COLOR, 1);
            }
        }

        if let Some(label) = &view.label {
            let w = label.chars().count() * 4 * LABEL_SCALE;
            let x = WIN_W.saturating_sub(w) / 2;
            self.draw_label(label, x, LABEL_Y, 0xFFFF5555, LABEL_SCALE);
        }

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, TEXT_BG);
        self.draw_label(&view.status, 10, STATUS_Y + 8, 0xFFEEEEEE, 2);

        // ── Key legend ────────────────────────────────────────────────────
        self.draw_label(
            "1-5 = left thumb..pinky  6-0 = right  shift = hand in view  q = quit",
            10, WIN_H - 14, 0xFF888888, 1,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Hand panel ────────────────────────────────────────────────────────

    fn draw_hand(&mut self, x: usize, fingers: FingerSet, present: bool) {
        for finger in Finger::ALL {
            let bx = x + finger.index() * (BOX_W + BOX_GAP);
            let color = match (present, fingers.is_raised(finger)) {
                (_, true)      => RAISED_COLOR,
                (true, false)  => LOWERED_COLOR,
                (false, false) => ABSENT_COLOR,
            };
            // Raised fingers stand taller.
            let lift = if fingers.is_raised(finger) { 0 } else { BOX_H / 3 };
            self.fill_rect(bx, PANEL_Y + lift, BOX_W, BOX_H - lift, color);
            self.draw_border(bx, PANEL_Y + lift, BOX_W, BOX_H - lift, 0xFF000000);

            let initial: String = finger.name().chars().take(1).collect();
            self.draw_label(&initial, bx + BOX_W / 2 - 3, PANEL_Y + BOX_H - 14, 0xFF000000, 2);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y+h).min(WIN_H) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// Minimal 3×5 bitmap font, each pixel drawn as a `scale`×`scale` block.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let mut cx = x;
        for ch in text.chars() {
            for (row, &bits) in char_glyph(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

/// Window rectangle for a frame-fraction box, scaled to the area above the
/// status bar.
fn bbox_rect(b: BoundingBox) -> (usize, usize, usize, usize) {
    let sx = |v: f32| (v.clamp(0.0, 1.0) * WIN_W as f32) as usize;
    let sy = |v: f32| (v.clamp(0.0, 1.0) * STATUS_Y as f32) as usize;
    (sx(b.x), sy(b.y), sx(b.w), sy(b.h))
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_lowercase() {
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
        'a' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '[' => [0b110, 0b100, 0b100, 0b100, 0b110],
        ']' => [0b011, 0b001, 0b001, 0b001, 0b011],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}
