// Window + software drawing utilities.
// Visual effects provided here:
// 1) A window that shows the magnified 8-bit thermal image.
// 2) A crosshair that follows your mouse.
// 3) A tiny 5x7 bitmap font to render the temperature readout on top.

use std::thread;
use std::time::Duration;

use image::GrayImage;
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use crate::display::{Display, ESCAPE, InputEvent, Overlay};
use crate::error::Error;
use crate::types::FrameBuffer;

const CROSSHAIR_COLOR: u32 = 0x00_FF_CC_33;
const TEXT_COLOR: u32 = 0x00_FF_FF_FF;
const LINE_HEIGHT: i32 = 10;

pub struct Drawer {
    window: Window, // the on-screen window you see
    screen: FrameBuffer,
    pending: Vec<InputEvent>,
    last_mouse: Option<(f32, f32)>,
}

impl Drawer {
    /// Create a window of `width` x `height` window pixels.
    /// Visual: a new empty window appears with your chosen title.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self {
            window,
            screen: FrameBuffer::new(width, height),
            pending: Vec::new(),
            last_mouse: None,
        })
    }

    // Key/mouse state is only valid right after an update, so every update is
    // followed by a collect; otherwise presses seen by `present` would be lost.
    fn collect_input(&mut self) {
        let shift = self.window.is_key_down(Key::LeftShift) || self.window.is_key_down(Key::RightShift);
        for key in self.window.get_keys_pressed(KeyRepeat::No) {
            if let Some(ch) = key_char(key, shift) {
                self.pending.push(InputEvent::Key(ch));
            }
        }

        let pos = self.window.get_mouse_pos(MouseMode::Discard);
        if let Some(event) = pointer_event(&mut self.last_mouse, pos) {
            self.pending.push(event);
        }

        if !self.window.is_open() {
            self.pending.push(InputEvent::Closed);
        }
    }
}

impl Display for Drawer {
    /// Push the pixels for this frame to the screen.
    /// Visual: the window immediately displays the new thermal image.
    fn present(&mut self, frame: &GrayImage, overlay: &Overlay) -> Result<(), Error> {
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        if self.screen.width != w || self.screen.height != h {
            self.screen = FrameBuffer::new(w, h);
        }
        for (dst, &v) in self.screen.pixels.iter_mut().zip(frame.as_raw().iter()) {
            *dst = v as u32 * 0x00_01_01_01; // gray -> 0x00RRGGBB
        }

        if let Some((cx, cy)) = overlay.cursor {
            draw_crosshair(&mut self.screen, cx, cy, 12, CROSSHAIR_COLOR);
        }
        for (i, line) in overlay.lines.iter().enumerate() {
            draw_text_5x7(&mut self.screen, 8, 8 + i as i32 * LINE_HEIGHT, line, TEXT_COLOR);
        }

        self.window
            .update_with_buffer(&self.screen.pixels, self.screen.width, self.screen.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        self.collect_input();
        Ok(())
    }

    fn poll_events(&mut self, timeout: Duration) -> Result<Vec<InputEvent>, Error> {
        thread::sleep(timeout);
        self.window.update();
        self.collect_input();
        Ok(std::mem::take(&mut self.pending))
    }
}

/// Characters the interaction handler understands; everything else is dropped here.
fn key_char(key: Key, shift: bool) -> Option<char> {
    match key {
        Key::F if shift => Some('F'),
        Key::F => Some('f'),
        Key::Q if shift => Some('Q'),
        Key::Q => Some('q'),
        Key::Escape => Some(ESCAPE),
        _ => None,
    }
}

/// Pointer transition since the last update: a move, a leave, or nothing.
fn pointer_event(last: &mut Option<(f32, f32)>, pos: Option<(f32, f32)>) -> Option<InputEvent> {
    match pos {
        Some(p) if *last != Some(p) => {
            *last = Some(p);
            Some(InputEvent::PointerMoved { x: p.0, y: p.1 })
        }
        Some(_) => None,
        None => last.take().map(|_| InputEvent::PointerLeft),
    }
}

/* ---------- Software drawing: pixels, crosshair, tiny bitmap font ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Draw a thin line between (x0,y0) and (x1,y1) using Bresenham.
fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draw a small crosshair centered at (cx,cy).
/// Visual: a "+" shape (with a tiny gap at the center) marks the queried pixel.
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    draw_line(fb, cx - size, cy, cx - 2, cy, color);
    draw_line(fb, cx + 2, cy, cx + size, cy, color);
    draw_line(fb, cx, cy - size, cx, cy - 2, color);
    draw_line(fb, cx, cy + 2, cx, cy + size, color);
    put_pixel(fb, cx, cy, color);
}

/* ---------- 5x7 bitmap font (ASCII subset for "T:36.8C R:4000 [3000,4100]" and "FPS: 8.7") ---------- */

/// Return a 5x7 glyph bitmap for a limited character set.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00110,0b00100,0b01000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '[' => g!(0b01110,0b01000,0b01000,0b01000,0b01000,0b01000,0b01110),
        ']' => g!(0b01110,0b00010,0b00010,0b00010,0b00010,0b00010,0b01110),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y), with a 1-pixel black shadow for contrast.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32) {
    if let Some(rows) = glyph5x7(ch) {
        for (offset, c) in [(1, 0x00000000), (0, color)] {
            for (ry, rowbits) in rows.iter().enumerate() {
                for rx in 0..5 {
                    if (rowbits & (1 << (4 - rx))) != 0 {
                        put_pixel(fb, x + rx + offset, y + ry as i32 + offset, c);
                    }
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color);
        x += 6; // 5 pixels glyph width + 1 pixel spacing
    }
}
