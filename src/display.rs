// What the acquisition loop needs from a window: show an 8-bit frame, hand back input.

use std::time::Duration;

use image::GrayImage;

use crate::error::Error;

pub const ESCAPE: char = '\u{1b}';

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// A key went down. Letters keep their case (shift+f is 'F').
    Key(char),
    /// Pointer position in window pixels.
    PointerMoved { x: f32, y: f32 },
    /// The pointer left the window.
    PointerLeft,
    /// The user closed the window.
    Closed,
}

/// Extra information drawn on top of the thermal image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlay {
    pub cursor: Option<(i32, i32)>,
    pub lines: Vec<String>,
}

pub trait Display {
    /// Show `frame` (already magnified to window size) with `overlay` on top.
    fn present(&mut self, frame: &GrayImage, overlay: &Overlay) -> Result<(), Error>;

    /// Wait up to `timeout` and return whatever input arrived.
    fn poll_events(&mut self, timeout: Duration) -> Result<Vec<InputEvent>, Error>;
}
