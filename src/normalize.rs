// Rescales 16-bit radiometric frames into 8-bit gray images for the window.
// Runs once per acquired frame, so the hot path writes into a reused buffer.

use image::{GrayImage, Luma};

use crate::types::RawFrame;

/// Gray level used for every pixel when the range collapses (max <= min).
pub const FLAT_FRAME_LEVEL: u8 = 128;

/// Raw-count interval mapped onto [0, 255].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawRange {
    pub min: u16,
    pub max: u16,
}

impl RawRange {
    pub fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    /// The driver-reported range of `frame`.
    pub fn of(frame: &RawFrame) -> Self {
        Self { min: frame.min_raw, max: frame.max_raw }
    }

    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }
}

/// Normalize `frame` into `out`, reallocating `out` only if its size differs.
pub fn normalize_into(frame: &RawFrame, range: RawRange, out: &mut GrayImage) {
    let (w, h) = (frame.width as u32, frame.height as u32);
    if out.dimensions() != (w, h) {
        *out = GrayImage::new(w, h);
    }

    if range.is_degenerate() {
        for px in out.pixels_mut() {
            *px = Luma([FLAT_FRAME_LEVEL]);
        }
        return;
    }

    let min = range.min as f64;
    let scale = 255.0 / (range.max as f64 - min);
    for (dst, &sample) in out.iter_mut().zip(frame.samples.iter()) {
        let v = ((sample as f64 - min) * scale).clamp(0.0, 255.0);
        *dst = v.round() as u8;
    }
}

/// Allocating convenience wrapper around [`normalize_into`].
#[cfg(test)]
pub fn normalize(frame: &RawFrame, range: RawRange) -> GrayImage {
    let mut out = GrayImage::new(frame.width as u32, frame.height as u32);
    normalize_into(frame, range, &mut out);
    out
}

/// Nearest-neighbour magnification into `out`, so each sensor pixel becomes a
/// `factor` x `factor` block. `out` is reallocated only if its size differs.
pub fn magnify_into(frame: &GrayImage, factor: u32, out: &mut GrayImage) {
    let factor = factor.max(1);
    let (w, h) = frame.dimensions();
    if out.dimensions() != (w * factor, h * factor) {
        *out = GrayImage::new(w * factor, h * factor);
    }
    for (x, y, px) in out.enumerate_pixels_mut() {
        *px = *frame.get_pixel(x / factor, y / factor);
    }
}
