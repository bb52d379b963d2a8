// Core types shared by the acquisition loop, the normalizer and the handlers.

use std::fmt;
use std::time::Instant;

/// One radiometric frame as delivered by the sensor driver.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFrame {
    pub width: usize,
    pub height: usize,
    pub samples: Vec<u16>, // row-major, length = width * height
    pub min_raw: u16,      // driver-reported minimum over the frame
    pub max_raw: u16,      // driver-reported maximum over the frame
    pub sequence: u64,     // increases by one for every frame the sensor captures
    pub captured_at: Instant,
}

impl RawFrame {
    /// Build a frame and compute min/max from the samples themselves.
    pub fn from_samples(width: usize, height: usize, samples: Vec<u16>, sequence: u64) -> Self {
        let min_raw = samples.iter().copied().min().unwrap_or(0);
        let max_raw = samples.iter().copied().max().unwrap_or(0);
        Self {
            width,
            height,
            samples,
            min_raw,
            max_raw,
            sequence,
            captured_at: Instant::now(),
        }
    }

    /// Sample at (x, y), or None when the coordinate lies outside the frame.
    pub fn sample(&self, x: usize, y: usize) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples.get(y * self.width + x).copied()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

/// Window pixels, each entry 0x00RRGGBB for minifb.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }
}

/// Sensor gain state as reported back by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GainMode {
    High,
    Low,
    Auto,
}

impl fmt::Display for GainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GainMode::High => write!(f, "High"),
            GainMode::Low => write!(f, "Low"),
            GainMode::Auto => write!(f, "Auto"),
        }
    }
}

/// Pointer position in screen (window) pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorQuery {
    pub x: f32,
    pub y: f32,
}

impl CursorQuery {
    /// Map a screen coordinate back onto a `width` x `height` frame that is shown
    /// magnified by `display_scale`. None when the point falls outside the frame.
    pub fn frame_coords(&self, display_scale: u32, width: usize, height: usize) -> Option<(usize, usize)> {
        if !self.x.is_finite() || !self.y.is_finite() || self.x < 0.0 || self.y < 0.0 {
            return None;
        }
        let scale = display_scale.max(1) as f32;
        let fx = (self.x / scale).floor() as usize;
        let fy = (self.y / scale).floor() as usize;
        if fx >= width || fy >= height {
            return None;
        }
        Some((fx, fy))
    }
}

/// Result of a temperature lookup under the cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemperatureReading {
    pub x: usize,
    pub y: usize,
    pub temperature: f64,
    pub raw: u16,
    pub min_raw: u16,
    pub max_raw: u16,
}

impl fmt::Display for TemperatureReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temp: {:.2} - Raw: {} [{},{}]",
            self.temperature, self.raw, self.min_raw, self.max_raw
        )
    }
}
