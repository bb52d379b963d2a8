// Linear radiometric calibration.
//
// The sensor is assumed linear over its High gain range ([-10, 140] degrees
// over 14 bits), so a single scale factor maps raw counts to temperature.

use crate::error::Error;

/// Temperature per raw count: 150 / (2^14 - 1).
pub const DEFAULT_SCALE_FACTOR: f64 = 0.0092;

pub const NORMAL_TEMPERATURE: f64 = 30.0;
pub const WARNING_TEMPERATURE: f64 = 37.0;
pub const FEVER_TEMPERATURE: f64 = 37.5;
pub const MAX_TEMPERATURE: f64 = 42.0;

/// A threshold kept in both calibrated and raw form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threshold {
    pub temperature: f64,
    pub raw: u16,
}

/// People screening thresholds, derived once at startup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub normal: Threshold,
    pub warning: Threshold,
    pub fever: Threshold,
    pub max: Threshold,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationModel {
    scale_factor: f64,
    thresholds: Thresholds,
}

impl CalibrationModel {
    pub fn new(scale_factor: f64) -> Result<Self, Error> {
        if !scale_factor.is_finite() || scale_factor <= 0.0 {
            return Err(Error::Settings(format!(
                "scale factor must be a positive number, got {scale_factor}"
            )));
        }
        Ok(Self::with_scale_factor(scale_factor))
    }

    fn with_scale_factor(scale_factor: f64) -> Self {
        let threshold = |temperature: f64| Threshold {
            temperature,
            raw: raw_for(temperature, scale_factor),
        };
        let thresholds = Thresholds {
            normal: threshold(NORMAL_TEMPERATURE),
            warning: threshold(WARNING_TEMPERATURE),
            fever: threshold(FEVER_TEMPERATURE),
            max: threshold(MAX_TEMPERATURE),
        };
        Self { scale_factor, thresholds }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    #[inline]
    pub fn temperature_of(&self, raw: u16) -> f64 {
        raw as f64 * self.scale_factor
    }

    /// Nearest raw count for `temperature`, saturating at the ends of the u16 range.
    #[inline]
    pub fn raw_of(&self, temperature: f64) -> u16 {
        raw_for(temperature, self.scale_factor)
    }
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self::with_scale_factor(DEFAULT_SCALE_FACTOR)
    }
}

// `as` saturates on overflow and maps NaN to 0.
fn raw_for(temperature: f64, scale_factor: f64) -> u16 {
    (temperature / scale_factor).round() as u16
}
