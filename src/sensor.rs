// Capability interface of a radiometric thermal sensor.
//
// The acquisition loop only talks to the sensor through [`SensorDriver`], so a
// hardware backend, the [`crate::simulated`] sensor or a scripted test double can
// be swapped in without touching the loop.

use std::time::Duration;

use thiserror::Error;

use crate::types::{GainMode, RawFrame};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("command rejected by sensor: {0}")]
    Rejected(String),
    #[error("sensor disconnected")]
    Disconnected,
}

/// Output settings pushed to the sensor at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquisitionMode {
    pub radiometry: bool,
    pub agc: bool,
    pub rgb: bool,
}

impl AcquisitionMode {
    /// 16-bit calibrated counts: radiometry on, AGC and RGB output off.
    pub fn radiometric() -> Self {
        Self { radiometry: true, agc: false, rgb: false }
    }

    /// AGC compresses the dynamic range and destroys absolute counts,
    /// so it can't be combined with radiometry.
    pub fn is_consistent(&self) -> bool {
        !(self.radiometry && self.agc)
    }
}

pub trait SensorDriver {
    fn configure(&mut self, mode: AcquisitionMode) -> Result<(), SensorError>;

    fn set_gain_mode(&mut self, mode: GainMode) -> Result<(), SensorError>;

    fn gain_mode(&mut self) -> Result<GainMode, SensorError>;

    fn enable_radiometry(&mut self, enable: bool) -> Result<(), SensorError>;

    /// Most recent frame, waiting at most `timeout` for one to exist.
    ///
    /// May hand back the same frame (same `sequence`) on consecutive calls when
    /// the sensor has not captured anything new.
    fn latest_frame(&mut self, timeout: Duration) -> Option<RawFrame>;

    fn flat_field_correction(&mut self) -> Result<(), SensorError>;

    fn radiometric_flat_field_correction(&mut self) -> Result<(), SensorError>;
}
