// Puts the sensor into raw radiometric mode once, before the acquisition loop starts.

use tracing::{error, info, warn};

use crate::error::Error;
use crate::sensor::{AcquisitionMode, SensorDriver};
use crate::types::GainMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeReport {
    /// False when the sensor refused the output settings.
    pub output_mode: bool,
    /// Gain the sensor reports after configuration, if it answered.
    pub gain: Option<GainMode>,
}

pub struct ModeController {
    mode: AcquisitionMode,
    gain: GainMode,
}

impl ModeController {
    /// Raw 16-bit counts at the given gain. High gain covers the body temperature band.
    pub fn radiometric(gain: GainMode) -> Self {
        Self { mode: AcquisitionMode::radiometric(), gain }
    }

    /// Output settings and gain are best effort; only radiometry is required.
    pub fn apply<S: SensorDriver>(&self, sensor: &mut S) -> Result<ModeReport, Error> {
        if !self.mode.is_consistent() {
            return Err(Error::Mode("AGC must be disabled when radiometry is enabled".into()));
        }

        let output_mode = match sensor.configure(self.mode) {
            Ok(()) => {
                let on_off = |b: bool| if b { "enabled" } else { "disabled" };
                info!(" * Radiometry {}", on_off(self.mode.radiometry));
                info!(" * AGC {}", on_off(self.mode.agc));
                info!(" * RGB {}", on_off(self.mode.rgb));
                true
            }
            Err(e) => {
                warn!("Failed to set output mode: {e}");
                false
            }
        };

        let mut gain = None;
        match sensor.set_gain_mode(self.gain) {
            Ok(()) => match sensor.gain_mode() {
                Ok(mode) => {
                    info!(" * Gain mode: {mode}");
                    gain = Some(mode);
                }
                Err(e) => warn!("Failed to read back gain mode: {e}"),
            },
            Err(e) => warn!("Failed to set gain mode {}: {e}", self.gain),
        }

        if self.mode.radiometry {
            if let Err(e) = sensor.enable_radiometry(true) {
                error!("Failed to enable radiometry!");
                return Err(Error::Radiometry(e));
            }
        }

        Ok(ModeReport { output_mode, gain })
    }
}
