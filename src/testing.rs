// Test doubles for the sensor and the window.

use std::collections::VecDeque;
use std::time::Duration;

use image::GrayImage;

use crate::display::{Display, InputEvent, Overlay};
use crate::error::Error;
use crate::run_state::RunState;
use crate::sensor::{AcquisitionMode, SensorDriver, SensorError};
use crate::types::{GainMode, RawFrame};

/// Sensor that plays back a fixed script of poll results.
pub struct ScriptedSensor {
    pub mode: Option<AcquisitionMode>,
    pub radiometry: bool,
    pub gain: GainMode,
    pub fail_configure: bool,
    pub fail_radiometry: bool,
    pub fail_gain: bool,
    pub fail_ffc: bool,
    pub ffc_calls: usize,
    pub radiometric_ffc_calls: usize,
    /// One entry per `latest_frame` call; an empty script means "no frame".
    pub script: VecDeque<Option<RawFrame>>,
    pub polls: usize,
}

impl Default for ScriptedSensor {
    fn default() -> Self {
        Self {
            mode: None,
            radiometry: false,
            gain: GainMode::Auto,
            fail_configure: false,
            fail_radiometry: false,
            fail_gain: false,
            fail_ffc: false,
            ffc_calls: 0,
            radiometric_ffc_calls: 0,
            script: VecDeque::new(),
            polls: 0,
        }
    }
}

impl ScriptedSensor {
    pub fn with_script(script: impl IntoIterator<Item = Option<RawFrame>>) -> Self {
        Self { script: script.into_iter().collect(), ..Self::default() }
    }
}

impl SensorDriver for ScriptedSensor {
    fn configure(&mut self, mode: AcquisitionMode) -> Result<(), SensorError> {
        if self.fail_configure {
            return Err(SensorError::Rejected("output mode".into()));
        }
        self.mode = Some(mode);
        Ok(())
    }

    fn set_gain_mode(&mut self, mode: GainMode) -> Result<(), SensorError> {
        if self.fail_gain {
            return Err(SensorError::Rejected("gain".into()));
        }
        self.gain = mode;
        Ok(())
    }

    fn gain_mode(&mut self) -> Result<GainMode, SensorError> {
        Ok(self.gain)
    }

    fn enable_radiometry(&mut self, enable: bool) -> Result<(), SensorError> {
        if self.fail_radiometry {
            return Err(SensorError::Rejected("radiometry".into()));
        }
        self.radiometry = enable;
        Ok(())
    }

    fn latest_frame(&mut self, _timeout: Duration) -> Option<RawFrame> {
        self.polls += 1;
        self.script.pop_front().flatten()
    }

    fn flat_field_correction(&mut self) -> Result<(), SensorError> {
        self.ffc_calls += 1;
        if self.fail_ffc {
            return Err(SensorError::Rejected("ffc".into()));
        }
        Ok(())
    }

    fn radiometric_flat_field_correction(&mut self) -> Result<(), SensorError> {
        self.radiometric_ffc_calls += 1;
        if self.fail_ffc {
            return Err(SensorError::Rejected("radiometric ffc".into()));
        }
        Ok(())
    }
}

/// Window that remembers what it was shown and replays scripted input.
#[derive(Default)]
pub struct RecordingDisplay {
    pub presented: Vec<GrayImage>,
    pub overlays: Vec<Overlay>,
    /// One entry per `poll_events` call.
    pub events: VecDeque<Vec<InputEvent>>,
    pub polls: usize,
    pub timeouts: Vec<Duration>,
    /// Flip this run state during the given poll (1-based), like a Ctrl+C arriving.
    pub interrupt_at: Option<(usize, RunState)>,
}

impl Display for RecordingDisplay {
    fn present(&mut self, frame: &GrayImage, overlay: &Overlay) -> Result<(), Error> {
        self.presented.push(frame.clone());
        self.overlays.push(overlay.clone());
        Ok(())
    }

    fn poll_events(&mut self, timeout: Duration) -> Result<Vec<InputEvent>, Error> {
        self.polls += 1;
        self.timeouts.push(timeout);
        if let Some((at, state)) = &self.interrupt_at {
            if *at == self.polls {
                state.request_stop();
            }
        }
        Ok(self.events.pop_front().unwrap_or_default())
    }
}

/// `width` x `height` frame whose samples ramp from `min` to `max`.
pub fn ramp_frame(width: usize, height: usize, min: u16, max: u16, sequence: u64) -> RawFrame {
    let n = (width * height).max(2);
    let samples = (0..width * height)
        .map(|i| min + ((max - min) as usize * i / (n - 1)) as u16)
        .collect();
    RawFrame::from_samples(width, height, samples, sequence)
}
