// Turns window input into sensor commands and temperature lookups.
//
// Keys: `f` standard flat-field correction, `F` radiometric flat-field
// correction, `q`/`Q`/Escape quit. Pointer moves report the temperature of
// the sensor pixel under the cursor.

use tracing::{info, warn};

use crate::calibration::CalibrationModel;
use crate::display::{ESCAPE, InputEvent};
use crate::run_state::RunState;
use crate::sensor::{SensorDriver, SensorError};
use crate::types::{CursorQuery, RawFrame, TemperatureReading};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    FlatField,
    RadiometricFlatField,
    Quit,
}

impl KeyCommand {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'f' => Some(KeyCommand::FlatField),
            'F' => Some(KeyCommand::RadiometricFlatField),
            'q' | 'Q' | ESCAPE => Some(KeyCommand::Quit),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Ignored,
    Calibrated {
        command: KeyCommand,
        result: Result<(), SensorError>,
    },
    StopRequested,
    Reading(TemperatureReading),
    /// Pointer outside the frame or window, or no frame acquired yet.
    NoData,
}

pub struct InteractionHandler {
    display_scale: u32,
    calibration: CalibrationModel,
}

impl InteractionHandler {
    pub fn new(display_scale: u32, calibration: CalibrationModel) -> Self {
        Self { display_scale: display_scale.max(1), calibration }
    }

    /// `frame` is the most recent complete frame, if any.
    pub fn handle<S: SensorDriver>(
        &self,
        event: InputEvent,
        sensor: &mut S,
        frame: Option<&RawFrame>,
        run_state: &RunState,
    ) -> Outcome {
        match event {
            InputEvent::Closed => {
                run_state.request_stop();
                Outcome::StopRequested
            }
            InputEvent::Key(key) => match KeyCommand::from_key(key) {
                Some(KeyCommand::Quit) => {
                    if run_state.request_stop() {
                        info!("quit requested from keyboard");
                    }
                    Outcome::StopRequested
                }
                Some(command) => self.calibrate(command, sensor),
                None => Outcome::Ignored,
            },
            InputEvent::PointerMoved { x, y } => match self.query(CursorQuery { x, y }, frame) {
                Some(reading) => {
                    info!("{reading}");
                    Outcome::Reading(reading)
                }
                None => Outcome::NoData,
            },
            InputEvent::PointerLeft => Outcome::NoData,
        }
    }

    /// Temperature under a screen-space cursor, bounds-checked against `frame`.
    pub fn query(&self, cursor: CursorQuery, frame: Option<&RawFrame>) -> Option<TemperatureReading> {
        let frame = frame?;
        let (x, y) = cursor.frame_coords(self.display_scale, frame.width, frame.height)?;
        let raw = frame.sample(x, y)?;
        Some(TemperatureReading {
            x,
            y,
            temperature: self.calibration.temperature_of(raw),
            raw,
            min_raw: frame.min_raw,
            max_raw: frame.max_raw,
        })
    }

    fn calibrate<S: SensorDriver>(&self, command: KeyCommand, sensor: &mut S) -> Outcome {
        let (name, result) = match command {
            KeyCommand::FlatField => ("FFC", sensor.flat_field_correction()),
            KeyCommand::RadiometricFlatField => ("Radiometry FFC", sensor.radiometric_flat_field_correction()),
            KeyCommand::Quit => return Outcome::Ignored,
        };
        match &result {
            Ok(()) => info!(" * {name} completed"),
            Err(e) => warn!("{name} failed: {e}"),
        }
        Outcome::Calibrated { command, result }
    }
}
