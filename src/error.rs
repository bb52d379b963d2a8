// Crate error type. Every variant states *where* things went wrong.
use thiserror::Error;

use crate::sensor::SensorError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed
    #[error("Failed to enable radiometry: {0}")]
    Radiometry(#[source] SensorError), // Sensor cannot deliver calibrated counts
    #[error("Invalid acquisition mode: {0}")]
    Mode(String),
    #[error("Frame geometry changed from {expected:?} to {actual:?}")]
    FrameGeometry {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("Invalid settings: {0}")]
    Settings(String),
}
