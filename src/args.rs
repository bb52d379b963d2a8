use std::time::Duration;

use clap::Parser;

use crate::acquisition::LoopConfig;
use crate::calibration::{CalibrationModel, DEFAULT_SCALE_FACTOR};
use crate::error::Error;
use crate::normalize::RawRange;
use crate::simulated::{LEPTON3_FPS, LEPTON3_HEIGHT, LEPTON3_WIDTH, SimulatedConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Live radiometric thermal view for fever screening")]
pub struct Args {
    /// Window title
    #[arg(long, default_value = "Temperature stream")]
    pub title: String,

    /// Window pixels per sensor pixel
    #[arg(long, default_value_t = 3)]
    pub display_scale: u32,

    /// Temperature per raw sensor count
    #[arg(long, default_value_t = DEFAULT_SCALE_FACTOR)]
    pub scale_factor: f64,

    /// Longest wait for keyboard/mouse input per iteration, in milliseconds
    #[arg(long, default_value_t = 5)]
    pub poll_ms: u64,

    /// Longest wait for a sensor frame per iteration, in milliseconds
    #[arg(long, default_value_t = 5)]
    pub frame_timeout_ms: u64,

    /// Lowest raw count of a fixed gray scale (needs --range-max)
    #[arg(long, requires = "range_max")]
    pub range_min: Option<u16>,

    /// Highest raw count of a fixed gray scale (needs --range-min)
    #[arg(long, requires = "range_min")]
    pub range_max: Option<u16>,

    /// Simulated sensor width in pixels
    #[arg(long, default_value_t = LEPTON3_WIDTH)]
    pub sensor_width: usize,

    /// Simulated sensor height in pixels
    #[arg(long, default_value_t = LEPTON3_HEIGHT)]
    pub sensor_height: usize,

    /// Simulated sensor frame rate
    #[arg(long, default_value_t = LEPTON3_FPS)]
    pub sensor_fps: f32,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Validated settings derived from [`Args`].
#[derive(Clone, Debug)]
pub struct Settings {
    pub title: String,
    pub calibration: CalibrationModel,
    pub acquisition: LoopConfig,
    pub sensor: SimulatedConfig,
}

impl Settings {
    pub fn window_size(&self) -> (usize, usize) {
        let scale = self.acquisition.display_scale as usize;
        (self.sensor.width * scale, self.sensor.height * scale)
    }
}

impl TryFrom<&Args> for Settings {
    type Error = Error;

    fn try_from(args: &Args) -> Result<Self, Error> {
        if args.display_scale == 0 {
            return Err(Error::Settings("display scale must be at least 1".into()));
        }
        if args.sensor_width == 0 || args.sensor_height == 0 {
            return Err(Error::Settings("sensor dimensions must be non-zero".into()));
        }
        if !(args.sensor_fps.is_finite() && args.sensor_fps > 0.0) {
            return Err(Error::Settings(format!("invalid sensor frame rate {}", args.sensor_fps)));
        }
        let calibration = CalibrationModel::new(args.scale_factor)?;
        let range = match (args.range_min, args.range_max) {
            (Some(min), Some(max)) if max <= min => {
                return Err(Error::Settings(format!("empty raw range [{min}, {max}]")));
            }
            (Some(min), Some(max)) => Some(RawRange::new(min, max)),
            _ => None,
        };

        Ok(Self {
            title: args.title.clone(),
            calibration,
            acquisition: LoopConfig {
                display_scale: args.display_scale,
                frame_timeout: Duration::from_millis(args.frame_timeout_ms),
                poll_interval: Duration::from_millis(args.poll_ms),
                range,
            },
            sensor: SimulatedConfig {
                width: args.sensor_width,
                height: args.sensor_height,
                fps: args.sensor_fps,
                calibration,
            },
        })
    }
}
