// What you SEE:
// • A magnified grayscale thermal image, rescaled every frame to its own min/max.
// • Move the mouse: the temperature under the crosshair is printed and drawn on top.
// • f runs a flat-field correction, F (shift+f) a radiometric one.
// • q, Q, ESC, closing the window or Ctrl+C quits.

mod acquisition;
mod args;
mod calibration;
mod display;
mod draw;
mod error;
mod interaction;
mod mode;
mod normalize;
mod run_state;
mod sensor;
mod simulated;
mod types;

#[cfg(test)]
mod testing;

use anyhow::Context;
use clap::Parser;
use tracing::{Level, info, warn};

use acquisition::AcquisitionLoop;
use args::{Args, Settings};
use draw::Drawer;
use interaction::InteractionHandler;
use mode::ModeController;
use run_state::RunState;
use simulated::SimulatedSensor;
use types::GainMode;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let settings = Settings::try_from(&args)?;
    info!("Check Fever App");

    /* --- Ctrl+C -> stop request, observed by the loop once per iteration --- */
    let run_state = RunState::new();
    let on_signal = run_state.clone();
    ctrlc::set_handler(move || {
        if on_signal.request_stop() {
            info!("Ctrl+C pressed...");
        }
    })
    .context("installing Ctrl+C handler")?;

    /* --- Sensor: raw 16-bit radiometric counts at High gain --- */
    let mut sensor = SimulatedSensor::start(settings.sensor);
    let report = ModeController::radiometric(GainMode::High)
        .apply(&mut sensor)
        .context("sensor cannot deliver radiometric frames")?;
    if !report.output_mode {
        warn!("sensor kept its previous output settings");
    }
    if report.gain != Some(GainMode::High) {
        warn!("sensor is not confirmed in High gain; readings may be off");
    }

    let t = settings.calibration.thresholds();
    for (name, th) in [("normal", t.normal), ("warning", t.warning), ("fever", t.fever), ("max", t.max)] {
        info!(" * {name} threshold: {:.1} (raw {})", th.temperature, th.raw);
    }

    /* --- Window sized to the magnified sensor frame --- */
    let (w, h) = settings.window_size();
    let drawer = Drawer::new(&settings.title, w, h)?;

    let handler = InteractionHandler::new(settings.acquisition.display_scale, settings.calibration);
    let mut acquisition = AcquisitionLoop::new(sensor, drawer, handler, run_state, settings.acquisition);
    let summary = acquisition.run()?;
    if summary.frames == 0 {
        warn!("no frames were received from the sensor");
    }

    Ok(())
}
