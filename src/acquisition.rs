// The acquisition loop: poll the sensor, normalize, present, route input.
//
// One cooperative loop owns every frame buffer. Both waits per iteration are
// bounded (the sensor poll and the window poll), so a stop request is seen
// within one iteration.

use std::time::{Duration, Instant};

use image::GrayImage;
use tracing::{debug, info, warn};

use crate::display::{Display, InputEvent, Overlay};
use crate::error::Error;
use crate::interaction::{InteractionHandler, Outcome};
use crate::normalize::{RawRange, magnify_into, normalize_into};
use crate::run_state::RunState;
use crate::sensor::SensorDriver;
use crate::types::{RawFrame, TemperatureReading};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopConfig {
    /// Integer magnification between sensor pixels and window pixels.
    pub display_scale: u32,
    /// Longest wait for the sensor to deliver a frame.
    pub frame_timeout: Duration,
    /// Longest wait for window input; also the loop's yield point.
    pub poll_interval: Duration,
    /// Fixed raw range for the gray scale; None rescales each frame to its own range.
    pub range: Option<RawRange>,
}

#[cfg(test)]
impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            display_scale: 3,
            frame_timeout: Duration::from_millis(5),
            poll_interval: Duration::from_millis(5),
            range: None,
        }
    }
}

/// Time between two successful frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInterval {
    pub period: Duration,
    pub fps: f64,
}

/// Instantaneous and once-per-second averaged frame rate. Diagnostics only.
#[derive(Debug, Default)]
pub struct FrameRate {
    last_frame: Option<Instant>,
    window_start: Option<Instant>,
    frames_in_window: u32,
    average: Option<f64>,
}

impl FrameRate {
    /// Record a frame at `now`. None for the very first frame.
    pub fn tick(&mut self, now: Instant) -> Option<FrameInterval> {
        let window_start = *self.window_start.get_or_insert(now);
        self.frames_in_window += 1;
        let window = now.duration_since(window_start);
        if window >= Duration::from_secs(1) {
            self.average = Some(self.frames_in_window as f64 / window.as_secs_f64());
            self.frames_in_window = 0;
            self.window_start = Some(now);
        }

        let previous = self.last_frame.replace(now)?;
        let period = now.duration_since(previous);
        let fps = if period.is_zero() { 0.0 } else { 1.0 / period.as_secs_f64() };
        Some(FrameInterval { period, fps })
    }

    pub fn average_fps(&self) -> Option<f64> {
        self.average
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// A new frame was normalized and shown.
    Rendered,
    /// No new frame this cycle; input was still polled.
    Missed,
    Stopped,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub misses: u64,
}

/// Buffers owned by the loop. The handler only ever sees `frame` between
/// iterations, so it always reads a complete frame.
#[derive(Default)]
struct Session {
    frame: Option<RawFrame>,
    gray: Option<GrayImage>,
    shown: Option<GrayImage>,
    /// Window position of the last pointer move, until the pointer leaves.
    crosshair: Option<(i32, i32)>,
    reading: Option<TemperatureReading>,
    frames: u64,
    misses: u64,
}

pub struct AcquisitionLoop<S, D> {
    sensor: S,
    display: D,
    handler: InteractionHandler,
    run_state: RunState,
    config: LoopConfig,
    rate: FrameRate,
    session: Session,
}

impl<S: SensorDriver, D: Display> AcquisitionLoop<S, D> {
    pub fn new(sensor: S, display: D, handler: InteractionHandler, run_state: RunState, config: LoopConfig) -> Self {
        Self {
            sensor,
            display,
            handler,
            run_state,
            config,
            rate: FrameRate::default(),
            session: Session::default(),
        }
    }

    /// Loop until the run state is stopped.
    pub fn run(&mut self) -> Result<LoopSummary, Error> {
        while self.step()? != Step::Stopped {}
        let summary = self.summary();
        info!("acquisition stopped after {} frames ({} empty polls)", summary.frames, summary.misses);
        Ok(summary)
    }

    /// One iteration: fetch, render, poll input, check the run state.
    pub fn step(&mut self) -> Result<Step, Error> {
        if !self.run_state.is_running() {
            return Ok(Step::Stopped);
        }

        let step = if self.fetch()? {
            self.render()?;
            Step::Rendered
        } else {
            self.session.misses += 1;
            Step::Missed
        };

        let events = self.display.poll_events(self.config.poll_interval)?;
        for event in events {
            self.dispatch(event);
        }

        if !self.run_state.is_running() {
            return Ok(Step::Stopped);
        }
        Ok(step)
    }

    pub fn summary(&self) -> LoopSummary {
        LoopSummary { frames: self.session.frames, misses: self.session.misses }
    }

    #[cfg(test)]
    pub fn latest_frame(&self) -> Option<&RawFrame> {
        self.session.frame.as_ref()
    }

    #[cfg(test)]
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    #[cfg(test)]
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Take the next frame from the sensor. False when nothing new arrived.
    fn fetch(&mut self) -> Result<bool, Error> {
        let Some(frame) = self.sensor.latest_frame(self.config.frame_timeout) else {
            debug!("no frame available");
            return Ok(false);
        };

        if frame.samples.len() != frame.width * frame.height {
            warn!(
                "dropping malformed frame: {} samples for {}x{}",
                frame.samples.len(),
                frame.width,
                frame.height
            );
            return Ok(false);
        }

        if let Some(current) = &self.session.frame {
            if current.sequence == frame.sequence {
                debug!("frame {} already shown", frame.sequence);
                return Ok(false);
            }
            if current.dimensions() != frame.dimensions() {
                return Err(Error::FrameGeometry {
                    expected: current.dimensions(),
                    actual: frame.dimensions(),
                });
            }
        } else {
            info!("first frame: {}x{}", frame.width, frame.height);
        }

        if let Some(interval) = self.rate.tick(frame.captured_at) {
            debug!(
                "> Frame period: {} usec - FPS: {:.2}",
                interval.period.as_micros(),
                interval.fps
            );
        }

        self.session.frame = Some(frame);
        self.session.frames += 1;
        Ok(true)
    }

    fn render(&mut self) -> Result<(), Error> {
        let overlay = self.overlay();
        let Session { frame, gray, shown, .. } = &mut self.session;
        let Some(frame) = frame.as_ref() else {
            return Ok(());
        };

        let range = self.config.range.unwrap_or_else(|| RawRange::of(frame));
        let gray = gray.get_or_insert_with(|| GrayImage::new(frame.width as u32, frame.height as u32));
        normalize_into(frame, range, gray);
        let shown = shown.get_or_insert_with(|| GrayImage::new(0, 0));
        magnify_into(gray, self.config.display_scale, shown);

        self.display.present(shown, &overlay)
    }

    fn dispatch(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMoved { x, y } => self.session.crosshair = Some((x as i32, y as i32)),
            InputEvent::PointerLeft => self.session.crosshair = None,
            _ => {}
        }
        let outcome = self
            .handler
            .handle(event, &mut self.sensor, self.session.frame.as_ref(), &self.run_state);
        match outcome {
            Outcome::Reading(reading) => self.session.reading = Some(reading),
            Outcome::NoData => self.session.reading = None,
            _ => {}
        }
    }

    fn overlay(&self) -> Overlay {
        let mut lines = Vec::with_capacity(2);
        if let Some(r) = &self.session.reading {
            lines.push(format!("T:{:.1}C R:{} [{},{}]", r.temperature, r.raw, r.min_raw, r.max_raw));
        }
        if let Some(fps) = self.rate.average_fps() {
            lines.push(format!("FPS: {fps:.1}"));
        }
        Overlay {
            cursor: self.session.crosshair,
            lines,
        }
    }
}
