// Simulated Lepton-class sensor.
// A background capture thread renders a room-temperature scene with a warm,
// drifting face and publishes it into a latest-frame slot, the same way a real
// driver's SPI reader thread would.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::calibration::CalibrationModel;
use crate::sensor::{AcquisitionMode, SensorDriver, SensorError};
use crate::types::{GainMode, RawFrame};

pub const LEPTON3_WIDTH: usize = 160;
pub const LEPTON3_HEIGHT: usize = 120;
pub const LEPTON3_FPS: f32 = 8.7;

const AMBIENT_TEMPERATURE: f64 = 22.0;
const FACE_TEMPERATURE: f64 = 36.6;
const NOISE_COUNTS: f32 = 6.0;
// Fixed-pattern drift added per frame until the next FFC.
const DRIFT_PER_FRAME: f32 = 0.25;
const MAX_DRIFT: f32 = 120.0;

#[derive(Clone, Copy, Debug)]
pub struct SimulatedConfig {
    pub width: usize,
    pub height: usize,
    pub fps: f32,
    pub calibration: CalibrationModel,
}

#[cfg(test)]
impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            width: LEPTON3_WIDTH,
            height: LEPTON3_HEIGHT,
            fps: LEPTON3_FPS,
            calibration: CalibrationModel::default(),
        }
    }
}

/// Deterministic xorshift32 RNG for sensor noise.
#[derive(Clone)]
struct Rng32 {
    state: u32,
}

impl Rng32 {
    fn from_seed(seed: u32) -> Self {
        Self { state: seed | 1 }
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in [-1, 1).
    #[inline]
    fn next_signed(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / ((1u32 << 23) as f32) - 1.0
    }
}

struct SensorState {
    mode: AcquisitionMode,
    gain: GainMode,
    drift: f32,
}

struct Slot {
    latest: Option<RawFrame>,
    state: SensorState,
}

struct Shared {
    slot: Mutex<Slot>,
    fresh: Condvar,
    running: AtomicBool,
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, Slot>, SensorError> {
        self.slot.lock().map_err(|_| SensorError::Disconnected)
    }
}

pub struct SimulatedSensor {
    shared: Arc<Shared>,
    capture: Option<JoinHandle<()>>,
    last_returned: Option<u64>,
}

impl SimulatedSensor {
    /// Start the capture thread. Frames begin to appear after one frame period.
    pub fn start(config: SimulatedConfig) -> Self {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                latest: None,
                state: SensorState {
                    mode: AcquisitionMode { radiometry: false, agc: true, rgb: false },
                    gain: GainMode::Auto,
                    drift: 0.0,
                },
            }),
            fresh: Condvar::new(),
            running: AtomicBool::new(true),
        });

        let worker = Arc::clone(&shared);
        let capture = thread::spawn(move || capture_loop(worker, config));

        Self { shared, capture: Some(capture), last_returned: None }
    }
}

impl Drop for SimulatedSensor {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                warn!("simulated capture thread panicked");
            }
        }
    }
}

impl SensorDriver for SimulatedSensor {
    fn configure(&mut self, mode: AcquisitionMode) -> Result<(), SensorError> {
        if !mode.is_consistent() {
            return Err(SensorError::Rejected("AGC cannot run with radiometry enabled".into()));
        }
        self.shared.lock()?.state.mode = mode;
        Ok(())
    }

    fn set_gain_mode(&mut self, mode: GainMode) -> Result<(), SensorError> {
        self.shared.lock()?.state.gain = mode;
        Ok(())
    }

    fn gain_mode(&mut self) -> Result<GainMode, SensorError> {
        Ok(self.shared.lock()?.state.gain)
    }

    fn enable_radiometry(&mut self, enable: bool) -> Result<(), SensorError> {
        let mut slot = self.shared.lock()?;
        if enable && slot.state.mode.agc {
            slot.state.mode.agc = false;
        }
        slot.state.mode.radiometry = enable;
        Ok(())
    }

    fn latest_frame(&mut self, timeout: Duration) -> Option<RawFrame> {
        let last = self.last_returned;
        let is_stale = |s: &mut Slot| match (&s.latest, last) {
            (None, _) => true,
            (Some(f), Some(seq)) => f.sequence <= seq,
            (Some(_), None) => false,
        };

        let slot = self.shared.slot.lock().ok()?;
        let (slot, _) = self.shared.fresh.wait_timeout_while(slot, timeout, is_stale).ok()?;
        let frame = slot.latest.as_ref()?;
        if last.is_some_and(|seq| frame.sequence <= seq) {
            return None;
        }
        self.last_returned = Some(frame.sequence);
        Some(frame.clone())
    }

    fn flat_field_correction(&mut self) -> Result<(), SensorError> {
        self.shared.lock()?.state.drift = 0.0;
        Ok(())
    }

    fn radiometric_flat_field_correction(&mut self) -> Result<(), SensorError> {
        let mut slot = self.shared.lock()?;
        if !slot.state.mode.radiometry {
            return Err(SensorError::Rejected("radiometry is disabled".into()));
        }
        slot.state.drift = 0.0;
        Ok(())
    }
}

/// Sleep one frame period, waking early on stop. False once stopped.
fn wait_for_next_frame(shared: &Shared, period: Duration) -> bool {
    let deadline = Instant::now() + period;
    while shared.running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        // parks may wake spuriously; the deadline decides
        thread::park_timeout(deadline - now);
    }
    false
}

fn capture_loop(shared: Arc<Shared>, config: SimulatedConfig) {
    let period = Duration::from_secs_f32(1.0 / config.fps.max(0.1));
    let mut rng = Rng32::from_seed(0xC0FFEE);
    let started = Instant::now();
    let mut sequence = 0u64;

    while wait_for_next_frame(&shared, period) {
        let Ok(mut slot) = shared.slot.lock() else {
            debug!("sensor slot poisoned, stopping capture");
            return;
        };

        // RGB output carries no 16-bit frames.
        if slot.state.mode.rgb {
            continue;
        }

        let drift = slot.state.drift;
        slot.state.drift = (drift + DRIFT_PER_FRAME).min(MAX_DRIFT);

        let t = started.elapsed().as_secs_f32();
        let samples = render_scene(&config, t, drift, &mut rng);
        slot.latest = Some(RawFrame::from_samples(config.width, config.height, samples, sequence));
        sequence += 1;
        drop(slot);
        shared.fresh.notify_all();
    }
}

/// Ambient background with a slight vertical gradient and a warm gaussian
/// "face" moving on a slow Lissajous path.
fn render_scene(config: &SimulatedConfig, t: f32, drift: f32, rng: &mut Rng32) -> Vec<u16> {
    let (w, h) = (config.width, config.height);
    let cal = &config.calibration;
    let ambient = cal.raw_of(AMBIENT_TEMPERATURE) as f32;
    let face = cal.raw_of(FACE_TEMPERATURE) as f32;

    let cx = w as f32 * (0.5 + 0.3 * (t * 0.35).sin());
    let cy = h as f32 * (0.5 + 0.2 * (t * 0.5).cos());
    let radius = (w.min(h) as f32) * 0.12;
    let denom = 2.0 * radius * radius;

    let mut samples = Vec::with_capacity(w * h);
    for y in 0..h {
        let gradient = (y as f32 / h.max(1) as f32) * 40.0;
        for x in 0..w {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let weight = (-(dx * dx + dy * dy) / denom).exp();
            // Column pattern that FFC removes.
            let pattern = if x % 2 == 0 { drift } else { -drift * 0.5 };
            let v = ambient + gradient + (face - ambient) * weight + pattern + rng.next_signed() * NOISE_COUNTS;
            samples.push(v.round().clamp(0.0, u16::MAX as f32) as u16);
        }
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SimulatedConfig {
        SimulatedConfig { width: 32, height: 24, fps: 200.0, ..SimulatedConfig::default() }
    }

    fn wait_for_frame(sensor: &mut SimulatedSensor) -> RawFrame {
        for _ in 0..200 {
            if let Some(frame) = sensor.latest_frame(Duration::from_millis(20)) {
                return frame;
            }
        }
        panic!("simulated sensor produced no frame");
    }

    #[test]
    fn produces_frames_with_consistent_range() {
        let mut sensor = SimulatedSensor::start(fast_config());
        sensor.configure(AcquisitionMode::radiometric()).unwrap();
        let frame = wait_for_frame(&mut sensor);
        assert_eq!(frame.dimensions(), (32, 24));
        assert_eq!(frame.samples.len(), 32 * 24);
        assert_eq!(frame.min_raw, *frame.samples.iter().min().unwrap());
        assert_eq!(frame.max_raw, *frame.samples.iter().max().unwrap());
        assert!(frame.max_raw > frame.min_raw);
    }

    #[test]
    fn consecutive_frames_advance_sequence() {
        let mut sensor = SimulatedSensor::start(fast_config());
        let a = wait_for_frame(&mut sensor);
        let b = wait_for_frame(&mut sensor);
        assert!(b.sequence > a.sequence);
    }

    #[test]
    fn latest_frame_wait_is_bounded() {
        let mut sensor = SimulatedSensor::start(SimulatedConfig { fps: 0.5, ..fast_config() });
        let started = Instant::now();
        assert!(sensor.latest_frame(Duration::from_millis(30)).is_none());
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[test]
    fn rgb_output_withholds_frames() {
        let mut sensor = SimulatedSensor::start(fast_config());
        sensor
            .configure(AcquisitionMode { radiometry: false, agc: false, rgb: true })
            .unwrap();
        // Drain anything captured before the mode switch.
        while sensor.latest_frame(Duration::from_millis(30)).is_some() {}
        assert!(sensor.latest_frame(Duration::from_millis(50)).is_none());
    }

    #[test]
    fn drop_is_prompt_at_low_frame_rate() {
        let sensor = SimulatedSensor::start(SimulatedConfig { fps: 0.25, ..fast_config() });
        thread::sleep(Duration::from_millis(50));
        let started = Instant::now();
        drop(sensor);
        let took = started.elapsed();
        assert!(took < Duration::from_millis(500), "drop took {took:?}");
    }

    #[test]
    fn radiometric_ffc_needs_radiometry() {
        let mut sensor = SimulatedSensor::start(fast_config());
        assert!(matches!(
            sensor.radiometric_flat_field_correction(),
            Err(SensorError::Rejected(_))
        ));
        sensor.enable_radiometry(true).unwrap();
        assert!(sensor.radiometric_flat_field_correction().is_ok());
        assert!(sensor.flat_field_correction().is_ok());
    }

    #[test]
    fn gain_mode_reads_back() {
        let mut sensor = SimulatedSensor::start(fast_config());
        sensor.set_gain_mode(GainMode::High).unwrap();
        assert_eq!(sensor.gain_mode().unwrap(), GainMode::High);
    }

    #[test]
    fn rejects_agc_with_radiometry() {
        let mut sensor = SimulatedSensor::start(fast_config());
        let mode = AcquisitionMode { radiometry: true, agc: true, rgb: false };
        assert!(sensor.configure(mode).is_err());
    }

    #[test]
    fn face_is_warmer_than_background() {
        let config = SimulatedConfig { width: 64, height: 48, ..SimulatedConfig::default() };
        let mut rng = Rng32::from_seed(1);
        let samples = render_scene(&config, 0.0, 0.0, &mut rng);
        let max = *samples.iter().max().unwrap();
        let temperature = config.calibration.temperature_of(max);
        assert!(temperature > 35.0 && temperature < 38.0, "{temperature}");
    }
}
