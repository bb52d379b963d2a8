// Process-wide stop request, shared between the signal handler and the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Clone, Debug, Default)]
pub struct RunState {
    stop: Arc<AtomicBool>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop. Returns true only for the call that flipped the flag.
    pub fn request_stop(&self) -> bool {
        self.stop
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn stop_transitions_exactly_once() {
        let state = RunState::new();
        assert!(state.is_running());
        assert!(state.request_stop());
        assert!(!state.request_stop());
        assert!(!state.is_running());
    }

    #[test]
    fn clones_share_the_flag() {
        let state = RunState::new();
        let handler_side = state.clone();
        let flipped = thread::spawn(move || handler_side.request_stop()).join().unwrap();
        assert!(flipped);
        assert!(!state.is_running());
    }

    #[test]
    fn concurrent_requests_flip_once() {
        let state = RunState::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = state.clone();
                thread::spawn(move || s.request_stop())
            })
            .collect();
        let flips = handles.into_iter().map(|h| h.join().unwrap()).filter(|f| *f).count();
        assert_eq!(flips, 1);
    }
}
