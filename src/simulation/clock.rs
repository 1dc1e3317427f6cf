use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Blocking suspension capability. A sleep in progress is never cut short.
pub trait Delay {
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock delays, optionally sped up or slowed down.
#[derive(Debug, Clone, Copy)]
pub struct ThreadClock {
    time_scale: f64,
}

impl ThreadClock {
    pub fn new(time_scale: f64) -> Self {
        Self { time_scale }
    }
}

impl Default for ThreadClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Delay for ThreadClock {
    fn sleep(&self, duration: Duration) {
        let scaled = duration.mul_f64(self.time_scale);
        if !scaled.is_zero() {
            std::thread::sleep(scaled);
        }
    }
}

#[derive(Debug, Default)]
struct ManualClockState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

/// Simulated time. Sleeping advances the clock instantly and is recorded.
///
/// Clones share the same timeline, so a clone handed to the output bank can
/// timestamp writes against the sleeps taken by the controller.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualClockState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualClockState> {
        // The state is plain data, a poisoned lock still holds a usable value
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    pub fn sleep_count(&self) -> usize {
        self.lock().sleeps.len()
    }

    /// Drops the recorded sleeps without rewinding elapsed time.
    pub fn clear_sleeps(&self) {
        self.lock().sleeps.clear();
    }
}

impl Delay for ManualClock {
    fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.elapsed += duration;
        state.sleeps.push(duration);
    }
}
