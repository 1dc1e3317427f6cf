use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod clock;
pub mod demand;
pub mod scheduler;
pub mod signal;
pub mod stats;

pub use clock::*;
pub use demand::*;
pub use scheduler::*;
pub use signal::*;
pub use stats::*;

/// Number of approaches at the intersection.
pub const APPROACH_COUNT: usize = 3;

/// One direction of traffic feeding the intersection.
///
/// Ordering follows the approach number and doubles as the tie-break order
/// when two queues have the same length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Approach(pub u8);

impl Approach {
    pub fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lamp {
    Red,
    Yellow,
    Green,
}

impl Lamp {
    pub const ALL: [Lamp; 3] = [Lamp::Red, Lamp::Yellow, Lamp::Green];
}

/// What an approach's signal head is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalState {
    /// Every lamp dark. Initial state and the state after `clear_all`.
    #[default]
    Off,
    Red,
    Yellow,
    Green,
}

/// Operator-requested shutdown, shared between the interrupt listener and the
/// control loop. The control loop polls it before every suspension point.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
