use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of per-approach queue lengths.
pub trait DemandSource {
    /// Integer drawn from `[low, high]`, both ends inclusive.
    fn uniform_int(&mut self, low: u32, high: u32) -> u32;
}

pub struct RandomDemand {
    rng: StdRng,
}

impl RandomDemand {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };

        Self { rng }
    }
}

impl DemandSource for RandomDemand {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Replays a fixed sequence of queue lengths, wrapping around at the end.
///
/// Values outside the requested bounds are clamped so the inclusive-range
/// contract of [`DemandSource`] still holds.
#[derive(Debug, Clone)]
pub struct ScriptedDemand {
    script: Vec<u32>,
    pending: VecDeque<u32>,
}

impl ScriptedDemand {
    pub fn new(script: impl IntoIterator<Item = u32>) -> Self {
        let script: Vec<u32> = script.into_iter().collect();
        Self {
            pending: script.iter().copied().collect(),
            script,
        }
    }
}

impl DemandSource for ScriptedDemand {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        if self.pending.is_empty() {
            self.pending.extend(self.script.iter().copied());
        }

        match self.pending.pop_front() {
            Some(value) => value.clamp(low, high.max(low)),
            None => low, // empty script
        }
    }
}
