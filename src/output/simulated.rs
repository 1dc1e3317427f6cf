use super::{ChannelId, Level, OutputBackend, OutputError};
use crate::simulation::ManualClock;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// One recorded write, stamped with simulated time when a clock is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputWrite {
    pub at: Duration,
    pub channel: ChannelId,
    pub level: Level,
}

/// In-memory output bank.
#[derive(Debug, Default)]
pub struct SimulatedOutput {
    levels: BTreeMap<ChannelId, Level>,
    history: Option<Vec<OutputWrite>>,
    clock: Option<ManualClock>,
    refuse_claims: HashSet<ChannelId>,
    writes_before_failure: Option<usize>,
    writes: usize,
    releases: usize,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps every write, stamped with the clock's simulated time.
    pub fn recording(clock: ManualClock) -> Self {
        Self {
            history: Some(Vec::new()),
            clock: Some(clock),
            ..Self::default()
        }
    }

    /// Makes `claim` fail for `channel`, as a misconfigured line would.
    pub fn refuse_claim(mut self, channel: ChannelId) -> Self {
        self.refuse_claims.insert(channel);
        self
    }

    /// Lets `count` writes succeed, then fails every later write.
    pub fn fail_writes_after(mut self, count: usize) -> Self {
        self.writes_before_failure = Some(count);
        self
    }

    pub fn level(&self, channel: ChannelId) -> Option<Level> {
        self.levels.get(&channel).copied()
    }

    pub fn is_claimed(&self, channel: ChannelId) -> bool {
        self.levels.contains_key(&channel)
    }

    pub fn claimed_count(&self) -> usize {
        self.levels.len()
    }

    pub fn history(&self) -> &[OutputWrite] {
        self.history.as_deref().unwrap_or(&[])
    }

    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn release_count(&self) -> usize {
        self.releases
    }
}

impl OutputBackend for SimulatedOutput {
    fn claim(&mut self, channel: ChannelId) -> Result<(), OutputError> {
        if self.refuse_claims.contains(&channel) {
            return Err(OutputError::Claim {
                channel,
                reason: "line is busy".to_string(),
            });
        }
        self.levels.insert(channel, Level::Low);
        Ok(())
    }

    fn write(&mut self, channel: ChannelId, level: Level) -> Result<(), OutputError> {
        if let Some(limit) = self.writes_before_failure {
            if self.writes >= limit {
                return Err(OutputError::Write {
                    channel,
                    level,
                    reason: "injected write failure".to_string(),
                });
            }
        }

        let slot = self
            .levels
            .get_mut(&channel)
            .ok_or(OutputError::Unclaimed(channel))?;
        *slot = level;
        self.writes += 1;

        if let Some(history) = self.history.as_mut() {
            let at = self.clock.as_ref().map(|c| c.elapsed()).unwrap_or_default();
            history.push(OutputWrite { at, channel, level });
        }
        log::trace!("Simulated channel {} -> {:?}", channel, level);
        Ok(())
    }

    fn release_all(&mut self) -> Result<(), OutputError> {
        self.levels.clear();
        self.releases += 1;
        Ok(())
    }

    fn get_name(&self) -> &'static str {
        "simulated"
    }
}
