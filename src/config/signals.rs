use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use std::collections::BTreeSet;
use super::Validate;
use crate::output::ChannelId;
use crate::simulation::{Approach, Lamp, APPROACH_COUNT};

/// Output lines wired to one approach's signal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApproachPins {
    pub id: u8,
    pub red: ChannelId,
    pub yellow: ChannelId,
    pub green: ChannelId,
}

impl ApproachPins {
    pub fn approach(&self) -> Approach {
        Approach(self.id)
    }

    pub fn channel(&self, lamp: Lamp) -> ChannelId {
        match lamp {
            Lamp::Red => self.red,
            Lamp::Yellow => self.yellow,
            Lamp::Green => self.green,
        }
    }

    pub fn channels(&self) -> [ChannelId; 3] {
        [self.red, self.yellow, self.green]
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignalsConfig {
    pub approaches: Vec<ApproachPins>,
}

impl Default for SignalsConfig {
    // Reference wiring on a Raspberry Pi header (BCM numbering)
    fn default() -> Self {
        Self {
            approaches: vec![
                ApproachPins { id: 1, red: 2, yellow: 14, green: 3 },
                ApproachPins { id: 2, red: 4, yellow: 15, green: 17 },
                ApproachPins { id: 3, red: 27, yellow: 18, green: 22 },
            ],
        }
    }
}

impl Validate for SignalsConfig {
    fn validate(&self) -> Result<()> {
        if self.approaches.len() != APPROACH_COUNT {
            return Err(anyhow!("Exactly {} approaches must be configured, got {}",
                               APPROACH_COUNT, self.approaches.len()));
        }

        let ids: BTreeSet<u8> = self.approaches.iter().map(|a| a.id).collect();
        let expected: BTreeSet<u8> = (1..=APPROACH_COUNT as u8).collect();
        if ids != expected {
            return Err(anyhow!("Approach ids must be exactly {:?}, got {:?}", expected, ids));
        }

        let mut seen = BTreeSet::new();
        for approach in &self.approaches {
            for channel in approach.channels() {
                if !seen.insert(channel) {
                    return Err(anyhow!("Output channel {} is assigned more than once (approach {})",
                                       channel, approach.id));
                }
            }
        }

        Ok(())
    }
}
