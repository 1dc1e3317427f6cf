use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use std::time::Duration;
use super::Validate;

/// How long an approach shows yellow when leaving green, in seconds.
pub const YELLOW_DWELL_SECS: f64 = 0.5;
/// Time to let one vehicle through, in seconds.
pub const SERVICE_INTERVAL_SECS: f64 = 0.3;
/// All-dark pause between two cycles, in seconds.
pub const CYCLE_PAUSE_SECS: f64 = 0.5;
/// Longest single delay accepted after scaling, in seconds.
pub const MAX_DELAY_SECS: f64 = 3600.0;

pub const MIN_QUEUE: u32 = 1;
pub const MAX_QUEUE: u32 = 20;
/// Vehicles served per green phase before the signal moves on.
pub const BATCH_SIZE: u32 = 10;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub yellow_dwell: f64,
    pub service_interval: f64,
    pub cycle_pause: f64,
    /// Multiplier applied to every real sleep. Below 1.0 runs faster.
    pub time_scale: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            yellow_dwell: YELLOW_DWELL_SECS,
            service_interval: SERVICE_INTERVAL_SECS,
            cycle_pause: CYCLE_PAUSE_SECS,
            time_scale: 1.0,
        }
    }
}

impl TimingConfig {
    pub fn yellow_dwell(&self) -> Duration {
        Duration::from_secs_f64(self.yellow_dwell)
    }

    pub fn service_interval(&self) -> Duration {
        Duration::from_secs_f64(self.service_interval)
    }

    pub fn cycle_pause(&self) -> Duration {
        Duration::from_secs_f64(self.cycle_pause)
    }
}

impl Validate for TimingConfig {
    fn validate(&self) -> Result<()> {
        let durations = [
            ("yellow_dwell", self.yellow_dwell),
            ("service_interval", self.service_interval),
            ("cycle_pause", self.cycle_pause),
        ];
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(anyhow!("Time scale must be positive, got {}", self.time_scale));
        }

        for (name, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(anyhow!("Timing '{}' must be a finite, non-negative number of seconds, got {}", name, value));
            }
            if value > MAX_DELAY_SECS || value * self.time_scale > MAX_DELAY_SECS {
                return Err(anyhow!(
                    "Timing '{}' of {}s at time scale {} exceeds the {}s limit",
                    name, value, self.time_scale, MAX_DELAY_SECS
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemandConfig {
    pub min_queue: u32,
    pub max_queue: u32,
    pub batch_size: u32,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            min_queue: MIN_QUEUE,
            max_queue: MAX_QUEUE,
            batch_size: BATCH_SIZE,
        }
    }
}

impl Validate for DemandConfig {
    fn validate(&self) -> Result<()> {
        if self.min_queue == 0 {
            return Err(anyhow!("Minimum queue length must be at least 1"));
        }

        if self.min_queue > self.max_queue {
            return Err(anyhow!("Minimum queue length {} exceeds maximum {}", self.min_queue, self.max_queue));
        }

        if self.batch_size == 0 {
            return Err(anyhow!("Batch size must be greater than zero"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RandomConfig {
    pub seed: Option<u64>,
}
