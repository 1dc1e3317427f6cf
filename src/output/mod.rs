use std::path::Path;
use thiserror::Error;

pub mod gpio;
pub mod simulated;

pub use gpio::*;
pub use simulated::*;

/// Numeric identifier of one output line (a GPIO line number on hardware).
pub type ChannelId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl From<bool> for Level {
    fn from(on: bool) -> Self {
        if on {
            Level::High
        } else {
            Level::Low
        }
    }
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to claim output channel {channel}: {reason}")]
    Claim { channel: ChannelId, reason: String },

    #[error("failed to drive channel {channel} {level:?}: {reason}")]
    Write {
        channel: ChannelId,
        level: Level,
        reason: String,
    },

    #[error("channel {0} has not been claimed")]
    Unclaimed(ChannelId),

    #[error("failed to release output channels: {0}")]
    Release(String),
}

/// Output capability the signal controller drives.
///
/// Writes are treated as synchronous and atomic; nothing above this trait
/// retries a failed call.
pub trait OutputBackend {
    fn claim(&mut self, channel: ChannelId) -> Result<(), OutputError>;
    fn write(&mut self, channel: ChannelId, level: Level) -> Result<(), OutputError>;
    fn release_all(&mut self) -> Result<(), OutputError>;
    fn get_name(&self) -> &'static str;
}

pub enum OutputDriver {
    Simulated(SimulatedOutput),
    Gpio(ChipOutput),
}

impl OutputDriver {
    pub fn new_simulated() -> Self {
        OutputDriver::Simulated(SimulatedOutput::new())
    }

    pub fn new_gpio(chip: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(OutputDriver::Gpio(ChipOutput::open_chip(chip)?))
    }
}

impl OutputBackend for OutputDriver {
    fn claim(&mut self, channel: ChannelId) -> Result<(), OutputError> {
        match self {
            OutputDriver::Simulated(backend) => backend.claim(channel),
            OutputDriver::Gpio(backend) => backend.claim(channel),
        }
    }

    fn write(&mut self, channel: ChannelId, level: Level) -> Result<(), OutputError> {
        match self {
            OutputDriver::Simulated(backend) => backend.write(channel, level),
            OutputDriver::Gpio(backend) => backend.write(channel, level),
        }
    }

    fn release_all(&mut self) -> Result<(), OutputError> {
        match self {
            OutputDriver::Simulated(backend) => backend.release_all(),
            OutputDriver::Gpio(backend) => backend.release_all(),
        }
    }

    fn get_name(&self) -> &'static str {
        match self {
            OutputDriver::Simulated(backend) => backend.get_name(),
            OutputDriver::Gpio(backend) => backend.get_name(),
        }
    }
}
