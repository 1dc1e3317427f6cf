//! GPIO output bank built on `embedded_hal::digital::OutputPin`.
//!
//! `PinOutput` owns one pin per claimed channel. Where the pins come from is
//! a `PinProvider`; on Linux that is a GPIO character device (`CdevChip`).

use super::{ChannelId, Level, OutputBackend, OutputError};
use anyhow::{Context, Result};
use embedded_hal::digital::OutputPin;
use gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::CdevPin;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// Consumer label shown by `gpioinfo` for claimed lines.
const CONSUMER: &str = "traffic-signal";

/// Hands out output pins by channel number.
pub trait PinProvider {
    type Pin: OutputPin;

    /// Requests `channel` as an output. The pin should start low.
    fn request(&mut self, channel: ChannelId) -> Result<Self::Pin, String>;
}

/// Output bank driving one `OutputPin` per claimed channel.
///
/// Pins are dropped on release, which hands the lines back to the provider.
pub struct PinOutput<P: PinProvider> {
    provider: P,
    pins: BTreeMap<ChannelId, P::Pin>,
}

impl<P: PinProvider> PinOutput<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            pins: BTreeMap::new(),
        }
    }

    pub fn claimed(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.pins.keys().copied()
    }

    fn drive(pin: &mut P::Pin, level: Level) -> Result<(), String> {
        let result = match level {
            Level::Low => pin.set_low(),
            Level::High => pin.set_high(),
        };
        result.map_err(|e| format!("{:?}", e))
    }
}

impl<P: PinProvider> OutputBackend for PinOutput<P> {
    fn claim(&mut self, channel: ChannelId) -> Result<(), OutputError> {
        let claim_error = move |reason: String| OutputError::Claim { channel, reason };

        let mut pin = self.provider.request(channel).map_err(claim_error)?;
        Self::drive(&mut pin, Level::Low).map_err(claim_error)?;

        self.pins.insert(channel, pin);
        log::debug!("Claimed GPIO line {}", channel);
        Ok(())
    }

    fn write(&mut self, channel: ChannelId, level: Level) -> Result<(), OutputError> {
        let pin = self.pins.get_mut(&channel).ok_or(OutputError::Unclaimed(channel))?;
        Self::drive(pin, level).map_err(|reason| OutputError::Write {
            channel,
            level,
            reason,
        })
    }

    fn release_all(&mut self) -> Result<(), OutputError> {
        let released = std::mem::take(&mut self.pins);
        log::debug!("Released {} GPIO lines", released.len());
        Ok(())
    }

    fn get_name(&self) -> &'static str {
        "gpio"
    }
}

/// Linux GPIO character device, e.g. `/dev/gpiochip0`.
pub struct CdevChip {
    chip: Chip,
}

impl CdevChip {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let chip = Chip::new(path)
            .with_context(|| format!("Failed to open GPIO chip {}", path.display()))?;
        log::info!("Opened GPIO chip {} ({} lines)", chip.name(), chip.num_lines());
        Ok(Self { chip })
    }
}

impl PinProvider for CdevChip {
    type Pin = CdevPin;

    fn request(&mut self, channel: ChannelId) -> Result<CdevPin, String> {
        let handle = self
            .chip
            .get_line(channel)
            .and_then(|line| line.request(LineRequestFlags::OUTPUT, 0, CONSUMER))
            .map_err(|e| e.to_string())?;
        CdevPin::new(handle).map_err(|e| e.to_string())
    }
}

pub type ChipOutput = PinOutput<CdevChip>;

impl ChipOutput {
    pub fn open_chip(path: impl AsRef<Path>) -> Result<Self> {
        Ok(PinOutput::new(CdevChip::open(path)?))
    }
}
