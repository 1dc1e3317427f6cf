//! Signal controller: turns "give approach X the green" into an exclusive,
//! correctly sequenced set of output writes.
//!
//! At most one approach shows green at any instant. Leaving green always goes
//! through a yellow dwell before red, entering green is immediate.

use super::{Approach, Delay, Lamp, ShutdownSignal, SignalState};
use crate::config::ApproachPins;
use crate::output::{ChannelId, Level, OutputBackend, OutputError};
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("approach {0} is not wired to this controller")]
    UnknownApproach(Approach),

    #[error("signal outputs have not been initialized")]
    NotInitialized,
}

/// How an approach came to hold the green.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// No approach was active before.
    Entered,
    /// The approach already had the green.
    Held,
    /// Another approach went through yellow to red first.
    Switched { from: Approach },
}

pub struct SignalController<O: OutputBackend, D: Delay> {
    output: O,
    clock: D,
    shutdown: ShutdownSignal,
    pins: Vec<ApproachPins>,
    states: BTreeMap<Approach, SignalState>,
    active: Option<Approach>,
    yellow_dwell: Duration,
    initialized: bool,
    released: bool,
}

impl<O: OutputBackend, D: Delay> SignalController<O, D> {
    pub fn new(
        output: O,
        clock: D,
        pins: &[ApproachPins],
        yellow_dwell: Duration,
        shutdown: ShutdownSignal,
    ) -> Self {
        let mut pins = pins.to_vec();
        pins.sort_by_key(|p| p.id);

        let states = pins
            .iter()
            .map(|p| (p.approach(), SignalState::Off))
            .collect();

        Self {
            output,
            clock,
            shutdown,
            pins,
            states,
            active: None,
            yellow_dwell,
            initialized: false,
            released: false,
        }
    }

    /// Claims every output line and drives it low.
    pub fn initialize(&mut self) -> Result<(), SignalError> {
        let channels: Vec<ChannelId> = self.pins.iter().flat_map(|p| p.channels()).collect();

        for channel in channels {
            self.output.claim(channel)?;
            self.output.write(channel, Level::Low)?;
        }

        for state in self.states.values_mut() {
            *state = SignalState::Off;
        }
        self.active = None;
        self.initialized = true;
        self.released = false;

        log::info!("Initialized {} approaches on {} outputs",
                   self.pins.len(), self.output.get_name());
        Ok(())
    }

    /// Steady state for one phase: `approach` green, every other approach red.
    pub fn set_active(&mut self, approach: Approach) -> Result<(), SignalError> {
        let target = self.pins_for(approach)?;

        // Everything else goes red before the target's green comes on
        let others: Vec<ApproachPins> = self.pins.iter().copied().filter(|p| p.id != target.id).collect();
        for pins in others {
            self.drive(&pins, Lamp::Green, false)?;
            self.drive(&pins, Lamp::Yellow, false)?;
            self.drive(&pins, Lamp::Red, true)?;
            self.states.insert(pins.approach(), SignalState::Red);
        }

        self.drive(&target, Lamp::Yellow, false)?;
        self.drive(&target, Lamp::Red, false)?;
        self.drive(&target, Lamp::Green, true)?;
        self.states.insert(approach, SignalState::Green);
        self.active = Some(approach);

        log::debug!("{} green", approach);
        Ok(())
    }

    /// Takes `approach` from green through the yellow dwell to red.
    ///
    /// Other approaches are left untouched. Returns `Break` without sleeping
    /// if shutdown was requested, leaving the approach on yellow.
    pub fn transition_to_red(&mut self, approach: Approach) -> Result<ControlFlow<()>, SignalError> {
        let pins = self.pins_for(approach)?;

        self.drive(&pins, Lamp::Green, false)?;
        self.drive(&pins, Lamp::Yellow, true)?;
        self.states.insert(approach, SignalState::Yellow);
        log::debug!("{} yellow", approach);

        if self.shutdown.is_requested() {
            return Ok(ControlFlow::Break(()));
        }
        self.clock.sleep(self.yellow_dwell);

        self.drive(&pins, Lamp::Yellow, false)?;
        self.drive(&pins, Lamp::Red, true)?;
        self.states.insert(approach, SignalState::Red);
        if self.active == Some(approach) {
            self.active = None;
        }

        log::debug!("{} red", approach);
        Ok(ControlFlow::Continue(()))
    }

    /// Hands the green to `approach`, dwelling the previous holder on yellow
    /// first when it is a different approach.
    pub fn activate(&mut self, approach: Approach) -> Result<ControlFlow<(), Activation>, SignalError> {
        self.pins_for(approach)?;

        let activation = match self.active {
            Some(previous) if previous == approach => Activation::Held,
            Some(previous) => {
                if self.transition_to_red(previous)?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
                Activation::Switched { from: previous }
            }
            None => Activation::Entered,
        };

        self.set_active(approach)?;
        Ok(ControlFlow::Continue(activation))
    }

    /// Every lamp dark. Not the same as all-red.
    pub fn clear_all(&mut self) -> Result<(), SignalError> {
        if !self.initialized {
            return Err(SignalError::NotInitialized);
        }

        let channels: Vec<ChannelId> = self.pins.iter().flat_map(|p| p.channels()).collect();
        for channel in channels {
            self.output.write(channel, Level::Low)?;
        }

        for state in self.states.values_mut() {
            *state = SignalState::Off;
        }
        self.active = None;
        Ok(())
    }

    /// Darkens every lamp and hands the output lines back.
    pub fn shutdown(mut self) -> Result<(), SignalError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), SignalError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        // Release is attempted even when the clear fails, the clear error wins
        let cleared = if self.initialized { self.clear_all() } else { Ok(()) };
        let released = self.output.release_all();
        self.initialized = false;

        cleared?;
        released?;
        log::info!("Released {} outputs", self.output.get_name());
        Ok(())
    }

    fn pins_for(&self, approach: Approach) -> Result<ApproachPins, SignalError> {
        self.pins
            .iter()
            .copied()
            .find(|p| p.approach() == approach)
            .ok_or(SignalError::UnknownApproach(approach))
    }

    fn drive(&mut self, pins: &ApproachPins, lamp: Lamp, on: bool) -> Result<(), SignalError> {
        if !self.initialized {
            return Err(SignalError::NotInitialized);
        }
        self.output.write(pins.channel(lamp), Level::from(on))?;
        Ok(())
    }

    pub fn state(&self, approach: Approach) -> Option<SignalState> {
        self.states.get(&approach).copied()
    }

    pub fn states(&self) -> impl Iterator<Item = (Approach, SignalState)> + '_ {
        self.states.iter().map(|(a, s)| (*a, *s))
    }

    pub fn active(&self) -> Option<Approach> {
        self.active
    }

    pub fn approaches(&self) -> Vec<Approach> {
        self.pins.iter().map(|p| p.approach()).collect()
    }

    pub fn pins(&self) -> &[ApproachPins] {
        &self.pins
    }

    pub fn clock(&self) -> &D {
        &self.clock
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl<O: OutputBackend, D: Delay> Drop for SignalController<O, D> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.release() {
            log::error!("Failed to reset signal outputs during cleanup: {}", e);
        }
    }
}
