//! Hardware backends for the bias actuator node.
//!
//! A simulated rig backs development and the CLI's default mode; the
//! `hardware` feature adds GPIO implementations of the same seams; the
//! file-backed store persists the committed bias state across power cycles.

pub mod error;
#[cfg(feature = "hardware")]
pub mod gpio;
pub mod store;

pub use error::HwError;
pub use store::FileBiasStore;

use bias_traits::{BoxError, BrakeLight, LimitSwitches, StepDirection, StepperDrive, SwitchInput};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
struct RigInner {
    travel: u16,
    carriage: u16,
}

/// Simulated actuator: a carriage on a rail between two end-of-travel
/// switches. The drive moves the carriage one step at a time (stalling
/// against the ends, as the real mechanism would) and the switches read its
/// position.
#[derive(Debug, Clone)]
pub struct SimulatedRig {
    inner: Rc<RefCell<RigInner>>,
}

impl SimulatedRig {
    /// A rig with `travel_steps` of usable travel, the carriage starting
    /// `start_pos` steps from the left switch.
    pub fn new(travel_steps: u16, start_pos: u16) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RigInner {
                travel: travel_steps,
                carriage: start_pos.min(travel_steps),
            })),
        }
    }

    pub fn drive(&self) -> SimulatedDrive {
        SimulatedDrive {
            inner: self.inner.clone(),
        }
    }

    pub fn switches(&self) -> SimulatedSwitches {
        SimulatedSwitches {
            inner: self.inner.clone(),
        }
    }

    pub fn carriage(&self) -> u16 {
        self.inner.borrow().carriage
    }
}

pub struct SimulatedDrive {
    inner: Rc<RefCell<RigInner>>,
}

impl StepperDrive for SimulatedDrive {
    fn step(&mut self, direction: StepDirection) -> Result<(), BoxError> {
        let mut rig = self.inner.borrow_mut();
        match direction {
            StepDirection::Forward => {
                if rig.carriage < rig.travel {
                    rig.carriage += 1;
                }
            }
            StepDirection::Reverse => rig.carriage = rig.carriage.saturating_sub(1),
        }
        tracing::trace!(?direction, carriage = rig.carriage, "sim step");
        Ok(())
    }
}

pub struct SimulatedSwitches {
    inner: Rc<RefCell<RigInner>>,
}

impl LimitSwitches for SimulatedSwitches {
    fn left_closed(&mut self) -> Result<bool, BoxError> {
        Ok(self.inner.borrow().carriage == 0)
    }

    fn right_closed(&mut self) -> Result<bool, BoxError> {
        let rig = self.inner.borrow();
        Ok(rig.carriage >= rig.travel)
    }
}

/// Switch input that is never active; the simulated vehicle has no brake
/// pedal or kill circuit wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct InactiveSwitch;

impl SwitchInput for InactiveSwitch {
    fn sample(&mut self) -> Result<bool, BoxError> {
        Ok(false)
    }
}

/// Brake light that logs transitions instead of driving a pin.
#[derive(Debug, Default)]
pub struct SimulatedBrakeLight {
    on: bool,
}

impl BrakeLight for SimulatedBrakeLight {
    fn set(&mut self, on: bool) -> Result<(), BoxError> {
        if on != self.on {
            tracing::debug!(on, "brake light");
            self.on = on;
        }
        Ok(())
    }
}
