//! Module-level arbitration between the adjustment and calibration FSMs.
//!
//! The arbitrator owns the actuator: exactly one FSM progresses per tick,
//! and a latched request for the other operation stays pending until the
//! active one commits. Adjustment is checked first when both are pending.

use crate::adjust::AdjustFsm;
use crate::calibrate::CalibrateFsm;
use crate::error::{BiasError, Result, map_hw_error};
use crate::intake::{RequestIntake, RequestSender};
use crate::position;
use crate::status::{FsmStatus, Interlocks, ModuleState, TickInputs};
use bias_traits::{
    BiasState, BiasStore, Clock, LimitSwitches, MonotonicClock, StatusReporter, StepperDrive,
};
use eyre::WrapErr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Cloneable, lock-free view of the last committed bias percentage. Handed
/// to the transport so a current-bias poll can be answered at any time.
#[derive(Debug, Clone)]
pub struct BiasReadback(Arc<AtomicU8>);

impl BiasReadback {
    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }
}

enum Commit {
    Adjustment,
    Calibration,
}

pub struct BiasModule<D, L, S> {
    drive: D,
    switches: L,
    store: S,
    clock: Arc<dyn Clock + Send + Sync>,
    intake: RequestIntake,
    position: BiasState,
    state: ModuleState,
    adjust: AdjustFsm,
    calibrate: CalibrateFsm,
    readback: Arc<AtomicU8>,
}

impl<D, L, S> core::fmt::Debug for BiasModule<D, L, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BiasModule")
            .field("state", &self.state)
            .field("position", &self.position)
            .finish()
    }
}

impl<D: StepperDrive, L: LimitSwitches, S: BiasStore> BiasModule<D, L, S> {
    /// Mint a producer handle for the receive context.
    pub fn sender(&self) -> RequestSender {
        self.intake.sender()
    }

    /// Lock-free view of the last committed bias, for request-reply service.
    pub fn readback(&self) -> BiasReadback {
        BiasReadback(self.readback.clone())
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn position(&self) -> BiasState {
        self.position
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }

    /// True while a latched request awaits service.
    pub fn has_pending(&self) -> bool {
        self.intake.adjustment().is_some() || self.intake.calibration()
    }

    /// Advance the module by one control-loop tick: route at Idle, or
    /// invoke one step of the active FSM and commit on completion.
    pub fn tick(
        &mut self,
        interlocks: Interlocks,
        reporter: &mut dyn StatusReporter,
    ) -> Result<ModuleState> {
        match self.state {
            ModuleState::Idle => {
                // Adjustment wins when both are pending.
                if self.intake.adjustment().is_some() {
                    tracing::debug!("adjustment request accepted");
                    self.state = ModuleState::Adjusting;
                } else if self.intake.calibration() {
                    tracing::debug!("calibration request accepted");
                    self.state = ModuleState::Calibrating;
                }
            }
            ModuleState::Adjusting => {
                let inputs = self.sample_inputs(interlocks)?;
                // The pending flag stays latched until the commit below, so
                // the payload is present for every Adjusting tick.
                let requested = self.intake.adjustment().unwrap_or(self.position.bias_actual);
                let status = self.adjust.step(
                    &mut self.position,
                    requested,
                    inputs,
                    &mut self.drive,
                    self.clock.as_ref(),
                )?;
                if status == FsmStatus::Finished {
                    self.commit(Commit::Adjustment, reporter)?;
                    self.state = ModuleState::Idle;
                }
            }
            ModuleState::Calibrating => {
                let inputs = self.sample_inputs(interlocks)?;
                let status = self.calibrate.step(
                    &mut self.position,
                    inputs,
                    &mut self.drive,
                    self.clock.as_ref(),
                )?;
                if status == FsmStatus::Finished {
                    self.commit(Commit::Calibration, reporter)?;
                    self.state = ModuleState::Idle;
                }
            }
        }
        Ok(self.state)
    }

    fn sample_inputs(&mut self, interlocks: Interlocks) -> Result<TickInputs> {
        let left_eot = self
            .switches
            .left_closed()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("left EOT switch")?;
        let right_eot = self
            .switches
            .right_closed()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("right EOT switch")?;
        Ok(TickInputs {
            interlocks,
            left_eot,
            right_eot,
        })
    }

    fn commit(&mut self, kind: Commit, reporter: &mut dyn StatusReporter) -> Result<()> {
        self.store
            .store(self.position)
            .map_err(|e| eyre::Report::new(BiasError::Storage(e.to_string())))
            .wrap_err("persist bias state")?;
        match kind {
            Commit::Adjustment => {
                self.readback
                    .store(self.position.bias_actual, Ordering::Release);
                tracing::info!(
                    bias_actual = self.position.bias_actual,
                    step_pos = self.position.step_pos,
                    "bias adjustment committed"
                );
                if let Err(e) = reporter.adjustment_success(self.position.bias_actual) {
                    tracing::warn!(error = %e, "adjustment report failed");
                }
                self.intake.clear_adjustment();
            }
            Commit::Calibration => {
                tracing::info!(
                    step_range = self.position.step_range,
                    step_pos = self.position.step_pos,
                    "bias calibration committed"
                );
                if let Err(e) = reporter.calibration_success() {
                    tracing::warn!(error = %e, "calibration report failed");
                }
                self.intake.clear_calibration();
            }
        }
        Ok(())
    }
}

/// Build a statically-dispatched module from concrete seam implementations.
/// Loads the persisted bias state (power-on defaults on first boot) and
/// arms the bias readback with the loaded value.
pub fn build_module<D, L, S>(
    drive: D,
    switches: L,
    mut store: S,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<BiasModule<D, L, S>>
where
    D: StepperDrive + 'static,
    L: LimitSwitches + 'static,
    S: BiasStore + 'static,
{
    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };

    let loaded = store
        .load()
        .map_err(|e| eyre::Report::new(BiasError::Storage(e.to_string())))
        .wrap_err("load bias state")?;
    let position = match loaded {
        Some(raw) => {
            let state = position::sanitize(raw);
            if state != raw {
                tracing::warn!(?raw, ?state, "persisted bias state out of range, clamped");
            }
            state
        }
        None => {
            tracing::info!("no persisted bias state, using power-on defaults");
            position::boot_default()
        }
    };
    tracing::info!(
        step_range = position.step_range,
        step_pos = position.step_pos,
        bias_actual = position.bias_actual,
        "bias state loaded"
    );

    let readback = Arc::new(AtomicU8::new(position.bias_actual));
    Ok(BiasModule {
        drive,
        switches,
        store,
        clock,
        intake: RequestIntake::new(),
        position,
        state: ModuleState::Idle,
        adjust: AdjustFsm::new(),
        calibrate: CalibrateFsm::new(),
        readback,
    })
}
