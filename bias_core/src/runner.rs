//! The module service loop: interlock polling plus FSM arbitration.
//!
//! One iteration refreshes the debounced interlocks, then lets the
//! arbitrator advance exactly one step of whichever FSM is active. The loop
//! never suspends beyond the bounded step/settle delays inside a tick and
//! the idle pacing sleep.

use crate::error::Result;
use crate::intake::RequestSender;
use crate::interlock::InterlockMonitor;
use crate::module::{BiasModule, BiasReadback};
use crate::status::ModuleState;
use bias_traits::{BiasState, BiasStore, BrakeLight, Clock, LimitSwitches, StatusReporter,
    StepperDrive, SwitchInput};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Pacing between loop iterations; also the interlock sampling period.
const LOOP_PERIOD: Duration = Duration::from_millis(5);

pub struct ControlLoop<D, L, S, B, K, W, R> {
    module: BiasModule<D, L, S>,
    monitor: InterlockMonitor<B, K, W>,
    reporter: R,
    clock: Arc<dyn Clock + Send + Sync>,
    shutdown: Arc<AtomicBool>,
}

impl<D, L, S, B, K, W, R> ControlLoop<D, L, S, B, K, W, R>
where
    D: StepperDrive,
    L: LimitSwitches,
    S: BiasStore,
    B: SwitchInput,
    K: SwitchInput,
    W: BrakeLight,
    R: StatusReporter,
{
    pub fn new(
        module: BiasModule<D, L, S>,
        monitor: InterlockMonitor<B, K, W>,
        reporter: R,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let clock = module.clock();
        Self {
            module,
            monitor,
            reporter,
            clock,
            shutdown,
        }
    }

    pub fn sender(&self) -> RequestSender {
        self.module.sender()
    }

    pub fn readback(&self) -> BiasReadback {
        self.module.readback()
    }

    pub fn position(&self) -> BiasState {
        self.module.position()
    }

    /// Run until the shutdown flag is set.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("bias module service loop started");
        while !self.shutdown.load(Ordering::Relaxed) {
            self.iterate()?;
        }
        tracing::info!("bias module service loop stopped");
        Ok(())
    }

    /// Run until every latched request has been serviced and the module is
    /// back at Idle, then return the committed travel state. One-shot
    /// commands use this instead of [`run`](Self::run).
    pub fn run_until_idle(&mut self) -> Result<BiasState> {
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }
            let state = self.iterate()?;
            if state == ModuleState::Idle && !self.module.has_pending() {
                break;
            }
        }
        Ok(self.module.position())
    }

    fn iterate(&mut self) -> Result<ModuleState> {
        let interlocks = self.monitor.poll(&mut self.reporter)?;
        let state = self.module.tick(interlocks, &mut self.reporter)?;
        self.clock.sleep(LOOP_PERIOD);
        Ok(state)
    }
}
