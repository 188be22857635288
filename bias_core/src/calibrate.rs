//! Bias calibration finite-state machine: travel-range discovery and
//! re-homing.
//!
//! Calibration homes the carriage against the left end-of-travel switch,
//! counts every step to the right switch to measure the usable travel, then
//! backs up to the position implied by the last committed bias. The bias
//! percentage itself is not changed by calibration.

use crate::error::{Result, map_hw_error};
use crate::position::target_steps;
use crate::status::{FsmStatus, TickInputs};
use crate::{REVERSE_SETTLE, STEP_DELAY};
use bias_traits::{BiasState, Clock, StepDirection, StepperDrive};
use eyre::WrapErr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CalState {
    Start,
    FindingLeftEot,
    FindingRightEot,
    Rebiasing,
    Finished,
}

/// Effect of one calibration tick, decided purely from state and inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CalEffect {
    /// Interlock active or nothing to do; keep position.
    Hold,
    /// One reverse step, homing toward the left switch.
    SeekLeft,
    /// Left switch reached: zero the position and wait out the settle time.
    Home,
    /// One forward step while measuring; counts position and range.
    SeekRight,
    /// Right switch reached: plan the re-home target and settle.
    PlanRehome,
    /// One reverse step toward the re-home target.
    Correct,
}

/// Pure transition for the three travel states. The Start and Finished
/// bookkeeping states never touch the hardware and are handled by the
/// executor directly.
pub(crate) fn transition(
    state: CalState,
    step_pos: u16,
    step_pos_req: u16,
    inputs: TickInputs,
) -> (CalState, CalEffect) {
    match state {
        CalState::FindingLeftEot => {
            if inputs.left_eot {
                (CalState::FindingRightEot, CalEffect::Home)
            } else if inputs.inhibited() {
                (CalState::FindingLeftEot, CalEffect::Hold)
            } else {
                (CalState::FindingLeftEot, CalEffect::SeekLeft)
            }
        }
        CalState::FindingRightEot => {
            if inputs.right_eot {
                (CalState::Rebiasing, CalEffect::PlanRehome)
            } else if inputs.inhibited() {
                (CalState::FindingRightEot, CalEffect::Hold)
            } else {
                (CalState::FindingRightEot, CalEffect::SeekRight)
            }
        }
        CalState::Rebiasing => {
            if step_pos > step_pos_req {
                if inputs.inhibited() {
                    (CalState::Rebiasing, CalEffect::Hold)
                } else {
                    (CalState::Rebiasing, CalEffect::Correct)
                }
            } else if step_pos == step_pos_req {
                (CalState::Finished, CalEffect::Hold)
            } else {
                // Below target cannot happen after a discovery pass, which
                // always overshoots to the right end. Hold rather than
                // correct forward.
                (CalState::Rebiasing, CalEffect::Hold)
            }
        }
        CalState::Start | CalState::Finished => (state, CalEffect::Hold),
    }
}

pub(crate) struct CalibrateFsm {
    state: CalState,
    step_pos_req: u16,
}

impl CalibrateFsm {
    pub(crate) fn new() -> Self {
        Self {
            state: CalState::Start,
            step_pos_req: 0,
        }
    }

    /// Advance one tick. Returns Finished exactly once per run, on the
    /// commit tick, after which the FSM is back at Start.
    pub(crate) fn step<D: StepperDrive>(
        &mut self,
        pos: &mut BiasState,
        inputs: TickInputs,
        drive: &mut D,
        clock: &dyn Clock,
    ) -> Result<FsmStatus> {
        match self.state {
            CalState::Start => {
                pos.step_range = 0;
                self.state = CalState::FindingLeftEot;
                tracing::debug!(bias_actual = pos.bias_actual, "calibration started");
                Ok(FsmStatus::Running)
            }
            CalState::Finished => {
                self.state = CalState::Start;
                Ok(FsmStatus::Finished)
            }
            _ => {
                let (next, effect) = transition(self.state, pos.step_pos, self.step_pos_req, inputs);
                match effect {
                    CalEffect::Hold => {}
                    CalEffect::SeekLeft => {
                        step_once(drive, StepDirection::Reverse, clock)?;
                    }
                    CalEffect::Home => {
                        pos.step_pos = 0;
                        clock.sleep(REVERSE_SETTLE);
                        tracing::debug!("left end of travel found");
                    }
                    CalEffect::SeekRight => {
                        step_once(drive, StepDirection::Forward, clock)?;
                        pos.step_pos = pos.step_pos.saturating_add(1);
                        pos.step_range = pos.step_range.saturating_add(1);
                    }
                    CalEffect::PlanRehome => {
                        self.step_pos_req = target_steps(pos.bias_actual, pos.step_range);
                        clock.sleep(REVERSE_SETTLE);
                        tracing::debug!(
                            step_range = pos.step_range,
                            step_pos_req = self.step_pos_req,
                            "travel range discovered"
                        );
                    }
                    CalEffect::Correct => {
                        step_once(drive, StepDirection::Reverse, clock)?;
                        pos.step_pos = pos.step_pos.saturating_sub(1);
                    }
                }
                self.state = next;
                Ok(FsmStatus::Running)
            }
        }
    }
}

fn step_once<D: StepperDrive>(
    drive: &mut D,
    direction: StepDirection,
    clock: &dyn Clock,
) -> Result<()> {
    drive
        .step(direction)
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err("stepper step")?;
    clock.sleep(STEP_DELAY);
    Ok(())
}
