//! Bias adjustment finite-state machine.
//!
//! Drives the actuator from its current position to the position implied by
//! a requested bias percentage, one step per control-loop tick. A closed
//! end-of-travel switch terminates the run early and still counts as
//! success: the mechanism is never driven past a physical limit, even when
//! the commanded percentage implies it should go further.

use crate::STEP_DELAY;
use crate::error::{Result, map_hw_error};
use crate::position::{clamp_bias, target_steps};
use crate::status::{FsmStatus, TickInputs};
use bias_traits::{BiasState, Clock, StepDirection, StepperDrive};
use eyre::WrapErr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdjustState {
    Start,
    Adjusting,
    Finished,
}

/// Movement decision for one Adjusting tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Motion {
    Hold,
    Forward,
    Reverse,
}

/// Pure transition for the Adjusting state: from the sampled inputs alone,
/// decide this tick's motion and whether the run is complete after it.
/// Never commands a step toward a closed end-of-travel switch.
pub(crate) fn adjusting_transition(
    step_pos: u16,
    step_pos_req: u16,
    inputs: TickInputs,
) -> (Motion, bool) {
    if inputs.inhibited() {
        // Hold position; re-poll next tick.
        return (Motion::Hold, false);
    }
    if step_pos < step_pos_req {
        if inputs.right_eot {
            (Motion::Hold, true)
        } else {
            (Motion::Forward, step_pos + 1 >= step_pos_req)
        }
    } else if step_pos > step_pos_req {
        if inputs.left_eot {
            (Motion::Hold, true)
        } else {
            (Motion::Reverse, step_pos - 1 <= step_pos_req)
        }
    } else {
        (Motion::Hold, true)
    }
}

pub(crate) struct AdjustFsm {
    state: AdjustState,
    bias_req: u8,
    step_pos_req: u16,
}

impl AdjustFsm {
    pub(crate) fn new() -> Self {
        Self {
            state: AdjustState::Start,
            bias_req: 0,
            step_pos_req: 0,
        }
    }

    /// Advance one tick. `requested` is the latched request payload; `pos`
    /// the live travel state. Returns Finished exactly once per run, on the
    /// commit tick, after which the FSM is back at Start.
    pub(crate) fn step<D: StepperDrive>(
        &mut self,
        pos: &mut BiasState,
        requested: u8,
        inputs: TickInputs,
        drive: &mut D,
        clock: &dyn Clock,
    ) -> Result<FsmStatus> {
        match self.state {
            AdjustState::Start => {
                self.bias_req = clamp_bias(requested);
                self.step_pos_req = target_steps(self.bias_req, pos.step_range);
                tracing::debug!(
                    bias_req = self.bias_req,
                    step_pos = pos.step_pos,
                    step_pos_req = self.step_pos_req,
                    "adjustment planned"
                );
                self.state = AdjustState::Adjusting;
                Ok(FsmStatus::Running)
            }
            AdjustState::Adjusting => {
                let (motion, arrived) =
                    adjusting_transition(pos.step_pos, self.step_pos_req, inputs);
                match motion {
                    Motion::Forward => {
                        drive
                            .step(StepDirection::Forward)
                            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                            .wrap_err("stepper step")?;
                        clock.sleep(STEP_DELAY);
                        pos.step_pos = pos.step_pos.saturating_add(1);
                    }
                    Motion::Reverse => {
                        drive
                            .step(StepDirection::Reverse)
                            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                            .wrap_err("stepper step")?;
                        clock.sleep(STEP_DELAY);
                        pos.step_pos = pos.step_pos.saturating_sub(1);
                    }
                    Motion::Hold => {}
                }
                if arrived {
                    self.state = AdjustState::Finished;
                }
                Ok(FsmStatus::Running)
            }
            AdjustState::Finished => {
                // The requested (possibly limit-truncated) percentage is
                // accepted as the new actual bias.
                pos.bias_actual = self.bias_req;
                self.state = AdjustState::Start;
                Ok(FsmStatus::Finished)
            }
        }
    }
}
