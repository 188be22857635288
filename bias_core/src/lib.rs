#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Bias adjustment and calibration engine (hardware-agnostic).
//!
//! This crate owns the brake-bias actuator's control logic. All hardware
//! interactions go through the `bias_traits` seams (`StepperDrive`,
//! `LimitSwitches`, `BiasStore`, `StatusReporter`).
//!
//! ## Architecture
//!
//! - **Position math**: bias percentage ↔ stepper position (`position`)
//! - **Request intake**: atomic single-slot mailboxes fed by the receive
//!   context, polled by the control loop (`intake`)
//! - **Adjustment**: drive to a commanded bias percentage (`adjust`)
//! - **Calibration**: discover the travel range and re-home (`calibrate`)
//! - **Arbitration**: Idle / Adjusting / Calibrating, one FSM step per
//!   control-loop tick (`module`)
//! - **Interlocks**: debounced brake/kill monitoring with edge reports
//!   (`interlock`)
//!
//! All travel arithmetic is integer-only: positions in whole steps, bias in
//! whole percent. Movement decisions are pure transition functions over a
//! per-tick input snapshot, so the whole engine runs against mocks.

pub mod adjust;
pub mod builder;
pub mod calibrate;
pub mod error;
pub mod intake;
pub mod interlock;
pub mod mocks;
pub mod module;
pub mod position;
pub mod runner;
pub mod status;

pub use bias_traits::BiasState;
pub use builder::{BoxedModule, Missing, ModuleBuilder, Set};
pub use error::{BiasError, BuildError, Result};
pub use intake::{RequestIntake, RequestSender};
pub use interlock::{Hysteresis, InterlockMonitor};
pub use module::{BiasModule, BiasReadback, build_module};
pub use position::{boot_default, clamp_bias, target_steps};
pub use runner::ControlLoop;
pub use status::{FsmStatus, Interlocks, ModuleState, TickInputs};

use std::time::Duration;

/// Front-to-rear distribution at the front-max end of travel (percent).
pub const MAX_BIAS: u8 = 70;
/// Front-to-rear distribution at the front-min end of travel (percent).
pub const MIN_BIAS: u8 = 30;

/// Pause after each individual actuator step.
pub const STEP_DELAY: Duration = Duration::from_millis(50);
/// Settle pause when calibration reverses travel direction.
pub const REVERSE_SETTLE: Duration = Duration::from_millis(1000);
