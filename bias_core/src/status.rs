//! Tick-level status and input snapshot types.

/// Which top-level activity owns the actuator this tick. Exactly one is
/// active; transitions happen only at loop granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Idle,
    Adjusting,
    Calibrating,
}

/// Outcome of a single FSM invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmStatus {
    /// Keep invoking; the operation is still in progress (or held by an
    /// interlock).
    Running,
    /// The operation committed this tick; the pending flag may be cleared.
    Finished,
}

/// Debounced safety interlock snapshot, valid for one loop iteration only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interlocks {
    pub brake_pressed: bool,
    pub kill_engaged: bool,
}

impl Interlocks {
    /// Movement is withheld while either interlock is active.
    #[inline]
    pub fn inhibited(&self) -> bool {
        self.brake_pressed || self.kill_engaged
    }
}

/// Everything an FSM tick is allowed to look at: the interlock snapshot and
/// the undebounced end-of-travel switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInputs {
    pub interlocks: Interlocks,
    pub left_eot: bool,
    pub right_eot: bool,
}

impl TickInputs {
    #[inline]
    pub fn inhibited(&self) -> bool {
        self.interlocks.inhibited()
    }
}
