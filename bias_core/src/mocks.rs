//! Test and helper mocks for bias_core.
//!
//! The mock rig is a shared mechanical model: a carriage on a rail between
//! two switches. The drive moves the carriage, the switches read its
//! position, and tests inspect or distort either side.

use bias_traits::{
    BiasState, BiasStore, BoxError, BrakeLight, Clock, LimitSwitches, StatusReporter,
    StepDirection, StepperDrive, SwitchInput,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct RigState {
    travel: u16,
    carriage: u16,
    steps_issued: u32,
    force_left: bool,
    force_right: bool,
}

/// Shared mechanical model of the actuator travel.
#[derive(Debug, Clone)]
pub struct MockRig {
    state: Rc<RefCell<RigState>>,
}

impl MockRig {
    /// A rig with `travel` physical steps between the switches and the
    /// carriage starting `carriage` steps from the left switch.
    pub fn new(travel: u16, carriage: u16) -> Self {
        Self {
            state: Rc::new(RefCell::new(RigState {
                travel,
                carriage: carriage.min(travel),
                steps_issued: 0,
                force_left: false,
                force_right: false,
            })),
        }
    }

    pub fn drive(&self) -> MockDrive {
        MockDrive {
            state: self.state.clone(),
        }
    }

    pub fn switches(&self) -> MockSwitches {
        MockSwitches {
            state: self.state.clone(),
        }
    }

    pub fn carriage(&self) -> u16 {
        self.state.borrow().carriage
    }

    pub fn steps_issued(&self) -> u32 {
        self.state.borrow().steps_issued
    }

    /// Force the left switch closed regardless of carriage position.
    pub fn force_left(&self, on: bool) {
        self.state.borrow_mut().force_left = on;
    }

    /// Force the right switch closed regardless of carriage position.
    pub fn force_right(&self, on: bool) {
        self.state.borrow_mut().force_right = on;
    }
}

pub struct MockDrive {
    state: Rc<RefCell<RigState>>,
}

impl StepperDrive for MockDrive {
    fn step(&mut self, direction: StepDirection) -> Result<(), BoxError> {
        let mut s = self.state.borrow_mut();
        s.steps_issued += 1;
        match direction {
            StepDirection::Forward => {
                if s.carriage < s.travel {
                    s.carriage += 1;
                }
            }
            StepDirection::Reverse => s.carriage = s.carriage.saturating_sub(1),
        }
        Ok(())
    }
}

pub struct MockSwitches {
    state: Rc<RefCell<RigState>>,
}

impl LimitSwitches for MockSwitches {
    fn left_closed(&mut self) -> Result<bool, BoxError> {
        let s = self.state.borrow();
        Ok(s.force_left || s.carriage == 0)
    }

    fn right_closed(&mut self) -> Result<bool, BoxError> {
        let s = self.state.borrow();
        Ok(s.force_right || s.carriage >= s.travel)
    }
}

#[derive(Debug, Default)]
struct MemStoreState {
    state: Option<BiasState>,
    stores: u32,
}

/// In-memory store with a store-call counter. Clones share the record, so a
/// "restart" can rebuild a module over the same storage.
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    inner: Rc<RefCell<MemStoreState>>,
}

impl MemStore {
    /// An empty store, as on a first-ever boot.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: BiasState) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemStoreState {
                state: Some(state),
                stores: 0,
            })),
        }
    }

    pub fn stored(&self) -> Option<BiasState> {
        self.inner.borrow().state
    }

    pub fn store_count(&self) -> u32 {
        self.inner.borrow().stores
    }
}

impl BiasStore for MemStore {
    fn load(&mut self) -> Result<Option<BiasState>, BoxError> {
        Ok(self.inner.borrow().state)
    }

    fn store(&mut self, state: BiasState) -> Result<(), BoxError> {
        let mut s = self.inner.borrow_mut();
        s.state = Some(state);
        s.stores += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEvent {
    AdjustmentSuccess(u8),
    CalibrationSuccess,
    Brake(bool),
    Kill(bool),
}

/// Records every report for assertion.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    events: Rc<RefCell<Vec<ReportEvent>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.borrow().clone()
    }
}

impl StatusReporter for RecordingReporter {
    fn adjustment_success(&mut self, bias_actual: u8) -> Result<(), BoxError> {
        self.events
            .borrow_mut()
            .push(ReportEvent::AdjustmentSuccess(bias_actual));
        Ok(())
    }

    fn calibration_success(&mut self) -> Result<(), BoxError> {
        self.events.borrow_mut().push(ReportEvent::CalibrationSuccess);
        Ok(())
    }

    fn brake_changed(&mut self, pressed: bool) -> Result<(), BoxError> {
        self.events.borrow_mut().push(ReportEvent::Brake(pressed));
        Ok(())
    }

    fn kill_changed(&mut self, engaged: bool) -> Result<(), BoxError> {
        self.events.borrow_mut().push(ReportEvent::Kill(engaged));
        Ok(())
    }
}

/// Plays back a fixed sample sequence, then repeats the last value.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    seq: Vec<bool>,
    idx: usize,
}

impl ScriptedInput {
    pub fn new(seq: impl Into<Vec<bool>>) -> Self {
        Self {
            seq: seq.into(),
            idx: 0,
        }
    }

    pub fn constant(value: bool) -> Self {
        Self::new([value])
    }
}

impl SwitchInput for ScriptedInput {
    fn sample(&mut self) -> Result<bool, BoxError> {
        let v = if self.idx < self.seq.len() {
            let x = self.seq[self.idx];
            self.idx += 1;
            x
        } else {
            self.seq.last().copied().unwrap_or(false)
        };
        Ok(v)
    }
}

/// Brake light spy.
#[derive(Debug, Default, Clone)]
pub struct MockLight {
    on: Rc<RefCell<bool>>,
}

impl MockLight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        *self.on.borrow()
    }
}

impl BrakeLight for MockLight {
    fn set(&mut self, on: bool) -> Result<(), BoxError> {
        *self.on.borrow_mut() = on;
        Ok(())
    }
}

/// Deterministic clock: sleeps advance simulated time without blocking.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    /// Total simulated time slept so far.
    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
