//! Type-state builder for [`BiasModule`].
//!
//! The drive, limit switches and store are mandatory; `build()` only exists
//! once all three are provided. `try_build()` is available in any state and
//! returns a typed [`BuildError`] for whatever is missing.

use crate::error::{BuildError, Result};
use crate::module::{BiasModule, build_module};
use bias_traits::{BiasStore, Clock, LimitSwitches, StepperDrive};
use std::marker::PhantomData;

// Type-state markers
pub struct Missing;
pub struct Set;

/// Dynamically-dispatched module as produced by the builder.
pub type BoxedModule =
    BiasModule<Box<dyn StepperDrive>, Box<dyn LimitSwitches>, Box<dyn BiasStore>>;

pub struct ModuleBuilder<D, L, S> {
    drive: Option<Box<dyn StepperDrive>>,
    switches: Option<Box<dyn LimitSwitches>>,
    store: Option<Box<dyn BiasStore>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _d: PhantomData<D>,
    _l: PhantomData<L>,
    _s: PhantomData<S>,
}

impl Default for ModuleBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            drive: None,
            switches: None,
            store: None,
            clock: None,
            _d: PhantomData,
            _l: PhantomData,
            _s: PhantomData,
        }
    }
}

impl BoxedModule {
    /// Start building a module.
    pub fn builder() -> ModuleBuilder<Missing, Missing, Missing> {
        ModuleBuilder::default()
    }
}

impl<D, L, S> ModuleBuilder<D, L, S> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<BoxedModule> {
        let drive = self
            .drive
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDrive))?;
        let switches = self
            .switches
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSwitches))?;
        let store = self
            .store
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStore))?;
        build_module(drive, switches, store, self.clock)
    }

    /// Provide a custom clock; defaults to the monotonic wall clock.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

impl<L, S> ModuleBuilder<Missing, L, S> {
    pub fn with_drive(self, drive: impl StepperDrive + 'static) -> ModuleBuilder<Set, L, S> {
        ModuleBuilder {
            drive: Some(Box::new(drive)),
            switches: self.switches,
            store: self.store,
            clock: self.clock,
            _d: PhantomData,
            _l: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<D, S> ModuleBuilder<D, Missing, S> {
    pub fn with_switches(self, switches: impl LimitSwitches + 'static) -> ModuleBuilder<D, Set, S> {
        ModuleBuilder {
            drive: self.drive,
            switches: Some(Box::new(switches)),
            store: self.store,
            clock: self.clock,
            _d: PhantomData,
            _l: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<D, L> ModuleBuilder<D, L, Missing> {
    pub fn with_store(self, store: impl BiasStore + 'static) -> ModuleBuilder<D, L, Set> {
        ModuleBuilder {
            drive: self.drive,
            switches: self.switches,
            store: Some(Box::new(store)),
            clock: self.clock,
            _d: PhantomData,
            _l: PhantomData,
            _s: PhantomData,
        }
    }
}

impl ModuleBuilder<Set, Set, Set> {
    /// Build the module. Only available once drive, switches and store are
    /// all set.
    pub fn build(self) -> Result<BoxedModule> {
        self.try_build()
    }
}
