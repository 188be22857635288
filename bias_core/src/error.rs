use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum BiasError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing stepper drive")]
    MissingDrive,
    #[error("missing limit switches")]
    MissingSwitches,
    #[error("missing bias store")]
    MissingStore,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

// Map any error surfacing from a trait seam to a typed BiasError, with
// special handling for typed hardware errors when available.
pub(crate) fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> BiasError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<bias_hardware::error::HwError>() {
        return BiasError::HardwareFault(hw.to_string());
    }
    BiasError::Hardware(e.to_string())
}
