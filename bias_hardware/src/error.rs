use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file format: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, HwError>;
