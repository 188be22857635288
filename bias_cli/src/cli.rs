//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "bias_cli", version, about = "Brake-bias actuator module CLI")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/bias_module.toml")]
    pub config: PathBuf,

    /// Override the persisted bias state file location
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Emit results as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Service loop: drive the module and take requests on stdin
    ///
    /// Requests: "adjust <percent>", "calibrate", "bias?", "quit".
    Run {
        /// Enable real-time mode (SCHED_FIFO + mlockall, Linux only)
        #[arg(long, action = ArgAction::SetTrue)]
        rt: bool,
        /// SCHED_FIFO priority when --rt is enabled (1..=max); clamped
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
    },
    /// One-shot bias adjustment
    Adjust {
        /// Requested front bias in percent; out-of-range values are clamped
        percent: u8,
    },
    /// One-shot travel range calibration
    Calibrate,
    /// Print the committed bias state
    Status,
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}
