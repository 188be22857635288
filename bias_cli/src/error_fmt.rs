//! Human-readable error descriptions and structured JSON error formatting.

use bias_core::{BiasError, BuildError};

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDrive => {
                "What happened: No stepper drive was provided to the bias module.\nLikely causes: The GPIO backend failed to initialize or was not wired into the builder.\nHow to fix: Check the [pins] stepper entries in the config and pass the drive via with_drive(...).".to_string()
            }
            BuildError::MissingSwitches => {
                "What happened: No end-of-travel switches were provided to the bias module.\nLikely causes: The GPIO backend failed to initialize or was not wired into the builder.\nHow to fix: Check the [pins] left_eot/right_eot entries and pass the switches via with_switches(...).".to_string()
            }
            BuildError::MissingStore => {
                "What happened: No bias state store was provided to the bias module.\nLikely causes: The state file path could not be opened.\nHow to fix: Check storage.state_file in the config (or --state) and filesystem permissions.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BiasError>() {
        return match be {
            BiasError::Storage(msg) => format!(
                "What happened: The bias state file could not be read or written ({msg}).\nLikely causes: Bad permissions, a full disk, or a corrupted record.\nHow to fix: Check storage.state_file (or --state); delete the file to fall back to power-on defaults."
            ),
            BiasError::Hardware(msg) | BiasError::HardwareFault(msg) => format!(
                "What happened: A hardware seam failed ({msg}).\nLikely causes: Wrong pin numbers, wiring problems, or missing GPIO permissions.\nHow to fix: Verify the [pins] table and that the process may access GPIO."
            ),
            BiasError::State(msg) => format!(
                "What happened: {msg}.\nHow to fix: Re-run with --log-level=debug for details."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("gpio") {
        return "What happened: Failed to initialize GPIO pins.\nLikely causes: Incorrect pin numbers or insufficient permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }
    if lower.contains("config") {
        return format!(
            "What happened: Configuration is invalid or unreadable.\nHow to fix: Edit the TOML config and try again. Original: {msg}"
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: config problems 2, storage 3, hardware 4, other 1.
pub fn exit_code(err: &eyre::Report) -> u8 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<BiasError>() {
        Some(BiasError::Storage(_)) => 3,
        Some(BiasError::Hardware(_) | BiasError::HardwareFault(_)) => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "error": true,
        "message": humanize(err),
        "detail": err.to_string(),
    })
    .to_string()
}
