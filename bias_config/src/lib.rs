#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the brake-bias actuator node.
//!
//! `Config` and sub-structs are deserialized from TOML and validated. The
//! control constants (bias bounds, step delays) are compile-time fixed in
//! `bias_core`; this file only covers wiring, storage, logging and the
//! simulated rig used when no hardware backend is compiled in.

use serde::Deserialize;
use std::path::PathBuf;

/// GPIO pin assignments (BCM numbering).
#[derive(Debug, Deserialize)]
pub struct Pins {
    pub stepper_step: u8,
    pub stepper_dir: u8,
    pub stepper_enable: Option<u8>,
    pub left_eot: u8,
    pub right_eot: u8,
    pub brake_switch: u8,
    pub kill_circuit: u8,
    pub brake_light: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Storage {
    /// Where the committed bias state lives across power cycles.
    pub state_file: PathBuf,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("var/bias_state.toml"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Simulated actuator rig, used when the `hardware` feature is off.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sim {
    /// Physical steps of travel between the end-of-travel switches.
    pub travel_steps: u16,
    /// Carriage position at startup, steps from the left switch.
    pub start_pos: u16,
}

impl Default for Sim {
    fn default() -> Self {
        Self {
            travel_steps: 200,
            start_pos: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub sim: Sim,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins: every assigned pin must be unique, or two backends would
        // fight over the same line.
        let mut pins = vec![
            self.pins.stepper_step,
            self.pins.stepper_dir,
            self.pins.left_eot,
            self.pins.right_eot,
            self.pins.brake_switch,
            self.pins.kill_circuit,
            self.pins.brake_light,
        ];
        if let Some(en) = self.pins.stepper_enable {
            pins.push(en);
        }
        pins.sort_unstable();
        let before = pins.len();
        pins.dedup();
        if pins.len() != before {
            eyre::bail!("pins must be pairwise distinct");
        }

        // Storage
        if self.storage.state_file.as_os_str().is_empty() {
            eyre::bail!("storage.state_file must not be empty");
        }

        // Logging
        if let Some(rot) = &self.logging.rotation
            && !matches!(rot.as_str(), "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of: never, daily, hourly");
        }

        // Sim rig
        if self.sim.travel_steps == 0 {
            eyre::bail!("sim.travel_steps must be > 0");
        }
        if self.sim.start_pos > self.sim.travel_steps {
            eyre::bail!("sim.start_pos must be <= sim.travel_steps");
        }

        Ok(())
    }
}
