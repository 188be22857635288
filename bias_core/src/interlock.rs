//! Debounced brake-pedal and kill-circuit monitoring.
//!
//! The raw switch inputs bounce; a count-based hysteresis filter turns them
//! into the per-iteration interlock snapshot the FSMs consume. The monitor
//! also drives the brake light and announces state edges on the status
//! channel.

use crate::error::{Result, map_hw_error};
use crate::status::Interlocks;
use bias_traits::{BrakeLight, StatusReporter, SwitchInput};
use eyre::WrapErr;

/// Hysteresis rails, in consecutive loop samples.
const ON_THRESHOLD: i8 = 2;
const OFF_THRESHOLD: i8 = -2;

/// Count-based hysteresis filter: each sample nudges the counter toward one
/// rail, and the output flips only at the rails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hysteresis {
    count: i8,
    active: bool,
}

impl Hysteresis {
    pub fn update(&mut self, sample: bool) -> bool {
        self.count = self.count.saturating_add(if sample { 1 } else { -1 });
        if self.count >= ON_THRESHOLD {
            self.active = true;
            self.count = ON_THRESHOLD;
        } else if self.count <= OFF_THRESHOLD {
            self.active = false;
            self.count = OFF_THRESHOLD;
        }
        self.active
    }

    pub fn active(&self) -> bool {
        self.active
    }
}

/// Samples the pedal and kill inputs once per loop iteration, drives the
/// brake light, and announces edges.
pub struct InterlockMonitor<B, K, W> {
    brake_input: B,
    kill_input: K,
    light: W,
    brake_filter: Hysteresis,
    kill_filter: Hysteresis,
    brake_active: bool,
    kill_active: bool,
}

impl<B: SwitchInput, K: SwitchInput, W: BrakeLight> InterlockMonitor<B, K, W> {
    pub fn new(brake_input: B, kill_input: K, light: W) -> Self {
        Self {
            brake_input,
            kill_input,
            light,
            brake_filter: Hysteresis::default(),
            kill_filter: Hysteresis::default(),
            brake_active: false,
            kill_active: false,
        }
    }

    /// Refresh both interlocks. Light and report failures are logged and
    /// swallowed; only input sampling errors propagate.
    pub fn poll(&mut self, reporter: &mut dyn StatusReporter) -> Result<Interlocks> {
        let brake_sample = self
            .brake_input
            .sample()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("brake switch")?;
        let brake_pressed = self.brake_filter.update(brake_sample);
        if let Err(e) = self.light.set(brake_pressed) {
            tracing::warn!(error = %e, "brake light update failed");
        }
        if brake_pressed != self.brake_active {
            self.brake_active = brake_pressed;
            tracing::info!(pressed = brake_pressed, "brake pedal state changed");
            if let Err(e) = reporter.brake_changed(brake_pressed) {
                tracing::warn!(error = %e, "brake report failed");
            }
        }

        let kill_sample = self
            .kill_input
            .sample()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("kill circuit")?;
        let kill_engaged = self.kill_filter.update(kill_sample);
        if kill_engaged != self.kill_active {
            self.kill_active = kill_engaged;
            tracing::info!(engaged = kill_engaged, "kill circuit state changed");
            if let Err(e) = reporter.kill_changed(kill_engaged) {
                tracing::warn!(error = %e, "kill report failed");
            }
        }

        Ok(Interlocks {
            brake_pressed,
            kill_engaged,
        })
    }
}
