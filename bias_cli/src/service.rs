//! Node assembly: config mapping, hardware selection, loop construction.

use crate::cli::Cli;
use bias_config::Config;
use bias_core::error::Result;
use bias_core::{BoxedModule, ControlLoop, InterlockMonitor};
use bias_hardware::FileBiasStore;
use bias_traits::{
    BiasStore, BoxError, BrakeLight, LimitSwitches, StatusReporter, StepperDrive, SwitchInput,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub type NodeLoop = ControlLoop<
    Box<dyn StepperDrive>,
    Box<dyn LimitSwitches>,
    Box<dyn BiasStore>,
    Box<dyn SwitchInput>,
    Box<dyn SwitchInput>,
    Box<dyn BrakeLight>,
    StdoutReporter,
>;

/// Status reports written to stdout, standing in for the network transport.
pub struct StdoutReporter {
    json: bool,
}

impl StdoutReporter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl StatusReporter for StdoutReporter {
    fn adjustment_success(&mut self, bias_actual: u8) -> std::result::Result<(), BoxError> {
        if self.json {
            println!(
                "{}",
                serde_json::json!({ "event": "adjustment_success", "bias_actual": bias_actual })
            );
        } else {
            println!("adjustment ok: bias {bias_actual}%");
        }
        Ok(())
    }

    fn calibration_success(&mut self) -> std::result::Result<(), BoxError> {
        if self.json {
            println!("{}", serde_json::json!({ "event": "calibration_success" }));
        } else {
            println!("calibration ok");
        }
        Ok(())
    }

    fn brake_changed(&mut self, pressed: bool) -> std::result::Result<(), BoxError> {
        if self.json {
            println!(
                "{}",
                serde_json::json!({ "event": "brake", "pressed": pressed })
            );
        } else {
            println!("brake {}", if pressed { "pressed" } else { "released" });
        }
        Ok(())
    }

    fn kill_changed(&mut self, engaged: bool) -> std::result::Result<(), BoxError> {
        if self.json {
            println!(
                "{}",
                serde_json::json!({ "event": "kill", "engaged": engaged })
            );
        } else {
            println!("kill circuit {}", if engaged { "engaged" } else { "disengaged" });
        }
        Ok(())
    }
}

/// The state file location: CLI override, then config, then the default.
pub fn state_path(cli: &Cli, config: Option<&Config>) -> PathBuf {
    cli.state.clone().unwrap_or_else(|| {
        config
            .map(|c| c.storage.state_file.clone())
            .unwrap_or_else(|| PathBuf::from("var/bias_state.toml"))
    })
}

#[cfg(feature = "hardware")]
pub fn build_loop(
    cli: &Cli,
    config: Option<&Config>,
    shutdown: Arc<AtomicBool>,
) -> Result<NodeLoop> {
    use bias_hardware::gpio::{
        GpioBrakeLight, GpioLimitSwitches, GpioStepperDrive, GpioSwitchInput,
    };

    let cfg = config.ok_or_else(|| eyre::eyre!("a config file is required in hardware mode"))?;
    let store = FileBiasStore::open(state_path(cli, config))?;
    let drive = GpioStepperDrive::new(
        cfg.pins.stepper_step,
        cfg.pins.stepper_dir,
        cfg.pins.stepper_enable,
    )?;
    let switches = GpioLimitSwitches::new(cfg.pins.left_eot, cfg.pins.right_eot)?;
    let brake = GpioSwitchInput::new(cfg.pins.brake_switch)?;
    let kill = GpioSwitchInput::new(cfg.pins.kill_circuit)?;
    let light = GpioBrakeLight::new(cfg.pins.brake_light)?;

    let module = BoxedModule::builder()
        .with_drive(drive)
        .with_switches(switches)
        .with_store(store)
        .build()?;
    let monitor = InterlockMonitor::new(
        Box::new(brake) as Box<dyn SwitchInput>,
        Box::new(kill) as Box<dyn SwitchInput>,
        Box::new(light) as Box<dyn BrakeLight>,
    );
    Ok(ControlLoop::new(
        module,
        monitor,
        StdoutReporter::new(cli.json),
        shutdown,
    ))
}

#[cfg(not(feature = "hardware"))]
pub fn build_loop(
    cli: &Cli,
    config: Option<&Config>,
    shutdown: Arc<AtomicBool>,
) -> Result<NodeLoop> {
    use bias_hardware::{InactiveSwitch, SimulatedBrakeLight, SimulatedRig};

    let (travel, start) = config
        .map(|c| (c.sim.travel_steps, c.sim.start_pos))
        .unwrap_or((200, 0));
    let rig = SimulatedRig::new(travel, start);
    tracing::info!(travel, start, "using simulated actuator rig");

    let store = FileBiasStore::open(state_path(cli, config))?;
    let module = BoxedModule::builder()
        .with_drive(rig.drive())
        .with_switches(rig.switches())
        .with_store(store)
        .build()?;
    let monitor = InterlockMonitor::new(
        Box::new(InactiveSwitch) as Box<dyn SwitchInput>,
        Box::new(InactiveSwitch) as Box<dyn SwitchInput>,
        Box::new(SimulatedBrakeLight::default()) as Box<dyn BrakeLight>,
    );
    Ok(ControlLoop::new(
        module,
        monitor,
        StdoutReporter::new(cli.json),
        shutdown,
    ))
}
