//! GPIO backends (Raspberry Pi, `rppal`) for the actuator seams.
//!
//! Limit switches and the brake/kill inputs are wired switch-to-ground with
//! the internal pull-ups enabled, so the active level is low. The brake
//! light logic signal is active low as well.

use crate::error::HwError;
use bias_traits::{BoxError, BrakeLight, LimitSwitches, StepDirection, StepperDrive, SwitchInput};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use std::thread::sleep;
use std::time::Duration;

/// Direction line setup time before the step pulse.
const DIR_SETUP: Duration = Duration::from_micros(2);
/// High and low width of the step pulse.
const STEP_PULSE: Duration = Duration::from_micros(2);

fn gpio() -> Result<Gpio, HwError> {
    Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))
}

fn output(gpio: &Gpio, pin: u8) -> Result<OutputPin, HwError> {
    Ok(gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?
        .into_output_low())
}

fn input_pullup(gpio: &Gpio, pin: u8) -> Result<InputPin, HwError> {
    Ok(gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?
        .into_input_pullup())
}

pub struct GpioStepperDrive {
    step: OutputPin,
    dir: OutputPin,
    // Held low for the lifetime of the drive to keep the driver enabled.
    _enable: Option<OutputPin>,
}

impl GpioStepperDrive {
    pub fn new(step_pin: u8, dir_pin: u8, enable_pin: Option<u8>) -> Result<Self, HwError> {
        let gpio = gpio()?;
        let step = output(&gpio, step_pin)?;
        let dir = output(&gpio, dir_pin)?;
        let enable = enable_pin.map(|p| output(&gpio, p)).transpose()?;
        Ok(Self {
            step,
            dir,
            _enable: enable,
        })
    }
}

impl StepperDrive for GpioStepperDrive {
    fn step(&mut self, direction: StepDirection) -> Result<(), BoxError> {
        match direction {
            StepDirection::Forward => self.dir.set_low(),
            StepDirection::Reverse => self.dir.set_high(),
        }
        sleep(DIR_SETUP);
        self.step.set_high();
        sleep(STEP_PULSE);
        self.step.set_low();
        sleep(STEP_PULSE);
        Ok(())
    }
}

pub struct GpioLimitSwitches {
    left: InputPin,
    right: InputPin,
}

impl GpioLimitSwitches {
    pub fn new(left_pin: u8, right_pin: u8) -> Result<Self, HwError> {
        let gpio = gpio()?;
        Ok(Self {
            left: input_pullup(&gpio, left_pin)?,
            right: input_pullup(&gpio, right_pin)?,
        })
    }
}

impl LimitSwitches for GpioLimitSwitches {
    fn left_closed(&mut self) -> Result<bool, BoxError> {
        Ok(self.left.is_low())
    }

    fn right_closed(&mut self) -> Result<bool, BoxError> {
        Ok(self.right.is_low())
    }
}

pub struct GpioSwitchInput {
    pin: InputPin,
}

impl GpioSwitchInput {
    pub fn new(pin: u8) -> Result<Self, HwError> {
        let gpio = gpio()?;
        Ok(Self {
            pin: input_pullup(&gpio, pin)?,
        })
    }
}

impl SwitchInput for GpioSwitchInput {
    fn sample(&mut self) -> Result<bool, BoxError> {
        Ok(self.pin.is_low())
    }
}

pub struct GpioBrakeLight {
    pin: OutputPin,
}

impl GpioBrakeLight {
    pub fn new(pin: u8) -> Result<Self, HwError> {
        let gpio = gpio()?;
        let mut pin = output(&gpio, pin)?;
        // Off at startup; the logic signal is active low.
        pin.set_high();
        Ok(Self { pin })
    }
}

impl BrakeLight for GpioBrakeLight {
    fn set(&mut self, on: bool) -> Result<(), BoxError> {
        if on {
            self.pin.set_low();
        } else {
            self.pin.set_high();
        }
        Ok(())
    }
}
