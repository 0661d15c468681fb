//! Door actuator drivers over Linux sysfs.
//!
//! One capability interface, two drivers: a hobby servo on a hardware PWM
//! channel (the deployed latch) and a boolean relay line. There is no
//! position feedback on either; the contract is fire-and-trust.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 50 Hz control period for hobby servos.
const SERVO_PERIOD_NS: u32 = 20_000_000;

#[derive(Debug, Error)]
pub enum DoorError {
    #[error("actuator sysfs node missing: {0}")]
    NodeMissing(String),
    #[error("actuator sysfs write failed ({path}): {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Physical door actuator primitives. `open`/`close` drive the mechanism;
/// `release` de-energizes the control signal (the mandatory safe state at
/// shutdown).
pub trait DoorDriver: Send {
    fn open(&mut self) -> Result<(), DoorError>;
    fn close(&mut self) -> Result<(), DoorError>;
    fn release(&mut self) -> Result<(), DoorError>;
}

fn write_sysfs(path: &Path, value: &str) -> Result<(), DoorError> {
    fs::write(path, value).map_err(|source| DoorError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Hobby servo on a hardware PWM channel
/// (`/sys/class/pwm/pwmchip<chip>/pwm<channel>`).
#[derive(Debug)]
pub struct PwmServo {
    channel_dir: PathBuf,
    open_duty_ns: u32,
    closed_duty_ns: u32,
}

impl PwmServo {
    /// Export and configure the PWM channel. Any sysfs failure here is a
    /// startup failure: the daemon must not run without a responsive
    /// actuator.
    pub fn export(
        chip: u32,
        channel: u32,
        open_pulse_us: u32,
        closed_pulse_us: u32,
    ) -> Result<Self, DoorError> {
        Self::export_at(Path::new("/sys/class/pwm"), chip, channel, open_pulse_us, closed_pulse_us)
    }

    fn export_at(
        base: &Path,
        chip: u32,
        channel: u32,
        open_pulse_us: u32,
        closed_pulse_us: u32,
    ) -> Result<Self, DoorError> {
        let chip_dir = base.join(format!("pwmchip{chip}"));
        if !chip_dir.exists() {
            return Err(DoorError::NodeMissing(chip_dir.display().to_string()));
        }

        let channel_dir = chip_dir.join(format!("pwm{channel}"));
        if !channel_dir.exists() {
            write_sysfs(&chip_dir.join("export"), &channel.to_string())?;
        }
        if !channel_dir.exists() {
            return Err(DoorError::NodeMissing(channel_dir.display().to_string()));
        }

        write_sysfs(&channel_dir.join("period"), &SERVO_PERIOD_NS.to_string())?;

        let servo = Self {
            channel_dir,
            open_duty_ns: open_pulse_us * 1_000,
            closed_duty_ns: closed_pulse_us * 1_000,
        };
        tracing::info!(
            chip,
            channel,
            open_us = open_pulse_us,
            closed_us = closed_pulse_us,
            "servo door driver ready"
        );
        Ok(servo)
    }

    fn set_duty(&self, duty_ns: u32) -> Result<(), DoorError> {
        write_sysfs(&self.channel_dir.join("duty_cycle"), &duty_ns.to_string())
    }

    fn set_enabled(&self, enabled: bool) -> Result<(), DoorError> {
        write_sysfs(&self.channel_dir.join("enable"), if enabled { "1" } else { "0" })
    }
}

impl DoorDriver for PwmServo {
    fn open(&mut self) -> Result<(), DoorError> {
        self.set_duty(self.open_duty_ns)?;
        self.set_enabled(true)
    }

    fn close(&mut self) -> Result<(), DoorError> {
        self.set_duty(self.closed_duty_ns)?;
        self.set_enabled(true)
    }

    fn release(&mut self) -> Result<(), DoorError> {
        // Zero the pulse before disabling so the line idles low.
        self.set_duty(0)?;
        self.set_enabled(false)
    }
}

/// Boolean relay line on sysfs GPIO (`/sys/class/gpio/gpio<pin>`).
pub struct GpioRelay {
    value_path: PathBuf,
}

impl GpioRelay {
    pub fn export(pin: u32) -> Result<Self, DoorError> {
        Self::export_at(Path::new("/sys/class/gpio"), pin)
    }

    fn export_at(base: &Path, pin: u32) -> Result<Self, DoorError> {
        if !base.exists() {
            return Err(DoorError::NodeMissing(base.display().to_string()));
        }

        let pin_dir = base.join(format!("gpio{pin}"));
        if !pin_dir.exists() {
            write_sysfs(&base.join("export"), &pin.to_string())?;
        }
        if !pin_dir.exists() {
            return Err(DoorError::NodeMissing(pin_dir.display().to_string()));
        }

        write_sysfs(&pin_dir.join("direction"), "out")?;
        let relay = Self { value_path: pin_dir.join("value") };
        write_sysfs(&relay.value_path, "0")?;
        tracing::info!(pin, "relay door driver ready");
        Ok(relay)
    }
}

impl DoorDriver for GpioRelay {
    fn open(&mut self) -> Result<(), DoorError> {
        write_sysfs(&self.value_path, "1")
    }

    fn close(&mut self) -> Result<(), DoorError> {
        write_sysfs(&self.value_path, "0")
    }

    fn release(&mut self) -> Result<(), DoorError> {
        // A de-energized relay is the closed/safe state.
        write_sysfs(&self.value_path, "0")
    }
}
