//! facegate-hw: Door actuator hardware abstraction.
//!
//! Driver variants (sysfs PWM servo, sysfs GPIO relay) unified behind the
//! [`DoorDriver`] trait, and the [`DoorController`] worker that runs the
//! open -> hold -> close pulse sequence off the recognition loop.

pub mod actuator;
pub mod controller;

pub use actuator::{DoorDriver, DoorError, GpioRelay, PwmServo};
pub use controller::{DoorController, DoorHandle};
