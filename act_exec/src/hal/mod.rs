//! # Hardware abstraction module
//!
//! The control loop only talks to hardware through the traits in this module, so that the same
//! loop can run against the Raspberry Pi peripherals, against simulated equipment on a
//! development host, or inside unit tests.
//!
//! A peripheral which failed to initialise is represented by `None`: every trait here is
//! implemented for `Option<T>`, with writes to an absent peripheral being no-ops. This is how the
//! executable carries on in a degraded mode rather than stopping.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Simulated equipment for host runs and tests.
pub mod sim;

/// Linux `/dev/watchdog` driver.
#[cfg(target_os = "linux")]
pub mod linux_wdt;

/// Raspberry Pi GPIO, software PWM and UART drivers.
#[cfg(all(target_arch = "arm", target_os = "linux"))]
pub mod rpi;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::event::EventCode;
use util::time::Millis;

use crate::servo_ctrl::ServoDriver;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of independent command links feeding the node.
pub const NUM_LINKS: usize = 2;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An 8-bit PWM output bank.
pub trait PwmOut {
    /// Set the duty cycle of a channel, where 255 is fully on.
    fn set_duty(&mut self, channel: u8, duty: u8) -> Result<(), HalError>;

    /// False if the peripheral failed to initialise.
    fn is_present(&self) -> bool {
        true
    }
}

/// A bank of digital output lines.
pub trait DigitalOut {
    /// Drive a pin high (`true`) or low (`false`).
    fn set_level(&mut self, pin: u8, high: bool) -> Result<(), HalError>;

    /// False if the peripheral failed to initialise.
    fn is_present(&self) -> bool {
        true
    }
}

/// A non-blocking source of bytes, such as a serial port.
pub trait ByteStream {
    /// Number of bytes which can be read without blocking.
    fn available(&mut self) -> usize;

    /// Read a single byte, or `None` if nothing is buffered.
    fn read_byte(&mut self) -> Option<u8>;

    /// False if the link could not be opened.
    fn is_present(&self) -> bool {
        true
    }
}

/// An external watchdog which resets the node if it is not fed in time.
pub trait Watchdog {
    /// Prove the control loop is still alive at `now_ms`.
    fn feed(&mut self, now_ms: Millis);

    /// True if the previous reset of the node was caused by this watchdog.
    fn caused_last_reset(&self) -> bool {
        false
    }
}

/// Destination for node events.
pub trait EventSink {
    fn log_event(&mut self, code: EventCode, timestamp_ms: Millis);
}

/// A set of equipment types the executable can run against.
pub trait Platform {
    type Pwm: PwmOut;
    type Servo: ServoDriver;
    type Gpio: DigitalOut;
    type Link: ByteStream;
    type Watchdog: Watchdog;
    type Events: EventSink;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// All equipment owned by the executable.
pub struct Eqpt<P: Platform> {
    /// PWM bank driving the two H-bridge motor drivers
    pub motor_pwm: P::Pwm,

    /// Servo board driving the manipulator joints
    pub servo_drv: P::Servo,

    /// GPIO bank driving the status indicators and motor driver enables
    pub gpio: P::Gpio,

    /// Command links, in priority-free order
    pub links: [P::Link; NUM_LINKS],

    pub watchdog: P::Watchdog,

    pub events: P::Events,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by equipment drivers.
#[derive(thiserror::Error, Debug)]
pub enum HalError {
    #[error("Channel {0} does not exist on this peripheral")]
    InvalidChannel(usize),

    #[error("Pin {0} could not be configured: {1}")]
    PinUnavailable(u8, String),

    #[error("Peripheral error: {0}")]
    Peripheral(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: PwmOut> PwmOut for Option<T> {
    fn set_duty(&mut self, channel: u8, duty: u8) -> Result<(), HalError> {
        match self {
            Some(p) => p.set_duty(channel, duty),
            None => Ok(())
        }
    }

    fn is_present(&self) -> bool {
        self.as_ref().map_or(false, |p| p.is_present())
    }
}

impl<T: DigitalOut> DigitalOut for Option<T> {
    fn set_level(&mut self, pin: u8, high: bool) -> Result<(), HalError> {
        match self {
            Some(g) => g.set_level(pin, high),
            None => Ok(())
        }
    }

    fn is_present(&self) -> bool {
        self.as_ref().map_or(false, |g| g.is_present())
    }
}

impl<T: ByteStream> ByteStream for Option<T> {
    fn available(&mut self) -> usize {
        match self {
            Some(s) => s.available(),
            None => 0
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.as_mut().and_then(|s| s.read_byte())
    }

    fn is_present(&self) -> bool {
        self.as_ref().map_or(false, |s| s.is_present())
    }
}

impl<T: Watchdog> Watchdog for Option<T> {
    fn feed(&mut self, now_ms: Millis) {
        if let Some(w) = self {
            w.feed(now_ms)
        }
    }

    fn caused_last_reset(&self) -> bool {
        self.as_ref().map_or(false, |w| w.caused_last_reset())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::sim::{SimLink, SimPwm};

    #[test]
    fn test_absent_peripherals_are_no_ops() {
        let mut pwm: Option<SimPwm> = None;
        assert!(!pwm.is_present());
        assert!(pwm.set_duty(2, 255).is_ok());

        let mut link: Option<SimLink> = None;
        assert_eq!(link.available(), 0);
        assert_eq!(link.read_byte(), None);
        assert!(!link.is_present());
        assert!(Some(SimLink::default()).is_present());

        let mut pwm = Some(SimPwm::default());
        assert!(pwm.is_present());
        pwm.set_duty(2, 100).unwrap();
        assert_eq!(pwm.as_ref().map(|p| p.duty(2)), Some(100));
    }
}
