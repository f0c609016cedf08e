//! # Event codes
//!
//! Numeric codes for the events the actuator node reports to its event sink.
//! Codes are grouped by range:
//!
//! - 1000-1999: system state
//! - 2000-2999: actuator status
//! - 4000-4999: recoverable safety events
//! - 5000-5999: faults

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An event reported by the actuator node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum EventCode {
    BootStart = 1000,
    BootComplete = 1001,

    ActInitStart = 2000,
    MotorsReady = 2001,
    ServosReady = 2002,

    /// No valid command was received within the failsafe timeout.
    FailsafeTrigger = 4005,
    /// A valid command was received while the failsafe was tripped.
    FailsafeClear = 4006,

    /// The motor driver PWM outputs could not be brought up.
    MotorDriverFault = 5001,
    /// The indicator and motor enable lines could not be brought up.
    GpioFault = 5002,
    /// A command link could not be opened.
    LinkDown = 5003,
    /// The servo board's I2C bus could not be brought up.
    I2cHang = 5005,
    /// The previous reset was caused by the hardware watchdog.
    WatchdogReset = 5007
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EventCode {
    /// The numeric value of this event.
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// A short, stable name for this event.
    pub fn name(&self) -> &'static str {
        match self {
            EventCode::BootStart => "SYS_BOOT_START",
            EventCode::BootComplete => "SYS_BOOT_COMPLETE",
            EventCode::ActInitStart => "ACT_INIT_START",
            EventCode::MotorsReady => "ACT_MOTORS_READY",
            EventCode::ServosReady => "ACT_SERVOS_READY",
            EventCode::FailsafeTrigger => "SAFE_FAILSAFE_TRIGGER",
            EventCode::FailsafeClear => "SAFE_FAILSAFE_CLEAR",
            EventCode::MotorDriverFault => "ERR_MOTOR_DRIVER",
            EventCode::GpioFault => "ERR_GPIO",
            EventCode::LinkDown => "ERR_LINK_DOWN",
            EventCode::I2cHang => "ERR_I2C_HANG",
            EventCode::WatchdogReset => "ERR_WATCHDOG_RESET"
        }
    }

    /// True for events in the fault range.
    pub fn is_fault(&self) -> bool {
        self.code() >= 5000
    }
}

impl std::fmt::Display for EventCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(EventCode::BootStart.code(), 1000);
        assert_eq!(EventCode::FailsafeTrigger.code(), 4005);
        assert_eq!(EventCode::FailsafeClear.code(), 4006);
        assert_eq!(EventCode::WatchdogReset.code(), 5007);

        assert!(EventCode::I2cHang.is_fault());
        assert!(EventCode::MotorDriverFault.is_fault());
        assert_eq!(EventCode::LinkDown.name(), "ERR_LINK_DOWN");
        assert!(!EventCode::FailsafeTrigger.is_fault());

        assert_eq!(
            format!("{}", EventCode::FailsafeClear),
            "SAFE_FAILSAFE_CLEAR (4006)"
        );
    }
}
