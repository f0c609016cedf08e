//! Parameters structure for MotorCtrl

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use util::time::Millis;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for motor control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    /// Period between output updates.
    ///
    /// Units: milliseconds
    pub update_period_ms: Millis,

    /// Largest change of a motor output in one update, in either direction.
    ///
    /// Units: duty counts (out of 255)
    pub ramp_step: i32,

    /// Frequency of the H-bridge PWM signals.
    ///
    /// Units: hertz
    pub pwm_freq_hz: f64,

    /// Driver for the left side motors
    pub left: HBridgeParams,

    /// Driver for the right side motors
    pub right: HBridgeParams,
}

/// Wiring of a single H-bridge driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HBridgeParams {
    /// PWM channel of the forward line
    pub fwd_channel: u8,

    /// PWM channel of the reverse line
    pub rev_channel: u8,

    /// Enable lines of the driver, driven high at boot
    pub enable_pins: [u8; 2],
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            update_period_ms: 10,
            ramp_step: 5,
            pwm_freq_hz: 15_000.0,
            left: HBridgeParams {
                fwd_channel: 2,
                rev_channel: 3,
                enable_pins: [21, 20],
            },
            right: HBridgeParams {
                fwd_channel: 5,
                rev_channel: 6,
                enable_pins: [22, 23],
            },
        }
    }
}

impl Params {
    /// All PWM channels used by the motor drivers.
    pub fn pwm_channels(&self) -> [u8; 4] {
        [
            self.left.fwd_channel,
            self.left.rev_channel,
            self.right.fwd_channel,
            self.right.rev_channel,
        ]
    }

    /// All enable lines of the motor drivers.
    pub fn enable_pins(&self) -> [u8; 4] {
        [
            self.left.enable_pins[0],
            self.left.enable_pins[1],
            self.right.enable_pins[0],
            self.right.enable_pins[1],
        ]
    }
}
