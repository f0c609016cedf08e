//! Parameters structure for ServoCtrl

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use util::time::Millis;

use super::NUM_JOINTS;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for servo control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    /// Period between joint updates.
    ///
    /// Units: milliseconds
    pub update_period_ms: Millis,

    // ---- OUTPUT ----

    /// Pulse width written for a joint at 0 degrees.
    ///
    /// Units: PCA9685 counts (out of 4096)
    pub servo_min: u16,

    /// Pulse width written for a joint at 180 degrees.
    ///
    /// Units: PCA9685 counts (out of 4096)
    pub servo_max: u16,

    /// Board channel of each joint, in joint order
    pub channels: [usize; NUM_JOINTS],

    /// 7-bit I2C address of the servo board
    pub i2c_address: u8,

    /// Servo PWM frequency.
    ///
    /// Units: hertz
    pub pwm_freq_hz: f64,

    // ---- MOTION ----

    /// Largest joint speed before sensitivity is applied.
    ///
    /// Units: degrees/update
    pub max_speed: f64,

    /// Largest increase of speed in one update.
    ///
    /// Units: degrees/update/update
    pub accel: f64,

    /// Largest decrease of speed in one update.
    ///
    /// Units: degrees/update/update
    pub decel: f64,

    /// Multiplier on `max_speed` for each joint
    pub sensitivity: [f64; NUM_JOINTS],

    /// Angle every joint is driven to at boot.
    ///
    /// Units: degrees
    pub initial_angle_deg: f64,

    /// Speed magnitude above which a joint is considered to be moving.
    ///
    /// Units: degrees/update
    pub active_epsilon: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            update_period_ms: 20,
            servo_min: 150,
            servo_max: 600,
            channels: [0, 1, 2, 3, 4, 5],
            i2c_address: 0x40,
            pwm_freq_hz: 60.0,
            max_speed: 2.0,
            accel: 0.05,
            decel: 0.05,
            sensitivity: [1.0; NUM_JOINTS],
            initial_angle_deg: 90.0,
            active_epsilon: 0.01,
        }
    }
}
