//! # Actuator Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use util::time::Millis;
use crate::{failsafe, hal::NUM_LINKS, motor_ctrl, servo_ctrl, status_ind};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Margin by which the watchdog timeout must exceed the worst case loop time.
pub const WATCHDOG_MARGIN_MS: Millis = 500;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the actuator executable, loaded from `act_exec.toml`.
///
/// Any value missing from the file takes the default of the reference actuator node.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActExecParams {

    /// Target period of the main loop.
    ///
    /// Units: milliseconds
    pub loop_period_ms: Millis,

    pub failsafe: failsafe::Params,

    pub watchdog: WatchdogParams,

    pub motors: motor_ctrl::Params,

    pub servos: servo_ctrl::Params,

    pub indicators: status_ind::Params,

    pub links: LinkParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchdogParams {
    /// Time after which the node is reset if the watchdog has not been fed.
    ///
    /// Units: milliseconds
    pub timeout_ms: Millis,

    /// Worst case duration of one loop iteration, including the sleep.
    ///
    /// Units: milliseconds
    pub max_loop_time_ms: Millis,

    /// Watchdog device, or `None` to run without a watchdog
    pub device: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkParams {
    /// Serial device of each command link
    pub devices: Vec<String>,

    pub baud_rate: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("{0} must not be zero")]
    ZeroPeriod(&'static str),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error(
        "The loop period ({loop_period_ms} ms) exceeds the maximum loop time ({max_loop_time_ms} ms)"
    )]
    LoopPeriodTooLong {
        loop_period_ms: Millis,
        max_loop_time_ms: Millis,
    },

    #[error(
        "The watchdog timeout ({timeout_ms} ms) must exceed the maximum loop time plus a margin \
         ({required_ms} ms)"
    )]
    WatchdogTooShort {
        timeout_ms: Millis,
        required_ms: Millis,
    },

    #[error("Servo minimum pulse ({0}) must be less than the maximum pulse ({1})")]
    InvalidServoRange(u16, u16),

    #[error("Joint {0} has a negative sensitivity")]
    NegativeSensitivity(usize),

    #[error("PWM channel {0} is used by more than one motor line")]
    DuplicatePwmChannel(u8),

    #[error("At most {max} command links are supported, found {found}")]
    TooManyLinks {
        max: usize,
        found: usize,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ActExecParams {
    fn default() -> Self {
        Self {
            loop_period_ms: 1,
            failsafe: failsafe::Params::default(),
            watchdog: WatchdogParams::default(),
            motors: motor_ctrl::Params::default(),
            servos: servo_ctrl::Params::default(),
            indicators: status_ind::Params::default(),
            links: LinkParams::default(),
        }
    }
}

impl Default for WatchdogParams {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            max_loop_time_ms: 100,
            device: None,
        }
    }
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            devices: vec![String::from("/dev/ttyAMA0"), String::from("/dev/ttyUSB0")],
            baud_rate: 115_200,
        }
    }
}

impl ActExecParams {

    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {

        // ---- TIMING ----

        let periods = [
            ("loop_period_ms", self.loop_period_ms),
            ("failsafe.timeout_ms", self.failsafe.timeout_ms),
            ("motors.update_period_ms", self.motors.update_period_ms),
            ("servos.update_period_ms", self.servos.update_period_ms),
            ("indicators.heartbeat_period_ms", self.indicators.heartbeat_period_ms),
            ("indicators.comms_period_ms", self.indicators.comms_period_ms),
            ("indicators.scanner_period_ms", self.indicators.scanner_period_ms),
            ("indicators.beacon_period_ms", self.indicators.beacon_period_ms),
        ];
        for (name, period) in periods.iter() {
            if *period == 0 {
                return Err(ParamsError::ZeroPeriod(*name))
            }
        }

        if self.loop_period_ms > self.watchdog.max_loop_time_ms {
            return Err(ParamsError::LoopPeriodTooLong {
                loop_period_ms: self.loop_period_ms,
                max_loop_time_ms: self.watchdog.max_loop_time_ms,
            })
        }

        let required_ms = self.watchdog.max_loop_time_ms.saturating_add(WATCHDOG_MARGIN_MS);
        if self.watchdog.timeout_ms <= required_ms {
            return Err(ParamsError::WatchdogTooShort {
                timeout_ms: self.watchdog.timeout_ms,
                required_ms,
            })
        }

        // ---- MOTORS ----

        if self.motors.ramp_step <= 0 {
            return Err(ParamsError::NotPositive("motors.ramp_step"))
        }

        let channels = self.motors.pwm_channels();
        for (i, ch) in channels.iter().enumerate() {
            if channels[i + 1..].contains(ch) {
                return Err(ParamsError::DuplicatePwmChannel(*ch))
            }
        }

        // ---- SERVOS ----

        if self.servos.servo_min >= self.servos.servo_max {
            return Err(ParamsError::InvalidServoRange(
                self.servos.servo_min,
                self.servos.servo_max,
            ))
        }

        let motion = [
            ("servos.max_speed", self.servos.max_speed),
            ("servos.accel", self.servos.accel),
            ("servos.decel", self.servos.decel),
        ];
        for (name, value) in motion.iter() {
            // Written this way round so that NaN is rejected too
            if !(*value > 0.0) {
                return Err(ParamsError::NotPositive(*name))
            }
        }

        for (i, s) in self.servos.sensitivity.iter().enumerate() {
            if !(*s >= 0.0) {
                return Err(ParamsError::NegativeSensitivity(i))
            }
        }

        // ---- LINKS ----

        if self.links.devices.len() > NUM_LINKS {
            return Err(ParamsError::TooManyLinks {
                max: NUM_LINKS,
                found: self.links.devices.len(),
            })
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
