//! # Servo Controller Module
//!
//! This module drives the manipulator joints. Each joint is commanded with a direction rather than
//! a position: while a joint is commanded to retract or extend its speed ramps up to the joint's
//! maximum, and its angle is integrated from that speed. Holding a joint ramps its speed back down
//! to zero.
//!
//! The joints are driven through a [`ServoDriver`], which abstracts over the servo driver board.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ServoDriver`] implementation for the Adafruit PCA9685 16 channel servo driver board.
pub mod pca9685;

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use comms_if::tc::NUM_JOINTS;
pub use params::*;
pub use state::*;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Smallest joint angle.
///
/// Units: degrees
pub const MIN_ANGLE_DEG: f64 = 0.0;

/// Largest joint angle.
///
/// Units: degrees
pub const MAX_ANGLE_DEG: f64 = 180.0;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing servo driver boards.
pub trait ServoDriver {

    /// Set the pulse width of a channel.
    ///
    /// ## Arguments
    /// - `channel` - The channel to set the pulse width for
    /// - `pulse` - The pulse width in driver counts
    fn set_pulse(&mut self, channel: usize, pulse: u16) -> Result<(), ServoError>;

    /// False if the board failed to initialise.
    fn is_present(&self) -> bool {
        true
    }
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ServoError {
    #[error("An I2C error occured")]
    I2c,

    #[error("Channel {0} does not exist on the servo board")]
    InvalidChannel(usize),

    #[error("Pulse width {0} is outside the range of the servo board")]
    InvalidPulse(u16),

    #[error("The servo board rejected the request")]
    Rejected,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: ServoDriver> ServoDriver for Option<T> {
    fn set_pulse(&mut self, channel: usize, pulse: u16) -> Result<(), ServoError> {
        match self {
            Some(d) => d.set_pulse(channel, pulse),
            None => Ok(())
        }
    }

    fn is_present(&self) -> bool {
        self.as_ref().map_or(false, |d| d.is_present())
    }
}
