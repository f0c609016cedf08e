//! # Motor control module
//!
//! Drives the left and right drive motors through a pair of dual-direction H-bridge drivers. Each
//! side has a target set by telecommand and a current output which is ramped towards the target on
//! the module's own cadence.
//!
//! Each H-bridge has a forward and a reverse PWM line. A non-negative output drives the forward
//! line with the reverse line held at zero, and a negative output does the opposite. Both lines
//! are never driven together.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of drive motors.
pub const NUM_MOTORS: usize = 2;

/// Largest magnitude of a motor target or output.
pub const MAX_DUTY: i32 = comms_if::tc::DRIVE_LIMIT;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Side of the rover a drive motor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Side {
    pub const ALL: [Side; NUM_MOTORS] = [Side::Left, Side::Right];

    pub(crate) fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}
