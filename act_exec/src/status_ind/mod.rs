//! # Status indicator module
//!
//! Drives the bank of status LEDs from the state of the rest of the node. Each pattern is an
//! independent state machine, and all of them are advanced from the same time reading once per
//! loop iteration:
//!
//! - Heartbeat: toggles unconditionally, showing the loop is running.
//! - Comms: blinks quickly while commands are arriving, off otherwise.
//! - Scanner: a pair of LEDs, one per drive side. With both sides driving the light sweeps between
//!   them; with one side driving only that side's LED blinks.
//! - Beacon: solid while the manipulator is still, blinking while any joint moves.

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

/// Number of LEDs in the scanner.
pub const NUM_SCANNER_LEDS: usize = 2;
