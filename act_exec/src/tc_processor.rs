//! # Telecommand processor module
//!
//! The telecommand processor parses complete lines from any command link and applies them. Both
//! links feed the same processor, so the last telecommand applied wins.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, trace};

// Internal
use comms_if::tc::Tc;
use util::time::Millis;
use crate::{data_store::DataStore, hal::EventSink, motor_ctrl::Side};

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Execute a telecommand line.
///
/// Malformed lines are discarded without touching any actuator or the failsafe deadline. A valid
/// telecommand restarts the failsafe deadline, clearing it if it was tripped, and is then applied.
///
/// Returns `true` if the line was a valid telecommand.
pub fn exec<E: EventSink>(ds: &mut DataStore, line: &[u8], now_ms: Millis, events: &mut E) -> bool {
    let tc = match Tc::from_line(line) {
        Ok(tc) => tc,
        Err(e) => {
            debug!("Discarding line {:?}: {}", String::from_utf8_lossy(line), e);
            ds.num_discarded_lines += 1;
            return false
        }
    };

    ds.failsafe.tc_received(now_ms, events);
    ds.num_valid_tcs += 1;

    trace!("Executing {:?}", tc);

    match tc {
        Tc::Drive { left, right } => {
            ds.motor_ctrl.set_target(Side::Left, left);
            ds.motor_ctrl.set_target(Side::Right, right);
        },
        Tc::Joint { joint, dir } => {
            ds.servo_ctrl.set_direction(joint, dir);
        }
    }

    true
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
