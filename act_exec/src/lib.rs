//! # Actuator Library
//!
//! Control software for the rover's actuator node. The node receives drive and manipulator
//! telecommands over two serial links, ramps the drive motors and manipulator joints towards their
//! demands, and stops everything if telecommands stop arriving.
//!
//! The library is split so that the control loop can be run against real equipment by the
//! `act_exec` binary, or against simulated equipment in tests.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable.
pub mod data_store;

/// Event sink writing to the log and session archive.
pub mod event_log;

/// Executive running the control loop.
pub mod exec;

/// Failsafe supervisor.
pub mod failsafe;

/// Hardware abstraction.
pub mod hal;

/// Line framing of command links.
pub mod ingest;

/// Drive motor control.
pub mod motor_ctrl;

/// Parameters for the actuator executable.
pub mod params;

/// Rate limited ramp.
pub mod ramp;

/// Manipulator joint control.
pub mod servo_ctrl;

/// Status LEDs.
pub mod status_ind;

/// Telecommand processor.
pub mod tc_processor;
