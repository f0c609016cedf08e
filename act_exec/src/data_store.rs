//! # Data Store
//!
//! All state owned by the actuator executable's control loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::{
    failsafe::Failsafe,
    motor_ctrl::{MotorCtrl, Side},
    params::ActExecParams,
    servo_ctrl::ServoCtrl,
    status_ind::{IndicatorInputs, StatusInd},
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    // Monitoring counters
    /// Number of telecommands successfully parsed and applied
    pub num_valid_tcs: u64,

    /// Number of complete lines which failed to parse
    pub num_discarded_lines: u64,

    // Modules
    pub motor_ctrl: MotorCtrl,
    pub servo_ctrl: ServoCtrl,
    pub failsafe: Failsafe,
    pub status_ind: StatusInd,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DataStore {
    pub fn new(params: &ActExecParams) -> Self {
        Self {
            num_cycles: 0,
            num_valid_tcs: 0,
            num_discarded_lines: 0,
            motor_ctrl: MotorCtrl::new(params.motors.clone()),
            servo_ctrl: ServoCtrl::new(params.servos.clone()),
            failsafe: Failsafe::new(&params.failsafe),
            status_ind: StatusInd::new(params.indicators.clone()),
        }
    }

    /// Gather the state shown by the status indicators.
    pub fn indicator_inputs(&self) -> IndicatorInputs {
        IndicatorInputs {
            left_active: self.motor_ctrl.is_active(Side::Left),
            right_active: self.motor_ctrl.is_active(Side::Right),
            joint_active: self.servo_ctrl.is_active(),
            comms_active: self.failsafe.comms_active(),
        }
    }
}
