//! # Failsafe supervisor
//!
//! Stops every actuator if no valid telecommand has been received within the timeout. Once
//! tripped the failsafe holds the actuators stopped on every check until the next valid
//! telecommand arrives, which clears it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Deserialize;

// Internal
use comms_if::event::EventCode;
use util::time::Millis;

use crate::{
    hal::{EventSink, PwmOut},
    motor_ctrl::MotorCtrl,
    servo_ctrl::ServoCtrl,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Longest allowed time between valid telecommands.
    ///
    /// Units: milliseconds
    pub timeout_ms: Millis,
}

pub struct Failsafe {
    timeout_ms: Millis,

    last_valid_tc_ms: Millis,

    state: FailsafeState,

    /// True once any valid telecommand has been received
    link_live: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailsafeState {
    Armed,
    Tripped,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self { timeout_ms: 500 }
    }
}

impl Failsafe {
    pub fn new(params: &Params) -> Self {
        Self {
            timeout_ms: params.timeout_ms,
            last_valid_tc_ms: 0,
            state: FailsafeState::Armed,
            link_live: false,
        }
    }

    /// Start the deadline from `now_ms`.
    pub fn arm(&mut self, now_ms: Millis) {
        self.last_valid_tc_ms = now_ms;
        self.state = FailsafeState::Armed;
    }

    /// Record a valid telecommand, clearing the failsafe if it was tripped.
    ///
    /// Returns `true` if this telecommand cleared a trip.
    pub fn tc_received<E: EventSink>(&mut self, now_ms: Millis, events: &mut E) -> bool {
        self.last_valid_tc_ms = now_ms;
        self.link_live = true;

        match self.state {
            FailsafeState::Tripped => {
                self.state = FailsafeState::Armed;
                events.log_event(EventCode::FailsafeClear, now_ms);
                info!("Valid telecommand received, failsafe cleared");
                true
            },
            FailsafeState::Armed => false
        }
    }

    /// Trip if the deadline has passed, and hold all actuators stopped while tripped.
    pub fn check<P: PwmOut, E: EventSink>(
        &mut self,
        now_ms: Millis,
        motor_ctrl: &mut MotorCtrl,
        servo_ctrl: &mut ServoCtrl,
        motor_pwm: &mut P,
        events: &mut E,
    ) {
        let silence_ms = now_ms.saturating_sub(self.last_valid_tc_ms);

        if self.state == FailsafeState::Armed && silence_ms > self.timeout_ms {
            self.state = FailsafeState::Tripped;
            events.log_event(EventCode::FailsafeTrigger, now_ms);
            warn!(
                "No valid telecommand for {} ms, failsafe tripped, stopping all actuators",
                silence_ms
            );
        }

        if self.state == FailsafeState::Tripped {
            motor_ctrl.emergency_stop(motor_pwm);
            servo_ctrl.emergency_stop();
            servo_ctrl.hold_all();
        }
    }

    pub fn state(&self) -> FailsafeState {
        self.state
    }

    pub fn is_tripped(&self) -> bool {
        self.state == FailsafeState::Tripped
    }

    /// True while valid telecommands are arriving in time.
    pub fn comms_active(&self) -> bool {
        self.link_live && !self.is_tripped()
    }

    pub fn last_valid_tc_ms(&self) -> Millis {
        self.last_valid_tc_ms
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::JointDir;
    use crate::{
        hal::sim::{SimEvents, SimPwm, SimServo},
        motor_ctrl::{self, Side},
        servo_ctrl,
    };

    struct Rig {
        fs: Failsafe,
        motors: MotorCtrl,
        servos: ServoCtrl,
        pwm: SimPwm,
        events: SimEvents,
    }

    impl Rig {
        fn new() -> Self {
            let mut fs = Failsafe::new(&Params::default());
            fs.arm(0);
            Self {
                fs,
                motors: MotorCtrl::new(motor_ctrl::Params::default()),
                servos: ServoCtrl::new(servo_ctrl::Params::default()),
                pwm: SimPwm::default(),
                events: SimEvents::default(),
            }
        }

        fn check(&mut self, now_ms: Millis) {
            self.fs.check(now_ms, &mut self.motors, &mut self.servos, &mut self.pwm, &mut self.events);
        }
    }

    #[test]
    fn test_trip_boundary() {
        let mut rig = Rig::new();

        rig.check(500);
        assert!(!rig.fs.is_tripped());

        rig.check(501);
        assert!(rig.fs.is_tripped());
        assert_eq!(rig.events.codes(), vec![EventCode::FailsafeTrigger]);
    }

    #[test]
    fn test_trip_stops_and_holds() {
        let mut rig = Rig::new();
        let mut drv = SimServo::default();

        rig.motors.set_target(Side::Left, 100);
        rig.motors.update(&mut rig.pwm);
        rig.servos.set_direction(2, JointDir::Extend);
        rig.servos.update(&mut drv);

        rig.check(600);
        assert!(rig.fs.is_tripped());
        assert_eq!(rig.motors.channel(Side::Left).current, 0);
        assert_eq!(rig.motors.channel(Side::Left).target, 0);
        assert_eq!(rig.servos.joint(2).unwrap().speed, 0.0);
        assert_eq!(rig.servos.joint(2).unwrap().dir, JointDir::Hold);

        // Only one trigger per trip, stop is held on every check
        rig.check(700);
        rig.check(800);
        assert_eq!(rig.events.count(EventCode::FailsafeTrigger), 1);
        assert_eq!(rig.pwm.duty(2), 0);
    }

    #[test]
    fn test_clear_once() {
        let mut rig = Rig::new();
        rig.check(1000);
        assert!(!rig.fs.comms_active());

        assert!(rig.fs.tc_received(1010, &mut rig.events));
        assert!(!rig.fs.tc_received(1011, &mut rig.events));
        assert_eq!(rig.events.count(EventCode::FailsafeClear), 1);
        assert!(rig.fs.comms_active());

        // Deadline restarted from the last telecommand
        rig.check(1511);
        assert!(!rig.fs.is_tripped());
        rig.check(1512);
        assert!(rig.fs.is_tripped());
    }
}
