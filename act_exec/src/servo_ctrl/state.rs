//! Implementations for the ServoCtrl state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};

// Internal
use comms_if::tc::JointDir;
use util::{
    maths::{clamp, lin_map},
    time::{Millis, PeriodicGate},
};
use super::{Params, ServoDriver, MAX_ANGLE_DEG, MIN_ANGLE_DEG, NUM_JOINTS};
use crate::ramp::RampRate;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Servo control module state
pub struct ServoCtrl {
    params: Params,

    gate: PeriodicGate,

    rate: RampRate<f64>,

    joints: [JointChannel; NUM_JOINTS],

    /// True while writes to the servo board are failing
    output_fault: bool,
}

/// State of a single manipulator joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointChannel {
    /// Units: degrees, always within `[0, 180]`
    pub angle_deg: f64,

    /// Units: degrees/update, positive when extending
    pub speed: f64,

    pub sensitivity: f64,

    /// Direction most recently commanded
    pub dir: JointDir,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl ServoCtrl {
    pub fn new(params: Params) -> Self {
        let angle = clamp(&params.initial_angle_deg, &MIN_ANGLE_DEG, &MAX_ANGLE_DEG);

        let mut joints = [JointChannel {
            angle_deg: angle,
            speed: 0.0,
            sensitivity: 1.0,
            dir: JointDir::Hold,
        }; NUM_JOINTS];

        for (j, s) in joints.iter_mut().zip(params.sensitivity.iter()) {
            j.sensitivity = *s;
        }

        Self {
            gate: PeriodicGate::new(params.update_period_ms),
            rate: RampRate::new(params.accel, params.decel),
            params,
            joints,
            output_fault: false,
        }
    }

    /// Drive every joint to its current angle.
    pub fn begin<D: ServoDriver>(&mut self, driver: &mut D) {
        let ok = self.write_all(driver);
        self.record_output(ok);

        info!(
            "ServoCtrl ready, {} joints at {:.0} deg",
            NUM_JOINTS, self.params.initial_angle_deg
        );
    }

    /// Set the commanded direction of a joint. Joints which do not exist are ignored.
    pub fn set_direction(&mut self, joint: usize, dir: JointDir) {
        match self.joints.get_mut(joint) {
            Some(j) => j.dir = dir,
            None => debug!("Ignoring direction for non-existent joint {}", joint)
        }
    }

    /// Command every joint to hold.
    pub fn hold_all(&mut self) {
        for j in self.joints.iter_mut() {
            j.dir = JointDir::Hold;
        }
    }

    /// Run an update if the module's cadence is due at `now_ms`.
    ///
    /// Returns `true` if an update was run.
    pub fn tick<D: ServoDriver>(&mut self, now_ms: Millis, driver: &mut D) -> bool {
        if self.gate.ready(now_ms) {
            self.update(driver);
            true
        }
        else {
            false
        }
    }

    /// Advance every joint by one update and write the resulting pulses.
    pub fn update<D: ServoDriver>(&mut self, driver: &mut D) {
        for j in self.joints.iter_mut() {
            let target = match j.dir {
                JointDir::Hold => 0.0,
                JointDir::Retract => -self.params.max_speed * j.sensitivity,
                JointDir::Extend => self.params.max_speed * j.sensitivity,
            };

            j.speed = self.rate.next(j.speed, target);
            j.angle_deg = clamp(&(j.angle_deg + j.speed), &MIN_ANGLE_DEG, &MAX_ANGLE_DEG);
        }

        let ok = self.write_all(driver);
        self.record_output(ok);
    }

    /// Stop every joint where it is. Angles are kept.
    pub fn emergency_stop(&mut self) {
        for j in self.joints.iter_mut() {
            j.speed = 0.0;
        }

        debug!("ServoCtrl emergency stop");
    }

    /// True if any joint is moving.
    pub fn is_active(&self) -> bool {
        self.joints.iter().any(|j| j.speed.abs() > self.params.active_epsilon)
    }

    /// Get a joint by its 0-based index.
    pub fn joint(&self, joint: usize) -> Option<&JointChannel> {
        self.joints.get(joint)
    }

    /// Pulse width for a joint angle. Whole degrees are used, matching the resolution of the
    /// servos.
    pub fn angle_to_pulse(&self, angle_deg: f64) -> u16 {
        lin_map(
            (MIN_ANGLE_DEG, MAX_ANGLE_DEG),
            (self.params.servo_min as f64, self.params.servo_max as f64),
            angle_deg.trunc(),
        ) as u16
    }

    fn write_all<D: ServoDriver>(&self, driver: &mut D) -> bool {
        let mut ok = true;

        for (j, ch) in self.joints.iter().zip(self.params.channels.iter()) {
            let pulse = self.angle_to_pulse(j.angle_deg);

            if let Err(e) = driver.set_pulse(*ch, pulse) {
                trace!("Servo channel {} write failed: {}", ch, e);
                ok = false;
            }
        }

        ok
    }

    fn record_output(&mut self, ok: bool) {
        if !ok && !self.output_fault {
            warn!("Servo board writes are failing, joints may not match demands");
            self.output_fault = true;
        }
        else if ok && self.output_fault {
            info!("Servo board writes recovered");
            self.output_fault = false;
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::hal::sim::SimServo;

    #[test]
    fn test_begin_writes_initial_pulse() {
        let mut ctrl = ServoCtrl::new(Params::default());
        let mut drv = SimServo::default();
        ctrl.begin(&mut drv);

        for ch in 0..NUM_JOINTS {
            assert_eq!(drv.pulse(ch), Some(375));
        }
        assert!(!ctrl.is_active());
    }

    #[test]
    fn test_angle_to_pulse() {
        let ctrl = ServoCtrl::new(Params::default());

        assert_eq!(ctrl.angle_to_pulse(0.0), 150);
        assert_eq!(ctrl.angle_to_pulse(180.0), 600);
        assert_eq!(ctrl.angle_to_pulse(90.0), 375);
        assert_eq!(ctrl.angle_to_pulse(1.9), 152);
    }

    #[test]
    fn test_extend_ramps_and_clamps() {
        let mut ctrl = ServoCtrl::new(Params::default());
        let mut drv = SimServo::default();

        ctrl.set_direction(0, JointDir::Extend);
        ctrl.update(&mut drv);

        let j = ctrl.joint(0).unwrap();
        assert!((j.speed - 0.05).abs() < 1e-9);
        assert!((j.angle_deg - 90.05).abs() < 1e-9);
        assert!(ctrl.is_active());

        for _ in 0..500 {
            ctrl.update(&mut drv);
            let j = ctrl.joint(0).unwrap();
            assert!(j.angle_deg >= 0.0 && j.angle_deg <= 180.0);
            assert!(j.speed <= 2.0);
        }

        assert_eq!(ctrl.joint(0).unwrap().angle_deg, 180.0);
        assert_eq!(drv.pulse(0), Some(600));

        // Untouched joints do not move
        assert_eq!(ctrl.joint(1).unwrap().angle_deg, 90.0);
    }

    #[test]
    fn test_reversal_passes_through_zero() {
        let mut ctrl = ServoCtrl::new(Params::default());
        let mut drv = SimServo::default();

        ctrl.set_direction(2, JointDir::Retract);
        for _ in 0..60 {
            ctrl.update(&mut drv);
        }
        assert!((ctrl.joint(2).unwrap().speed + 2.0).abs() < 1e-9);

        ctrl.set_direction(2, JointDir::Extend);
        let mut prev = ctrl.joint(2).unwrap().speed;
        for _ in 0..100 {
            ctrl.update(&mut drv);
            let speed = ctrl.joint(2).unwrap().speed;

            // Monotonic increase by at most one acceleration step
            assert!(speed >= prev);
            assert!(speed - prev <= 0.05 + 1e-9);
            prev = speed;
        }
        assert!((prev - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_sensitivity_scales_speed() {
        let mut params = Params::default();
        params.sensitivity[4] = 0.5;
        let mut ctrl = ServoCtrl::new(params);
        let mut drv = SimServo::default();

        ctrl.set_direction(4, JointDir::Retract);
        for _ in 0..100 {
            ctrl.update(&mut drv);
        }
        assert!((ctrl.joint(4).unwrap().speed + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_joint_ignored() {
        let mut ctrl = ServoCtrl::new(Params::default());
        ctrl.set_direction(6, JointDir::Extend);
        ctrl.set_direction(usize::MAX, JointDir::Retract);

        for j in 0..NUM_JOINTS {
            assert_eq!(ctrl.joint(j).unwrap().dir, JointDir::Hold);
        }
        assert!(ctrl.joint(6).is_none());
    }

    #[test]
    fn test_emergency_stop_keeps_angle() {
        let mut ctrl = ServoCtrl::new(Params::default());
        let mut drv = SimServo::default();

        ctrl.set_direction(1, JointDir::Extend);
        for _ in 0..20 {
            ctrl.update(&mut drv);
        }
        let angle = ctrl.joint(1).unwrap().angle_deg;

        ctrl.emergency_stop();
        ctrl.hold_all();
        ctrl.update(&mut drv);

        assert_eq!(ctrl.joint(1).unwrap().speed, 0.0);
        assert_eq!(ctrl.joint(1).unwrap().angle_deg, angle);
        assert!(!ctrl.is_active());
    }

    #[test]
    fn test_absent_board() {
        let mut ctrl = ServoCtrl::new(Params::default());
        let mut drv: Option<SimServo> = None;

        ctrl.set_direction(0, JointDir::Extend);
        ctrl.update(&mut drv);
        assert!(!ctrl.output_fault);
        assert!(ctrl.joint(0).unwrap().angle_deg > 90.0);
    }
}
