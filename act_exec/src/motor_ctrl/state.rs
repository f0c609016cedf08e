//! Implementations for the MotorCtrl state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};

// Internal
use super::{HBridgeParams, Params, Side, MAX_DUTY, NUM_MOTORS};
use crate::{
    hal::{DigitalOut, HalError, PwmOut},
    ramp::RampRate,
};
use util::time::{Millis, PeriodicGate};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Motor control module state
pub struct MotorCtrl {
    params: Params,

    gate: PeriodicGate,

    rate: RampRate<i32>,

    channels: [ActuatorChannel; NUM_MOTORS],

    /// True while writes to the motor drivers are failing
    output_fault: bool,
}

/// Target and ramped output of one drive motor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorChannel {
    /// Demanded output, set by telecommand.
    ///
    /// Units: duty counts, positive forwards
    pub target: i32,

    /// Output currently being driven, moved only by the ramp or an emergency stop.
    ///
    /// Units: duty counts, positive forwards
    pub current: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl MotorCtrl {
    pub fn new(params: Params) -> Self {
        Self {
            gate: PeriodicGate::new(params.update_period_ms),
            rate: RampRate::symmetric(params.ramp_step),
            params,
            channels: [ActuatorChannel::default(); NUM_MOTORS],
            output_fault: false,
        }
    }

    /// Bring the motor drivers up: enable both drivers and command all lines to zero.
    pub fn begin<P: PwmOut, G: DigitalOut>(&mut self, pwm: &mut P, gpio: &mut G) {
        for pin in self.params.enable_pins().iter() {
            if let Err(e) = gpio.set_level(*pin, true) {
                warn!("Could not enable motor driver line {}: {}", pin, e);
            }
        }

        self.emergency_stop(pwm);

        info!(
            "MotorCtrl ready, ramp step {} every {} ms",
            self.params.ramp_step, self.params.update_period_ms
        );
    }

    /// Set the target of one side, clamped into the valid duty range.
    ///
    /// The output is only affected on the next update.
    pub fn set_target(&mut self, side: Side, target: i32) {
        self.channels[side.index()].target = target.clamp(-MAX_DUTY, MAX_DUTY);
    }

    /// Run an update if the module's cadence is due at `now_ms`.
    ///
    /// Returns `true` if an update was run.
    pub fn tick<P: PwmOut>(&mut self, now_ms: Millis, pwm: &mut P) -> bool {
        if self.gate.ready(now_ms) {
            self.update(pwm);
            true
        }
        else {
            false
        }
    }

    /// Ramp both outputs one step towards their targets and write them to the drivers.
    pub fn update<P: PwmOut>(&mut self, pwm: &mut P) {
        let mut ok = true;

        for side in Side::ALL.iter() {
            let ch = &mut self.channels[side.index()];
            ch.current = self.rate.next(ch.current, ch.target);

            let current = ch.current;
            let bridge = self.bridge(*side);
            ok &= Self::drive(pwm, &bridge, current);
        }

        trace!(
            "MotorCtrl output: left {} (target {}), right {} (target {})",
            self.channels[0].current,
            self.channels[0].target,
            self.channels[1].current,
            self.channels[1].target
        );

        self.record_output(ok);
    }

    /// Set both targets and outputs to zero and write zero to every line immediately.
    ///
    /// This is the only way an output can change by more than one ramp step.
    pub fn emergency_stop<P: PwmOut>(&mut self, pwm: &mut P) {
        let mut ok = true;

        for side in Side::ALL.iter() {
            self.channels[side.index()] = ActuatorChannel::default();

            let bridge = self.bridge(*side);
            ok &= report(pwm.set_duty(bridge.fwd_channel, 0));
            ok &= report(pwm.set_duty(bridge.rev_channel, 0));
        }

        debug!("MotorCtrl emergency stop");

        self.record_output(ok);
    }

    /// A side is active while its target is non-zero.
    pub fn is_active(&self, side: Side) -> bool {
        self.channels[side.index()].target != 0
    }

    pub fn channel(&self, side: Side) -> &ActuatorChannel {
        &self.channels[side.index()]
    }

    fn bridge(&self, side: Side) -> HBridgeParams {
        match side {
            Side::Left => self.params.left,
            Side::Right => self.params.right,
        }
    }

    /// Write a signed output to a driver. The idle line is zeroed before the active line is
    /// driven so that both are never high together.
    fn drive<P: PwmOut>(pwm: &mut P, bridge: &HBridgeParams, current: i32) -> bool {
        let duty = current.unsigned_abs().min(MAX_DUTY as u32) as u8;

        let (active, idle) = if current >= 0 {
            (bridge.fwd_channel, bridge.rev_channel)
        }
        else {
            (bridge.rev_channel, bridge.fwd_channel)
        };

        // Never drive the active line if the idle one could not be zeroed
        report(pwm.set_duty(idle, 0)) && report(pwm.set_duty(active, duty))
    }

    /// Warn once when writes start failing and note when they recover.
    fn record_output(&mut self, ok: bool) {
        if !ok && !self.output_fault {
            warn!("Motor driver writes are failing, outputs may not match demands");
            self.output_fault = true;
        }
        else if ok && self.output_fault {
            info!("Motor driver writes recovered");
            self.output_fault = false;
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn report(result: Result<(), HalError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            trace!("Motor PWM write failed: {}", e);
            false
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::hal::sim::{SimGpio, SimPwm};

    fn setup() -> (MotorCtrl, SimPwm, SimGpio) {
        let mut ctrl = MotorCtrl::new(Params::default());
        let mut pwm = SimPwm::default();
        let mut gpio = SimGpio::default();
        ctrl.begin(&mut pwm, &mut gpio);
        (ctrl, pwm, gpio)
    }

    #[test]
    fn test_begin() {
        let (ctrl, pwm, gpio) = setup();

        for pin in [21, 20, 22, 23].iter() {
            assert!(gpio.level(*pin));
        }
        assert_eq!(pwm.num_writes, 4);
        assert!(!ctrl.is_active(Side::Left));
        assert!(!ctrl.is_active(Side::Right));
    }

    #[test]
    fn test_set_target_clamps() {
        let (mut ctrl, _, _) = setup();

        ctrl.set_target(Side::Left, 1000);
        ctrl.set_target(Side::Right, -1000);
        assert_eq!(ctrl.channel(Side::Left).target, 255);
        assert_eq!(ctrl.channel(Side::Right).target, -255);

        // No output change until the next update
        assert_eq!(ctrl.channel(Side::Left).current, 0);
        assert!(ctrl.is_active(Side::Left));
    }

    #[test]
    fn test_update_step_bound() {
        let (mut ctrl, mut pwm, _) = setup();

        ctrl.set_target(Side::Left, 100);
        ctrl.set_target(Side::Right, -12);

        let mut prev = [0, 0];
        for _ in 0..30 {
            ctrl.update(&mut pwm);
            for side in Side::ALL.iter() {
                let ch = ctrl.channel(*side);
                assert!((ch.current - prev[side.index()]).abs() <= 5);
                prev[side.index()] = ch.current;
            }
        }

        assert_eq!(ctrl.channel(Side::Left).current, 100);
        assert_eq!(ctrl.channel(Side::Right).current, -12);

        // Left forward, right reverse
        assert_eq!(pwm.duty(2), 100);
        assert_eq!(pwm.duty(3), 0);
        assert_eq!(pwm.duty(5), 0);
        assert_eq!(pwm.duty(6), 12);
    }

    #[test]
    fn test_tick_cadence() {
        let (mut ctrl, mut pwm, _) = setup();
        ctrl.set_target(Side::Left, 50);

        assert!(!ctrl.tick(5, &mut pwm));
        assert!(ctrl.tick(10, &mut pwm));
        assert!(!ctrl.tick(15, &mut pwm));
        assert!(ctrl.tick(20, &mut pwm));
        assert_eq!(ctrl.channel(Side::Left).current, 10);
    }

    #[test]
    fn test_emergency_stop() {
        let (mut ctrl, mut pwm, _) = setup();

        ctrl.set_target(Side::Left, 255);
        ctrl.set_target(Side::Right, -255);
        for _ in 0..10 {
            ctrl.update(&mut pwm);
        }
        assert_eq!(pwm.duty(2), 50);

        ctrl.emergency_stop(&mut pwm);

        assert_eq!(*ctrl.channel(Side::Left), ActuatorChannel::default());
        assert_eq!(*ctrl.channel(Side::Right), ActuatorChannel::default());
        for ch in [2, 3, 5, 6].iter() {
            assert_eq!(pwm.duty(*ch), 0);
        }
    }

    #[test]
    fn test_output_fault_keeps_ramping() {
        let (mut ctrl, mut pwm, _) = setup();

        pwm.failing = true;
        ctrl.set_target(Side::Left, 20);
        ctrl.update(&mut pwm);
        assert!(ctrl.output_fault);

        // State still advances so the outputs catch up once writes recover
        assert_eq!(ctrl.channel(Side::Left).current, 5);

        pwm.failing = false;
        ctrl.update(&mut pwm);
        assert!(!ctrl.output_fault);
        assert_eq!(pwm.duty(2), 10);
    }
}
