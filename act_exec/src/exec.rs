//! # Actuator executive
//!
//! Owns the data store, the equipment and the line framers for each command link, and runs one
//! cycle of the cooperative control loop per call. Nothing in a cycle waits: links are drained of
//! whatever is buffered, and each controller runs only when its own cadence is due.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{info, trace, warn};

// Internal
use comms_if::event::EventCode;
use util::time::Millis;
use crate::{
    data_store::DataStore,
    hal::{ByteStream, DigitalOut, Eqpt, EventSink, Platform, PwmOut, Watchdog, NUM_LINKS},
    ingest::CmdIngestor,
    params::ActExecParams,
    servo_ctrl::ServoDriver,
    tc_processor,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ActExec<P: Platform> {
    pub ds: DataStore,

    pub eqpt: Eqpt<P>,

    ingestors: [CmdIngestor; NUM_LINKS],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P: Platform> ActExec<P> {
    pub fn new(params: &ActExecParams, eqpt: Eqpt<P>) -> Self {
        Self {
            ds: DataStore::new(params),
            eqpt,
            ingestors: Default::default(),
        }
    }

    /// Bring up the actuators and arm the failsafe.
    pub fn boot(&mut self, now_ms: Millis) {
        let Self { ds, eqpt, .. } = self;

        eqpt.events.log_event(EventCode::BootStart, now_ms);

        if eqpt.watchdog.caused_last_reset() {
            warn!("The previous reset was caused by the watchdog");
            eqpt.events.log_event(EventCode::WatchdogReset, now_ms);
        }

        eqpt.events.log_event(EventCode::ActInitStart, now_ms);

        if !eqpt.gpio.is_present() {
            warn!("GPIO not available, indicators and motor enables will have no effect");
            eqpt.events.log_event(EventCode::GpioFault, now_ms);
        }

        ds.motor_ctrl.begin(&mut eqpt.motor_pwm, &mut eqpt.gpio);
        if eqpt.motor_pwm.is_present() {
            eqpt.events.log_event(EventCode::MotorsReady, now_ms);
        }
        else {
            warn!("Motor PWM not available, drive demands will have no effect");
            eqpt.events.log_event(EventCode::MotorDriverFault, now_ms);
        }

        ds.servo_ctrl.begin(&mut eqpt.servo_drv);
        if eqpt.servo_drv.is_present() {
            eqpt.events.log_event(EventCode::ServosReady, now_ms);
        }
        else {
            warn!("Servo board not available, joint demands will have no effect");
            eqpt.events.log_event(EventCode::I2cHang, now_ms);
        }

        for (i, link) in eqpt.links.iter().enumerate() {
            if !link.is_present() {
                warn!("Command link {} not available", i);
                eqpt.events.log_event(EventCode::LinkDown, now_ms);
            }
        }

        ds.failsafe.arm(now_ms);
        eqpt.watchdog.feed(now_ms);

        eqpt.events.log_event(EventCode::BootComplete, now_ms);
        info!("Boot complete");
    }

    /// Run one cycle of the control loop at `now_ms`.
    pub fn cycle(&mut self, now_ms: Millis) {
        let Self { ds, eqpt, ingestors } = self;

        ds.num_cycles += 1;

        eqpt.watchdog.feed(now_ms);

        // ---- TELECOMMANDS ----

        let events = &mut eqpt.events;
        for (ingestor, link) in ingestors.iter_mut().zip(eqpt.links.iter_mut()) {
            ingestor.drain(link, |line| {
                tc_processor::exec(ds, line, now_ms, events);
            });
        }

        // ---- FAILSAFE ----

        ds.failsafe.check(
            now_ms,
            &mut ds.motor_ctrl,
            &mut ds.servo_ctrl,
            &mut eqpt.motor_pwm,
            &mut eqpt.events,
        );

        // ---- ACTUATORS ----

        if ds.motor_ctrl.tick(now_ms, &mut eqpt.motor_pwm) {
            trace!("MotorCtrl updated");
        }
        ds.servo_ctrl.tick(now_ms, &mut eqpt.servo_drv);

        // ---- INDICATORS ----

        let inputs = ds.indicator_inputs();
        ds.status_ind.update(now_ms, &inputs, &mut eqpt.gpio);
    }

    /// Total bytes dropped from over-long lines across all links.
    pub fn num_dropped_bytes(&self) -> usize {
        self.ingestors.iter().map(|i| i.num_dropped_bytes).sum()
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
        hal::sim::{SimEvents, SimGpio, SimLink, SimPlatform, SimPwm, SimServo, SimWatchdog},
        motor_ctrl::Side,
    };

    fn sim_exec() -> ActExec<SimPlatform> {
        let eqpt = Eqpt::<SimPlatform> {
            motor_pwm: SimPwm::default(),
            servo_drv: Some(SimServo::default()),
            gpio: SimGpio::default(),
            links: [SimLink::default(), SimLink::default()],
            watchdog: SimWatchdog::default(),
            events: SimEvents::default(),
        };

        ActExec::new(&ActExecParams::default(), eqpt)
    }

    /// Sim equipment where every peripheral may be missing.
    struct DegradedPlatform;

    impl Platform for DegradedPlatform {
        type Pwm = Option<SimPwm>;
        type Servo = Option<SimServo>;
        type Gpio = Option<SimGpio>;
        type Link = Option<SimLink>;
        type Watchdog = SimWatchdog;
        type Events = SimEvents;
    }

    fn booted() -> ActExec<SimPlatform> {
        let mut exec = sim_exec();
        exec.boot(0);
        exec.eqpt.events.events.clear();
        exec
    }

    #[test]
    fn test_boot_events() {
        let mut exec = sim_exec();
        exec.boot(0);

        assert_eq!(
            exec.eqpt.events.codes(),
            vec![
                EventCode::BootStart,
                EventCode::ActInitStart,
                EventCode::MotorsReady,
                EventCode::ServosReady,
                EventCode::BootComplete,
            ]
        );
        assert_eq!(exec.eqpt.servo_drv.as_ref().unwrap().pulse(0), Some(375));
        assert!(exec.eqpt.gpio.level(21));
    }

    #[test]
    fn test_degraded_boot() {
        let mut exec = sim_exec();
        exec.eqpt.servo_drv = None;
        exec.eqpt.watchdog.reset_flag = true;
        exec.boot(0);

        assert_eq!(
            exec.eqpt.events.codes(),
            vec![
                EventCode::BootStart,
                EventCode::WatchdogReset,
                EventCode::ActInitStart,
                EventCode::MotorsReady,
                EventCode::I2cHang,
                EventCode::BootComplete,
            ]
        );

        // Joint commands still parse and run against the missing board
        exec.eqpt.links[0].push_str("S1R\n");
        for t in 1..=100 {
            exec.cycle(t);
        }
        assert!(exec.ds.servo_ctrl.is_active());
    }

    #[test]
    fn test_missing_motor_driver_gpio_and_link() {
        let eqpt = Eqpt::<DegradedPlatform> {
            motor_pwm: None,
            servo_drv: Some(SimServo::default()),
            gpio: None,
            links: [Some(SimLink::default()), None],
            watchdog: SimWatchdog::default(),
            events: SimEvents::default(),
        };
        let mut exec = ActExec::new(&ActExecParams::default(), eqpt);
        exec.boot(0);

        assert_eq!(
            exec.eqpt.events.codes(),
            vec![
                EventCode::BootStart,
                EventCode::ActInitStart,
                EventCode::GpioFault,
                EventCode::MotorDriverFault,
                EventCode::ServosReady,
                EventCode::LinkDown,
                EventCode::BootComplete,
            ]
        );
        assert_eq!(exec.eqpt.events.count(EventCode::MotorsReady), 0);

        // The remaining link still drives the controllers
        if let Some(link) = exec.eqpt.links[0].as_mut() {
            link.push_str("40,40\n");
        }
        for t in 1..=10 {
            exec.cycle(t);
        }
        assert_eq!(exec.ds.motor_ctrl.channel(Side::Left).target, 40);
        assert_eq!(exec.ds.num_valid_tcs, 1);
    }

    #[test]
    fn test_stalled_loop_expires_watchdog() {
        let mut exec = booted();
        let timeout_ms = exec.eqpt.watchdog.timeout_ms;

        for t in 1..=10 {
            exec.cycle(t);
            assert!(!exec.eqpt.watchdog.expired(t + 1));
        }

        // Loop stalls after the cycle at 10 ms
        assert!(!exec.eqpt.watchdog.expired(10 + timeout_ms));
        assert!(exec.eqpt.watchdog.expired(11 + timeout_ms));

        // Feeding again in time keeps it from expiring
        let mut exec = booted();
        exec.eqpt.watchdog.timeout_ms = 50;
        for t in (0..=1000).step_by(25) {
            exec.cycle(t);
            assert!(!exec.eqpt.watchdog.expired(t + 50));
        }
    }

    #[test]
    fn test_drive_then_silence() {
        let mut exec = booted();

        exec.eqpt.links[0].push_str("100,100\n");

        let mut prev = 0;
        let mut tripped_at = None;
        for t in 1..=1000 {
            exec.cycle(t);
            let current = exec.ds.motor_ctrl.channel(Side::Left).current;

            if tripped_at.is_none() {
                if exec.ds.failsafe.is_tripped() {
                    tripped_at = Some(t);
                }
                else {
                    assert!((current - prev).abs() <= 5);
                }
            }
            prev = current;
        }

        // Last valid telecommand at 1 ms, so the deadline passes at 502 ms
        assert_eq!(tripped_at, Some(502));
        assert_eq!(exec.ds.motor_ctrl.channel(Side::Left).current, 0);
        assert_eq!(exec.ds.motor_ctrl.channel(Side::Right).current, 0);
        assert_eq!(exec.eqpt.motor_pwm.duty(2), 0);
        assert_eq!(exec.eqpt.motor_pwm.duty(5), 0);
        assert_eq!(exec.eqpt.events.codes(), vec![EventCode::FailsafeTrigger]);

        // A valid telecommand clears the trip and ramps from zero
        exec.eqpt.links[1].push_str("50,-50\r\n");
        exec.cycle(1001);
        assert!(!exec.ds.failsafe.is_tripped());
        assert_eq!(exec.eqpt.events.count(EventCode::FailsafeClear), 1);

        for t in 1002..=1010 {
            exec.cycle(t);
        }
        assert_eq!(exec.ds.motor_ctrl.channel(Side::Left).current, 5);
        assert_eq!(exec.ds.motor_ctrl.channel(Side::Right).current, -5);
    }

    #[test]
    fn test_single_clear_for_batch() {
        let mut exec = booted();

        exec.cycle(600);
        assert!(exec.ds.failsafe.is_tripped());

        exec.eqpt.links[0].push_str("10,10\n20,20\n");
        exec.eqpt.links[1].push_str("S1R\n");
        exec.cycle(601);

        assert_eq!(exec.eqpt.events.count(EventCode::FailsafeClear), 1);
        assert_eq!(exec.ds.motor_ctrl.channel(Side::Left).target, 20);
        assert_eq!(exec.ds.servo_ctrl.joint(0).unwrap().dir, JointDir::Extend);
        assert_eq!(exec.ds.num_valid_tcs, 3);
    }

    #[test]
    fn test_malformed_does_not_reset_deadline() {
        let mut exec = booted();

        for t in 1..=500 {
            if t == 400 {
                exec.eqpt.links[0].push_str("Q,9\nS9X\n");
            }
            exec.cycle(t);
        }
        assert!(!exec.ds.failsafe.is_tripped());

        exec.cycle(501);
        assert!(exec.ds.failsafe.is_tripped());
        assert_eq!(exec.ds.num_discarded_lines, 2);
    }

    #[test]
    fn test_joint_reversal() {
        let mut exec = booted();

        let mut speeds = Vec::new();
        for t in 1..=3000 {
            if t % 100 == 1 {
                let line = if t <= 1000 { "S3L\n" } else { "S3R\n" };
                exec.eqpt.links[0].push_str(line);
            }
            exec.cycle(t);

            let j = exec.ds.servo_ctrl.joint(2).unwrap();
            assert!(j.angle_deg >= 0.0 && j.angle_deg <= 180.0);
            if t > 1000 {
                speeds.push(j.speed);
            }
        }

        assert!(!exec.ds.failsafe.is_tripped());
        assert!(speeds[0] < 0.0);
        assert!(speeds.windows(2).all(|w| w[1] >= w[0]));
        assert!((speeds[speeds.len() - 1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_watchdog_and_indicators() {
        let mut exec = booted();

        exec.eqpt.links[0].push_str("80,80\n");
        for t in 1..=200 {
            exec.cycle(t);
        }

        // Fed once at boot and once per cycle
        assert_eq!(exec.eqpt.watchdog.num_feeds, 201);

        // Both sides driving, scanner relit on its first LED
        assert_eq!(exec.ds.status_ind.levels().scanner, [true, false]);
        assert!(exec.ds.indicator_inputs().comms_active);
        assert!(exec.ds.indicator_inputs().left_active);

        // Beacon is solid while the joints are still
        assert!(exec.eqpt.gpio.level(9));

        for t in 201..=800 {
            exec.cycle(t);
        }
        assert!(!exec.ds.indicator_inputs().comms_active);
        assert!(!exec.eqpt.gpio.level(24));
        assert!(!exec.eqpt.gpio.level(10));
        assert!(!exec.eqpt.gpio.level(11));
    }
}
