//! # Actuator Control Executable
//!
//! This executable runs the rover's actuator node:
//! - Drive motors (left and right H-bridges)
//! - Manipulator joints (6 servos)
//! - Status LEDs
//!
//! On a Raspberry Pi the node drives the real equipment and listens to its serial links. On any
//! other host, or when given a script, the node runs against simulated equipment with command
//! lines taken from the script or from stdin.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use std::{
    io::BufRead,
    path::PathBuf,
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};
use color_eyre::{Result, eyre::WrapErr};
use log::{debug, error, info, warn};
use structopt::StructOpt;

// Internal
use act_lib::{
    event_log::EventLog,
    exec::ActExec,
    hal::{
        Eqpt, Platform,
        sim::{SimGpio, SimLink, SimPwm, SimServo, SimWatchdog},
    },
    motor_ctrl::Side,
    params::ActExecParams,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    script_interpreter::{PendingLines, ScriptInterpreter},
    session::Session,
    time::{Clock, Millis, PeriodicGate, SystemClock},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Period between status reports in the log.
const STATUS_REPORT_PERIOD_MS: Millis = 1000;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "act_exec", about = "Rover actuator node")]
struct Opt {
    /// Script of timed command lines to run against simulated equipment
    #[structopt(short, long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Parameter file, relative to $ROVER_SW_ROOT/params
    #[structopt(short, long, default_value = "act_exec.toml")]
    params: String,
}

/// Simulated equipment with events going to the session's event log.
struct HostPlatform;

impl Platform for HostPlatform {
    type Pwm = SimPwm;
    type Servo = Option<SimServo>;
    type Gpio = SimGpio;
    type Link = SimLink;
    type Watchdog = SimWatchdog;
    type Events = EventLog;
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    let opt = Opt::from_args();

    // Initialise session
    let session = Session::new(
        "act_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, Some(&session))
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Actuator Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let params: ActExecParams = util::params::load(&opt.params)
        .wrap_err("Failed to load parameters")?;
    params.are_valid()
        .wrap_err("Invalid parameters")?;

    info!("Parameters loaded");

    // ---- RUN ----

    #[cfg(all(target_arch = "arm", target_os = "linux"))]
    {
        if opt.script.is_none() {
            return rpi::run(&params, &session)
        }
    }

    run_host(&params, &session, opt.script)
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run against simulated equipment, taking command lines from a script or from stdin.
fn run_host(params: &ActExecParams, session: &Session, script_path: Option<PathBuf>) -> Result<()> {

    let mut script = match script_path {
        Some(p) => {
            let s = ScriptInterpreter::new(&p)
                .wrap_err("Failed to load the script")?;
            info!(
                "Loaded script {:?}: {} lines over {:.1} s",
                p, s.get_num_lines(), s.get_duration()
            );
            Some(s)
        },
        None => None
    };

    // Without a script, stdin is the first command link
    let link_0 = match script {
        Some(_) => SimLink::default(),
        None => {
            let (tx, rx) = mpsc::channel();

            thread::spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let mut bytes = match line {
                        Ok(l) => l.into_bytes(),
                        Err(_) => break
                    };
                    bytes.push(b'\n');

                    if tx.send(bytes).is_err() {
                        break
                    }
                }
            });

            info!("Reading command lines from stdin");
            SimLink::with_feed(rx)
        }
    };

    let eqpt = Eqpt::<HostPlatform> {
        motor_pwm: SimPwm::default(),
        servo_drv: Some(SimServo::default()),
        gpio: SimGpio::default(),
        links: [link_0, SimLink::default()],
        watchdog: SimWatchdog::new(params.watchdog.timeout_ms),
        events: EventLog::new(session),
    };

    let mut exec = ActExec::new(params, eqpt);

    run_loop(&mut exec, params, |exec, now_ms| {
        // A real watchdog would reset the node here
        if exec.eqpt.watchdog.expired(now_ms) {
            error!(
                "Watchdog expired, not fed for over {} ms",
                exec.eqpt.watchdog.timeout_ms
            );
            return false
        }

        let script = match script {
            Some(ref mut s) => s,
            None => return true
        };

        match script.get_pending_lines(now_ms as f64 / 1000.0) {
            PendingLines::Some(lines) => {
                for line in lines {
                    debug!("Script: {:?}", line);
                    exec.eqpt.links[0].push_str(&line);
                    exec.eqpt.links[0].push_str("\n");
                }
                true
            },
            PendingLines::None => true,
            PendingLines::EndOfScript => {
                // Let the failsafe bring everything to rest before stopping
                if exec.ds.failsafe.is_tripped() {
                    info!("End of script reached");
                    false
                }
                else {
                    true
                }
            }
        }
    });

    Ok(())
}

/// Boot the node and run the control loop until `pre_cycle` returns `false`.
fn run_loop<P, F>(exec: &mut ActExec<P>, params: &ActExecParams, mut pre_cycle: F)
where
    P: Platform,
    F: FnMut(&mut ActExec<P>, Millis) -> bool
{
    let clock = SystemClock::new();
    let period = Duration::from_millis(params.loop_period_ms);
    let mut report_gate = PeriodicGate::new(STATUS_REPORT_PERIOD_MS);

    exec.boot(clock.now_ms());

    info!("Initialisation complete, entering main loop");

    loop {
        let cycle_start = Instant::now();
        let now_ms = clock.now_ms();

        if !pre_cycle(exec, now_ms) {
            break
        }

        exec.cycle(now_ms);

        if report_gate.ready(now_ms) {
            let ds = &exec.ds;
            debug!(
                "Cycle {}: left {}/{}, right {}/{}, joints moving {}, failsafe {:?}, \
                 {} valid TCs, {} discarded lines, {} bytes dropped",
                ds.num_cycles,
                ds.motor_ctrl.channel(Side::Left).current,
                ds.motor_ctrl.channel(Side::Left).target,
                ds.motor_ctrl.channel(Side::Right).current,
                ds.motor_ctrl.channel(Side::Right).target,
                ds.servo_ctrl.is_active(),
                ds.failsafe.state(),
                ds.num_valid_tcs,
                ds.num_discarded_lines,
                exec.num_dropped_bytes()
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let elapsed = cycle_start.elapsed();
        let elapsed_ms = elapsed.as_millis() as Millis;
        if let Some(over_ms) = overrun_ms(elapsed_ms, params.watchdog.max_loop_time_ms) {
            warn!(
                "Cycle took {} ms, {} ms over the maximum loop time",
                elapsed_ms,
                over_ms
            );
        }

        if let Some(remaining) = period.checked_sub(elapsed) {
            thread::sleep(remaining);
        }
    }
}

/// Time by which a cycle exceeded the maximum loop time, if it did.
fn overrun_ms(elapsed_ms: Millis, max_loop_time_ms: Millis) -> Option<Millis> {
    match elapsed_ms.checked_sub(max_loop_time_ms) {
        Some(over) if over > 0 => Some(over),
        _ => None
    }
}

// ------------------------------------------------------------------------------------------------
// RASPBERRY PI
// ------------------------------------------------------------------------------------------------

#[cfg(all(target_arch = "arm", target_os = "linux"))]
mod rpi {
    use super::*;
    use act_lib::{
        hal::{
            linux_wdt::DevWatchdog,
            rpi::{RpiGpio, RpiPlatform, RpiPwm, RpiUart},
        },
        servo_ctrl::pca9685::Pca9685Servo,
    };
    use rppal::i2c::I2c;

    /// Run against the Pi's equipment. Equipment which cannot be brought up is left out and the
    /// node runs without it.
    pub fn run(params: &ActExecParams, session: &Session) -> Result<()> {
        let motor_pwm = RpiPwm::new(
            &params.motors.pwm_channels(),
            params.motors.pwm_freq_hz
        ).map_err(|e| warn!("Motor PWM unavailable: {}", e)).ok();

        let servo_drv = match I2c::new() {
            Ok(i2c) => Pca9685Servo::init(
                i2c,
                params.servos.i2c_address,
                params.servos.pwm_freq_hz
            ).map_err(|e| warn!("Servo board unavailable: {}", e)).ok(),
            Err(e) => {
                warn!("I2C bus unavailable: {}", e);
                None
            }
        };

        let mut pins = params.indicators.pins().to_vec();
        pins.extend_from_slice(&params.motors.enable_pins());
        let gpio = RpiGpio::new(&pins)
            .map_err(|e| warn!("GPIO unavailable: {}", e)).ok();

        let open_link = |i: usize| {
            let dev = params.links.devices.get(i)?;
            RpiUart::open(dev, params.links.baud_rate)
                .map_err(|e| warn!("Command link {} ({}) unavailable: {}", i, dev, e))
                .ok()
        };
        let links = [open_link(0), open_link(1)];

        let watchdog = match params.watchdog.device {
            Some(ref dev) => DevWatchdog::open(dev, params.watchdog.timeout_ms)
                .map_err(|e| warn!("Watchdog {} unavailable: {}", dev, e))
                .ok(),
            None => {
                warn!("Running without a watchdog");
                None
            }
        };

        let eqpt = Eqpt::<RpiPlatform> {
            motor_pwm,
            servo_drv,
            gpio,
            links,
            watchdog,
            events: EventLog::new(session),
        };

        let mut exec = ActExec::new(params, eqpt);
        run_loop(&mut exec, params, |_, _| true);

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_overrun() {
        assert_eq!(overrun_ms(50, 100), None);
        assert_eq!(overrun_ms(100, 100), None);
        assert_eq!(overrun_ms(130, 100), Some(30));
    }
}
