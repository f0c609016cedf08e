//! # Command line operator
//!
//! Interactive console which encodes drive and joint commands into telecommand lines and writes
//! them to the actuator node's serial link, or to stdout if no device is given.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::PathBuf,
};

use color_eyre::{Result, eyre::WrapErr};
use rustyline::{error::ReadlineError, DefaultEditor};
use structopt::{clap::AppSettings, StructOpt};

use comms_if::tc::{JointDir, Tc, NUM_JOINTS};

const PROMPT: &str = "Rover $ ";

#[derive(Debug, StructOpt)]
#[structopt(name = "command_line_operator", about = "Operator console for the actuator node")]
struct Opt {
    /// Serial device of the command link, telecommands are printed if not given
    #[structopt(short, long, parse(from_os_str))]
    device: Option<PathBuf>,

    /// File to keep the command history in
    #[structopt(long, parse(from_os_str), default_value = "data/history.txt")]
    history: PathBuf,
}

/// A command typed at the console.
#[derive(Debug, PartialEq, StructOpt)]
#[structopt(
    name = "",
    no_version,
    global_settings = &[AppSettings::NoBinaryName, AppSettings::AllowNegativeNumbers]
)]
enum Cmd {
    /// Set the left and right drive demands (-255 to 255)
    Drive {
        left: i32,
        right: i32,
    },

    /// Move a manipulator joint
    Joint {
        /// Joint number, 1 to 6
        joint: usize,

        /// One of retract, extend or hold
        #[structopt(parse(try_from_str = parse_dir))]
        dir: JointDir,
    },

    /// Stop the drive motors and hold every joint
    Stop,

    /// Send a line exactly as typed
    Raw {
        line: Vec<String>,
    },

    /// Leave the console
    Exit,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    let mut out: Box<dyn Write> = match opt.device {
        Some(ref path) => Box::new(
            OpenOptions::new()
                .write(true)
                .open(path)
                .wrap_err_with(|| format!("Could not open {:?}", path))?
        ),
        None => Box::new(io::stdout()),
    };

    let mut rl = DefaultEditor::new().wrap_err("Could not start the line editor")?;
    if rl.load_history(&opt.history).is_err() {
        println!("No history detected");
    }

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                println!("Unhandled Error: {:?}", e);
                break
            }
        };

        if line.trim().is_empty() {
            continue
        }
        rl.add_history_entry(line.as_str()).ok();

        let cmd = match Cmd::from_iter_safe(line.split_whitespace()) {
            Ok(c) => c,
            Err(e) => {
                // Also covers `help`
                println!("{}", e.message);
                continue
            }
        };

        if cmd == Cmd::Exit {
            break
        }

        match encode(&cmd) {
            Ok(tcs) => {
                for tc in tcs {
                    out.write_all(tc.as_bytes()).wrap_err("Could not send telecommand")?;
                }
                out.flush().wrap_err("Could not send telecommand")?;
            },
            Err(e) => println!("{}", e),
        }
    }

    println!("Exiting...");

    if let Some(dir) = opt.history.parent() {
        std::fs::create_dir_all(dir).ok();
    }
    rl.save_history(&opt.history).wrap_err("Could not save the history")?;

    Ok(())
}

/// Encode a command into the lines to send.
fn encode(cmd: &Cmd) -> Result<Vec<String>, String> {
    match cmd {
        Cmd::Drive { left, right } => Ok(vec![
            Tc::Drive { left: *left, right: *right }.to_line()
        ]),
        Cmd::Joint { joint, dir } => {
            if *joint == 0 || *joint > NUM_JOINTS {
                return Err(format!("Joint must be between 1 and {}", NUM_JOINTS))
            }
            Ok(vec![Tc::Joint { joint: joint - 1, dir: *dir }.to_line()])
        },
        Cmd::Stop => {
            let mut lines = vec![Tc::Drive { left: 0, right: 0 }.to_line()];
            lines.extend(
                (0..NUM_JOINTS).map(|joint| Tc::Joint { joint, dir: JointDir::Hold }.to_line())
            );
            Ok(lines)
        },
        Cmd::Raw { line } => Ok(vec![format!("{}\n", line.join(" "))]),
        Cmd::Exit => Ok(vec![]),
    }
}

fn parse_dir(s: &str) -> Result<JointDir, String> {
    match s.to_lowercase().as_str() {
        "retract" | "l" => Ok(JointDir::Retract),
        "extend" | "r" => Ok(JointDir::Extend),
        "hold" | "h" => Ok(JointDir::Hold),
        _ => Err(format!("Unknown direction {:?}, expected retract, extend or hold", s)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lines(s: &str) -> Result<Vec<String>, String> {
        let cmd = Cmd::from_iter_safe(s.split_whitespace()).map_err(|e| e.message)?;
        encode(&cmd)
    }

    #[test]
    fn test_drive() {
        assert_eq!(lines("drive 100 -50"), Ok(vec![String::from("100,-50\n")]));
        assert_eq!(lines("drive 300 0"), Ok(vec![String::from("255,0\n")]));
        assert!(lines("drive 100").is_err());
    }

    #[test]
    fn test_joint() {
        assert_eq!(lines("joint 3 retract"), Ok(vec![String::from("S3L\n")]));
        assert_eq!(lines("joint 1 R"), Ok(vec![String::from("S1R\n")]));
        assert!(lines("joint 7 extend").is_err());
        assert!(lines("joint 2 sideways").is_err());
    }

    #[test]
    fn test_stop_and_raw() {
        let stop = lines("stop").unwrap();
        assert_eq!(stop.len(), 1 + NUM_JOINTS);
        assert_eq!(stop[0], "0,0\n");
        assert_eq!(stop[6], "S6H\n");

        assert_eq!(lines("raw Q,9"), Ok(vec![String::from("Q,9\n")]));
        assert_eq!(Cmd::from_iter_safe("exit".split_whitespace()).unwrap(), Cmd::Exit);
    }
}
