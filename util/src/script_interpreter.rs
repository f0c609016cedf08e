//! # Command script interpreter module
//!
//! This module provides an interpreter for command scripts, allowing command
//! lines to be replayed into the actuator executable at scripted times.
//!
//! A script is a list of `<time_s>: <command line>;` entries, for example:
//!
//! ```text
//! 0.0: 100,100;
//! 0.2: S3L;
//! 1.5: S3R;
//! ```
//!
//! The command lines are not validated here, so malformed lines can be
//! scripted to exercise the receiving side.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command line which is scripted to occur at a specific time.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedLine {
    /// The time the line is to be sent at
    exec_time_s: f64,

    /// The command line, without terminator
    line: String
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending_lines` to acquire a list of command lines that are due.
pub struct ScriptInterpreter {
    _script_path: PathBuf,
    lines: VecDeque<ScriptedLine>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script timestamps must not decrease ({0} s follows {1} s)")]
    OutOfOrder(f64, f64)
}

#[derive(Debug, PartialEq)]
pub enum PendingLines {
    None,
    Some(Vec<String>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());
        
        // Check that the script file exists.
        if !path.exists() {
            return Err(
                ScriptError::ScriptNotFound(path.display().to_string()));
        }

        // Load the script into a string
        let script = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e))
        };

        let lines = Self::parse(&script)?;

        Ok(ScriptInterpreter {
            _script_path: path,
            lines
        })
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        Ok(ScriptInterpreter {
            _script_path: PathBuf::new(),
            lines: Self::parse(script)?
        })
    }

    /// Return the lines that are due at `elapsed_s`, in script order.
    pub fn get_pending_lines(&mut self, elapsed_s: f64) -> PendingLines {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.lines.is_empty() {
            return PendingLines::EndOfScript
        }

        let mut due: Vec<String> = vec![];

        // Pop lines from the front of the queue until the head's exec time is
        // later than the current time.
        while let Some(front) = self.lines.front() {
            if front.exec_time_s > elapsed_s {
                break;
            }
            if let Some(l) = self.lines.pop_front() {
                due.push(l.line);
            }
        }

        if due.is_empty() {
            PendingLines::None
        }
        else {
            PendingLines::Some(due)
        }
    }

    /// Get the number of lines remaining in the script
    pub fn get_num_lines(&self) -> usize {
        self.lines.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.lines.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }

    fn parse(script: &str) -> Result<VecDeque<ScriptedLine>, ScriptError> {
        // Empty queue of lines
        let mut queue: VecDeque<ScriptedLine> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("Script regex is invalid");

        for cap in re.captures_iter(script) {
            let (time_str, line) = match (cap.get(1), cap.get(3)) {
                (Some(t), Some(l)) => (t.as_str(), l.as_str()),
                _ => continue
            };

            // Parse the exec time
            let exec_time_s: f64 = match time_str.parse() {
                Ok(t) => t,
                Err(e) => return Err(
                    ScriptError::InvalidTimestamp(format!("{}", e)))
            };

            if let Some(prev) = queue.back() {
                if exec_time_s < prev.exec_time_s {
                    return Err(ScriptError::OutOfOrder(exec_time_s, prev.exec_time_s))
                }
            }

            queue.push_back(ScriptedLine {
                exec_time_s,
                line: line.trim().to_string()
            });
        }

        if queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(queue)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const SCRIPT: &str = "
        0.0: 100,100;
        0.5: S3L;
        0.5: Q,9;
        2: S3R;
    ";

    #[test]
    fn test_pending_lines() {
        let mut si = ScriptInterpreter::from_script(SCRIPT).unwrap();

        assert_eq!(si.get_num_lines(), 4);
        assert_eq!(si.get_duration(), 2.0);

        assert_eq!(
            si.get_pending_lines(0.0),
            PendingLines::Some(vec![String::from("100,100")])
        );
        assert_eq!(si.get_pending_lines(0.4), PendingLines::None);
        assert_eq!(
            si.get_pending_lines(1.0),
            PendingLines::Some(vec![String::from("S3L"), String::from("Q,9")])
        );
        assert_eq!(
            si.get_pending_lines(2.1),
            PendingLines::Some(vec![String::from("S3R")])
        );
        assert_eq!(si.get_pending_lines(3.0), PendingLines::EndOfScript);
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            ScriptInterpreter::from_script("nothing to see here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_script("1.0: 0,0;\n0.5: 0,0;"),
            Err(ScriptError::OutOfOrder(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::new("/no/such/script.txt"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
