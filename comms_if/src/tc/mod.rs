//! # Telecommand module
//!
//! This module provides the telecommand line protocol spoken between the
//! operator and the actuator node. Each telecommand is a single ASCII line
//! terminated by `\n` or `\r`, in one of two forms:
//!
//! - Drive: `<int>,<int>` giving the left and right motor targets, each
//!   clamped to `[-255, 255]`.
//! - Joint: `S<digit><dir>`, where `<digit>` is the 1-based joint index
//!   (`1`..`6`) and `<dir>` is `L` (retract) or `R` (extend). Any other
//!   direction character means hold.
//!
//! The link is one-way, so there is no response to a telecommand.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of manipulator joints addressable by a joint telecommand.
pub const NUM_JOINTS: usize = 6;

/// Largest magnitude of a drive target.
pub const DRIVE_LIMIT: i32 = 255;

/// First character of a joint telecommand.
pub const JOINT_MARKER: u8 = b'S';

/// Separator between the left and right values of a drive telecommand.
pub const DRIVE_SEPARATOR: char = ',';

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the rover by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tc {
    /// Set the left and right drive motor targets.
    Drive {
        left: i32,
        right: i32
    },

    /// Set the direction of a manipulator joint.
    Joint {
        /// 0-based joint index, always less than [`NUM_JOINTS`].
        joint: usize,
        dir: JointDir
    }
}

/// Commanded direction of a manipulator joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointDir {
    Retract,
    Extend,
    Hold
}

/// Possible parsing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TcParseError {
    #[error("TC line is empty")]
    Empty,

    #[error("TC line contains non-ASCII data")]
    NotAscii,

    #[error("Joint TC must be 3 characters long, found {0}")]
    InvalidJointLength(usize),

    #[error("Joint index must be a digit, found {0:?}")]
    InvalidJointIndex(char),

    #[error("Joint {0} does not exist")]
    JointOutOfRange(usize),

    #[error("Drive TC must be two integers separated by a single comma")]
    InvalidDriveFormat,

    #[error("Drive value {0:?} is not an integer")]
    InvalidDriveValue(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {

    /// Parse a TC from a single line, without its terminator.
    pub fn from_line(line: &[u8]) -> Result<Self, TcParseError> {
        if line.is_empty() {
            return Err(TcParseError::Empty)
        }

        if !line.is_ascii() {
            return Err(TcParseError::NotAscii)
        }

        if line[0] == JOINT_MARKER {
            Self::parse_joint(line)
        }
        else {
            // Checked as ASCII above, so this is valid UTF-8
            match std::str::from_utf8(line) {
                Ok(s) => Self::parse_drive(s),
                Err(_) => Err(TcParseError::NotAscii)
            }
        }
    }

    /// Get the wire representation of this TC, including the terminator.
    pub fn to_line(&self) -> String {
        match self {
            Tc::Drive { left, right } => format!(
                "{}{}{}\n",
                (*left).clamp(-DRIVE_LIMIT, DRIVE_LIMIT),
                DRIVE_SEPARATOR,
                (*right).clamp(-DRIVE_LIMIT, DRIVE_LIMIT)
            ),
            Tc::Joint { joint, dir } => format!(
                "{}{}{}\n",
                JOINT_MARKER as char,
                joint + 1,
                dir.to_char()
            )
        }
    }

    fn parse_joint(line: &[u8]) -> Result<Self, TcParseError> {
        if line.len() != 3 {
            return Err(TcParseError::InvalidJointLength(line.len()))
        }

        let digit = line[1] as char;
        let number = match digit.to_digit(10) {
            Some(n) => n as usize,
            None => return Err(TcParseError::InvalidJointIndex(digit))
        };

        // Joint numbers on the wire are 1-based
        if number == 0 || number > NUM_JOINTS {
            return Err(TcParseError::JointOutOfRange(number))
        }

        Ok(Tc::Joint {
            joint: number - 1,
            dir: JointDir::from_byte(line[2])
        })
    }

    fn parse_drive(line: &str) -> Result<Self, TcParseError> {
        let mut parts = line.split(DRIVE_SEPARATOR);

        let (left, right) = match (parts.next(), parts.next(), parts.next()) {
            (Some(l), Some(r), None) => (l, r),
            _ => return Err(TcParseError::InvalidDriveFormat)
        };

        Ok(Tc::Drive {
            left: parse_drive_value(left)?,
            right: parse_drive_value(right)?
        })
    }
}

impl JointDir {
    /// Get the direction from its wire character. Anything other than `L` or
    /// `R` is treated as hold.
    pub fn from_byte(b: u8) -> Self {
        match b {
            b'L' => JointDir::Retract,
            b'R' => JointDir::Extend,
            _ => JointDir::Hold
        }
    }

    /// Get the wire character for this direction.
    pub fn to_char(&self) -> char {
        match self {
            JointDir::Retract => 'L',
            JointDir::Extend => 'R',
            JointDir::Hold => 'H'
        }
    }
}

impl Default for JointDir {
    fn default() -> Self {
        JointDir::Hold
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse one side of a drive TC, clamping it into the drive range.
fn parse_drive_value(s: &str) -> Result<i32, TcParseError> {
    let trimmed = s.trim();

    match trimmed.parse::<i64>() {
        Ok(v) => Ok(v.clamp(-(DRIVE_LIMIT as i64), DRIVE_LIMIT as i64) as i32),
        Err(_) => Err(TcParseError::InvalidDriveValue(trimmed.to_string()))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
