//! # Event log
//!
//! The executable's event sink. Every event is written to the log, and is also archived to the
//! session's `events.csv` when an archive is available.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;

// Internal
use comms_if::event::EventCode;
use util::{archive::Archiver, session::Session, time::Millis};

use crate::hal::EventSink;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Archive file for events, relative to the session archive root.
pub const EVENTS_ARCHIVE: &str = "events.csv";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Default)]
pub struct EventLog {
    archive: Option<Archiver>,
}

/// A single row of the events archive.
#[derive(Debug, Serialize)]
struct EventRecord {
    time_ms: Millis,
    code: u16,
    name: &'static str,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EventLog {
    /// Create an event log archiving into the given session.
    ///
    /// If the archive cannot be created events are only logged.
    pub fn new(session: &Session) -> Self {
        match Archiver::from_path(session, EVENTS_ARCHIVE) {
            Ok(a) => Self::with_archive(a),
            Err(e) => {
                warn!("Could not create the events archive, events will only be logged: {}", e);
                Self::default()
            }
        }
    }

    pub fn with_archive(archive: Archiver) -> Self {
        Self {
            archive: Some(archive),
        }
    }
}

impl EventSink for EventLog {
    fn log_event(&mut self, code: EventCode, timestamp_ms: Millis) {
        if code.is_fault() {
            warn!("[EVENT] {} at {} ms", code, timestamp_ms);
        }
        else {
            info!("[EVENT] {} at {} ms", code, timestamp_ms);
        }

        let failed = match self.archive {
            Some(ref mut a) => {
                let record = EventRecord {
                    time_ms: timestamp_ms,
                    code: code.code(),
                    name: code.name(),
                };

                match a.serialise(record) {
                    Ok(_) => false,
                    Err(e) => {
                        warn!("Could not archive event, events will only be logged: {}", e);
                        true
                    }
                }
            },
            None => false
        };

        if failed {
            self.archive = None;
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_archive_events() {
        let mut path = std::env::temp_dir();
        path.push(format!("act_exec_events_test_{}.csv", std::process::id()));

        {
            let mut log = EventLog::with_archive(Archiver::from_file_path(&path).unwrap());
            log.log_event(EventCode::BootStart, 0);
            log.log_event(EventCode::FailsafeTrigger, 1501);
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            contents,
            "time_ms,code,name\n0,1000,SYS_BOOT_START\n1501,4005,SAFE_FAILSAFE_TRIGGER\n"
        );
    }

    #[test]
    fn test_log_only() {
        let mut log = EventLog::default();
        log.log_event(EventCode::I2cHang, 3);
        assert!(log.archive.is_none());
    }
}
