//! # Linux watchdog driver
//!
//! Drives the kernel watchdog device. Any write to the device feeds it, and writing the magic
//! character `V` before closing disarms it so that a clean shutdown does not reset the board.
//! The timeout is set on opening with `WDIOC_SETTIMEOUT`, which only has whole second
//! resolution.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use log::{info, warn};
use nix::libc::c_int;

// Internal
use util::time::Millis;
use super::{HalError, Watchdog};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Boot status file of the first watchdog device.
const BOOT_STATUS_PATH: &str = "/sys/class/watchdog/watchdog0/bootstatus";

/// Value of `WDIOF_CARDRESET` in the boot status flags.
const CARD_RESET_FLAG: u32 = 0x0020;

// WDIOC_SETTIMEOUT = _IOWR('W', 6, int)
nix::ioctl_readwrite!(wdioc_settimeout, b'W', 6, c_int);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct DevWatchdog {
    file: File,

    caused_reset: bool,

    /// Set once a feed has failed so that the warning is only given once
    feed_fault: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DevWatchdog {
    /// Open and arm the watchdog device at the given path, resetting the node if it is not fed
    /// within `timeout_ms`.
    pub fn open<P: AsRef<Path>>(path: P, timeout_ms: Millis) -> Result<Self, HalError> {
        let file = OpenOptions::new().write(true).open(path)?;

        let caused_reset = match std::fs::read_to_string(BOOT_STATUS_PATH) {
            Ok(s) => parse_boot_status(&s),
            Err(_) => false
        };

        // Built before the timeout is set so that a failure still disarms on drop
        let wdt = Self {
            file,
            caused_reset,
            feed_fault: false,
        };

        // The driver writes back the timeout it actually applied
        let mut secs = timeout_secs(timeout_ms);
        unsafe { wdioc_settimeout(wdt.file.as_raw_fd(), &mut secs) }
            .map_err(|e| HalError::Peripheral(format!("Could not set watchdog timeout: {}", e)))?;
        info!("Watchdog timeout set to {} s", secs);

        Ok(wdt)
    }
}

impl Watchdog for DevWatchdog {
    fn feed(&mut self, _now_ms: Millis) {
        match self.file.write_all(b"\0").and_then(|_| self.file.flush()) {
            Ok(_) => self.feed_fault = false,
            Err(e) => {
                if !self.feed_fault {
                    warn!("Could not feed the watchdog: {}", e);
                    self.feed_fault = true;
                }
            }
        }
    }

    fn caused_last_reset(&self) -> bool {
        self.caused_reset
    }
}

impl Drop for DevWatchdog {
    fn drop(&mut self) {
        // Magic close
        self.file.write_all(b"V").ok();
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Round a timeout up to whole seconds, never less than one.
fn timeout_secs(timeout_ms: Millis) -> c_int {
    let secs = timeout_ms.saturating_add(999) / 1000;
    secs.clamp(1, c_int::MAX as Millis) as c_int
}

fn parse_boot_status(s: &str) -> bool {
    match s.trim().parse::<u32>() {
        Ok(flags) => flags & CARD_RESET_FLAG != 0,
        Err(_) => false
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_boot_status() {
        assert!(parse_boot_status("32\n"));
        assert!(parse_boot_status("33"));
        assert!(!parse_boot_status("0\n"));
        assert!(!parse_boot_status("garbage"));
    }

    #[test]
    fn test_timeout_secs() {
        assert_eq!(timeout_secs(2000), 2);
        assert_eq!(timeout_secs(2001), 3);
        assert_eq!(timeout_secs(1), 1);
        assert_eq!(timeout_secs(0), 1);
    }
}
