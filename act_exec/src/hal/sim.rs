//! # Simulated equipment
//!
//! Recording implementations of the hardware traits. These are used when running the executable
//! on a development host and by the unit tests, which inspect what was written to each output.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{Receiver, TryRecvError};

// Internal
use comms_if::event::EventCode;
use util::time::Millis;

use super::{ByteStream, DigitalOut, EventSink, HalError, Platform, PwmOut, Watchdog};
use crate::{
    params::WatchdogParams,
    servo_ctrl::{ServoDriver, ServoError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Platform made entirely of simulated equipment.
pub struct SimPlatform;

/// Simulated PWM bank recording the last duty written to each channel.
#[derive(Debug, Default)]
pub struct SimPwm {
    duty: HashMap<u8, u8>,

    /// Number of writes made to the bank
    pub num_writes: usize,

    /// When set every write fails
    pub failing: bool,
}

/// Simulated servo board recording the last pulse written to each channel.
#[derive(Debug, Default)]
pub struct SimServo {
    pulse: HashMap<usize, u16>,

    /// Number of writes made to the board
    pub num_writes: usize,

    /// When set every write fails
    pub failing: bool,
}

/// Simulated GPIO bank recording the level of each pin.
#[derive(Debug, Default)]
pub struct SimGpio {
    levels: HashMap<u8, bool>,
}

/// Simulated byte link.
///
/// Bytes can be queued directly or arrive through a channel from another thread, such as a stdin
/// reader. Channel data is only pulled into the queue when the link is polled.
#[derive(Debug, Default)]
pub struct SimLink {
    queue: VecDeque<u8>,

    feed: Option<Receiver<Vec<u8>>>,
}

/// Simulated watchdog with a deadline, counting how many times it has been fed.
///
/// The watchdog is armed by its first feed. It has expired once more than `timeout_ms` has passed
/// since the last feed.
#[derive(Debug)]
pub struct SimWatchdog {
    pub timeout_ms: Millis,

    last_feed_ms: Option<Millis>,

    pub num_feeds: usize,

    /// Reported by `caused_last_reset`
    pub reset_flag: bool,
}

/// Simulated event sink recording every event.
#[derive(Debug, Default)]
pub struct SimEvents {
    pub events: Vec<(EventCode, Millis)>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Platform for SimPlatform {
    type Pwm = SimPwm;
    type Servo = Option<SimServo>;
    type Gpio = SimGpio;
    type Link = SimLink;
    type Watchdog = SimWatchdog;
    type Events = SimEvents;
}

impl SimPwm {
    /// Last duty written to the channel, zero if never written.
    pub fn duty(&self, channel: u8) -> u8 {
        self.duty.get(&channel).copied().unwrap_or(0)
    }
}

impl PwmOut for SimPwm {
    fn set_duty(&mut self, channel: u8, duty: u8) -> Result<(), HalError> {
        if self.failing {
            return Err(HalError::Peripheral(String::from("simulated PWM failure")))
        }

        self.num_writes += 1;
        self.duty.insert(channel, duty);
        Ok(())
    }
}

impl SimServo {
    /// Last pulse written to the channel, if any.
    pub fn pulse(&self, channel: usize) -> Option<u16> {
        self.pulse.get(&channel).copied()
    }
}

impl ServoDriver for SimServo {
    fn set_pulse(&mut self, channel: usize, pulse: u16) -> Result<(), ServoError> {
        if self.failing {
            return Err(ServoError::I2c)
        }

        self.num_writes += 1;
        self.pulse.insert(channel, pulse);
        Ok(())
    }
}

impl SimGpio {
    /// Level of the pin, low if never written.
    pub fn level(&self, pin: u8) -> bool {
        self.levels.get(&pin).copied().unwrap_or(false)
    }
}

impl DigitalOut for SimGpio {
    fn set_level(&mut self, pin: u8, high: bool) -> Result<(), HalError> {
        self.levels.insert(pin, high);
        Ok(())
    }
}

impl SimLink {
    /// Create a link fed by the given channel.
    pub fn with_feed(feed: Receiver<Vec<u8>>) -> Self {
        Self {
            queue: VecDeque::new(),
            feed: Some(feed),
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes.iter().copied());
    }

    pub fn push_str(&mut self, s: &str) {
        self.push_bytes(s.as_bytes())
    }

    /// Pull everything waiting on the feed channel into the queue.
    fn poll_feed(&mut self) {
        let mut disconnected = false;

        if let Some(ref rx) = self.feed {
            loop {
                match rx.try_recv() {
                    Ok(bytes) => self.queue.extend(bytes),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break
                    }
                }
            }
        }

        if disconnected {
            self.feed = None;
        }
    }
}

impl ByteStream for SimLink {
    fn available(&mut self) -> usize {
        self.poll_feed();
        self.queue.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.queue.pop_front()
    }
}

impl SimWatchdog {
    pub fn new(timeout_ms: Millis) -> Self {
        Self {
            timeout_ms,
            last_feed_ms: None,
            num_feeds: 0,
            reset_flag: false,
        }
    }

    /// True if the watchdog was armed and has not been fed within its timeout at `now_ms`.
    pub fn expired(&self, now_ms: Millis) -> bool {
        match self.last_feed_ms {
            Some(last) => now_ms.saturating_sub(last) > self.timeout_ms,
            None => false
        }
    }
}

impl Default for SimWatchdog {
    fn default() -> Self {
        Self::new(WatchdogParams::default().timeout_ms)
    }
}

impl Watchdog for SimWatchdog {
    fn feed(&mut self, now_ms: Millis) {
        self.last_feed_ms = Some(now_ms);
        self.num_feeds += 1;
    }

    fn caused_last_reset(&self) -> bool {
        self.reset_flag
    }
}

impl SimEvents {
    /// Number of times the given event was logged.
    pub fn count(&self, code: EventCode) -> usize {
        self.events.iter().filter(|(c, _)| *c == code).count()
    }

    /// Codes in the order they were logged.
    pub fn codes(&self) -> Vec<EventCode> {
        self.events.iter().map(|(c, _)| *c).collect()
    }
}

impl EventSink for SimEvents {
    fn log_event(&mut self, code: EventCode, timestamp_ms: Millis) {
        self.events.push((code, timestamp_ms));
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_link_feed() {
        let (tx, rx) = channel();
        let mut link = SimLink::with_feed(rx);

        link.push_str("1,");
        tx.send(b"2\n".to_vec()).unwrap();
        drop(tx);

        assert_eq!(link.available(), 4);

        let mut read = Vec::new();
        while let Some(b) = link.read_byte() {
            read.push(b);
        }
        assert_eq!(read, b"1,2\n");

        // Feed has gone away, the link just stays empty
        assert_eq!(link.available(), 0);
    }

    #[test]
    fn test_watchdog_deadline() {
        let mut wdt = SimWatchdog::new(100);

        // Not armed until the first feed
        assert!(!wdt.expired(10_000));

        wdt.feed(1000);
        assert!(!wdt.expired(1100));
        assert!(wdt.expired(1101));

        wdt.feed(1101);
        assert!(!wdt.expired(1101));
        assert_eq!(wdt.num_feeds, 2);
    }

    #[test]
    fn test_failing_pwm() {
        let mut pwm = SimPwm::default();
        pwm.set_duty(3, 40).unwrap();

        pwm.failing = true;
        assert!(pwm.set_duty(3, 80).is_err());
        assert_eq!(pwm.duty(3), 40);
        assert_eq!(pwm.num_writes, 1);
    }
}
