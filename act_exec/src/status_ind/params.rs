//! Parameters structure for StatusInd

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use util::time::Millis;

use super::NUM_SCANNER_LEDS;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the status indicators. Periods are the time between toggles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    pub heartbeat_pin: u8,
    pub heartbeat_period_ms: Millis,

    pub comms_pin: u8,
    pub comms_period_ms: Millis,

    /// Scanner pins, left side first
    pub scanner_pins: [u8; NUM_SCANNER_LEDS],
    pub scanner_period_ms: Millis,

    pub beacon_pin: u8,
    pub beacon_period_ms: Millis,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            heartbeat_pin: 13,
            heartbeat_period_ms: 500,
            comms_pin: 24,
            comms_period_ms: 50,
            scanner_pins: [10, 11],
            scanner_period_ms: 100,
            beacon_pin: 9,
            beacon_period_ms: 100,
        }
    }
}

impl Params {
    /// Every pin driven by the indicators.
    pub fn pins(&self) -> [u8; 3 + NUM_SCANNER_LEDS] {
        [
            self.heartbeat_pin,
            self.comms_pin,
            self.scanner_pins[0],
            self.scanner_pins[1],
            self.beacon_pin,
        ]
    }
}
