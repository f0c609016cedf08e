//! Implementations for the StatusInd state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{info, warn};

// Internal
use super::{Params, NUM_SCANNER_LEDS};
use crate::hal::DigitalOut;
use util::time::{Millis, PeriodicGate};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Status indicator module state
pub struct StatusInd {
    params: Params,

    heartbeat: Blinker,
    comms: Blinker,
    scanner: Scanner,

    /// Blinker used when only one drive side is active
    side_blink: Blinker,

    beacon: Beacon,

    levels: IndicatorLevels,

    output_fault: bool,
}

/// State of the rest of the node which the indicators show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorInputs {
    pub left_active: bool,
    pub right_active: bool,
    pub joint_active: bool,
    pub comms_active: bool,
}

/// Output level of every indicator, `true` being lit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorLevels {
    pub heartbeat: bool,
    pub comms: bool,
    pub scanner: [bool; NUM_SCANNER_LEDS],
    pub beacon: bool,
}

/// A single LED toggling on a fixed period.
struct Blinker {
    gate: PeriodicGate,
    lit: bool,
}

struct Scanner {
    gate: PeriodicGate,
    phase: ScanPhase,
    idx: usize,
    dir: ScanDir,
    lit: bool,
}

struct Beacon {
    gate: PeriodicGate,
    phase: BeaconPhase,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Step of the scanner's micro-sequence. Each step lasts one scanner period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanPhase {
    Lit,
    Dark,
    Relit,
    /// Move to the next LED and light it
    Advance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanDir {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BeaconPhase {
    On,
    Off,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl StatusInd {
    pub fn new(params: Params) -> Self {
        Self {
            heartbeat: Blinker::new(params.heartbeat_period_ms),
            comms: Blinker::new(params.comms_period_ms),
            scanner: Scanner::new(params.scanner_period_ms),
            side_blink: Blinker::new(params.scanner_period_ms),
            beacon: Beacon::new(params.beacon_period_ms),
            params,
            levels: IndicatorLevels::default(),
            output_fault: false,
        }
    }

    /// Advance every pattern to `now_ms` and write all indicator levels.
    pub fn update<G: DigitalOut>(&mut self, now_ms: Millis, inputs: &IndicatorInputs, gpio: &mut G) {
        let heartbeat = self.heartbeat.step(now_ms);

        let comms = if inputs.comms_active {
            self.comms.step(now_ms)
        }
        else {
            self.comms.force(false)
        };

        let scanner = match (inputs.left_active, inputs.right_active) {
            (true, true) => self.scanner.step(now_ms),
            (true, false) => [self.side_blink.step(now_ms), false],
            (false, true) => [false, self.side_blink.step(now_ms)],
            (false, false) => [false; NUM_SCANNER_LEDS],
        };

        let beacon = self.beacon.step(now_ms, inputs.joint_active);

        self.levels = IndicatorLevels {
            heartbeat,
            comms,
            scanner,
            beacon,
        };

        self.write(gpio);
    }

    /// Levels written by the last update.
    pub fn levels(&self) -> IndicatorLevels {
        self.levels
    }

    fn write<G: DigitalOut>(&mut self, gpio: &mut G) {
        let l = &self.levels;
        let p = &self.params;

        let writes = [
            (p.heartbeat_pin, l.heartbeat),
            (p.comms_pin, l.comms),
            (p.scanner_pins[0], l.scanner[0]),
            (p.scanner_pins[1], l.scanner[1]),
            (p.beacon_pin, l.beacon),
        ];

        let mut ok = true;
        for (pin, level) in writes.iter() {
            ok &= gpio.set_level(*pin, *level).is_ok();
        }

        if !ok && !self.output_fault {
            warn!("Indicator writes are failing");
            self.output_fault = true;
        }
        else if ok && self.output_fault {
            info!("Indicator writes recovered");
            self.output_fault = false;
        }
    }
}

impl Blinker {
    fn new(period_ms: Millis) -> Self {
        Self {
            gate: PeriodicGate::new(period_ms),
            lit: false,
        }
    }

    fn step(&mut self, now_ms: Millis) -> bool {
        if self.gate.ready(now_ms) {
            self.lit = !self.lit;
        }
        self.lit
    }

    fn force(&mut self, lit: bool) -> bool {
        self.lit = lit;
        lit
    }
}

impl Scanner {
    fn new(period_ms: Millis) -> Self {
        Self {
            gate: PeriodicGate::new(period_ms),
            phase: ScanPhase::Lit,
            idx: 0,
            dir: ScanDir::Up,
            lit: true,
        }
    }

    fn step(&mut self, now_ms: Millis) -> [bool; NUM_SCANNER_LEDS] {
        if self.gate.ready(now_ms) {
            self.phase = match self.phase {
                ScanPhase::Lit => ScanPhase::Dark,
                ScanPhase::Dark => ScanPhase::Relit,
                ScanPhase::Relit => ScanPhase::Advance,
                ScanPhase::Advance => ScanPhase::Lit,
            };

            self.lit = match self.phase {
                ScanPhase::Dark => false,
                ScanPhase::Advance => {
                    self.advance();
                    true
                },
                ScanPhase::Lit | ScanPhase::Relit => true,
            };
        }

        let mut levels = [false; NUM_SCANNER_LEDS];
        levels[self.idx] = self.lit;
        levels
    }

    /// Move one LED along, bouncing at either end.
    fn advance(&mut self) {
        match self.dir {
            ScanDir::Up if self.idx + 1 < NUM_SCANNER_LEDS => self.idx += 1,
            ScanDir::Up => {
                self.idx = NUM_SCANNER_LEDS - 2;
                self.dir = ScanDir::Down;
            },
            ScanDir::Down if self.idx > 0 => self.idx -= 1,
            ScanDir::Down => {
                self.idx = 1;
                self.dir = ScanDir::Up;
            },
        }
    }
}

impl Beacon {
    fn new(period_ms: Millis) -> Self {
        Self {
            gate: PeriodicGate::new(period_ms),
            phase: BeaconPhase::On,
        }
    }

    fn step(&mut self, now_ms: Millis, blinking: bool) -> bool {
        if !blinking {
            self.phase = BeaconPhase::On;
        }
        else if self.gate.ready(now_ms) {
            self.phase = match self.phase {
                BeaconPhase::On => BeaconPhase::Off,
                BeaconPhase::Off => BeaconPhase::On,
            };
        }

        self.phase == BeaconPhase::On
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::hal::sim::SimGpio;

    fn both_driving() -> IndicatorInputs {
        IndicatorInputs {
            left_active: true,
            right_active: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_heartbeat() {
        let mut ind = StatusInd::new(Params::default());
        let mut gpio = SimGpio::default();
        let inputs = IndicatorInputs::default();

        ind.update(0, &inputs, &mut gpio);
        assert!(!ind.levels().heartbeat);
        ind.update(499, &inputs, &mut gpio);
        assert!(!ind.levels().heartbeat);
        ind.update(500, &inputs, &mut gpio);
        assert!(ind.levels().heartbeat);
        assert!(gpio.level(13));
        ind.update(1000, &inputs, &mut gpio);
        assert!(!gpio.level(13));
    }

    #[test]
    fn test_comms_blink() {
        let mut ind = StatusInd::new(Params::default());
        let mut gpio = SimGpio::default();
        let mut inputs = IndicatorInputs {
            comms_active: true,
            ..Default::default()
        };

        ind.update(50, &inputs, &mut gpio);
        assert!(gpio.level(24));
        ind.update(100, &inputs, &mut gpio);
        assert!(!gpio.level(24));
        ind.update(150, &inputs, &mut gpio);
        assert!(gpio.level(24));

        inputs.comms_active = false;
        ind.update(160, &inputs, &mut gpio);
        assert!(!gpio.level(24));
        ind.update(400, &inputs, &mut gpio);
        assert!(!gpio.level(24));
    }

    #[test]
    fn test_scanner_sequence() {
        let mut ind = StatusInd::new(Params::default());
        let mut gpio = SimGpio::default();
        let inputs = both_driving();

        let mut seen = Vec::new();
        for step in 0..9 {
            ind.update(step * 100, &inputs, &mut gpio);
            seen.push(ind.levels().scanner);
        }

        assert_eq!(
            seen,
            vec![
                [true, false],
                [false, false],
                [true, false],
                [false, true],
                [false, true],
                [false, false],
                [false, true],
                [true, false],
                [true, false],
            ]
        );
        assert!(gpio.level(10));
        assert!(!gpio.level(11));
    }

    #[test]
    fn test_single_side_blink() {
        let mut ind = StatusInd::new(Params::default());
        let mut gpio = SimGpio::default();
        let inputs = IndicatorInputs {
            right_active: true,
            ..Default::default()
        };

        ind.update(100, &inputs, &mut gpio);
        assert_eq!(ind.levels().scanner, [false, true]);
        ind.update(200, &inputs, &mut gpio);
        assert_eq!(ind.levels().scanner, [false, false]);
        ind.update(300, &inputs, &mut gpio);
        assert_eq!(ind.levels().scanner, [false, true]);

        ind.update(350, &IndicatorInputs::default(), &mut gpio);
        assert_eq!(ind.levels().scanner, [false, false]);
        assert!(!gpio.level(10));
        assert!(!gpio.level(11));
    }

    #[test]
    fn test_beacon() {
        let mut ind = StatusInd::new(Params::default());
        let mut gpio = SimGpio::default();
        let mut inputs = IndicatorInputs::default();

        ind.update(0, &inputs, &mut gpio);
        assert!(gpio.level(9));
        ind.update(1000, &inputs, &mut gpio);
        assert!(gpio.level(9));

        inputs.joint_active = true;
        ind.update(1100, &inputs, &mut gpio);
        assert!(!gpio.level(9));
        ind.update(1150, &inputs, &mut gpio);
        assert!(!gpio.level(9));
        ind.update(1200, &inputs, &mut gpio);
        assert!(gpio.level(9));

        inputs.joint_active = false;
        ind.update(1250, &inputs, &mut gpio);
        assert!(gpio.level(9));
    }
}
