//! # Raspberry Pi equipment
//!
//! Drivers for the Pi's own peripherals using `rppal`. The motor driver PWM is generated in
//! software on GPIO pins, the indicators and motor driver enables are plain GPIO outputs, and
//! each command link is a UART device.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use std::collections::HashMap;
use std::time::Duration;
use rppal::{
    gpio::{Gpio, OutputPin},
    i2c::I2c,
    uart::{Parity, Uart},
};
use log::warn;

// Internal
use super::{ByteStream, DigitalOut, HalError, Platform, PwmOut, linux_wdt::DevWatchdog};
use crate::{event_log::EventLog, servo_ctrl::pca9685::Pca9685Servo};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Platform for the actuator node running on a Raspberry Pi.
pub struct RpiPlatform;

/// Software PWM outputs.
pub struct RpiPwm {
    pins: HashMap<u8, OutputPin>,

    freq_hz: f64,
}

/// Plain digital outputs.
pub struct RpiGpio {
    pins: HashMap<u8, OutputPin>,
}

/// A command link on a UART device.
pub struct RpiUart {
    uart: Uart,

    /// Set once a read has failed so that the warning is only given once
    read_fault: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Platform for RpiPlatform {
    type Pwm = Option<RpiPwm>;
    type Servo = Option<Pca9685Servo<I2c>>;
    type Gpio = Option<RpiGpio>;
    type Link = Option<RpiUart>;
    type Watchdog = Option<DevWatchdog>;
    type Events = EventLog;
}

impl RpiPwm {
    /// Acquire the given pins as PWM outputs running at `freq_hz`.
    pub fn new(channels: &[u8], freq_hz: f64) -> Result<Self, HalError> {
        let gpio = Gpio::new().map_err(|e| HalError::Peripheral(e.to_string()))?;

        let mut pins = HashMap::new();
        for &ch in channels {
            let pin = gpio.get(ch)
                .map_err(|e| HalError::PinUnavailable(ch, e.to_string()))?
                .into_output_low();
            pins.insert(ch, pin);
        }

        Ok(Self { pins, freq_hz })
    }
}

impl PwmOut for RpiPwm {
    fn set_duty(&mut self, channel: u8, duty: u8) -> Result<(), HalError> {
        let pin = self.pins.get_mut(&channel)
            .ok_or(HalError::InvalidChannel(channel as usize))?;

        // Software PWM cannot produce a fully off signal at zero duty
        if duty == 0 {
            pin.clear_pwm().map_err(|e| HalError::Peripheral(e.to_string()))?;
            pin.set_low();
            return Ok(())
        }

        pin.set_pwm_frequency(self.freq_hz, duty as f64 / u8::MAX as f64)
            .map_err(|e| HalError::Peripheral(e.to_string()))
    }
}

impl RpiGpio {
    /// Acquire the given pins as outputs, initially low.
    pub fn new(pins: &[u8]) -> Result<Self, HalError> {
        let gpio = Gpio::new().map_err(|e| HalError::Peripheral(e.to_string()))?;

        let mut out = HashMap::new();
        for &p in pins {
            let pin = gpio.get(p)
                .map_err(|e| HalError::PinUnavailable(p, e.to_string()))?
                .into_output_low();
            out.insert(p, pin);
        }

        Ok(Self { pins: out })
    }
}

impl DigitalOut for RpiGpio {
    fn set_level(&mut self, pin: u8, high: bool) -> Result<(), HalError> {
        let p = self.pins.get_mut(&pin)
            .ok_or(HalError::InvalidChannel(pin as usize))?;

        if high {
            p.set_high();
        }
        else {
            p.set_low();
        }

        Ok(())
    }
}

impl RpiUart {
    /// Open a UART device in non-blocking mode, 8N1.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, HalError> {
        let mut uart = Uart::with_path(path, baud_rate, Parity::None, 8, 1)
            .map_err(|e| HalError::Peripheral(e.to_string()))?;

        uart.set_read_mode(0, Duration::default())
            .map_err(|e| HalError::Peripheral(e.to_string()))?;

        Ok(Self {
            uart,
            read_fault: false,
        })
    }
}

impl ByteStream for RpiUart {
    fn available(&mut self) -> usize {
        match self.uart.input_len() {
            Ok(n) => {
                self.read_fault = false;
                n
            },
            Err(e) => {
                if !self.read_fault {
                    warn!("Could not poll UART: {}", e);
                    self.read_fault = true;
                }
                0
            }
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];

        match self.uart.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            _ => None
        }
    }
}
