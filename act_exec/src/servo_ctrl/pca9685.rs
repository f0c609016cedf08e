//! [`ServoDriver`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use pwm_pca9685::{Address, Channel, Pca9685};
use embedded_hal::blocking::i2c::{Write, WriteRead};

use super::{ServoDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Resolution of each PWM period.
const MAX_PWM: u16 = 4096;

/// Frequency of the PCA9685 internal oscillator.
const OSC_CLOCK_HZ: f64 = 25_000_000.0;

/// Lowest and highest prescale values accepted by the chip.
const PRESCALE_RANGE: (u8, u8) = (3, 255);

/// Channels in index order.
const CHANNELS: [Channel; 16] = [
    Channel::C0, Channel::C1, Channel::C2, Channel::C3,
    Channel::C4, Channel::C5, Channel::C6, Channel::C7,
    Channel::C8, Channel::C9, Channel::C10, Channel::C11,
    Channel::C12, Channel::C13, Channel::C14, Channel::C15,
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A PCA9685 board on an I2C bus.
pub struct Pca9685Servo<I2C> {
    dev: Pca9685<I2C>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> Pca9685Servo<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    /// Bring up the board at the given 7-bit address with the given output frequency.
    pub fn init(i2c: I2C, address: u8, freq_hz: f64) -> Result<Self, ServoError> {
        let mut dev = Pca9685::new(i2c, Address::from(address))
            .map_err(map_err)?;

        dev.set_prescale(prescale_for(freq_hz)).map_err(map_err)?;
        dev.enable().map_err(map_err)?;

        Ok(Self { dev })
    }
}

impl<I2C, E> ServoDriver for Pca9685Servo<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    fn set_pulse(&mut self, channel: usize, pulse: u16) -> Result<(), ServoError> {
        let ch = *CHANNELS.get(channel).ok_or(ServoError::InvalidChannel(channel))?;

        if pulse >= MAX_PWM {
            return Err(ServoError::InvalidPulse(pulse))
        }

        self.dev.set_channel_on_off(ch, 0, pulse).map_err(map_err)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Prescale value giving the closest output frequency to `freq_hz`.
pub fn prescale_for(freq_hz: f64) -> u8 {
    let raw = (OSC_CLOCK_HZ / (MAX_PWM as f64 * freq_hz)).round() - 1.0;

    if raw.is_nan() || raw < PRESCALE_RANGE.0 as f64 {
        PRESCALE_RANGE.0
    }
    else if raw > PRESCALE_RANGE.1 as f64 {
        PRESCALE_RANGE.1
    }
    else {
        raw as u8
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn map_err<E>(e: pwm_pca9685::Error<E>) -> ServoError {
    match e {
        pwm_pca9685::Error::I2C(_) => ServoError::I2c,
        pwm_pca9685::Error::InvalidInputData => ServoError::Rejected
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_prescale() {
        assert_eq!(prescale_for(60.0), 101);
        assert_eq!(prescale_for(50.0), 121);
        assert_eq!(prescale_for(1.0), 255);
        assert_eq!(prescale_for(100_000.0), 3);
    }
}
