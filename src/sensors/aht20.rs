//! AHT20 temperature / humidity sensor.
//!
//! Fixed I2C address 0x38. A measurement is triggered with
//! `0xAC 0x33 0x00`, takes ~80 ms, and returns six bytes:
//!
//! ```text
//!  [0] status   bit7 = busy, bit3 = calibrated
//!  [1] hum[19:12]
//!  [2] hum[11:4]
//!  [3] hum[3:0] | temp[19:16]
//!  [4] temp[15:8]
//!  [5] temp[7:0]
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::SensorError;

pub const ADDRESS: u8 = 0x38;

const CMD_INIT: [u8; 3] = [0xBE, 0x08, 0x00];
const CMD_TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];
const CMD_STATUS: u8 = 0x71;

const STATUS_BUSY: u8 = 0x80;
const STATUS_CALIBRATED: u8 = 0x08;

const POWER_ON_MS: u32 = 40;
const INIT_MS: u32 = 10;
const CONVERSION_MS: u32 = 80;

/// 2^20, full scale of both 20-bit channels.
const FULL_SCALE: f32 = 1_048_576.0;

pub struct Aht20 {
    address: u8,
}

impl Default for Aht20 {
    fn default() -> Self {
        Self::new()
    }
}

impl Aht20 {
    pub fn new() -> Self {
        Self { address: ADDRESS }
    }

    /// Wait out power-on and load calibration if the device reports none.
    pub fn init<I: I2c, D: DelayNs>(&mut self, i2c: &mut I, delay: &mut D) -> Result<(), SensorError> {
        delay.delay_ms(POWER_ON_MS);
        let mut status = [0u8; 1];
        i2c.write_read(self.address, &[CMD_STATUS], &mut status)
            .map_err(|_| SensorError::Bus)?;
        if status[0] & STATUS_CALIBRATED == 0 {
            i2c.write(self.address, &CMD_INIT).map_err(|_| SensorError::Bus)?;
            delay.delay_ms(INIT_MS);
        }
        Ok(())
    }

    /// Trigger one measurement and return `(°C, %RH)`.
    pub fn read<I: I2c, D: DelayNs>(&mut self, i2c: &mut I, delay: &mut D) -> Result<(f32, f32), SensorError> {
        i2c.write(self.address, &CMD_TRIGGER).map_err(|_| SensorError::Bus)?;
        delay.delay_ms(CONVERSION_MS);
        let mut frame = [0u8; 6];
        i2c.read(self.address, &mut frame).map_err(|_| SensorError::Bus)?;
        decode(&frame)
    }
}

/// Decode a measurement frame into `(°C, %RH)`.
pub fn decode(frame: &[u8; 6]) -> Result<(f32, f32), SensorError> {
    let status = frame[0];
    if status & STATUS_BUSY != 0 {
        return Err(SensorError::Busy);
    }
    if status & STATUS_CALIBRATED == 0 {
        return Err(SensorError::NotCalibrated);
    }
    let raw_hum = (u32::from(frame[1]) << 12) | (u32::from(frame[2]) << 4) | (u32::from(frame[3]) >> 4);
    let raw_temp = (u32::from(frame[3] & 0x0F) << 16) | (u32::from(frame[4]) << 8) | u32::from(frame[5]);

    let humidity = raw_hum as f32 * 100.0 / FULL_SCALE;
    let temperature = raw_temp as f32 * 200.0 / FULL_SCALE - 50.0;
    Ok((temperature, humidity))
}
