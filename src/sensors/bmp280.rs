//! BMP280 barometric pressure sensor.
//!
//! Runs in normal mode with x1 oversampling on both channels. Compensation
//! is the 32-bit integer routine from the Bosch datasheet, so the result is
//! bit-exact with the vendor driver.

use embedded_hal::i2c::I2c;

use crate::error::SensorError;

pub const ADDRESS: u8 = 0x76;
pub const CHIP_ID: u8 = 0x58;

const REG_CHIP_ID: u8 = 0xD0;
const REG_CALIB: u8 = 0x88;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_DATA: u8 = 0xF7;

/// osrs_t = x1, osrs_p = x1, mode = normal
const CTRL_MEAS_NORMAL: u8 = 0x27;

/// Factory trimming parameters (registers 0x88..0x9F, little endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
}

impl Calibration {
    pub fn from_bytes(b: &[u8; 24]) -> Self {
        let u = |i: usize| u16::from_le_bytes([b[i], b[i + 1]]);
        let s = |i: usize| i16::from_le_bytes([b[i], b[i + 1]]);
        Self {
            t1: u(0),
            t2: s(2),
            t3: s(4),
            p1: u(6),
            p2: s(8),
            p3: s(10),
            p4: s(12),
            p5: s(14),
            p6: s(16),
            p7: s(18),
            p8: s(20),
            p9: s(22),
        }
    }

    /// Fine temperature carried into the pressure compensation.
    pub fn t_fine(&self, adc_t: i32) -> i32 {
        let t1 = i32::from(self.t1);
        let var1 = ((adc_t >> 3) - (t1 << 1)).wrapping_mul(i32::from(self.t2)) >> 11;
        let d = (adc_t >> 4) - t1;
        let var2 = (d.wrapping_mul(d) >> 12).wrapping_mul(i32::from(self.t3)) >> 14;
        var1.wrapping_add(var2)
    }

    /// Temperature in hundredths of a degree Celsius.
    pub fn temperature_centi(&self, adc_t: i32) -> i32 {
        (self.t_fine(adc_t) * 5 + 128) >> 8
    }

    /// Pressure in pascals, or `None` when the calibration would divide by zero.
    pub fn pressure_pa(&self, adc_p: i32, adc_t: i32) -> Option<u32> {
        let t_fine = self.t_fine(adc_t);

        let mut var1 = (t_fine >> 1) - 64000;
        let sq = (var1 >> 2).wrapping_mul(var1 >> 2);
        let mut var2 = (sq >> 11).wrapping_mul(i32::from(self.p6));
        var2 = var2.wrapping_add(var1.wrapping_mul(i32::from(self.p5)) << 1);
        var2 = (var2 >> 2).wrapping_add(i32::from(self.p4) << 16);
        var1 = ((i32::from(self.p3).wrapping_mul(sq >> 13) >> 3)
            .wrapping_add(i32::from(self.p2).wrapping_mul(var1) >> 1))
            >> 18;
        var1 = (32768 + var1).wrapping_mul(i32::from(self.p1)) >> 15;
        if var1 == 0 {
            return None;
        }

        let mut p = ((1_048_576 - adc_p).wrapping_sub(var2 >> 12) as u32).wrapping_mul(3125);
        p = if p < 0x8000_0000 {
            (p << 1) / var1 as u32
        } else {
            (p / var1 as u32) * 2
        };

        let var1 = i32::from(self.p9).wrapping_mul(((p >> 3).wrapping_mul(p >> 3) >> 13) as i32) >> 12;
        let var2 = ((p >> 2) as i32).wrapping_mul(i32::from(self.p8)) >> 13;
        Some((p as i32).wrapping_add((var1 + var2 + i32::from(self.p7)) >> 4) as u32)
    }
}

pub struct Bmp280 {
    address: u8,
    calibration: Option<Calibration>,
}

impl Default for Bmp280 {
    fn default() -> Self {
        Self::new()
    }
}

impl Bmp280 {
    pub fn new() -> Self {
        Self { address: ADDRESS, calibration: None }
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Check the chip id, load calibration and start continuous conversion.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        i2c.write_read(self.address, &[REG_CHIP_ID], &mut id)
            .map_err(|_| SensorError::Bus)?;
        if id[0] != CHIP_ID {
            return Err(SensorError::WrongChip(id[0]));
        }

        let mut calib = [0u8; 24];
        i2c.write_read(self.address, &[REG_CALIB], &mut calib)
            .map_err(|_| SensorError::Bus)?;
        self.calibration = Some(Calibration::from_bytes(&calib));

        i2c.write(self.address, &[REG_CTRL_MEAS, CTRL_MEAS_NORMAL])
            .map_err(|_| SensorError::Bus)
    }

    /// Latest uncompensated `(adc_p, adc_t)`.
    pub fn read_raw<I: I2c>(&mut self, i2c: &mut I) -> Result<(i32, i32), SensorError> {
        let mut d = [0u8; 6];
        i2c.write_read(self.address, &[REG_DATA], &mut d)
            .map_err(|_| SensorError::Bus)?;
        let adc_p = (i32::from(d[0]) << 12) | (i32::from(d[1]) << 4) | (i32::from(d[2]) >> 4);
        let adc_t = (i32::from(d[3]) << 12) | (i32::from(d[4]) << 4) | (i32::from(d[5]) >> 4);
        Ok((adc_p, adc_t))
    }
}
