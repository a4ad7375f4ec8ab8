//! Sensor subsystem: the two I2C drivers and the [`SensorHub`] that owns
//! the shared bus.
//!
//! | Driver   | Address | Measures                    |
//! |----------|---------|-----------------------------|
//! | `aht20`  | 0x38    | temperature, humidity       |
//! | `bmp280` | 0x76    | pressure (+ die temperature)|
//!
//! On targets without the real bus, [`simulated::SimulatedSensors`]
//! implements the same [`SensorPort`].

pub mod aht20;
pub mod bmp280;
pub mod simulated;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::ports::{RawPressure, SensorPort};
use crate::error::{Result, SensorError};
use aht20::Aht20;
use bmp280::Bmp280;

/// Owns the I2C bus and both drivers.
pub struct SensorHub<I, D> {
    i2c: I,
    delay: D,
    aht20: Aht20,
    bmp280: Bmp280,
}

impl<I: I2c, D: DelayNs> SensorHub<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self {
            i2c,
            delay,
            aht20: Aht20::new(),
            bmp280: Bmp280::new(),
        }
    }

    /// Initialise both sensors. A failure is logged and reported, but the
    /// hub stays usable: reads from the failed device will error and the
    /// acquisition task substitutes sentinel values.
    pub fn init(&mut self) -> Result<()> {
        let aht = self.aht20.init(&mut self.i2c, &mut self.delay);
        match aht {
            Ok(()) => info!("SENSORS | AHT20 ready"),
            Err(e) => warn!("SENSORS | AHT20 init failed: {}", e),
        }
        let bmp = self.bmp280.init(&mut self.i2c);
        match bmp {
            Ok(()) => info!("SENSORS | BMP280 ready, calibration loaded"),
            Err(e) => warn!("SENSORS | BMP280 init failed: {}", e),
        }
        aht?;
        bmp?;
        Ok(())
    }
}

impl<I: I2c, D: DelayNs> SensorPort for SensorHub<I, D> {
    fn read_temp_humidity(&mut self) -> Result<(f32, f32)> {
        Ok(self.aht20.read(&mut self.i2c, &mut self.delay)?)
    }

    fn read_pressure_temp(&mut self) -> Result<RawPressure> {
        let (adc_p, adc_t) = self.bmp280.read_raw(&mut self.i2c)?;
        Ok(RawPressure { adc_p, adc_t })
    }

    fn pressure_hpa(&self, raw: RawPressure) -> Result<f32> {
        convert_pressure(self.bmp280.calibration(), raw)
    }
}

/// Compensate a raw reading to hectopascals. A zero pressure word means
/// the conversion never ran.
pub fn convert_pressure(calibration: Option<&bmp280::Calibration>, raw: RawPressure) -> Result<f32> {
    if raw.adc_p == 0 {
        return Err(SensorError::InvalidData.into());
    }
    let calibration = calibration.ok_or(SensorError::NotCalibrated)?;
    let pa = calibration
        .pressure_pa(raw.adc_p, raw.adc_t)
        .ok_or(SensorError::InvalidData)?;
    Ok(pa as f32 / 100.0)
}
