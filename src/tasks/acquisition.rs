//! Sensor acquisition task.
//!
//! Each cycle:
//!
//! 1. copy the offsets out under the config lock (own scope),
//! 2. read both sensors with no lock held,
//! 3. store raw + offset under the sensor lock.
//!
//! A failed sensor contributes `0.0` for its fields (no offset applied).
//! A lock timeout skips the whole cycle. The bus is never touched while
//! the sensor lock is held, so a slow read cannot stall the alert engine,
//! the display or the web server past their bounded wait.

use log::{error, info, warn};

use crate::app::ports::SensorPort;
use crate::error::Result;
use crate::state::{AppContext, SensorReading};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Offsets {
    temp: f32,
    hum: f32,
    press: f32,
}

/// One acquisition cycle. Returns the stored reading.
pub fn acquire_once<S: SensorPort>(ctx: &AppContext, sensors: &mut S) -> Result<SensorReading> {
    let offsets = {
        let limits = ctx.limits.lock()?;
        Offsets { temp: limits.temp_offset, hum: limits.hum_offset, press: limits.press_offset }
    };

    let mut reading = SensorReading::default();

    match sensors.read_temp_humidity() {
        Ok((t, h)) => {
            reading.temperature = t + offsets.temp;
            reading.humidity = h + offsets.hum;
        }
        Err(e) => error!("SENSORS | AHT20 read failed: {}", e),
    }

    match sensors.read_pressure_temp().and_then(|raw| sensors.pressure_hpa(raw)) {
        Ok(hpa) => reading.pressure = hpa + offsets.press,
        Err(e) => error!("SENSORS | BMP280 read failed: {}", e),
    }

    *ctx.reading.lock()? = reading;

    if ctx.flags.logging_enabled() {
        info!(
            "SENSORS | T={:.1}\u{00b0}C H={:.1}% P={:.1}hPa",
            reading.temperature, reading.humidity, reading.pressure
        );
    }
    Ok(reading)
}

/// Task body for [`super::ACQUISITION`].
pub fn cycle<S: SensorPort>(ctx: &AppContext, sensors: &mut S) {
    if let Err(e) = acquire_once(ctx, sensors) {
        warn!("SENSORS | cycle skipped: {}", e);
    }
}
