//! Simulated environment for host runs.
//!
//! Produces slowly drifting indoor values so the dashboard graphs move and
//! the alert engine can be provoked by tightening a limit from the web form.

use crate::app::ports::{RawPressure, SensorPort};
use crate::error::{Result, SensorError};

pub struct SimulatedSensors {
    tick: u32,
}

impl Default for SimulatedSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSensors {
    pub fn new() -> Self {
        Self { tick: 0 }
    }

    fn phase(&self) -> f32 {
        self.tick as f32 / 30.0
    }
}

impl SensorPort for SimulatedSensors {
    fn read_temp_humidity(&mut self) -> Result<(f32, f32)> {
        let x = self.phase();
        self.tick = self.tick.wrapping_add(1);
        Ok((22.5 + 2.5 * x.sin(), 48.0 + 6.0 * (x * 0.7).cos()))
    }

    /// Simulated raw words carry pascals directly.
    fn read_pressure_temp(&mut self) -> Result<RawPressure> {
        let pa = 101_325.0 + 250.0 * (self.phase() * 0.3).sin();
        Ok(RawPressure { adc_p: pa as i32, adc_t: 0 })
    }

    fn pressure_hpa(&self, raw: RawPressure) -> Result<f32> {
        if raw.adc_p == 0 {
            return Err(SensorError::InvalidData.into());
        }
        Ok(raw.adc_p as f32 / 100.0)
    }
}
