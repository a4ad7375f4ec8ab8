//! Port traits: the boundary between the station runtime and hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ tasks / alert engine / event pump
//! ```
//!
//! Driven adapters (sensor bus, display, LED and buzzer, wireless link,
//! bootloader hooks, event sinks) implement these traits. The runtime
//! consumes them via generics, so nothing in the core touches a register.

use crate::error::Result;

// ───────────────────────────────────────────────────────────────
// Sensor port (hardware → runtime)
// ───────────────────────────────────────────────────────────────

/// Raw pressure sensor output, before compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPressure {
    pub adc_p: i32,
    pub adc_t: i32,
}

/// The two environmental sensors.
pub trait SensorPort {
    /// Calibrated `(temperature °C, relative humidity %)`.
    fn read_temp_humidity(&mut self) -> Result<(f32, f32)>;

    /// Uncompensated pressure and temperature ADC words.
    fn read_pressure_temp(&mut self) -> Result<RawPressure>;

    /// Convert a raw reading to hectopascals using the device calibration.
    fn pressure_hpa(&self, raw: RawPressure) -> Result<f32>;
}

// ───────────────────────────────────────────────────────────────
// Display port (runtime → local screen)
// ───────────────────────────────────────────────────────────────

/// Lines the display shows per frame.
pub const DISPLAY_LINES: usize = 4;

pub trait DisplayPort {
    fn render_lines(&mut self, lines: &[&str; DISPLAY_LINES]);
}

// ───────────────────────────────────────────────────────────────
// Indicator port (runtime → LED + buzzer)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorColor {
    Red,
    Green,
}

pub trait IndicatorPort {
    /// Show the alert state on the primary channel; `link_lost` lights the
    /// secondary channel.
    fn set_indicator(&mut self, color: IndicatorColor, link_lost: bool);

    fn emit_tone(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Link port (runtime ↔ wireless link)
// ───────────────────────────────────────────────────────────────

pub trait LinkPort {
    /// Blocking connect with a timeout. Only used before the server starts.
    fn connect(&mut self, timeout_ms: u32) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Ask the link layer to reconnect in the background. Must not block.
    fn request_reconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Maintenance port (runtime → bootloader)
// ───────────────────────────────────────────────────────────────

pub trait MaintenancePort {
    /// Hand the device over to the maintenance (firmware update) path.
    fn enter_maintenance_mode(&mut self) -> !;
}

// ───────────────────────────────────────────────────────────────
// Button port (push buttons → runtime)
// ───────────────────────────────────────────────────────────────

/// Edge sources feeding [`AppContext::on_button_edge`](crate::state::AppContext::on_button_edge).
pub trait ButtonPort {
    /// Re-enable edge delivery after the handler has fired. Called from
    /// task context on every control poll.
    fn rearm(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (runtime → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The runtime emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

/// Monotonic milliseconds since boot.
pub trait Clock {
    fn now_ms(&self) -> u64;
}
