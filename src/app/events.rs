//! Outbound application events.
//!
//! Tasks emit these through the [`EventSink`](super::ports::EventSink)
//! port. Adapters decide where they go.

use crate::config::ConfigField;
use crate::state::SensorReading;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Runtime is up. Carries the HTTP port, or `None` when the server did
    /// not start.
    Started { http_port: Option<u16> },

    /// A reading left its limits.
    AlertRaised(SensorReading),

    /// All readings are back inside their limits.
    AlertCleared(SensorReading),

    /// One field accepted from the web form.
    ConfigApplied { field: ConfigField, value: f32 },

    /// Limits and offsets restored to defaults.
    ConfigReset,

    /// Per-cycle logging switched.
    LoggingToggled(bool),

    /// Maintenance mode requested; the device is about to hand over.
    MaintenanceRequested,

    LinkUp,

    LinkLost,

    /// All boot-time link attempts failed; the server stays down.
    LinkFailed { attempts: u8 },
}
