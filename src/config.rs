//! Station configuration.
//!
//! Two kinds of configuration live here:
//!
//! - [`ConfigLimits`]: the operator-tunable alert limits and calibration
//!   offsets. Mutated at runtime by the web form and the reset button,
//!   never persisted.
//! - [`RuntimeConfig`]: task periods, timeouts and other timing knobs,
//!   fixed at boot.
//!
//! Capacities that size fixed buffers are plain constants.

use core::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Simultaneous HTTP clients (connection pool slots).
pub const MAX_CONNECTIONS: usize = 4;
/// Bytes of response body handed to the transport per send.
pub const CHUNK_SIZE: usize = 512;
/// Largest request (head + body) the server accepts.
pub const MAX_REQUEST_SIZE: usize = 1024;

// ═══════════════════════════════════════════════════════════════
//  Alert limits and offsets
// ═══════════════════════════════════════════════════════════════

/// Alert limits (min/max per measured dimension) plus additive offsets.
///
/// Invariant: `*_min < *_max` for every dimension. [`ConfigLimits::apply`]
/// is the only mutation path besides [`ConfigLimits::default`] and keeps it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfigLimits {
    #[serde(serialize_with = "one_decimal")]
    pub temp_min: f32,
    #[serde(serialize_with = "one_decimal")]
    pub temp_max: f32,
    #[serde(serialize_with = "one_decimal")]
    pub hum_min: f32,
    #[serde(serialize_with = "one_decimal")]
    pub hum_max: f32,
    #[serde(serialize_with = "one_decimal")]
    pub press_min: f32,
    #[serde(serialize_with = "one_decimal")]
    pub press_max: f32,
    #[serde(serialize_with = "one_decimal")]
    pub temp_offset: f32,
    #[serde(serialize_with = "one_decimal")]
    pub hum_offset: f32,
    #[serde(serialize_with = "one_decimal")]
    pub press_offset: f32,
}

impl Default for ConfigLimits {
    /// Comfortable indoor ranges for people.
    fn default() -> Self {
        Self {
            temp_min: 15.0,
            temp_max: 30.0,
            hum_min: 30.0,
            hum_max: 70.0,
            press_min: 950.0,
            press_max: 1050.0,
            temp_offset: 0.0,
            hum_offset: 0.0,
            press_offset: 0.0,
        }
    }
}

impl ConfigLimits {
    pub fn get(&self, field: ConfigField) -> f32 {
        match field {
            ConfigField::TempMin => self.temp_min,
            ConfigField::TempMax => self.temp_max,
            ConfigField::HumMin => self.hum_min,
            ConfigField::HumMax => self.hum_max,
            ConfigField::PressMin => self.press_min,
            ConfigField::PressMax => self.press_max,
            ConfigField::TempOffset => self.temp_offset,
            ConfigField::HumOffset => self.hum_offset,
            ConfigField::PressOffset => self.press_offset,
        }
    }

    fn slot(&mut self, field: ConfigField) -> &mut f32 {
        match field {
            ConfigField::TempMin => &mut self.temp_min,
            ConfigField::TempMax => &mut self.temp_max,
            ConfigField::HumMin => &mut self.hum_min,
            ConfigField::HumMax => &mut self.hum_max,
            ConfigField::PressMin => &mut self.press_min,
            ConfigField::PressMax => &mut self.press_max,
            ConfigField::TempOffset => &mut self.temp_offset,
            ConfigField::HumOffset => &mut self.hum_offset,
            ConfigField::PressOffset => &mut self.press_offset,
        }
    }

    /// Validate `value` for `field` and store it.
    ///
    /// The value must be finite and inside the field's plausible range. A
    /// limit must also stay strictly on its side of the *current* partner
    /// limit, so the outcome of a multi-field update depends on order.
    pub fn apply(&mut self, field: ConfigField, value: f32) -> Result<(), FieldError> {
        if !value.is_finite() {
            return Err(FieldError::NotANumber);
        }
        let (lo, hi) = field.range();
        if value < lo || value > hi {
            return Err(FieldError::OutOfRange { value });
        }
        match field.role() {
            LimitRole::Min { max } => {
                let current = self.get(max);
                if value >= current {
                    return Err(FieldError::NotBelow { partner: max, partner_value: current });
                }
            }
            LimitRole::Max { min } => {
                let current = self.get(min);
                if value <= current {
                    return Err(FieldError::NotAbove { partner: min, partner_value: current });
                }
            }
            LimitRole::Offset => {}
        }
        *self.slot(field) = value;
        Ok(())
    }

    /// `min < max` holds for every dimension.
    pub fn is_consistent(&self) -> bool {
        self.temp_min < self.temp_max && self.hum_min < self.hum_max && self.press_min < self.press_max
    }
}

/// One named, individually updatable configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    TempMin,
    TempMax,
    HumMin,
    HumMax,
    PressMin,
    PressMax,
    TempOffset,
    HumOffset,
    PressOffset,
}

/// How a field relates to the rest of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitRole {
    Min { max: ConfigField },
    Max { min: ConfigField },
    Offset,
}

impl ConfigField {
    pub const ALL: [Self; 9] = [
        Self::TempMin,
        Self::TempMax,
        Self::HumMin,
        Self::HumMax,
        Self::PressMin,
        Self::PressMax,
        Self::TempOffset,
        Self::HumOffset,
        Self::PressOffset,
    ];

    /// Form / JSON key.
    pub const fn key(self) -> &'static str {
        match self {
            Self::TempMin => "temp_min",
            Self::TempMax => "temp_max",
            Self::HumMin => "hum_min",
            Self::HumMax => "hum_max",
            Self::PressMin => "press_min",
            Self::PressMax => "press_max",
            Self::TempOffset => "temp_offset",
            Self::HumOffset => "hum_offset",
            Self::PressOffset => "press_offset",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Inclusive plausible range.
    pub const fn range(self) -> (f32, f32) {
        match self {
            Self::TempMin | Self::TempMax => (-50.0, 50.0),
            Self::HumMin | Self::HumMax => (0.0, 100.0),
            Self::PressMin | Self::PressMax => (300.0, 1100.0),
            Self::TempOffset | Self::HumOffset => (-10.0, 10.0),
            Self::PressOffset => (-50.0, 50.0),
        }
    }

    pub const fn role(self) -> LimitRole {
        match self {
            Self::TempMin => LimitRole::Min { max: Self::TempMax },
            Self::HumMin => LimitRole::Min { max: Self::HumMax },
            Self::PressMin => LimitRole::Min { max: Self::PressMax },
            Self::TempMax => LimitRole::Max { min: Self::TempMin },
            Self::HumMax => LimitRole::Max { min: Self::HumMin },
            Self::PressMax => LimitRole::Max { min: Self::PressMin },
            Self::TempOffset | Self::HumOffset | Self::PressOffset => LimitRole::Offset,
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Why a single field update was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldError {
    /// The value is not a finite number.
    NotANumber,
    /// Outside the plausible range for the field.
    OutOfRange { value: f32 },
    /// A minimum that is not strictly below the current maximum.
    NotBelow { partner: ConfigField, partner_value: f32 },
    /// A maximum that is not strictly above the current minimum.
    NotAbove { partner: ConfigField, partner_value: f32 },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber => write!(f, "not a number"),
            Self::OutOfRange { value } => write!(f, "value out of range: {value:.1}"),
            Self::NotBelow { partner, partner_value } => {
                write!(f, "must be below {partner} ({partner_value:.1})")
            }
            Self::NotAbove { partner, partner_value } => {
                write!(f, "must be above {partner} ({partner_value:.1})")
            }
        }
    }
}

/// Serialize an `f32` rounded to one decimal place.
pub fn one_decimal<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f32((value * 10.0).round() / 10.0)
}

// ═══════════════════════════════════════════════════════════════
//  Timing
// ═══════════════════════════════════════════════════════════════

/// Task periods and timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Periodic tasks ---
    /// Sensor acquisition period (milliseconds)
    pub sensor_period_ms: u32,
    /// Alert evaluation tick (milliseconds)
    pub alert_tick_ms: u32,
    /// Display refresh period (milliseconds)
    pub display_period_ms: u32,
    /// Idle-connection sweep period (milliseconds)
    pub sweep_period_ms: u32,
    /// Pending control action poll period (milliseconds)
    pub control_poll_ms: u32,

    // --- Locks and debounce ---
    /// Bounded wait on any shared-state lock (milliseconds)
    pub lock_wait_ms: u32,
    /// Minimum gap between two accepted button edges (milliseconds)
    pub debounce_ms: u32,

    // --- Alert tone ---
    pub beep_on_ms: u32,
    pub beep_off_ms: u32,
    pub beep_count: u8,

    // --- HTTP ---
    /// TCP port the dashboard listens on
    pub http_port: u16,
    /// Connection idle timeout (milliseconds)
    pub idle_timeout_ms: u32,

    // --- Wireless link ---
    /// Link status poll period once connected (milliseconds)
    pub link_poll_ms: u32,
    /// Minimum gap between reconnect requests (milliseconds)
    pub reconnect_interval_ms: u32,
    /// Connection attempts at boot before giving up
    pub link_connect_attempts: u8,
    /// Timeout of a single boot-time connection attempt (milliseconds)
    pub link_connect_timeout_ms: u32,
    /// Pause between boot-time attempts (milliseconds)
    pub link_retry_pause_ms: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sensor_period_ms: 2000,
            alert_tick_ms: 500,
            display_period_ms: 500,
            sweep_period_ms: 1000,
            control_poll_ms: 50,

            lock_wait_ms: 100,
            debounce_ms: 200,

            beep_on_ms: 200,
            beep_off_ms: 100,
            beep_count: 3,

            http_port: 80,
            idle_timeout_ms: 10_000,

            link_poll_ms: 100,
            reconnect_interval_ms: 5000,
            link_connect_attempts: 5,
            link_connect_timeout_ms: 10_000,
            link_retry_pause_ms: 5000,
        }
    }
}
