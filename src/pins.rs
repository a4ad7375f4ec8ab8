//! GPIO / peripheral pin assignments for the station board (ESP32-S3).
//!
//! Single source of truth: every adapter references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Sensor I²C bus (AHT20 @ 0x38, BMP280 @ 0x76)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// Standard-mode bus clock.
pub const I2C_BAUD_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Indicator LEDs (discrete, active-high)
// ---------------------------------------------------------------------------

/// Alert.
pub const LED_R_GPIO: i32 = 13;
/// Normal.
pub const LED_G_GPIO: i32 = 11;
/// Link down.
pub const LED_B_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// Buzzer (passive, LEDC PWM)
// ---------------------------------------------------------------------------

pub const BUZZER_GPIO: i32 = 21;
pub const BUZZER_FREQ_HZ: u32 = 2_500;

// ---------------------------------------------------------------------------
// Push buttons (active-low, internal pull-up, falling-edge interrupt)
// ---------------------------------------------------------------------------

/// Toggle periodic sensor logging.
pub const BUTTON_LOGGING_GPIO: i32 = 5;
/// Enter maintenance (firmware update) mode.
pub const BUTTON_MAINTENANCE_GPIO: i32 = 6;
/// Restore default limits and offsets.
pub const BUTTON_RESET_GPIO: i32 = 4;
