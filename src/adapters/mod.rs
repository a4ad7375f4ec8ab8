//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter            | Implements      | Connects to                      |
//! |--------------------|-----------------|----------------------------------|
//! | `buttons`          | ButtonPort      | GPIO interrupts / stdin          |
//! | `display`          | DisplayPort     | Console log                      |
//! | `indicator`        | IndicatorPort   | GPIO LEDs + LEDC buzzer / log    |
//! | `log_sink`         | EventSink       | Serial log output                |
//! | `maintenance`      | MaintenancePort | Chip restart / process exit      |
//! | `socket_transport` | Transport       | Non-blocking TCP (lwIP / OS)     |
//! | `time`             | Clock, DelayNs  | ESP32 system timer / `Instant`   |
//! | `wifi`             | LinkPort        | ESP-IDF WiFi STA / host network  |

pub mod buttons;
pub mod display;
pub mod indicator;
pub mod log_sink;
pub mod maintenance;
pub mod socket_transport;
pub mod time;
pub mod wifi;
