//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the logger
//! (UART / USB-CDC on the device, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { http_port: Some(port) } => {
                info!("START | dashboard on port {}", port);
            }
            AppEvent::Started { http_port: None } => {
                info!("START | running without web server");
            }
            AppEvent::AlertRaised(r) => {
                warn!(
                    "ALERT | raised | T={:.1}\u{00b0}C H={:.1}% P={:.1}hPa",
                    r.temperature, r.humidity, r.pressure
                );
            }
            AppEvent::AlertCleared(r) => {
                info!(
                    "ALERT | cleared | T={:.1}\u{00b0}C H={:.1}% P={:.1}hPa",
                    r.temperature, r.humidity, r.pressure
                );
            }
            AppEvent::ConfigApplied { field, value } => {
                info!("CONFIG | {} = {:.1}", field, value);
            }
            AppEvent::ConfigReset => {
                info!("CONFIG | restored defaults");
            }
            AppEvent::LoggingToggled(on) => {
                info!("CONTROL | periodic logging {}", if *on { "on" } else { "off" });
            }
            AppEvent::MaintenanceRequested => {
                warn!("CONTROL | entering maintenance mode");
            }
            AppEvent::LinkUp => {
                info!("LINK | up");
            }
            AppEvent::LinkLost => {
                warn!("LINK | lost");
            }
            AppEvent::LinkFailed { attempts } => {
                warn!("LINK | gave up after {} attempts", attempts);
            }
        }
    }
}
