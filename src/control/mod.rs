//! Button-triggered control actions.
//!
//! The edge handler ([`AppContext::on_button_edge`]) only debounces and
//! queues. This task drains the queue and does the real work, so
//! configuration is never locked from interrupt context.
//!
//! | Input           | Action                                  |
//! |-----------------|-----------------------------------------|
//! | `ToggleLogging` | flip per-cycle sensor logging           |
//! | `Maintenance`   | hand over to the maintenance path       |
//! | `ResetConfig`   | restore default limits and offsets      |

use std::sync::Arc;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ButtonPort, EventSink, MaintenancePort};
use crate::config::ConfigLimits;
use crate::error::Result;
use crate::state::{AppContext, ControlInput};

/// Pause before handing over, so the log line reaches the console.
const MAINTENANCE_GRACE_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    LoggingToggled(bool),
    ConfigReset,
}

/// Restore default limits and offsets under the configuration lock.
pub fn reset_config(ctx: &AppContext) -> Result<()> {
    let mut limits = ctx.limits.lock()?;
    *limits = ConfigLimits::default();
    Ok(())
}

/// Carry out one queued control action.
///
/// `Maintenance` never returns.
pub fn handle<M, E, D>(
    ctx: &AppContext,
    input: ControlInput,
    maintenance: &mut M,
    sink: &mut E,
    delay: &mut D,
) -> Result<ControlOutcome>
where
    M: MaintenancePort,
    E: EventSink,
    D: DelayNs,
{
    match input {
        ControlInput::ToggleLogging => {
            let enabled = ctx.flags.toggle_logging();
            info!("CONTROL | logging {}", if enabled { "enabled" } else { "disabled" });
            sink.emit(&AppEvent::LoggingToggled(enabled));
            Ok(ControlOutcome::LoggingToggled(enabled))
        }
        ControlInput::ResetConfig => {
            reset_config(ctx)?;
            info!("CONTROL | configuration reset to defaults");
            sink.emit(&AppEvent::ConfigReset);
            Ok(ControlOutcome::ConfigReset)
        }
        ControlInput::Maintenance => {
            info!("CONTROL | entering maintenance mode");
            sink.emit(&AppEvent::MaintenanceRequested);
            delay.delay_ms(MAINTENANCE_GRACE_MS);
            maintenance.enter_maintenance_mode()
        }
    }
}

/// Control task body: drain queued inputs, re-arm the buttons, sleep.
pub fn run<B, M, E, D>(
    ctx: Arc<AppContext>,
    poll: Duration,
    mut buttons: B,
    mut maintenance: M,
    mut sink: E,
    mut delay: D,
) -> !
where
    B: ButtonPort,
    M: MaintenancePort,
    E: EventSink,
    D: DelayNs,
{
    loop {
        while let Some(input) = ctx.next_control() {
            if let Err(e) = handle(&ctx, input, &mut maintenance, &mut sink, &mut delay) {
                warn!("CONTROL | {:?} skipped: {}", input, e);
            }
        }
        buttons.rearm();
        std::thread::sleep(poll);
    }
}
