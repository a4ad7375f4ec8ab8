//! Wireless link supervision.
//!
//! At boot the link gets a fixed number of blocking attempts. Once the
//! server runs, the pump polls [`LinkSupervisor::poll`] and reconnects are
//! only ever *requested*, never waited on.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, LinkPort};
use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::state::AppContext;

/// Blocking boot-time connection with retries.
///
/// On failure the link flag stays down and the caller runs degraded.
pub fn connect_at_boot<L, D, E>(link: &mut L, cfg: &RuntimeConfig, ctx: &AppContext, delay: &mut D, sink: &mut E) -> Result<()>
where
    L: LinkPort,
    D: DelayNs,
    E: EventSink,
{
    for attempt in 1..=cfg.link_connect_attempts {
        info!("LINK | connecting (attempt {}/{})", attempt, cfg.link_connect_attempts);
        match link.connect(cfg.link_connect_timeout_ms) {
            Ok(()) => {
                ctx.flags.set_link_connected(true);
                info!("LINK | connected");
                sink.emit(&AppEvent::LinkUp);
                return Ok(());
            }
            Err(e) => {
                warn!("LINK | attempt {} failed: {}", attempt, e);
                if attempt < cfg.link_connect_attempts {
                    delay.delay_ms(cfg.link_retry_pause_ms);
                }
            }
        }
    }
    ctx.flags.set_link_connected(false);
    sink.emit(&AppEvent::LinkFailed { attempts: cfg.link_connect_attempts });
    Err(Error::Link("no connection after retries"))
}

/// Tracks link transitions and paces reconnect requests.
pub struct LinkSupervisor {
    connected: bool,
    next_reconnect_ms: u64,
    reconnect_interval_ms: u64,
}

impl LinkSupervisor {
    pub fn new(cfg: &RuntimeConfig, connected: bool) -> Self {
        Self {
            connected,
            next_reconnect_ms: 0,
            reconnect_interval_ms: u64::from(cfg.reconnect_interval_ms),
        }
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Non-blocking status check. Returns `true` if the status changed.
    pub fn poll<L: LinkPort, E: EventSink>(&mut self, link: &mut L, now_ms: u64, ctx: &AppContext, sink: &mut E) -> bool {
        let up = link.is_connected();
        match (self.connected, up) {
            (false, true) => {
                self.connected = true;
                ctx.flags.set_link_connected(true);
                info!("LINK | restored");
                sink.emit(&AppEvent::LinkUp);
                true
            }
            (true, false) => {
                self.connected = false;
                ctx.flags.set_link_connected(false);
                warn!("LINK | lost, requesting reconnect");
                sink.emit(&AppEvent::LinkLost);
                link.request_reconnect();
                self.next_reconnect_ms = now_ms + self.reconnect_interval_ms;
                true
            }
            (false, false) => {
                if now_ms >= self.next_reconnect_ms {
                    link.request_reconnect();
                    self.next_reconnect_ms = now_ms + self.reconnect_interval_ms;
                }
                false
            }
            (true, true) => false,
        }
    }
}
