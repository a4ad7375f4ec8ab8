//! Event pump: the single owner of the connection pool.
//!
//! Runs on its own thread with `edge-executor` for cooperative scheduling
//! and `async-io-mini` timers (no busy-spinning). Three futures share the
//! pump state:
//!
//! 1. **Transport**: drains socket notifications every few milliseconds
//! 2. **Sweep**: wakes on [`AppContext::sweep`] and expires idle slots
//! 3. **Link**: polls link status and paces reconnect requests
//!
//! ```text
//!  ┌─────────────────────────────────────────────────────────┐
//!  │  Pump thread                                            │
//!  │  ┌────────────────────────────────────────────────────┐ │
//!  │  │  edge_executor::LocalExecutor                      │ │
//!  │  │                                                    │ │
//!  │  │  ┌───────────┐  ┌──────────────┐  ┌────────────┐   │ │
//!  │  │  │ Transport │  │ Sweep        │  │ Link       │   │ │
//!  │  │  │ 5ms ⏱     │  │ wake-on-sig  │  │ 100ms ⏱    │   │ │
//!  │  │  └───────────┘  └──────────────┘  └────────────┘   │ │
//!  │  └────────────────────────────────────────────────────┘ │
//!  └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Because every pool mutation happens on this one thread, an accept, a
//! socket notification and a sweep can never act on the same slot at once.

use core::cell::RefCell;
use core::time::Duration;
use std::rc::Rc;
use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::{Clock, EventSink, LinkPort};
use crate::config::{MAX_CONNECTIONS, RuntimeConfig};
use crate::error::Result;
use crate::state::AppContext;

use super::link::{LinkSupervisor, connect_at_boot};
use super::manager::ConnectionManager;
use super::transport::{Transport, TransportEvent};

/// Transport poll interval.
const TRANSPORT_POLL: Duration = Duration::from_millis(5);

pub struct EventPump<T, L, E, C> {
    manager: ConnectionManager,
    transport: T,
    link: L,
    supervisor: LinkSupervisor,
    sink: E,
    clock: C,
    events: Vec<TransportEvent>,
}

impl<T, L, E, C> EventPump<T, L, E, C>
where
    T: Transport,
    L: LinkPort,
    E: EventSink,
    C: Clock,
{
    pub fn new(cfg: &RuntimeConfig, transport: T, link: L, sink: E, clock: C, link_up: bool) -> Self {
        Self {
            manager: ConnectionManager::new(cfg),
            transport,
            link,
            supervisor: LinkSupervisor::new(cfg, link_up),
            sink,
            clock,
            events: Vec::with_capacity(MAX_CONNECTIONS * 2),
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    /// Drain and handle pending transport notifications. Returns how many
    /// were handled.
    pub fn service_transport(&mut self, ctx: &AppContext) -> usize {
        self.transport.poll(&mut self.events);
        let now = self.clock.now_ms();
        let n = self.events.len();
        for event in self.events.drain(..) {
            self.manager.handle_event(event, now, ctx, &mut self.transport, &mut self.sink);
        }
        n
    }

    pub fn service_sweep(&mut self) -> usize {
        let now = self.clock.now_ms();
        self.manager.sweep(now, &mut self.transport)
    }

    pub fn service_link(&mut self, ctx: &AppContext) -> bool {
        let now = self.clock.now_ms();
        self.supervisor.poll(&mut self.link, now, ctx, &mut self.sink)
    }

    /// Run the pump forever on the current thread.
    pub fn run(self, ctx: Arc<AppContext>, cfg: &RuntimeConfig)
    where
        T: 'static,
        L: 'static,
        E: 'static,
        C: 'static,
    {
        let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
        let shared = Rc::new(RefCell::new(self));
        let link_poll = Duration::from_millis(u64::from(cfg.link_poll_ms));

        executor.spawn(transport_loop(shared.clone(), ctx.clone())).detach();
        executor.spawn(sweep_loop(shared.clone(), ctx.clone())).detach();
        executor.spawn(link_loop(shared, ctx, link_poll)).detach();

        info!("HTTP | event pump running ({} slots)", MAX_CONNECTIONS);
        futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
    }
}

type Shared<T, L, E, C> = Rc<RefCell<EventPump<T, L, E, C>>>;

async fn transport_loop<T, L, E, C>(pump: Shared<T, L, E, C>, ctx: Arc<AppContext>)
where
    T: Transport,
    L: LinkPort,
    E: EventSink,
    C: Clock,
{
    loop {
        pump.borrow_mut().service_transport(&ctx);
        async_io_mini::Timer::after(TRANSPORT_POLL).await;
    }
}

/// Wakes only when the sweep task signals; no polling.
async fn sweep_loop<T, L, E, C>(pump: Shared<T, L, E, C>, ctx: Arc<AppContext>)
where
    T: Transport,
    L: LinkPort,
    E: EventSink,
    C: Clock,
{
    loop {
        ctx.sweep.wait().await;
        pump.borrow_mut().service_sweep();
    }
}

async fn link_loop<T, L, E, C>(pump: Shared<T, L, E, C>, ctx: Arc<AppContext>, period: Duration)
where
    T: Transport,
    L: LinkPort,
    E: EventSink,
    C: Clock,
{
    loop {
        pump.borrow_mut().service_link(&ctx);
        async_io_mini::Timer::after(period).await;
    }
}

/// Bring the link up, open the transport and run the pump.
///
/// If the link never comes up, or the listener cannot be opened, this logs
/// and returns. Every other task keeps running; the indicator shows the
/// link as down.
pub fn start<T, L, E, C, D>(
    ctx: Arc<AppContext>,
    cfg: &RuntimeConfig,
    open: impl FnOnce() -> Result<T>,
    mut link: L,
    mut sink: E,
    clock: C,
    mut delay: D,
) where
    T: Transport + 'static,
    L: LinkPort + 'static,
    E: EventSink + 'static,
    C: Clock + 'static,
    D: DelayNs,
{
    if let Err(e) = connect_at_boot(&mut link, cfg, &ctx, &mut delay, &mut sink) {
        error!("LINK | {}; running without web server", e);
        return;
    }
    let transport = match open() {
        Ok(t) => t,
        Err(e) => {
            error!("HTTP | cannot open listener: {}", e);
            return;
        }
    };
    sink.emit(&AppEvent::Started { http_port: Some(cfg.http_port) });
    EventPump::new(cfg, transport, link, sink, clock, true).run(ctx, cfg);
}
