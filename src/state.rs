//! Shared station state.
//!
//! Everything the tasks share lives in one [`AppContext`], handed to each
//! task as an `Arc`. Composite values (the latest reading, the limits) sit
//! behind [`BoundedMutex`]; single-word flags are atomics.
//!
//! Locks are only ever taken one at a time. No code path holds the sensor
//! lock while acquiring the config lock or the other way round.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::mpmc::Q8;
use log::warn;

use crate::config::{ConfigLimits, RuntimeConfig};
use crate::error::{Error, Result};

/// Default bounded wait for any shared-state lock.
pub const LOCK_WAIT: Duration = Duration::from_millis(100);

const LOCK_POLL: Duration = Duration::from_millis(1);

// ───────────────────────────────────────────────────────────────
// Bounded-wait mutex
// ───────────────────────────────────────────────────────────────

/// A mutex whose acquisition gives up after a bounded wait.
///
/// Callers that cannot get the lock in time see [`Error::LockTimeout`] and
/// skip their work for this cycle. A poisoned lock is recovered: every
/// protected value is plain data and stays valid after a panicking writer.
pub struct BoundedMutex<T> {
    name: &'static str,
    wait: Duration,
    inner: Mutex<T>,
}

impl<T> BoundedMutex<T> {
    pub const fn new(name: &'static str, value: T) -> Self {
        Self { name, wait: LOCK_WAIT, inner: Mutex::new(value) }
    }

    #[must_use]
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Acquire within this mutex's configured wait.
    pub fn lock(&self) -> Result<MutexGuard<'_, T>> {
        self.lock_within(self.wait)
    }

    pub fn lock_within(&self, wait: Duration) -> Result<MutexGuard<'_, T>> {
        let deadline = Instant::now() + wait;
        loop {
            match self.inner.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(poisoned)) => {
                    warn!("lock '{}' was poisoned, recovering", self.name);
                    return Ok(poisoned.into_inner());
                }
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockTimeout(self.name));
                    }
                    std::thread::sleep(LOCK_POLL);
                }
            }
        }
    }

    /// Copy the value out under the lock.
    pub fn snapshot(&self) -> Result<T>
    where
        T: Copy,
    {
        self.lock().map(|g| *g)
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor reading
// ───────────────────────────────────────────────────────────────

/// Latest calibrated measurement set.
///
/// A failed read leaves `0.0` in the affected field; readers cannot tell a
/// failure from a true zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    /// Degrees Celsius
    pub temperature: f32,
    /// Percent relative humidity
    pub humidity: f32,
    /// Hectopascals
    pub pressure: f32,
}

// ───────────────────────────────────────────────────────────────
// Status flags
// ───────────────────────────────────────────────────────────────

/// Single-word status shared without locks.
///
/// `alert_active` is written only by the alert task, `logging_enabled`
/// only by the control task, `link_connected` only by the event pump.
pub struct StatusFlags {
    alert_active: AtomicBool,
    link_connected: AtomicBool,
    logging_enabled: AtomicBool,
}

impl StatusFlags {
    pub const fn new() -> Self {
        Self {
            alert_active: AtomicBool::new(false),
            link_connected: AtomicBool::new(false),
            logging_enabled: AtomicBool::new(true),
        }
    }

    pub fn alert_active(&self) -> bool {
        self.alert_active.load(Ordering::Acquire)
    }

    pub fn set_alert_active(&self, v: bool) {
        self.alert_active.store(v, Ordering::Release);
    }

    pub fn link_connected(&self) -> bool {
        self.link_connected.load(Ordering::Acquire)
    }

    pub fn set_link_connected(&self, v: bool) {
        self.link_connected.store(v, Ordering::Release);
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled.load(Ordering::Acquire)
    }

    /// Flip logging and return the new value.
    pub fn toggle_logging(&self) -> bool {
        !self.logging_enabled.fetch_xor(true, Ordering::AcqRel)
    }
}

impl Default for StatusFlags {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Control inputs
// ───────────────────────────────────────────────────────────────

/// Physical push-button inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlInput {
    ToggleLogging,
    Maintenance,
    ResetConfig,
}

/// Edge debouncer shared by all inputs.
///
/// One timestamp for every button: an edge on any input closes the window
/// for all of them. Arithmetic wraps, so the 32-bit millisecond tick
/// rolling over does not lock the inputs out.
pub struct Debouncer {
    last_ms: AtomicU32,
    window_ms: u32,
}

impl Debouncer {
    pub const fn new(window_ms: u32) -> Self {
        Self { last_ms: AtomicU32::new(0), window_ms }
    }

    /// Accept the edge at `now_ms` if the window since the last accepted
    /// edge has passed. Lock-free, so it is safe in interrupt context.
    pub fn accept(&self, now_ms: u32) -> bool {
        let last = self.last_ms.load(Ordering::Acquire);
        if now_ms.wrapping_sub(last) <= self.window_ms {
            return false;
        }
        self.last_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

// ───────────────────────────────────────────────────────────────
// Application context
// ───────────────────────────────────────────────────────────────

/// All state shared between tasks.
pub struct AppContext {
    pub reading: BoundedMutex<SensorReading>,
    pub limits: BoundedMutex<ConfigLimits>,
    pub flags: StatusFlags,
    pub debounce: Debouncer,
    /// Control actions raised by button edges, consumed by the control task.
    pub pending: Q8<ControlInput>,
    /// Raised by the sweep task, consumed by the event pump.
    pub sweep: Signal<CriticalSectionRawMutex, ()>,
}

impl AppContext {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            reading: BoundedMutex::new("sensor", SensorReading::default()),
            limits: BoundedMutex::new("config", ConfigLimits::default()),
            flags: StatusFlags::new(),
            debounce: Debouncer::new(debounce_ms),
            pending: Q8::new(),
            sweep: Signal::new(),
        }
    }

    /// Context with the lock wait and debounce window from `cfg`.
    pub fn from_config(cfg: &RuntimeConfig) -> Self {
        let wait = Duration::from_millis(u64::from(cfg.lock_wait_ms));
        let mut ctx = Self::new(cfg.debounce_ms);
        ctx.reading = BoundedMutex::new("sensor", SensorReading::default()).with_wait(wait);
        ctx.limits = BoundedMutex::new("config", ConfigLimits::default()).with_wait(wait);
        ctx
    }

    /// Button edge handler. Debounces and queues; never locks.
    ///
    /// Returns `true` if the edge was accepted and queued.
    pub fn on_button_edge(&self, input: ControlInput, now_ms: u32) -> bool {
        if !self.debounce.accept(now_ms) {
            return false;
        }
        self.pending.enqueue(input).is_ok()
    }

    pub fn next_control(&self) -> Option<ControlInput> {
        self.pending.dequeue()
    }
}
