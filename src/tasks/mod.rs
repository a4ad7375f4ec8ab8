//! Task table and core-pinned spawning.
//!
//! The station runs a fixed set of tasks created once at boot:
//!
//! | Task         | Prio | Period  | Core | Work                               |
//! |--------------|------|---------|------|------------------------------------|
//! | acquisition  | 2    | 2 s     | App  | read sensors, store calibrated data|
//! | event pump   | 3    | ~5 ms   | Pro  | link supervision, HTTP connections |
//! | alert        | 2    | 500 ms  | App  | limit check, LED, buzzer           |
//! | presentation | 2    | 500 ms  | App  | local display                      |
//! | sweep        | 1    | 1 s     | Pro  | wake the pump to expire idle slots |
//! | control      | 1    | 50 ms   | App  | button actions                     |
//!
//! ESP-IDF implements `std::thread` on pthreads, which are FreeRTOS tasks.
//! `esp_pthread_set_cfg()` applies to the *next* `pthread_create()` from
//! the calling thread, so the config→spawn pair must not be interleaved
//! with other thread creation on the same thread.

pub mod acquisition;
pub mod presentation;
pub mod sweep;

use std::io;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::RuntimeConfig;

/// CPU core identifiers for the dual-core Xtensa parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU), shared with the Wi-Fi and lwIP stacks.
    Pro = 0,
    /// Core 1 (APP_CPU), application work.
    App = 1,
}

/// Static description of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    /// NUL-terminated, as the pthread config wants it.
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

impl TaskSpec {
    pub fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }

    pub fn spawn(&self, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
        spawn_on_core(self.core, self.priority, self.stack_kb, self.name, f)
    }
}

pub const ACQUISITION: TaskSpec = TaskSpec { name: "sensors\0", core: Core::App, priority: 2, stack_kb: 6 };
pub const EVENT_PUMP: TaskSpec = TaskSpec { name: "net-pump\0", core: Core::Pro, priority: 3, stack_kb: 12 };
pub const ALERT: TaskSpec = TaskSpec { name: "alert\0", core: Core::App, priority: 2, stack_kb: 4 };
pub const PRESENTATION: TaskSpec = TaskSpec { name: "display\0", core: Core::App, priority: 2, stack_kb: 4 };
pub const SWEEP: TaskSpec = TaskSpec { name: "sweep\0", core: Core::Pro, priority: 1, stack_kb: 3 };
pub const CONTROL: TaskSpec = TaskSpec { name: "control\0", core: Core::App, priority: 1, stack_kb: 4 };

/// Every task the runtime starts, in start order.
pub const TASKS: [TaskSpec; 6] = [ACQUISITION, EVENT_PUMP, ALERT, PRESENTATION, SWEEP, CONTROL];

/// Fixed period of each periodic task, from the runtime config.
pub fn period_of(spec: &TaskSpec, cfg: &RuntimeConfig) -> Option<Duration> {
    let ms = match spec.name {
        n if n == ACQUISITION.name => cfg.sensor_period_ms,
        n if n == ALERT.name => cfg.alert_tick_ms,
        n if n == PRESENTATION.name => cfg.display_period_ms,
        n if n == SWEEP.name => cfg.sweep_period_ms,
        n if n == CONTROL.name => cfg.control_poll_ms,
        _ => return None,
    };
    Some(Duration::from_millis(u64::from(ms)))
}

/// Run `cycle` forever with a fixed sleep between iterations. The sleep is
/// the task's only blocking point.
pub fn run_periodic(period: Duration, mut cycle: impl FnMut()) -> ! {
    loop {
        cycle();
        std::thread::sleep(period);
    }
}

/// Spawn a thread pinned to a specific core with explicit priority and stack.
///
/// `name` must be NUL-terminated (e.g. `"sensors\0"`).
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let ret = unsafe {
        let mut cfg = esp_idf_svc::sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = i32::from(priority);
        cfg.stack_size = (stack_kb * 1024) as _;
        cfg.thread_name = name.as_ptr().cast();
        esp_idf_svc::sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_svc::sys::ESP_OK {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );

    std::thread::Builder::new().name(display_name.into()).spawn(f)
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let display_name = name.trim_end_matches('\0');
    log::info!("Spawning '{}' (sim, no core pinning, stack={}KB)", display_name, stack_kb);

    // Host threads need more headroom than the board budget (formatting,
    // std::net), so never go below the platform default.
    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size((stack_kb * 1024).max(256 * 1024))
        .spawn(f)
}
