//! Push-button adapters.
//!
//! Edges go straight into [`AppContext::on_button_edge`], which only
//! touches atomics and a lock-free queue, so it is safe from interrupt
//! context. The control task drains the queue.
//!
//! - **`target_os = "espidf"`**: three active-low GPIOs with falling-edge
//!   interrupts. ESP-IDF disables a pin's interrupt after it fires;
//!   [`ButtonPort::rearm`] turns it back on.
//! - **host**: typing `1`, `2` or `3` and Enter on stdin simulates an edge.

use std::sync::Arc;

use log::info;

use crate::app::ports::ButtonPort;
use crate::state::{AppContext, ControlInput};

use super::time::{MonotonicClock, now_ms_u32};

/// Map a console line to the button it simulates.
pub fn input_for(line: &str) -> Option<ControlInput> {
    match line.trim() {
        "1" => Some(ControlInput::ToggleLogging),
        "2" => Some(ControlInput::Maintenance),
        "3" => Some(ControlInput::ResetConfig),
        _ => None,
    }
}

/// Host stand-in: a reader thread feeds stdin lines to the debouncer.
pub struct StdinButtons;

impl StdinButtons {
    pub fn spawn(ctx: Arc<AppContext>, clock: MonotonicClock) -> std::io::Result<Self> {
        std::thread::Builder::new().name("stdin-buttons".into()).spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if let Some(input) = input_for(&line) {
                            let accepted = ctx.on_button_edge(input, now_ms_u32(&clock));
                            info!("BUTTON | {:?} {}", input, if accepted { "queued" } else { "debounced" });
                        }
                    }
                }
            }
        })?;
        info!("BUTTON | type 1 (logging), 2 (maintenance) or 3 (reset) + Enter");
        Ok(Self)
    }
}

impl ButtonPort for StdinButtons {
    fn rearm(&mut self) {}
}

#[cfg(target_os = "espidf")]
pub use esp::GpioButtons;

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::Arc;

    use esp_idf_hal::gpio::{AnyIOPin, Input, InterruptType, PinDriver, Pull};
    use log::warn;

    use crate::app::ports::ButtonPort;
    use crate::state::{AppContext, ControlInput};

    pub struct GpioButtons {
        pins: [PinDriver<'static, AnyIOPin, Input>; 3],
    }

    fn now_ms() -> u32 {
        // ISR-safe.
        ((unsafe { esp_idf_svc::sys::esp_timer_get_time() }) / 1000) as u32
    }

    impl GpioButtons {
        /// Configure each pin and subscribe its edge handler.
        pub fn new(ctx: &Arc<AppContext>, pins: [(AnyIOPin, ControlInput); 3]) -> anyhow::Result<Self> {
            let [a, b, c] = pins.map(|(pin, input)| (PinDriver::input(pin), input));
            let mut drivers = Vec::with_capacity(3);
            for (driver, input) in [a, b, c] {
                let mut driver = driver?;
                driver.set_pull(Pull::Up)?;
                driver.set_interrupt_type(InterruptType::NegEdge)?;
                let ctx = ctx.clone();
                // SAFETY: the handler only touches atomics and a lock-free queue.
                unsafe {
                    driver.subscribe(move || {
                        ctx.on_button_edge(input, now_ms());
                    })?;
                }
                driver.enable_interrupt()?;
                drivers.push(driver);
            }
            let pins = drivers.try_into().map_err(|_| anyhow::anyhow!("button count"))?;
            Ok(Self { pins })
        }
    }

    impl ButtonPort for GpioButtons {
        fn rearm(&mut self) {
            for pin in &mut self.pins {
                if let Err(e) = pin.enable_interrupt() {
                    warn!("BUTTON | rearm failed: {}", e);
                }
            }
        }
    }
}
