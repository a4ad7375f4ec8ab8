//! Maintenance-mode adapter.
//!
//! On the board the chip restarts; holding BOOT through the reset lands in
//! the ROM download mode for flashing over USB. On the host the process
//! exits.

use log::warn;

use crate::app::ports::MaintenancePort;

#[derive(Debug, Default, Clone, Copy)]
pub struct RebootToLoader;

impl MaintenancePort for RebootToLoader {
    #[cfg(target_os = "espidf")]
    fn enter_maintenance_mode(&mut self) -> ! {
        warn!("MAINT | restarting for firmware update");
        unsafe { esp_idf_svc::sys::esp_restart() };
        #[allow(unreachable_code)]
        loop {
            esp_idf_hal::delay::FreeRtos::delay_ms(1000);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn enter_maintenance_mode(&mut self) -> ! {
        warn!("MAINT | maintenance mode requested, exiting");
        std::process::exit(0);
    }
}
