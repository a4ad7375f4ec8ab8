//! Weather station firmware library.
//!
//! Exposes the runtime (shared state, alert engine, tasks, web server) for
//! integration testing and host simulation. All ESP-IDF-specific code is
//! guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod alert;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod net;
pub mod pins;
pub mod sensors;
pub mod state;
pub mod tasks;
