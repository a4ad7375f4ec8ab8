//! Unified error types for the station firmware.
//!
//! A single `Error` enum that every subsystem can convert into. Variants are
//! `Copy` so they can be handed across task boundaries and logged without
//! allocation. None of these are fatal: callers log them and degrade (skip a
//! cycle, substitute a sentinel, tear down one connection).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bounded-wait lock could not be acquired in time. Carries the lock name.
    LockTimeout(&'static str),
    /// A sensor could not be read.
    Sensor(SensorError),
    /// The network transport refused an operation.
    Transport(TransportError),
    /// The wireless link could not be brought up.
    Link(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LockTimeout(name) => write!(f, "lock '{name}' timed out"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Link(msg) => write!(f, "link: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I2C transaction failed.
    Bus,
    /// The device never reported a finished conversion.
    Busy,
    /// The device answered with an unexpected identity.
    WrongChip(u8),
    /// The device returned a value that cannot be a real measurement.
    InvalidData,
    /// Calibration data has not been loaded yet.
    NotCalibrated,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "I2C bus error"),
            Self::Busy => write!(f, "conversion not ready"),
            Self::WrongChip(id) => write!(f, "unexpected chip id 0x{id:02X}"),
            Self::InvalidData => write!(f, "invalid measurement"),
            Self::NotCalibrated => write!(f, "calibration not loaded"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The handle does not refer to an open connection.
    UnknownHandle,
    /// The transport has no room for the data right now.
    OutOfMemory,
    /// The underlying socket reported an error (raw OS / lwIP code).
    Io(i32),
    /// The listener could not be created or bound.
    Bind,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownHandle => write!(f, "unknown connection handle"),
            Self::OutOfMemory => write!(f, "out of buffer space"),
            Self::Io(code) => write!(f, "socket error {code}"),
            Self::Bind => write!(f, "listener bind failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
