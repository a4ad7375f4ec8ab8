//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`]: a blocking connect used only at boot, a status
//! query, and a non-blocking reconnect request the event pump issues after
//! a loss.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: the host network is assumed up; loss can be
//!   simulated for tests.

use core::fmt;
use log::{info, warn};

use crate::app::ports::LinkPort;
use crate::error::{Error, Result};

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    Timeout,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::Timeout => write!(f, "WiFi connection timed out"),
        }
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Link(match e {
            ConnectivityError::NoCredentials => "no credentials",
            ConnectivityError::InvalidSsid => "invalid SSID",
            ConnectivityError::InvalidPassword => "invalid password",
            ConnectivityError::ConnectionFailed => "connection failed",
            ConnectivityError::Timeout => "connect timed out",
        })
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> core::result::Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> core::result::Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

/// Validated station credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("ssid", &self.ssid).finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(ssid: &str, password: &str) -> core::result::Result<Self, ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut c = Self { ssid: heapless::String::new(), password: heapless::String::new() };
        c.ssid.push_str(ssid).map_err(|()| ConnectivityError::InvalidSsid)?;
        c.password.push_str(password).map_err(|()| ConnectivityError::InvalidPassword)?;
        Ok(c)
    }

    /// Credentials baked in from `WIFI_SSID` / `WIFI_PASS` at build time.
    pub fn from_build_env() -> core::result::Result<Self, ConnectivityError> {
        let ssid = env!("WIFI_SSID");
        if ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        Self::new(ssid, env!("WIFI_PASS"))
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    #[cfg(target_os = "espidf")]
    credentials: Credentials,
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    /// Simulation: whether the host "network" is currently reachable.
    #[cfg(not(target_os = "espidf"))]
    sim_reachable: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(credentials: Credentials, wifi: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self { state: WifiState::Disconnected, credentials, wifi }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self { state: WifiState::Disconnected, sim_reachable: true }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Simulation: make the network (un)reachable.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_reachable(&mut self, reachable: bool) {
        self.sim_reachable = reachable;
        if !reachable {
            self.state = WifiState::Disconnected;
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, timeout_ms: u32) -> core::result::Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let client = ClientConfiguration {
            ssid: self.credentials.ssid.clone(),
            password: self.credentials.password.clone(),
            auth_method: if self.credentials.is_open() { AuthMethod::None } else { AuthMethod::WPA2Personal },
            ..Default::default()
        };
        self.wifi
            .set_configuration(&Configuration::Client(client))
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| ConnectivityError::ConnectionFailed)?;
        }
        self.wifi.connect().map_err(|_| ConnectivityError::ConnectionFailed)?;

        let deadline = std::time::Instant::now() + std::time::Duration::from_millis(u64::from(timeout_ms));
        while std::time::Instant::now() < deadline {
            if self.wifi.is_up().unwrap_or(false) {
                return Ok(());
            }
            esp_idf_hal::delay::FreeRtos::delay_ms(100);
        }
        let _ = self.wifi.disconnect();
        Err(ConnectivityError::Timeout)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, _timeout_ms: u32) -> core::result::Result<(), ConnectivityError> {
        if self.sim_reachable { Ok(()) } else { Err(ConnectivityError::Timeout) }
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_reachable && self.state == WifiState::Connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_reconnect(&mut self) {
        // Returns immediately; the driver completes the association in
        // the background.
        if let Err(e) = self.wifi.connect() {
            warn!("WiFi: reconnect request failed: {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_reconnect(&mut self) {
        if self.sim_reachable {
            self.state = WifiState::Connected;
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn connect(&mut self, timeout_ms: u32) -> Result<()> {
        self.state = WifiState::Connecting;
        match self.platform_connect(timeout_ms) {
            Ok(()) => {
                self.state = WifiState::Connected;
                info!("WiFi: associated");
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: {}", e);
                self.state = WifiState::Disconnected;
                Err(e.into())
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn request_reconnect(&mut self) {
        info!("WiFi: reconnect requested");
        self.platform_reconnect();
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
