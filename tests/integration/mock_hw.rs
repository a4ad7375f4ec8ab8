//! Mock ports for integration tests.
//!
//! Each mock records what the runtime did to it so tests can assert on the
//! full history without touching real GPIO, I2C or sockets.

#![allow(dead_code)]

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use weather_station::app::events::AppEvent;
use weather_station::app::ports::{
    DISPLAY_LINES, DisplayPort, EventSink, IndicatorColor, IndicatorPort, LinkPort, RawPressure, SensorPort,
};
use weather_station::error::{Error, Result, SensorError, TransportError};
use weather_station::net::pool::SlotId;
use weather_station::net::transport::{ConnHandle, Transport, TransportEvent};

// ── Sensors ───────────────────────────────────────────────────

/// Returns fixed values; each sensor can be made to fail.
pub struct MockSensors {
    pub temperature: f32,
    pub humidity: f32,
    /// Hectopascals, passed through `adc_p` as pascals.
    pub pressure: f32,
    pub aht_fails: bool,
    pub bmp_fails: bool,
    pub reads: u32,
}

impl MockSensors {
    pub fn new(temperature: f32, humidity: f32, pressure: f32) -> Self {
        Self { temperature, humidity, pressure, aht_fails: false, bmp_fails: false, reads: 0 }
    }
}

impl SensorPort for MockSensors {
    fn read_temp_humidity(&mut self) -> Result<(f32, f32)> {
        self.reads += 1;
        if self.aht_fails {
            return Err(Error::Sensor(SensorError::Bus));
        }
        Ok((self.temperature, self.humidity))
    }

    fn read_pressure_temp(&mut self) -> Result<RawPressure> {
        if self.bmp_fails {
            return Err(Error::Sensor(SensorError::Bus));
        }
        Ok(RawPressure { adc_p: (self.pressure * 100.0) as i32, adc_t: 0 })
    }

    fn pressure_hpa(&self, raw: RawPressure) -> Result<f32> {
        Ok(raw.adc_p as f32 / 100.0)
    }
}

// ── Indicator ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorCall {
    Set(IndicatorColor, bool),
    Tone(bool),
}

#[derive(Default)]
pub struct MockIndicator {
    pub calls: Vec<IndicatorCall>,
}

impl MockIndicator {
    pub fn last_color(&self) -> Option<(IndicatorColor, bool)> {
        self.calls.iter().rev().find_map(|c| match c {
            IndicatorCall::Set(color, lost) => Some((*color, *lost)),
            IndicatorCall::Tone(_) => None,
        })
    }

    pub fn beeps(&self) -> usize {
        self.calls.iter().filter(|c| **c == IndicatorCall::Tone(true)).count()
    }
}

impl IndicatorPort for MockIndicator {
    fn set_indicator(&mut self, color: IndicatorColor, link_lost: bool) {
        self.calls.push(IndicatorCall::Set(color, link_lost));
    }

    fn emit_tone(&mut self, on: bool) {
        self.calls.push(IndicatorCall::Tone(on));
    }
}

// ── Display ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockDisplay {
    pub frames: Vec<[String; DISPLAY_LINES]>,
}

impl DisplayPort for MockDisplay {
    fn render_lines(&mut self, lines: &[&str; DISPLAY_LINES]) {
        self.frames.push(lines.map(str::to_owned));
    }
}

// ── Link ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLink {
    pub up: bool,
    pub reconnects: u32,
}

impl LinkPort for MockLink {
    fn connect(&mut self, _timeout_ms: u32) -> Result<()> {
        self.up = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.up
    }

    fn request_reconnect(&mut self) {
        self.reconnects += 1;
    }
}

// ── Events / delay ────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog(pub Vec<AppEvent>);

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(event.clone());
    }
}

/// Records requested delays without sleeping.
#[derive(Default)]
pub struct NoDelay {
    pub total_ms: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += u64::from(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}

// ── Transport ─────────────────────────────────────────────────

/// Scripted transport: tests push events, the runtime's writes and closes
/// are recorded per slot.
#[derive(Default)]
pub struct ScriptedTransport {
    pub script: VecDeque<TransportEvent>,
    pub bound: Vec<(ConnHandle, SlotId)>,
    pub writes: Vec<(SlotId, Vec<u8>)>,
    pub closed: Vec<SlotId>,
    pub rejected: Vec<ConnHandle>,
    pub fail_writes: bool,
}

impl ScriptedTransport {
    pub fn push(&mut self, event: TransportEvent) {
        self.script.push_back(event);
    }

    pub fn slot_of(&self, handle: ConnHandle) -> SlotId {
        self.bound.iter().rev().find(|(h, _)| *h == handle).map(|(_, s)| *s).expect("handle was never bound")
    }

    pub fn written(&self, slot: SlotId) -> Vec<u8> {
        self.writes.iter().filter(|(s, _)| *s == slot).flat_map(|(_, b)| b.iter().copied()).collect()
    }

    pub fn written_len(&self, slot: SlotId) -> usize {
        self.writes.iter().filter(|(s, _)| *s == slot).map(|(_, b)| b.len()).sum()
    }

    pub fn close_count(&self, slot: SlotId) -> usize {
        self.closed.iter().filter(|s| **s == slot).count()
    }
}

impl Transport for ScriptedTransport {
    fn poll(&mut self, events: &mut Vec<TransportEvent>) {
        events.extend(self.script.drain(..));
    }

    fn bind(&mut self, handle: ConnHandle, slot: SlotId) -> core::result::Result<(), TransportError> {
        self.bound.push((handle, slot));
        Ok(())
    }

    fn write(&mut self, slot: SlotId, data: &[u8]) -> core::result::Result<(), TransportError> {
        if self.fail_writes {
            return Err(TransportError::OutOfMemory);
        }
        self.writes.push((slot, data.to_vec()));
        Ok(())
    }

    fn close(&mut self, slot: SlotId) {
        self.closed.push(slot);
    }

    fn reject(&mut self, handle: ConnHandle) {
        self.rejected.push(handle);
    }
}

/// Split a raw HTTP response into status code, headers and body.
pub fn parse_response(raw: &[u8]) -> (u16, String, Vec<u8>) {
    let split = raw.windows(4).position(|w| w == b"\r\n\r\n").expect("no header terminator");
    let head = String::from_utf8(raw[..split].to_vec()).expect("head is ASCII");
    let code = head.split(' ').nth(1).and_then(|c| c.parse().ok()).expect("status code");
    (code, head, raw[split + 4..].to_vec())
}

// ── Clock ─────────────────────────────────────────────────────

/// Manually advanced clock; clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock(std::rc::Rc<std::cell::Cell<u64>>);

impl ManualClock {
    pub fn set(&self, ms: u64) {
        self.0.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl weather_station::app::ports::Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}
