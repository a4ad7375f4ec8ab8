//! End-to-end HTTP flows through the event pump over a scripted transport.

use weather_station::app::events::AppEvent;
use weather_station::config::{CHUNK_SIZE, ConfigField, MAX_CONNECTIONS, RuntimeConfig};
use weather_station::net::dashboard;
use weather_station::net::pool::SlotId;
use weather_station::net::pump::EventPump;
use weather_station::net::transport::{ConnHandle, TransportEvent};
use weather_station::state::{AppContext, SensorReading};

use super::mock_hw::{EventLog, ManualClock, MockLink, ScriptedTransport, parse_response};

type Pump = EventPump<ScriptedTransport, MockLink, EventLog, ManualClock>;

fn pump() -> (Pump, AppContext, ManualClock) {
    let cfg = RuntimeConfig::default();
    let clock = ManualClock::default();
    let link = MockLink { up: true, ..Default::default() };
    let pump = EventPump::new(&cfg, ScriptedTransport::default(), link, EventLog::default(), clock.clone(), true);
    (pump, AppContext::new(200), clock)
}

fn accept(pump: &mut Pump, ctx: &AppContext, handle: ConnHandle) -> SlotId {
    pump.transport_mut().push(TransportEvent::Accept { handle });
    pump.service_transport(ctx);
    pump.transport().slot_of(handle)
}

fn send(pump: &mut Pump, ctx: &AppContext, slot: SlotId, data: &[u8]) {
    pump.transport_mut().push(TransportEvent::Received { slot, data: data.to_vec() });
    pump.service_transport(ctx);
}

/// Acknowledge everything written until the connection closes. Returns
/// the raw response.
fn drain(pump: &mut Pump, ctx: &AppContext, slot: SlotId) -> Vec<u8> {
    let mut acked = 0;
    for _ in 0..64 {
        if pump.transport().close_count(slot) > 0 {
            break;
        }
        let total = pump.transport().written_len(slot);
        assert!(total > acked, "no progress on {slot}");
        pump.transport_mut().push(TransportEvent::Sent { slot, len: total - acked });
        acked = total;
        pump.service_transport(ctx);
    }
    assert_eq!(pump.transport().close_count(slot), 1, "closed exactly once");
    pump.transport().written(slot)
}

fn get(pump: &mut Pump, ctx: &AppContext, handle: ConnHandle, path: &str) -> (u16, String, Vec<u8>) {
    let slot = accept(pump, ctx, handle);
    send(pump, ctx, slot, format!("GET {path} HTTP/1.1\r\nHost: station\r\n\r\n").as_bytes());
    parse_response(&drain(pump, ctx, slot))
}

// ── GET ──────────────────────────────────────────────────────

#[test]
fn dashboard_streams_in_bounded_chunks() {
    let (mut pump, ctx, _) = pump();
    let (code, head, body) = get(&mut pump, &ctx, 1, "/");

    assert_eq!(code, 200);
    assert!(head.contains("Content-Type: text/html"));
    assert!(head.contains(&format!("Content-Length: {}", dashboard::PAGE.len())));
    assert!(head.contains("Connection: close"));
    assert_eq!(body, dashboard::PAGE.as_bytes());

    // Head first, then no body write larger than one chunk.
    let slot = pump.transport().slot_of(1);
    let writes: Vec<usize> =
        pump.transport().writes.iter().filter(|(s, _)| *s == slot).map(|(_, b)| b.len()).collect();
    assert!(writes.len() >= 1 + dashboard::PAGE.len().div_ceil(CHUNK_SIZE));
    assert!(writes[1..].iter().all(|&n| n <= CHUNK_SIZE));
    assert_eq!(pump.manager().pool().occupied(), 0);
}

#[test]
fn json_reports_latest_reading() {
    let (mut pump, ctx, _) = pump();
    *ctx.reading.lock().unwrap() = SensorReading { temperature: 24.26, humidity: 48.0, pressure: 1011.94 };

    let (code, head, body) = get(&mut pump, &ctx, 7, "/json?ts=123");
    assert_eq!(code, 200);
    assert!(head.contains("Access-Control-Allow-Origin: *"));
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["temp_aht20"], 24.3);
    assert_eq!(v["hum_aht20"], 48.0);
    assert_eq!(v["press_bmp280"], 1011.9);
}

#[test]
fn unknown_route_is_404() {
    let (mut pump, ctx, _) = pump();
    let (code, _, body) = get(&mut pump, &ctx, 1, "/nope");
    assert_eq!(code, 404);
    assert_eq!(body, b"404 Not Found");
}

#[test]
fn garbage_request_line_is_400() {
    let (mut pump, ctx, _) = pump();
    let slot = accept(&mut pump, &ctx, 1);
    send(&mut pump, &ctx, slot, b"\r\n\r\n");
    let (code, _, body) = parse_response(&drain(&mut pump, &ctx, slot));
    assert_eq!(code, 400);
    assert_eq!(body, b"Bad Request");
}

// ── POST /cfg ────────────────────────────────────────────────

#[test]
fn config_post_split_across_packets() {
    let (mut pump, ctx, _) = pump();
    let body = "temp_max=32.5&press_offset=-3&bogus=1";
    let head = format!(
        "POST /cfg HTTP/1.1\r\nHost: station\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n",
        body.len()
    );

    let slot = accept(&mut pump, &ctx, 3);
    send(&mut pump, &ctx, slot, head.as_bytes());
    assert_eq!(pump.transport().written_len(slot), 0, "waits for the body");
    send(&mut pump, &ctx, slot, &body.as_bytes()[..10]);
    assert_eq!(pump.transport().written_len(slot), 0);
    send(&mut pump, &ctx, slot, &body.as_bytes()[10..]);

    let (code, _, resp) = parse_response(&drain(&mut pump, &ctx, slot));
    assert_eq!(code, 200);
    let v: serde_json::Value = serde_json::from_slice(&resp).unwrap();
    assert_eq!(v["status"], "success");
    assert_eq!(v["updates"].as_array().unwrap().len(), 2);
    assert_eq!(v["errors"][0]["field"], "bogus");

    let limits = ctx.limits.snapshot().unwrap();
    assert_eq!(limits.temp_max, 32.5);
    assert_eq!(limits.press_offset, -3.0);
}

#[test]
fn posted_offset_shows_in_config_and_nothing_else_moves() {
    let (mut pump, ctx, _) = pump();
    let (code, _, before) = get(&mut pump, &ctx, 1, "/config");
    assert_eq!(code, 200);
    let before: serde_json::Value = serde_json::from_slice(&before).unwrap();

    let body = "temp_offset=2.5";
    let slot = accept(&mut pump, &ctx, 2);
    send(&mut pump, &ctx, slot, format!("POST /cfg HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}", body.len()).as_bytes());
    let (code, _, _) = parse_response(&drain(&mut pump, &ctx, slot));
    assert_eq!(code, 200);

    let (code, _, after) = get(&mut pump, &ctx, 3, "/config");
    assert_eq!(code, 200);
    let after: serde_json::Value = serde_json::from_slice(&after).unwrap();
    for field in ConfigField::ALL {
        let key = field.key();
        if field == ConfigField::TempOffset {
            assert_eq!(after[key].as_f64(), Some(2.5));
        } else {
            assert_eq!(after[key], before[key], "{key} changed");
        }
    }
    assert_eq!(after.as_object().unwrap().len(), ConfigField::ALL.len());
}

#[test]
fn config_post_with_nothing_valid_is_400_and_unchanged() {
    let (mut pump, ctx, _) = pump();
    let before = ctx.limits.snapshot().unwrap();
    let body = "hum_min=90";
    let slot = accept(&mut pump, &ctx, 1);
    send(&mut pump, &ctx, slot, format!("POST /cfg HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}", body.len()).as_bytes());

    let (code, _, resp) = parse_response(&drain(&mut pump, &ctx, slot));
    assert_eq!(code, 400);
    let v: serde_json::Value = serde_json::from_slice(&resp).unwrap();
    assert_eq!(v["message"], "No valid parameter applied");
    assert_eq!(v["errors"][0]["error"], "must be below hum_max (70.0)");
    assert_eq!(ctx.limits.snapshot().unwrap(), before);
}

#[test]
fn declared_oversize_body_is_413() {
    let (mut pump, ctx, _) = pump();
    let slot = accept(&mut pump, &ctx, 1);
    send(&mut pump, &ctx, slot, b"POST /cfg HTTP/1.1\r\nContent-Length: 5000\r\n\r\n");
    let (code, _, body) = parse_response(&drain(&mut pump, &ctx, slot));
    assert_eq!(code, 413);
    assert_eq!(body, b"Payload Too Large");
}

#[test]
fn applied_fields_are_emitted_as_events() {
    let cfg = RuntimeConfig::default();
    let clock = ManualClock::default();
    let mut pump =
        EventPump::new(&cfg, ScriptedTransport::default(), MockLink::default(), EventLog::default(), clock, true);
    let ctx = AppContext::new(200);
    let slot = accept(&mut pump, &ctx, 1);
    let body = "hum_offset=2";
    send(&mut pump, &ctx, slot, format!("POST /cfg HTTP/1.1\r\nContent-Length: 12\r\n\r\n{body}").as_bytes());
    drain(&mut pump, &ctx, slot);

    // The link was marked up but the mock reports down: LinkLost comes from
    // the supervisor, ConfigApplied from the request.
    pump.service_link(&ctx);
    let sink_events = pump_events(&pump);
    assert!(sink_events.contains(&AppEvent::ConfigApplied { field: ConfigField::HumOffset, value: 2.0 }));
    assert!(sink_events.contains(&AppEvent::LinkLost));
}

fn pump_events(pump: &EventPump<ScriptedTransport, MockLink, EventLog, ManualClock>) -> Vec<AppEvent> {
    pump.sink().0.clone()
}

// ── Pool and teardown ────────────────────────────────────────

#[test]
fn fifth_connection_is_refused_until_a_slot_frees() {
    let (mut pump, ctx, _) = pump();
    let slots: Vec<SlotId> = (1..=MAX_CONNECTIONS as ConnHandle).map(|h| accept(&mut pump, &ctx, h)).collect();
    assert_eq!(pump.manager().pool().occupied(), MAX_CONNECTIONS);

    pump.transport_mut().push(TransportEvent::Accept { handle: 99 });
    pump.service_transport(&ctx);
    assert_eq!(pump.transport().rejected, vec![99]);

    send(&mut pump, &ctx, slots[0], b"GET /config HTTP/1.1\r\n\r\n");
    drain(&mut pump, &ctx, slots[0]);
    assert_eq!(pump.manager().pool().occupied(), MAX_CONNECTIONS - 1);

    let reused = accept(&mut pump, &ctx, 100);
    assert_eq!(reused.index(), slots[0].index());
    assert_ne!(reused, slots[0], "generation must change");
}

#[test]
fn idle_connection_is_swept_and_late_events_ignored() {
    let (mut pump, ctx, clock) = pump();
    let slot = accept(&mut pump, &ctx, 1);
    send(&mut pump, &ctx, slot, b"GET /json HTTP/1.1\r\n");

    clock.advance(9_000);
    send(&mut pump, &ctx, slot, b"X-Slow: 1\r\n");
    clock.advance(9_000);
    assert_eq!(pump.service_sweep(), 0, "activity pushed the deadline out");

    clock.advance(1_001);
    assert_eq!(pump.service_sweep(), 1);
    assert_eq!(pump.transport().close_count(slot), 1);

    // Stale notifications for the torn-down slot do nothing.
    send(&mut pump, &ctx, slot, b"\r\n");
    pump.transport_mut().push(TransportEvent::Sent { slot, len: 10 });
    pump.transport_mut().push(TransportEvent::Error { slot, code: -13 });
    pump.service_transport(&ctx);
    assert_eq!(pump.transport().written_len(slot), 0);
    assert_eq!(pump.transport().close_count(slot), 1);
}

#[test]
fn transport_error_mid_response_closes_once() {
    let (mut pump, ctx, _) = pump();
    let slot = accept(&mut pump, &ctx, 1);
    send(&mut pump, &ctx, slot, b"GET / HTTP/1.1\r\n\r\n");
    let first = pump.transport().written_len(slot);

    pump.transport_mut().push(TransportEvent::Error { slot, code: -14 });
    pump.transport_mut().push(TransportEvent::Sent { slot, len: first });
    pump.service_transport(&ctx);

    assert_eq!(pump.transport().close_count(slot), 1);
    assert_eq!(pump.transport().written_len(slot), first, "nothing sent after the error");
    assert_eq!(pump.manager().pool().occupied(), 0);
    assert_eq!(pump.service_sweep(), 0);
}

#[test]
fn write_failure_tears_down() {
    let (mut pump, ctx, _) = pump();
    let slot = accept(&mut pump, &ctx, 1);
    pump.transport_mut().fail_writes = true;
    send(&mut pump, &ctx, slot, b"GET /config HTTP/1.1\r\n\r\n");
    assert_eq!(pump.transport().close_count(slot), 1);
    assert_eq!(pump.manager().pool().occupied(), 0);
}

#[test]
fn peer_close_before_request_frees_slot() {
    let (mut pump, ctx, _) = pump();
    let slot = accept(&mut pump, &ctx, 1);
    send(&mut pump, &ctx, slot, b"");
    assert_eq!(pump.transport().close_count(slot), 1);
    assert_eq!(pump.manager().pool().occupied(), 0);
}
