//! The event pump over real loopback sockets.

use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use weather_station::adapters::socket_transport::SocketTransport;
use weather_station::adapters::time::MonotonicClock;
use weather_station::config::RuntimeConfig;
use weather_station::net::dashboard;
use weather_station::net::pump::EventPump;
use weather_station::state::{AppContext, SensorReading};

use super::mock_hw::{EventLog, MockLink, parse_response};

type Pump = EventPump<SocketTransport, MockLink, EventLog, MonotonicClock>;

fn loopback_pump() -> (Pump, SocketAddr) {
    let transport = SocketTransport::bind(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))).unwrap();
    let addr = transport.local_addr().unwrap();
    let link = MockLink { up: true, ..Default::default() };
    let pump = EventPump::new(&RuntimeConfig::default(), transport, link, EventLog::default(), MonotonicClock::new(), true);
    (pump, addr)
}

fn client(addr: SocketAddr, request: &'static [u8]) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut s = TcpStream::connect(addr).unwrap();
        s.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        s.write_all(request).unwrap();
        let mut raw = Vec::new();
        s.read_to_end(&mut raw).unwrap();
        raw
    })
}

/// Pump until `done` or five seconds pass.
fn run_until(pump: &mut Pump, ctx: &AppContext, mut done: impl FnMut(&Pump) -> bool) {
    let start = Instant::now();
    while !done(pump) && start.elapsed() < Duration::from_secs(5) {
        pump.service_transport(ctx);
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn json_over_loopback() {
    let (mut pump, addr) = loopback_pump();
    let ctx = AppContext::new(200);
    *ctx.reading.lock().unwrap() = SensorReading { temperature: 19.5, humidity: 62.0, pressure: 998.0 };

    let c = client(addr, b"GET /json HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n");
    run_until(&mut pump, &ctx, |_| c.is_finished());
    let (code, _, body) = parse_response(&c.join().unwrap());

    assert_eq!(code, 200);
    assert_eq!(body, br#"{"temp_aht20":19.5,"hum_aht20":62.0,"press_bmp280":998.0}"#);
    run_until(&mut pump, &ctx, |p| p.manager().pool().occupied() == 0);
    assert_eq!(pump.manager().pool().occupied(), 0);
}

#[test]
fn dashboard_over_loopback() {
    let (mut pump, addr) = loopback_pump();
    let ctx = AppContext::new(200);

    let c = client(addr, b"GET / HTTP/1.1\r\n\r\n");
    run_until(&mut pump, &ctx, |_| c.is_finished());
    let (code, head, body) = parse_response(&c.join().unwrap());

    assert_eq!(code, 200);
    assert!(head.contains("text/html"));
    assert_eq!(body, dashboard::PAGE.as_bytes());
}

#[test]
fn peer_hangup_frees_slot() {
    let (mut pump, addr) = loopback_pump();
    let ctx = AppContext::new(200);

    let mut s = TcpStream::connect(addr).unwrap();
    s.write_all(b"GET /js").unwrap();
    run_until(&mut pump, &ctx, |p| p.manager().pool().occupied() == 1);
    assert_eq!(pump.manager().pool().occupied(), 1);

    drop(s);
    run_until(&mut pump, &ctx, |p| p.manager().pool().occupied() == 0);
    assert_eq!(pump.manager().pool().occupied(), 0);
}
