//! Integration tests for the sensing pipeline:
//! acquisition → shared state → alert engine / display / control.

use std::sync::Arc;
use std::time::Duration;

use weather_station::alert::{AlertEngine, AlertState, TonePattern};
use weather_station::app::events::AppEvent;
use weather_station::app::ports::{IndicatorColor, MaintenancePort};
use weather_station::config::{ConfigField, ConfigLimits};
use weather_station::control::{self, ControlOutcome};
use weather_station::error::Error;
use weather_station::state::{AppContext, ControlInput, SensorReading};
use weather_station::tasks::{acquisition, presentation};

use super::mock_hw::{EventLog, IndicatorCall, MockDisplay, MockIndicator, MockSensors, NoDelay};

struct NeverMaintenance;
impl MaintenancePort for NeverMaintenance {
    fn enter_maintenance_mode(&mut self) -> ! {
        panic!("maintenance must not be entered");
    }
}

fn station() -> (AppContext, AlertEngine, MockIndicator, EventLog) {
    (
        AppContext::new(200),
        AlertEngine::new(TonePattern::default()),
        MockIndicator::default(),
        EventLog::default(),
    )
}

// ── Acquisition → alert → indicator ──────────────────────────

#[test]
fn comfortable_readings_keep_green() {
    let (ctx, mut engine, mut led, mut events) = station();
    ctx.flags.set_link_connected(true);
    let mut sensors = MockSensors::new(22.0, 50.0, 1013.0);

    acquisition::acquire_once(&ctx, &mut sensors).unwrap();
    let state = engine.tick(&ctx, &mut led, &mut NoDelay::default(), &mut events).unwrap();

    assert_eq!(state, AlertState::Normal);
    assert!(!ctx.flags.alert_active());
    assert_eq!(led.last_color(), Some((IndicatorColor::Green, false)));
    assert_eq!(led.beeps(), 0);
    assert!(events.0.is_empty());
}

#[test]
fn hot_reading_raises_alert_once_with_three_beeps() {
    let (ctx, mut engine, mut led, mut events) = station();
    let mut sensors = MockSensors::new(35.0, 50.0, 1013.0);
    let mut delay = NoDelay::default();

    acquisition::acquire_once(&ctx, &mut sensors).unwrap();
    engine.tick(&ctx, &mut led, &mut delay, &mut events).unwrap();
    engine.tick(&ctx, &mut led, &mut delay, &mut events).unwrap();

    assert!(ctx.flags.alert_active());
    assert_eq!(led.beeps(), 3, "pattern plays only on entry");
    assert_eq!(delay.total_ms, 3 * (200 + 100));
    assert_eq!(led.last_color(), Some((IndicatorColor::Red, false)));
    assert!(matches!(events.0.as_slice(), [AppEvent::AlertRaised(r)] if r.temperature == 35.0));
}

#[test]
fn led_is_set_before_tone_starts() {
    let (ctx, mut engine, mut led, mut events) = station();
    acquisition::acquire_once(&ctx, &mut MockSensors::new(10.0, 50.0, 1013.0)).unwrap();
    engine.tick(&ctx, &mut led, &mut NoDelay::default(), &mut events).unwrap();
    assert_eq!(led.calls[0], IndicatorCall::Set(IndicatorColor::Red, false));
    assert_eq!(led.calls[1], IndicatorCall::Tone(true));
}

#[test]
fn recovery_clears_alert() {
    let (ctx, mut engine, mut led, mut events) = station();
    let mut sensors = MockSensors::new(22.0, 80.0, 1013.0);
    acquisition::acquire_once(&ctx, &mut sensors).unwrap();
    engine.tick(&ctx, &mut led, &mut NoDelay::default(), &mut events).unwrap();
    assert!(ctx.flags.alert_active());

    sensors.humidity = 60.0;
    acquisition::acquire_once(&ctx, &mut sensors).unwrap();
    engine.tick(&ctx, &mut led, &mut NoDelay::default(), &mut events).unwrap();
    assert!(!ctx.flags.alert_active());
    assert!(matches!(events.0.last(), Some(AppEvent::AlertCleared(_))));
    // Link never came up: green plus the link-down channel.
    assert_eq!(led.last_color(), Some((IndicatorColor::Green, true)));
}

#[test]
fn three_in_limit_readings_clear_alert_once_without_new_tone() {
    let (ctx, mut engine, mut led, mut events) = station();
    let mut sensors = MockSensors::new(22.0, 50.0, 1200.0);
    acquisition::acquire_once(&ctx, &mut sensors).unwrap();
    engine.tick(&ctx, &mut led, &mut NoDelay::default(), &mut events).unwrap();
    assert_eq!(led.beeps(), 3);

    sensors.pressure = 1013.0;
    for _ in 0..3 {
        acquisition::acquire_once(&ctx, &mut sensors).unwrap();
        let state = engine.tick(&ctx, &mut led, &mut NoDelay::default(), &mut events).unwrap();
        assert_eq!(state, AlertState::Normal);
    }

    assert_eq!(led.beeps(), 3, "clearing plays no pattern");
    let cleared = events.0.iter().filter(|e| matches!(e, AppEvent::AlertCleared(_))).count();
    let raised = events.0.iter().filter(|e| matches!(e, AppEvent::AlertRaised(_))).count();
    assert_eq!((raised, cleared), (1, 1));
    assert!(!ctx.flags.alert_active());
}

#[test]
fn offsets_are_applied_at_acquisition() {
    let ctx = AppContext::new(200);
    {
        let mut limits = ctx.limits.lock().unwrap();
        limits.apply(ConfigField::TempOffset, -1.5).unwrap();
        limits.apply(ConfigField::PressOffset, 10.0).unwrap();
    }
    let r = acquisition::acquire_once(&ctx, &mut MockSensors::new(25.0, 40.0, 1000.0)).unwrap();
    assert_eq!(r, SensorReading { temperature: 23.5, humidity: 40.0, pressure: 1010.0 });
    assert_eq!(ctx.reading.snapshot().unwrap(), r);
}

#[test]
fn failed_sensor_reads_zero_and_triggers_alert() {
    let (ctx, mut engine, mut led, mut events) = station();
    let mut sensors = MockSensors::new(22.0, 50.0, 1013.0);
    sensors.bmp_fails = true;

    let r = acquisition::acquire_once(&ctx, &mut sensors).unwrap();
    assert_eq!(r.pressure, 0.0);
    assert_eq!(r.temperature, 22.0);

    // Zero pressure is below every allowed minimum.
    engine.tick(&ctx, &mut led, &mut NoDelay::default(), &mut events).unwrap();
    assert!(ctx.flags.alert_active());
}

#[test]
fn busy_sensor_lock_skips_alert_tick() {
    let ctx = Arc::new(AppContext::new(200));
    let mut engine = AlertEngine::new(TonePattern::default());
    let mut led = MockIndicator::default();

    let holder = {
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let _g = ctx.reading.lock().unwrap();
            std::thread::sleep(Duration::from_millis(300));
        })
    };
    std::thread::sleep(Duration::from_millis(50));

    let res = engine.tick(&ctx, &mut led, &mut NoDelay::default(), &mut EventLog::default());
    assert_eq!(res, Err(Error::LockTimeout("sensor")));
    assert!(led.calls.is_empty(), "skipped tick must not touch the LED");
    holder.join().unwrap();
}

// ── Presentation ─────────────────────────────────────────────

#[test]
fn display_shows_latest_reading_and_link() {
    let ctx = AppContext::new(200);
    let mut display = MockDisplay::default();
    acquisition::acquire_once(&ctx, &mut MockSensors::new(21.04, 45.55, 1002.0)).unwrap();
    presentation::cycle(&ctx, &mut display);
    ctx.flags.set_link_connected(true);
    presentation::cycle(&ctx, &mut display);

    assert_eq!(display.frames.len(), 2);
    assert_eq!(display.frames[0][0], "Temp: 21.0 C");
    assert_eq!(display.frames[0][2], "Press: 1002.0 hPa");
    assert_eq!(display.frames[0][3], "Link: ---");
    assert_eq!(display.frames[1][3], "Link: OK");
}

// ── Control ──────────────────────────────────────────────────

#[test]
fn reset_button_restores_defaults_and_clears_alert() {
    let (ctx, mut engine, mut led, mut events) = station();
    ctx.limits.lock().unwrap().apply(ConfigField::TempMax, 20.0).unwrap();
    acquisition::acquire_once(&ctx, &mut MockSensors::new(25.0, 50.0, 1013.0)).unwrap();
    engine.tick(&ctx, &mut led, &mut NoDelay::default(), &mut events).unwrap();
    assert!(ctx.flags.alert_active());

    assert!(ctx.on_button_edge(ControlInput::ResetConfig, 5_000));
    let input = ctx.next_control().unwrap();
    let outcome = control::handle(&ctx, input, &mut NeverMaintenance, &mut events, &mut NoDelay::default()).unwrap();
    assert_eq!(outcome, ControlOutcome::ConfigReset);
    assert_eq!(ctx.limits.snapshot().unwrap(), ConfigLimits::default());

    engine.tick(&ctx, &mut led, &mut NoDelay::default(), &mut events).unwrap();
    assert!(!ctx.flags.alert_active());
}

#[test]
fn logging_toggle_survives_bounce() {
    let ctx = AppContext::new(200);
    let mut events = EventLog::default();
    // A bouncing contact: only the first edge counts.
    for t in [1_000, 1_010, 1_050, 1_190] {
        ctx.on_button_edge(ControlInput::ToggleLogging, t);
    }
    while let Some(input) = ctx.next_control() {
        control::handle(&ctx, input, &mut NeverMaintenance, &mut events, &mut NoDelay::default()).unwrap();
    }
    assert!(!ctx.flags.logging_enabled());
    assert_eq!(events.0, vec![AppEvent::LoggingToggled(false)]);
}
