//! Weather Station Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SensorHub      GpioIndicator   LogDisplay    WifiAdapter      │
//! │  (SensorPort)   (IndicatorPort) (DisplayPort) (LinkPort)       │
//! │  SocketTransport  GpioButtons   RebootToLoader  LogEventSink   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │   AppContext (sensor data · limits · flags · queue)    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  acquisition · event pump · alert · presentation · sweep ·     │
//! │  control  (one thread each, see `tasks`)                       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the host the same runtime runs against simulated sensors, console
//! display and LEDs, stdin buttons, and an OS socket on port 8080.
#![deny(unused_must_use)]

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Result;
use log::{error, info, warn};

use weather_station::adapters::log_sink::LogEventSink;
use weather_station::adapters::maintenance::RebootToLoader;
use weather_station::adapters::socket_transport::SocketTransport;
use weather_station::adapters::time::{MonotonicClock, ThreadDelay};
use weather_station::alert::{AlertEngine, TonePattern};
use weather_station::app::events::AppEvent;
use weather_station::app::ports::{
    ButtonPort, DisplayPort, EventSink, IndicatorPort, LinkPort, SensorPort,
};
use weather_station::config::RuntimeConfig;
use weather_station::net::pump;
use weather_station::state::AppContext;
use weather_station::tasks::{self, TaskSpec, acquisition, presentation, sweep};
use weather_station::{control, error::Error};

/// Board or host peripherals, already wrapped in their adapters.
struct Peripherals<S, I, D, B, L> {
    sensors: S,
    indicator: I,
    display: D,
    buttons: B,
    /// `None` when no usable link credentials exist.
    link: Option<L>,
}

fn main() -> Result<()> {
    // ── 1. Bootstrap + logging ───────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    info!("╔══════════════════════════════════════╗");
    info!("║  Weather Station v{}              ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Shared state ──────────────────────────────────────
    let cfg = runtime_config();
    let ctx = Arc::new(AppContext::from_config(&cfg));
    let clock = MonotonicClock::new();

    // ── 3. Peripherals ───────────────────────────────────────
    let hw = init_peripherals(&ctx, clock)?;

    // ── 4. Tasks ─────────────────────────────────────────────
    let handles = start_tasks(ctx, cfg, clock, hw)?;
    info!("Runtime started ({} tasks)", handles.len());

    for handle in handles {
        if handle.join().is_err() {
            error!("A task panicked");
        }
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
fn runtime_config() -> RuntimeConfig {
    RuntimeConfig::default()
}

/// Port 80 needs privileges on most hosts.
#[cfg(not(target_os = "espidf"))]
fn runtime_config() -> RuntimeConfig {
    RuntimeConfig { http_port: 8080, ..RuntimeConfig::default() }
}

fn spawn_periodic(
    spec: TaskSpec,
    cfg: &RuntimeConfig,
    cycle: impl FnMut() + Send + 'static,
) -> Result<JoinHandle<()>> {
    let period = tasks::period_of(&spec, cfg)
        .ok_or_else(|| anyhow::anyhow!("{} has no period", spec.display_name()))?;
    Ok(spec.spawn(move || tasks::run_periodic(period, cycle))?)
}

fn start_tasks<S, I, D, B, L>(
    ctx: Arc<AppContext>,
    cfg: RuntimeConfig,
    clock: MonotonicClock,
    hw: Peripherals<S, I, D, B, L>,
) -> Result<Vec<JoinHandle<()>>>
where
    S: SensorPort + Send + 'static,
    I: IndicatorPort + Send + 'static,
    D: DisplayPort + Send + 'static,
    B: ButtonPort + Send + 'static,
    L: LinkPort + Send + 'static,
{
    let Peripherals { mut sensors, mut indicator, mut display, buttons, link } = hw;
    let mut handles = Vec::with_capacity(tasks::TASKS.len());

    // Acquisition
    let c = ctx.clone();
    handles.push(spawn_periodic(tasks::ACQUISITION, &cfg, move || acquisition::cycle(&c, &mut sensors))?);

    // Event pump
    match link {
        Some(link) => {
            let c = ctx.clone();
            let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, cfg.http_port));
            handles.push(tasks::EVENT_PUMP.spawn(move || {
                pump::start(
                    c,
                    &cfg,
                    || SocketTransport::bind(addr),
                    link,
                    LogEventSink,
                    clock,
                    ThreadDelay,
                );
            })?);
        }
        None => {
            warn!("LINK | no usable credentials; web server disabled");
            LogEventSink.emit(&AppEvent::Started { http_port: None });
        }
    }

    // Alert
    let c = ctx.clone();
    let mut engine = AlertEngine::new(TonePattern::from_config(&cfg));
    let mut sink = LogEventSink;
    handles.push(spawn_periodic(tasks::ALERT, &cfg, move || {
        // Failures are logged inside and skip the tick.
        let _ = engine.tick(&c, &mut indicator, &mut ThreadDelay, &mut sink);
    })?);

    // Presentation
    let c = ctx.clone();
    handles.push(spawn_periodic(tasks::PRESENTATION, &cfg, move || presentation::cycle(&c, &mut display))?);

    // Sweep
    let c = ctx.clone();
    handles.push(spawn_periodic(tasks::SWEEP, &cfg, move || sweep::cycle(&c))?);

    // Control
    let poll = tasks::period_of(&tasks::CONTROL, &cfg).ok_or(Error::Init("control period"))?;
    handles.push(tasks::CONTROL.spawn(move || {
        control::run(ctx, poll, buttons, RebootToLoader, LogEventSink, ThreadDelay)
    })?);

    Ok(handles)
}

// ── Board wiring ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn init_peripherals(
    ctx: &Arc<AppContext>,
    _clock: MonotonicClock,
) -> Result<
    Peripherals<
        weather_station::sensors::SensorHub<esp_idf_hal::i2c::I2cDriver<'static>, ThreadDelay>,
        weather_station::adapters::indicator::GpioIndicator<
            esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>,
            esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>,
            esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>,
            esp_idf_hal::ledc::LedcDriver<'static>,
        >,
        weather_station::adapters::display::LogDisplay,
        weather_station::adapters::buttons::GpioButtons,
        weather_station::adapters::wifi::WifiAdapter,
    >,
> {
    use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, config::TimerConfig};
    use esp_idf_hal::units::Hertz;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::EspWifi;

    use weather_station::adapters::buttons::GpioButtons;
    use weather_station::adapters::display::LogDisplay;
    use weather_station::adapters::indicator::GpioIndicator;
    use weather_station::adapters::wifi::{Credentials, WifiAdapter};
    use weather_station::pins;
    use weather_station::sensors::SensorHub;
    use weather_station::state::ControlInput;

    let p = esp_idf_hal::peripherals::Peripherals::take()?;

    // SAFETY: each GPIO number is claimed exactly once, here.
    let (sda, scl) = unsafe { (AnyIOPin::new(pins::I2C_SDA_GPIO), AnyIOPin::new(pins::I2C_SCL_GPIO)) };
    let i2c = I2cDriver::new(p.i2c0, sda, scl, &I2cConfig::new().baudrate(Hertz(pins::I2C_BAUD_HZ)))?;
    let mut sensors = SensorHub::new(i2c, ThreadDelay);
    if let Err(e) = sensors.init() {
        warn!("Sensor init incomplete ({}), readings will show sentinels", e);
    }

    let led = |n| PinDriver::output(unsafe { AnyOutputPin::new(n) });
    let timer = LedcTimerDriver::new(p.ledc.timer0, &TimerConfig::default().frequency(Hertz(pins::BUZZER_FREQ_HZ)))?;
    let buzzer = LedcDriver::new(p.ledc.channel0, timer, unsafe { AnyOutputPin::new(pins::BUZZER_GPIO) })?;
    let indicator = GpioIndicator::new(led(pins::LED_R_GPIO)?, led(pins::LED_G_GPIO)?, led(pins::LED_B_GPIO)?, buzzer);

    let buttons = GpioButtons::new(ctx, unsafe {
        [
            (AnyIOPin::new(pins::BUTTON_LOGGING_GPIO), ControlInput::ToggleLogging),
            (AnyIOPin::new(pins::BUTTON_MAINTENANCE_GPIO), ControlInput::Maintenance),
            (AnyIOPin::new(pins::BUTTON_RESET_GPIO), ControlInput::ResetConfig),
        ]
    })?;

    let link = match Credentials::from_build_env() {
        Ok(credentials) => {
            let sysloop = EspSystemEventLoop::take()?;
            let nvs = EspDefaultNvsPartition::take()?;
            let wifi = EspWifi::new(p.modem, sysloop, Some(nvs))?;
            info!("WiFi: station '{}'", credentials.ssid());
            Some(WifiAdapter::new(credentials, wifi))
        }
        Err(e) => {
            error!("WiFi: {}", e);
            None
        }
    };

    Ok(Peripherals { sensors, indicator, display: LogDisplay::new(), buttons, link })
}

#[cfg(not(target_os = "espidf"))]
fn init_peripherals(
    ctx: &Arc<AppContext>,
    clock: MonotonicClock,
) -> Result<
    Peripherals<
        weather_station::sensors::simulated::SimulatedSensors,
        weather_station::adapters::indicator::LogIndicator,
        weather_station::adapters::display::LogDisplay,
        weather_station::adapters::buttons::StdinButtons,
        weather_station::adapters::wifi::WifiAdapter,
    >,
> {
    use weather_station::adapters::buttons::StdinButtons;
    use weather_station::adapters::display::LogDisplay;
    use weather_station::adapters::indicator::LogIndicator;
    use weather_station::adapters::wifi::WifiAdapter;
    use weather_station::sensors::simulated::SimulatedSensors;

    info!("Host simulation: simulated sensors, console display and LEDs");
    Ok(Peripherals {
        sensors: SimulatedSensors::new(),
        indicator: LogIndicator::new(),
        display: LogDisplay::new(),
        buttons: StdinButtons::spawn(ctx.clone(), clock)?,
        link: Some(WifiAdapter::new()),
    })
}
