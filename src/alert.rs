//! Alert engine.
//!
//! Two states, re-evaluated every tick:
//!
//! ```text
//!            any value outside [min, max]
//!   NORMAL ───────────────────────────────▶ ALERT   (plays tone pattern)
//!          ◀───────────────────────────────
//!            all values back inside
//! ```
//!
//! There is no hysteresis. A reading sitting on a limit can flip the state
//! every tick, and each entry into ALERT plays the full tone pattern.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, IndicatorColor, IndicatorPort};
use crate::config::{ConfigLimits, RuntimeConfig};
use crate::error::Result;
use crate::state::{AppContext, SensorReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertState {
    #[default]
    Normal,
    Alert,
}

/// Tone pattern played on every entry into ALERT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TonePattern {
    pub on_ms: u32,
    pub off_ms: u32,
    pub pulses: u8,
}

impl TonePattern {
    pub fn from_config(cfg: &RuntimeConfig) -> Self {
        Self { on_ms: cfg.beep_on_ms, off_ms: cfg.beep_off_ms, pulses: cfg.beep_count }
    }

    /// Play the pattern synchronously.
    pub fn play<I: IndicatorPort, D: DelayNs>(&self, indicator: &mut I, delay: &mut D) {
        for _ in 0..self.pulses {
            indicator.emit_tone(true);
            delay.delay_ms(self.on_ms);
            indicator.emit_tone(false);
            delay.delay_ms(self.off_ms);
        }
    }
}

impl Default for TonePattern {
    fn default() -> Self {
        Self::from_config(&RuntimeConfig::default())
    }
}

/// `true` when every value lies inside its inclusive `[min, max]`.
pub fn within_limits(r: &SensorReading, l: &ConfigLimits) -> bool {
    (l.temp_min..=l.temp_max).contains(&r.temperature)
        && (l.hum_min..=l.hum_max).contains(&r.humidity)
        && (l.press_min..=l.press_max).contains(&r.pressure)
}

/// LED state as a pure function of alert state and link status.
pub fn indicator_for(state: AlertState, link_connected: bool) -> (IndicatorColor, bool) {
    match state {
        AlertState::Alert => (IndicatorColor::Red, false),
        AlertState::Normal => (IndicatorColor::Green, !link_connected),
    }
}

pub struct AlertEngine {
    state: AlertState,
    tone: TonePattern,
}

impl AlertEngine {
    pub fn new(tone: TonePattern) -> Self {
        Self { state: AlertState::Normal, tone }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Advance the state machine. Returns the new state if it changed.
    pub fn evaluate(&mut self, reading: &SensorReading, limits: &ConfigLimits) -> Option<AlertState> {
        let next = if within_limits(reading, limits) {
            AlertState::Normal
        } else {
            AlertState::Alert
        };
        if next == self.state {
            return None;
        }
        self.state = next;
        Some(next)
    }

    /// One alert tick against the shared state.
    ///
    /// Reading and limits are snapshotted in separate lock scopes. If
    /// either lock times out the tick is skipped and the previous state
    /// kept.
    pub fn tick<I, D, E>(
        &mut self,
        ctx: &AppContext,
        indicator: &mut I,
        delay: &mut D,
        sink: &mut E,
    ) -> Result<AlertState>
    where
        I: IndicatorPort,
        D: DelayNs,
        E: EventSink,
    {
        let reading = ctx.reading.snapshot().inspect_err(|e| warn!("ALERT | skipped: {}", e))?;
        let limits = ctx.limits.snapshot().inspect_err(|e| warn!("ALERT | skipped: {}", e))?;

        let changed = self.evaluate(&reading, &limits);
        ctx.flags.set_alert_active(self.state == AlertState::Alert);

        let (color, link_lost) = indicator_for(self.state, ctx.flags.link_connected());
        indicator.set_indicator(color, link_lost);

        match changed {
            Some(AlertState::Alert) => {
                warn!(
                    "ALERT | out of limits: T={:.1} H={:.1} P={:.1}",
                    reading.temperature, reading.humidity, reading.pressure
                );
                sink.emit(&AppEvent::AlertRaised(reading));
                self.tone.play(indicator, delay);
            }
            Some(AlertState::Normal) => {
                info!("ALERT | all readings within limits");
                sink.emit(&AppEvent::AlertCleared(reading));
            }
            None => {}
        }
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(t: f32, h: f32, p: f32) -> SensorReading {
        SensorReading { temperature: t, humidity: h, pressure: p }
    }

    #[test]
    fn limits_are_inclusive() {
        let l = ConfigLimits::default();
        assert!(within_limits(&reading(15.0, 30.0, 950.0), &l));
        assert!(within_limits(&reading(30.0, 70.0, 1050.0), &l));
        assert!(!within_limits(&reading(30.1, 50.0, 1000.0), &l));
        assert!(!within_limits(&reading(20.0, 50.0, 949.9), &l));
    }

    #[test]
    fn zeroed_reading_is_an_alert() {
        let mut engine = AlertEngine::new(TonePattern::default());
        let changed = engine.evaluate(&SensorReading::default(), &ConfigLimits::default());
        assert_eq!(changed, Some(AlertState::Alert));
    }

    #[test]
    fn transitions_reported_once() {
        let l = ConfigLimits::default();
        let mut engine = AlertEngine::new(TonePattern::default());
        assert_eq!(engine.evaluate(&reading(40.0, 50.0, 1000.0), &l), Some(AlertState::Alert));
        assert_eq!(engine.evaluate(&reading(41.0, 50.0, 1000.0), &l), None);
        assert_eq!(engine.evaluate(&reading(22.0, 50.0, 1000.0), &l), Some(AlertState::Normal));
        assert_eq!(engine.evaluate(&reading(22.0, 50.0, 1000.0), &l), None);
    }

    #[test]
    fn indicator_mapping() {
        assert_eq!(indicator_for(AlertState::Alert, false), (IndicatorColor::Red, false));
        assert_eq!(indicator_for(AlertState::Normal, true), (IndicatorColor::Green, false));
        assert_eq!(indicator_for(AlertState::Normal, false), (IndicatorColor::Green, true));
    }
}
