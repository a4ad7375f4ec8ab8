//! LED + buzzer adapter.
//!
//! Three discrete LEDs and a buzzer. The primary colour shows the alert
//! state, the blue line shows a lost link. The buzzer is PWM driven so a
//! passive element sounds at the LEDC frequency; any
//! [`SetDutyCycle`] works, which lets tests use a recording fake.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::{debug, warn};

use crate::app::ports::{IndicatorColor, IndicatorPort};

const TONE_DUTY_PERCENT: u8 = 50;

pub struct GpioIndicator<R, G, B, Z> {
    red: R,
    green: G,
    blue: B,
    buzzer: Z,
}

fn drive<P: OutputPin>(pin: &mut P, on: bool, name: &str) {
    let res = if on { pin.set_high() } else { pin.set_low() };
    if let Err(e) = res {
        warn!("LED | {} write failed: {:?}", name, embedded_hal::digital::Error::kind(&e));
    }
}

impl<R, G, B, Z> GpioIndicator<R, G, B, Z>
where
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
    Z: SetDutyCycle,
{
    /// Takes the pins and drives everything off.
    pub fn new(red: R, green: G, blue: B, buzzer: Z) -> Self {
        let mut this = Self { red, green, blue, buzzer };
        drive(&mut this.red, false, "red");
        drive(&mut this.green, false, "green");
        drive(&mut this.blue, false, "blue");
        this.emit_tone(false);
        this
    }

    pub fn release(self) -> (R, G, B, Z) {
        (self.red, self.green, self.blue, self.buzzer)
    }
}

impl<R, G, B, Z> IndicatorPort for GpioIndicator<R, G, B, Z>
where
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
    Z: SetDutyCycle,
{
    fn set_indicator(&mut self, color: IndicatorColor, link_lost: bool) {
        drive(&mut self.red, color == IndicatorColor::Red, "red");
        drive(&mut self.green, color == IndicatorColor::Green, "green");
        drive(&mut self.blue, link_lost, "blue");
    }

    fn emit_tone(&mut self, on: bool) {
        let res = if on {
            self.buzzer.set_duty_cycle_percent(TONE_DUTY_PERCENT)
        } else {
            self.buzzer.set_duty_cycle_fully_off()
        };
        if let Err(e) = res {
            warn!("BUZZER | duty write failed: {:?}", embedded_hal::pwm::Error::kind(&e));
        }
    }
}

/// Host stand-in: logs indicator changes.
#[derive(Debug, Default)]
pub struct LogIndicator {
    last: Option<(IndicatorColor, bool)>,
}

impl LogIndicator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndicatorPort for LogIndicator {
    fn set_indicator(&mut self, color: IndicatorColor, link_lost: bool) {
        if self.last != Some((color, link_lost)) {
            self.last = Some((color, link_lost));
            debug!("LED | {:?}{}", color, if link_lost { " + link-down" } else { "" });
        }
    }

    fn emit_tone(&mut self, on: bool) {
        if on {
            debug!("BUZZER | beep");
        }
    }
}
