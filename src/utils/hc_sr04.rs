/// HcSr04 Module
///
/// Drives the HC-SR04 trigger line and times the echo line by polling, the same way the
/// module's datasheet describes: a short trigger pulse, then the echo stays high for the
/// round-trip time of the ping.
use crate::error::SensorError;
use crate::hardware::PulseTimer;
use rppal::gpio::{Gpio, InputPin, OutputPin};
use std::hint;
use std::time::{Duration, Instant};

// Trigger is held low this long before each pulse
const SETTLE_TIME: Duration = Duration::from_micros(10);

pub struct HcSr04 {
    trigger: OutputPin,
    echo: InputPin,
}

impl HcSr04 {
    pub fn new(gpio: &Gpio, trigger_pin: u8, echo_pin: u8) -> Result<Self, rppal::gpio::Error> {
        let mut trigger = gpio.get(trigger_pin)?.into_output();
        trigger.set_low();
        let echo = gpio.get(echo_pin)?.into_input();
        Ok(Self { trigger, echo })
    }
}

impl PulseTimer for HcSr04 {
    fn pulse(&mut self, width: Duration) {
        self.trigger.set_low();
        spin_for(SETTLE_TIME);
        self.trigger.set_high();
        spin_for(width);
        self.trigger.set_low();
    }

    fn wait_for_echo(&mut self, timeout: Duration) -> Result<Duration, SensorError> {
        let deadline = Instant::now() + timeout;

        while self.echo.is_low() {
            if Instant::now() >= deadline {
                return Err(SensorError::Timeout(timeout));
            }
        }
        let pulse_start = Instant::now();
        while self.echo.is_high() {
            if Instant::now() >= deadline {
                return Err(SensorError::Timeout(timeout));
            }
        }

        Ok(pulse_start.elapsed())
    }
}

// thread::sleep overshoots microsecond waits by far too much on Linux
fn spin_for(duration: Duration) {
    let start = Instant::now();
    while start.elapsed() < duration {
        hint::spin_loop();
    }
}
