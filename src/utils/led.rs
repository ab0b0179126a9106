/// LED Module
///
/// The proximity LED is a plain GPIO output.
use crate::hardware::{DigitalOutput, Level};
use rppal::gpio::{Gpio, OutputPin};

pub struct Led {
    pin: OutputPin,
}

impl Led {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self, rppal::gpio::Error> {
        let mut pin = gpio.get(pin)?.into_output();
        pin.set_low();
        Ok(Self { pin })
    }
}

impl DigitalOutput for Led {
    fn set_level(&mut self, level: Level) {
        self.pin.write(level);
    }
}
