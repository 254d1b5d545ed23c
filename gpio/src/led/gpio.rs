use crate::led::{Color, Indicator};
use crate::{GpioOutput, GpioResult};
use std::fmt::{Debug, Formatter};

/// A tri-color LED on three GPIO output pins.
///
/// Channel polarity (common cathode or anode) is handled by the pins' active
/// levels, not here.
pub struct GpioLed<'a> {
    red: &'a dyn GpioOutput,
    green: &'a dyn GpioOutput,
    blue: &'a dyn GpioOutput,
}

impl Debug for GpioLed<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpioLed({:?}, {:?}, {:?})", self.red, self.green, self.blue)
    }
}

impl<'a> GpioLed<'a> {
    pub fn new(
        red: &'a dyn GpioOutput,
        green: &'a dyn GpioOutput,
        blue: &'a dyn GpioOutput,
    ) -> Self {
        GpioLed { red, green, blue }
    }
}

impl Indicator for GpioLed<'_> {
    fn set_color(&self, color: Color) -> GpioResult<()> {
        self.red.write(color.red())?;
        self.green.write(color.green())?;
        self.blue.write(color.blue())?;
        Ok(())
    }
}
