mod gpio;

use crate::GpioResult;
use std::fmt::Debug;
use std::ops::BitOr;
pub use gpio::*;

/// A color for the tri-color status LED, as a mask of the three channels.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Color(u8);

impl Color {
    pub const OFF: Color = Color(0b000);
    pub const RED: Color = Color(0b001);
    pub const GREEN: Color = Color(0b010);
    pub const BLUE: Color = Color(0b100);
    pub const YELLOW: Color = Color(0b011);
    pub const WHITE: Color = Color(0b111);

    pub fn red(self) -> bool {
        self.0 & Self::RED.0 != 0
    }

    pub fn green(self) -> bool {
        self.0 & Self::GREEN.0 != 0
    }

    pub fn blue(self) -> bool {
        self.0 & Self::BLUE.0 != 0
    }
}

impl BitOr for Color {
    type Output = Color;

    fn bitor(self, rhs: Color) -> Color {
        Color(self.0 | rhs.0)
    }
}

/// A status indicator that shows a single color at a time.
pub trait Indicator: Debug {
    fn set_color(&self, color: Color) -> GpioResult<()>;

    fn off(&self) -> GpioResult<()> {
        self.set_color(Color::OFF)
    }
}
