//! Hardware-abstraction layer for the codelock terminal.
//!
//! The traits here describe what the firmware needs from the board: single
//! pins, fixed-width pin buses, and the devices built on top of them (matrix
//! keypad, character LCD, tri-color LED). Backends implement the pin and bus
//! traits; everything above them is backend-agnostic.

pub mod gpiod;
pub mod keypad;
pub mod lcd;
pub mod led;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// A GPIO backend that can hand out pins and pin buses.
pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO pins available.
    fn count(&self) -> GpioResult<usize>;

    /// Gets the GPIO pin at the given index.
    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>>;

    /// Gets a bus made of the GPIO pins at the given indices.
    fn get_pin_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBus<N> + '_>>;
}

/// The active level of a pin. `High` by default; `Low` inverts the logical
/// value at the physical pin.
#[derive(Copy, Clone, Debug, Default)]
pub enum GpioActiveLevel {
    #[default]
    High,
    Low,
}

/// Pull-up/pull-down resistor configuration for a pin.
#[derive(Copy, Clone, Debug, Default)]
pub enum GpioBias {
    #[default]
    None,
    PullUp,
    PullDown,
}

/// A reserved GPIO pin whose direction is not decided yet.
pub trait GpioPin: Debug {
    /// Configures the pin as an input, allowing its state to be read.
    fn as_input(&mut self) -> GpioResult<Box<dyn GpioInput + '_>>;
    /// Configures the pin as an output, allowing its state to be written.
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>>;

    fn supports_active_level(&self) -> bool {
        false
    }
    fn active_level(&self) -> GpioActiveLevel {
        GpioActiveLevel::High
    }
    /// # Errors
    /// - `GpioError::NotSupported` if the backend cannot invert levels.
    fn set_active_level(&mut self, _level: GpioActiveLevel) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }

    fn supports_bias(&self) -> bool {
        false
    }
    fn bias(&self) -> GpioBias {
        GpioBias::None
    }
    /// # Errors
    /// - `GpioError::NotSupported` if the backend has no bias resistors.
    fn set_bias(&mut self, _bias: GpioBias) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }
}

pub trait GpioInput: Debug {
    /// Reads the logical state of the pin.
    fn read(&self) -> GpioResult<bool>;
}

pub trait GpioOutput: Debug {
    /// Writes the logical state of the pin.
    fn write(&self, value: bool) -> GpioResult<()>;
}

/// A group of `N` pins configured and accessed together.
pub trait GpioBus<const N: usize>: Debug {
    fn as_input(&mut self) -> GpioResult<Box<dyn GpioBusInput<N> + '_>>;
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>>;

    fn supports_active_level(&self) -> bool {
        false
    }
    fn active_level(&self) -> GpioActiveLevel {
        GpioActiveLevel::High
    }
    fn set_active_level(&mut self, _level: GpioActiveLevel) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }

    fn supports_bias(&self) -> bool {
        false
    }
    fn bias(&self) -> GpioBias {
        GpioBias::None
    }
    fn set_bias(&mut self, _bias: GpioBias) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }
}

pub trait GpioBusInput<const N: usize>: Debug {
    fn read(&self) -> GpioResult<[bool; N]>;
}

impl dyn GpioBusInput<8> + '_ {
    /// Reads the bus as a byte, LSb first.
    pub fn read_byte(&self) -> GpioResult<u8> {
        let values = self.read()?;
        let mut byte = 0u8;
        for (i, &value) in values.iter().enumerate() {
            if value {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }
}

impl dyn GpioBusInput<4> + '_ {
    /// Reads the bus as a nibble, LSb first.
    pub fn read_nibble(&self) -> GpioResult<u8> {
        let values = self.read()?;
        let mut nibble = 0u8;
        for (i, &value) in values.iter().enumerate() {
            if value {
                nibble |= 1 << i;
            }
        }
        Ok(nibble)
    }
}

pub trait GpioBusOutput<const N: usize>: Debug {
    fn write(&self, values: &[bool; N]) -> GpioResult<()>;
}

impl dyn GpioBusOutput<8> + '_ {
    /// Writes a byte to the bus, LSb first.
    pub fn write_byte(&self, value: u8) -> GpioResult<()> {
        let mut values = [false; 8];
        for (i, value_slot) in values.iter_mut().enumerate() {
            *value_slot = (value & (1 << i)) != 0;
        }
        self.write(&values)
    }
}

impl dyn GpioBusOutput<4> + '_ {
    /// Writes a nibble to the bus, LSb first.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `value` does not fit in four bits.
    pub fn write_nibble(&self, value: u8) -> GpioResult<()> {
        if value > 0b1111 {
            return Err(GpioError::InvalidArgument);
        }

        let mut values = [false; 4];
        for (i, value_slot) in values.iter_mut().enumerate() {
            *value_slot = (value & (1 << i)) != 0;
        }
        self.write(&values)
    }
}
