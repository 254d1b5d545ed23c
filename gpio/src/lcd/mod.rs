//! HD44780-compatible character LCD module.
//!
//! One driver covers every wiring variant of the controller: the data bus
//! width (8-bit or 4-bit) and the pin map are configuration, not separate
//! code paths.

mod gpio;

use crate::{GpioError, GpioResult};
use std::fmt::Debug;
pub use gpio::*;

pub trait Hd44780Driver: Debug {
    /// Initializes the controller: bus synchronization, function set,
    /// a cleared display and left-to-right entry mode.
    fn init(&mut self, two_lines: bool, alt_font: bool) -> GpioResult<()>;

    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) -> GpioResult<()> {
        self.send_command(0b00000001)
    }

    /// Sets the cursor to the home position.
    fn return_home(&mut self) -> GpioResult<()> {
        self.send_command(0b00000010)
    }

    /// Sets the cursor move direction and whether the display shifts.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> GpioResult<()> {
        let mut command = 0b00000100;
        if cursor_direction == CursorDirection::Right {
            command |= 0b00000010;
        }
        if shift {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> GpioResult<()> {
        let mut command = 0b00001000;
        if display_on {
            command |= 0b00000100;
        }
        if cursor_on {
            command |= 0b00000010;
        }
        if blink_on {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the interface data length, line count and font.
    fn function_set(&mut self, data_length: bool, two_lines: bool, alt_font: bool) -> GpioResult<()> {
        let mut command = 0b00100000;
        if data_length {
            command |= 0b00010000;
        }
        if two_lines {
            command |= 0b00001000;
        }
        if alt_font {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the DDRAM address, i.e. the write position on the display.
    fn set_ddram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b01111111 {
            return Err(GpioError::InvalidArgument);
        }
        self.send_command(0b10000000 | address)
    }

    // Low-level commands, implemented by the backend. The high-level
    // functions above are built on these.

    /// Sends a command byte to the controller (RS low).
    fn send_command(&mut self, command: u8) -> GpioResult<()>;

    /// Sends a data byte to the controller (RS high).
    fn send_data(&mut self, data: u8) -> GpioResult<()>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// The cursor moves left after writing data.
    Left,
    /// The cursor moves right after writing data.
    Right,
}
