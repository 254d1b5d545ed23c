//! The 16x2 character screen the access controller writes to.

use codelock_gpio::lcd::Hd44780Driver;
use codelock_gpio::{GpioError, GpioResult};
use log::warn;

pub const SCREEN_COLS: usize = 16;
pub const SCREEN_ROWS: usize = 2;

/// What the controller needs from the display: cursor positioning and ASCII
/// text output on a 16x2 grid. Characters are passed straight through to the
/// display's character generator.
pub trait Screen {
    fn clear(&mut self) -> GpioResult<()>;

    /// Moves the cursor. `col` in `[0,16)`, `row` in `{0,1}`.
    fn set_cursor(&mut self, col: usize, row: usize) -> GpioResult<()>;

    /// Writes one character at the cursor; the cursor advances.
    fn put_char(&mut self, c: char) -> GpioResult<()>;

    fn put_str(&mut self, s: &str) -> GpioResult<()> {
        for c in s.chars() {
            self.put_char(c)?;
        }
        Ok(())
    }
}

impl<T: ?Sized + Hd44780Driver> Screen for T {
    fn clear(&mut self) -> GpioResult<()> {
        self.clear_display()
    }

    fn set_cursor(&mut self, col: usize, row: usize) -> GpioResult<()> {
        if col >= SCREEN_COLS || row >= SCREEN_ROWS {
            return Err(GpioError::InvalidArgument);
        }
        // The second line starts at DDRAM address 0x40 on two-line
        // controllers.
        self.set_ddram_address((col + 0x40 * row) as u8)
    }

    fn put_char(&mut self, c: char) -> GpioResult<()> {
        if c.is_ascii() {
            self.send_data(c as u8)
        } else {
            warn!("Non-ASCII character: {}", c);
            self.send_data(b'?')
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct FakeLcd {
        commands: RefCell<Vec<u8>>,
        data: RefCell<Vec<u8>>,
    }

    impl Hd44780Driver for FakeLcd {
        fn init(&mut self, _two_lines: bool, _alt_font: bool) -> GpioResult<()> {
            Ok(())
        }

        fn send_command(&mut self, command: u8) -> GpioResult<()> {
            self.commands.borrow_mut().push(command);
            Ok(())
        }

        fn send_data(&mut self, data: u8) -> GpioResult<()> {
            self.data.borrow_mut().push(data);
            Ok(())
        }
    }

    #[test]
    fn cursor_maps_to_ddram_addresses() {
        let mut lcd = FakeLcd::default();

        lcd.set_cursor(0, 0).unwrap();
        lcd.set_cursor(3, 1).unwrap();
        assert_eq!(*lcd.commands.borrow(), vec![0x80, 0x80 | 0x43]);

        assert_eq!(lcd.set_cursor(16, 0), Err(GpioError::InvalidArgument));
        assert_eq!(lcd.set_cursor(0, 2), Err(GpioError::InvalidArgument));
    }

    #[test]
    fn non_ascii_characters_are_replaced() {
        let mut lcd = FakeLcd::default();

        lcd.put_str("ok\u{263a}").unwrap();
        assert_eq!(*lcd.data.borrow(), vec![b'o', b'k', b'?']);
    }
}
