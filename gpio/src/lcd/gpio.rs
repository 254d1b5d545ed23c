use crate::lcd::{CursorDirection, Hd44780Driver};
use crate::{GpioBus, GpioOutput, GpioResult};
use log::trace;
use std::thread::sleep;
use std::time::Duration;

/// The data bus wiring of the controller.
#[derive(Debug)]
pub enum Hd44780Bus<'a> {
    Bus8Bit(&'a mut dyn GpioBus<8>),
    Bus4Bit(&'a mut dyn GpioBus<4>),
}

impl Hd44780Bus<'_> {
    pub fn is_8bit(&self) -> bool {
        matches!(self, Hd44780Bus::Bus8Bit(_))
    }
}

/// Bit-banged HD44780 driver over GPIO.
///
/// In 4-bit mode each byte is sent as two nibbles, high first. The RW pin is
/// optional; when wired it is held low, since the driver never reads back.
#[derive(Debug)]
pub struct GpioHd44780Driver<'a> {
    pin_e: &'a dyn GpioOutput,
    pin_rw: Option<&'a dyn GpioOutput>,
    pin_rs: &'a dyn GpioOutput,
    data_bus: Hd44780Bus<'a>,
}

impl<'a> GpioHd44780Driver<'a> {
    pub fn new(
        pin_e: &'a dyn GpioOutput,
        pin_rw: Option<&'a dyn GpioOutput>,
        pin_rs: &'a dyn GpioOutput,
        data_bus: Hd44780Bus<'a>,
    ) -> Self {
        GpioHd44780Driver {
            pin_e,
            pin_rw,
            pin_rs,
            data_bus,
        }
    }

    fn pulse_e(pin: &dyn GpioOutput) -> GpioResult<()> {
        pin.write(true)?;
        sleep(Duration::from_micros(1));
        pin.write(false)?;
        sleep(Duration::from_millis(1));
        Ok(())
    }

    fn send(&mut self, data: u8, rs: bool) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", data, rs);

        self.pin_rs.write(rs)?;

        if let Some(rw) = self.pin_rw {
            rw.write(false)?;
        }

        match &mut self.data_bus {
            Hd44780Bus::Bus8Bit(bus) => {
                bus.as_output()?.write_byte(data)?;
                Self::pulse_e(self.pin_e)?;
            }
            Hd44780Bus::Bus4Bit(bus) => {
                bus.as_output()?.write_nibble((data >> 4) & 0x0F)?;
                Self::pulse_e(self.pin_e)?;
                bus.as_output()?.write_nibble(data & 0x0F)?;
                Self::pulse_e(self.pin_e)?;
            }
        }

        Ok(())
    }
}

impl Hd44780Driver for GpioHd44780Driver<'_> {
    fn init(&mut self, two_lines: bool, alt_font: bool) -> GpioResult<()> {
        // Synchronize the interface; the 4-bit sequence also switches the
        // controller out of its power-on 8-bit mode.
        match self.data_bus {
            Hd44780Bus::Bus8Bit(_) => {
                self.send(0b00111000, false)?;
                self.send(0b00111000, false)?;
                self.send(0b00111000, false)?;
            }
            Hd44780Bus::Bus4Bit(_) => {
                self.send(0b00110011, false)?;
                self.send(0b00110010, false)?;
            }
        }
        self.function_set(self.data_bus.is_8bit(), two_lines, alt_font)?;
        self.clear_display()?;
        self.set_display_control(true, false, false)?;
        self.set_entry_mode(CursorDirection::Right, false)?;
        Ok(())
    }

    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        self.send(command, false)
    }

    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.send(data, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GpioBusInput, GpioBusOutput, GpioError};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct FakePin {
        writes: RefCell<Vec<bool>>,
    }

    impl GpioOutput for FakePin {
        fn write(&self, value: bool) -> GpioResult<()> {
            self.writes.borrow_mut().push(value);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FakeBus4 {
        nibbles: Rc<RefCell<Vec<u8>>>,
    }

    #[derive(Debug)]
    struct FakeBus4Out {
        nibbles: Rc<RefCell<Vec<u8>>>,
    }

    impl GpioBus<4> for FakeBus4 {
        fn as_input(&mut self) -> GpioResult<Box<dyn GpioBusInput<4> + '_>> {
            Err(GpioError::NotSupported)
        }

        fn as_output(&mut self) -> GpioResult<Box<dyn GpioBusOutput<4> + '_>> {
            Ok(Box::new(FakeBus4Out {
                nibbles: Rc::clone(&self.nibbles),
            }))
        }
    }

    impl GpioBusOutput<4> for FakeBus4Out {
        fn write(&self, values: &[bool; 4]) -> GpioResult<()> {
            let mut nibble = 0u8;
            for (i, &value) in values.iter().enumerate() {
                if value {
                    nibble |= 1 << i;
                }
            }
            self.nibbles.borrow_mut().push(nibble);
            Ok(())
        }
    }

    #[test]
    fn four_bit_send_splits_bytes_high_nibble_first() {
        let pin_e = FakePin::default();
        let pin_rs = FakePin::default();
        let nibbles = Rc::new(RefCell::new(Vec::new()));
        let mut bus = FakeBus4 {
            nibbles: Rc::clone(&nibbles),
        };
        let mut lcd = GpioHd44780Driver::new(&pin_e, None, &pin_rs, Hd44780Bus::Bus4Bit(&mut bus));

        lcd.send_data(0b10110100).unwrap();

        assert_eq!(*nibbles.borrow(), vec![0b1011, 0b0100]);
        // RS high for data, one E pulse (high then low) per nibble.
        assert_eq!(*pin_rs.writes.borrow(), vec![true]);
        assert_eq!(*pin_e.writes.borrow(), vec![true, false, true, false]);
    }

    #[test]
    fn ddram_address_is_validated() {
        let pin_e = FakePin::default();
        let pin_rs = FakePin::default();
        let nibbles = Rc::new(RefCell::new(Vec::new()));
        let mut bus = FakeBus4 {
            nibbles: Rc::clone(&nibbles),
        };
        let mut lcd = GpioHd44780Driver::new(&pin_e, None, &pin_rs, Hd44780Bus::Bus4Bit(&mut bus));

        assert_eq!(lcd.set_ddram_address(0x80), Err(GpioError::InvalidArgument));
        lcd.set_ddram_address(0x40).unwrap();
        assert_eq!(*nibbles.borrow(), vec![0b1100, 0b0000]);
    }
}
