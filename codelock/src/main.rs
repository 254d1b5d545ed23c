mod app;
mod config;
mod screen;

use crate::app::{App, SleepHold};
use crate::config::Config;
use crate::screen::{SCREEN_COLS, Screen};
use codelock_gpio::GpioBias::PullDown;
use codelock_gpio::gpiod::GpiodDriver;
use codelock_gpio::keypad::{GpioKeypad, Keypad};
use codelock_gpio::lcd::{GpioHd44780Driver, Hd44780Bus, Hd44780Driver};
use codelock_gpio::led::{GpioLed, Indicator};
use codelock_gpio::{GpioActiveLevel, GpioBus, GpioDriver};
use dotenv::dotenv;
use log::{debug, info};
use std::env::var;
use std::thread;
use std::time::Duration;
use sysinfo::System;

fn parse_pin_list(pin_str: &str) -> eyre::Result<Vec<usize>> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(eyre::Report::from))
        .collect()
}

fn parse_pin_bus<const N: usize>(pin_str: &str) -> eyre::Result<[usize; N]> {
    parse_pin_list(pin_str)?
        .try_into()
        .map_err(|pins: Vec<usize>| {
            eyre::eyre!("expected {} pins, got {}", N, pins.len())
        })
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!("Codelock starting...");
    info!(
        "Running on {} ({}), kernel {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );

    // Get pin numbers from env
    let lcd_e_pin_no: usize = var("CODELOCK_LCD_PIN_E")?.parse()?;
    let lcd_rw_pin_no: Option<usize> = match var("CODELOCK_LCD_PIN_RW") {
        Ok(pin) => Some(pin.parse()?),
        Err(_) => None,
    };
    let lcd_rs_pin_no: usize = var("CODELOCK_LCD_PIN_RS")?.parse()?;
    let lcd_data_pin_nos = parse_pin_list(&var("CODELOCK_LCD_PINS_DATA")?)?;

    let keypad_pin_col_nos: [usize; 3] = parse_pin_bus(&var("CODELOCK_KEYPAD_PINS_COLS")?)?;
    let keypad_pin_row_nos: [usize; 4] = parse_pin_bus(&var("CODELOCK_KEYPAD_PINS_ROWS")?)?;

    let led_pin_nos: [usize; 3] = parse_pin_bus(&var("CODELOCK_LED_PINS")?)?;
    let led_active_low = var("CODELOCK_LED_ACTIVE_LOW").is_ok_and(|v| v == "1");

    info!(
        "LCD @ E: {}, RW: {:?}, RS: {}, Data: {:?}",
        lcd_e_pin_no, lcd_rw_pin_no, lcd_rs_pin_no, lcd_data_pin_nos
    );
    info!(
        "Keypad @ Cols: {:?}, Rows: {:?}",
        keypad_pin_col_nos, keypad_pin_row_nos
    );
    info!("LED @ R/G/B: {:?}, active low: {}", led_pin_nos, led_active_low);

    debug!("Initializing GPIO driver...");
    let chip_path = var("CODELOCK_GPIO_CHIP").unwrap_or_else(|_| "/dev/gpiochip0".to_string());
    let gpio = GpiodDriver::open(&chip_path)?;
    debug!("{:?} initialized.", gpio);

    debug!("Initializing LCD driver...");
    let mut lcd_e_pin = gpio.get_pin(lcd_e_pin_no)?;
    let lcd_e_out = lcd_e_pin.as_output()?;
    let mut lcd_rs_pin = gpio.get_pin(lcd_rs_pin_no)?;
    let lcd_rs_out = lcd_rs_pin.as_output()?;
    let mut lcd_rw_pin;
    let lcd_rw_out = match lcd_rw_pin_no {
        Some(pin_no) => {
            lcd_rw_pin = gpio.get_pin(pin_no)?;
            Some(lcd_rw_pin.as_output()?)
        }
        None => None,
    };

    // Bus width is wiring, not code: 4 data pins select 4-bit mode, 8 pins
    // select 8-bit mode.
    let mut lcd_data_bus4: Box<dyn GpioBus<4> + '_>;
    let mut lcd_data_bus8: Box<dyn GpioBus<8> + '_>;
    let lcd_data_bus = match lcd_data_pin_nos.len() {
        4 => {
            lcd_data_bus4 = gpio.get_pin_bus(parse_pin_bus::<4>(&var("CODELOCK_LCD_PINS_DATA")?)?)?;
            Hd44780Bus::Bus4Bit(&mut *lcd_data_bus4)
        }
        8 => {
            lcd_data_bus8 = gpio.get_pin_bus(parse_pin_bus::<8>(&var("CODELOCK_LCD_PINS_DATA")?)?)?;
            Hd44780Bus::Bus8Bit(&mut *lcd_data_bus8)
        }
        n => return Err(eyre::eyre!("LCD data bus must have 4 or 8 pins, got {n}")),
    };

    let mut lcd = GpioHd44780Driver::new(
        &*lcd_e_out,
        lcd_rw_out.as_deref(),
        &*lcd_rs_out,
        lcd_data_bus,
    );
    lcd.init(true, false)?;
    debug!("{:?} initialized.", lcd);

    debug!("Initializing keypad driver...");
    let mut keypad_col_bus = gpio.get_pin_bus(keypad_pin_col_nos)?;
    let mut keypad_row_bus = gpio.get_pin_bus(keypad_pin_row_nos)?;
    keypad_row_bus.set_bias(PullDown)?;
    let keypad_col_out = keypad_col_bus.as_output()?;
    let keypad_row_in = keypad_row_bus.as_input()?;
    let keypad = GpioKeypad::standard(&*keypad_col_out, &*keypad_row_in);
    debug!("{:?} initialized.", keypad);

    debug!("Initializing LED driver...");
    let [led_r_no, led_g_no, led_b_no] = led_pin_nos;
    let mut led_r_pin = gpio.get_pin(led_r_no)?;
    let mut led_g_pin = gpio.get_pin(led_g_no)?;
    let mut led_b_pin = gpio.get_pin(led_b_no)?;
    if led_active_low {
        led_r_pin.set_active_level(GpioActiveLevel::Low)?;
        led_g_pin.set_active_level(GpioActiveLevel::Low)?;
        led_b_pin.set_active_level(GpioActiveLevel::Low)?;
    }
    let led_r_out = led_r_pin.as_output()?;
    let led_g_out = led_g_pin.as_output()?;
    let led_b_out = led_b_pin.as_output()?;
    let led = GpioLed::new(&*led_r_out, &*led_g_out, &*led_b_out);
    led.off()?;
    debug!("{:?} initialized.", led);

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };
    config.validate()?;
    debug!("Initial passcode is {:?}.", config.passcode);

    // Boot splash
    lcd.set_cursor(0, 0)?;
    lcd.put_str("Codelock")?;
    const VERSION_LINE: &str = concat!("v", env!("CARGO_PKG_VERSION"));
    lcd.set_cursor(SCREEN_COLS - VERSION_LINE.len(), 1)?;
    lcd.put_str(VERSION_LINE)?;

    info!("Codelock initialized.");

    thread::sleep(Duration::from_secs(1));

    let hold = SleepHold;
    let mut app = App::new(config, &mut lcd, &led, &hold);
    app.reset()?;

    info!("Starting main loop...");
    loop {
        if let Some(key) = keypad.poll()? {
            app.handle_key(key)?;
        }

        thread::sleep(Duration::from_millis(10));
    }
}
