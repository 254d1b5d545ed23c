//! The access-control state machine.
//!
//! Consumes one-shot keypad events and drives the screen and the status LED.
//! There are no error codes toward the user: every abnormal input is an
//! ordinary branch that ends in a well-defined state, signaled only through
//! the display and the indicator.

use codelock_gpio::GpioResult;
use codelock_gpio::keypad::KeypadKey;
use codelock_gpio::led::{Color, Indicator};
use log::{info, warn};
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::screen::{SCREEN_COLS, Screen};

/// Length of the stored passcode.
pub const PASSCODE_LENGTH: usize = 7;
/// The fixed passcode that enters admin mode. Compiled in, never changes.
pub const ADMIN_PASSCODE: &str = "98765";

const REJECT_HOLD: Duration = Duration::from_millis(2000);
const CHANGED_HOLD: Duration = Duration::from_millis(3000);
const IDLE_HOLD: Duration = Duration::from_millis(1000);
const HINT_HOLD: Duration = Duration::from_millis(1000);

/// The mode the terminal is in. Exactly one is active at any time; there is
/// no terminal mode, the device runs forever.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Mode {
    #[default]
    InputPassword,
    AdminMode,
    ChangePassword,
}

/// The characters entered since the last mode change, at most
/// [PASSCODE_LENGTH] of them.
#[derive(Debug, Default)]
pub struct EntryBuffer {
    chars: Vec<char>,
}

impl EntryBuffer {
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Appends a character. Returns `false` if the buffer is full, in which
    /// case the character is dropped.
    pub fn push(&mut self, c: char) -> bool {
        if self.chars.len() < PASSCODE_LENGTH {
            self.chars.push(c);
            true
        } else {
            false
        }
    }

    pub fn pop(&mut self) -> Option<char> {
        self.chars.pop()
    }

    pub fn clear(&mut self) {
        self.chars.clear();
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }
}

/// A blocking timed wait. The main loop does nothing else while a hold runs;
/// holds always run to completion.
pub trait Hold {
    fn hold(&self, duration: Duration);
}

#[derive(Debug)]
pub struct SleepHold;

impl Hold for SleepHold {
    fn hold(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// The main app state struct. Owns the mode, the entry buffer and the stored
/// passcode; the screen and indicator are only written, never read.
pub struct App<'a> {
    screen: &'a mut dyn Screen,
    indicator: &'a dyn Indicator,
    hold: &'a dyn Hold,
    mode: Mode,
    entry: EntryBuffer,
    stored_passcode: String,
    open_hold: Duration,
}

impl<'a> App<'a> {
    pub fn new(
        config: Config,
        screen: &'a mut dyn Screen,
        indicator: &'a dyn Indicator,
        hold: &'a dyn Hold,
    ) -> App<'a> {
        App {
            screen,
            indicator,
            hold,
            mode: Mode::default(),
            entry: EntryBuffer::default(),
            stored_passcode: config.passcode,
            open_hold: Duration::from_millis(config.open_hold_ms),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn entry(&self) -> &EntryBuffer {
        &self.entry
    }

    pub fn stored_passcode(&self) -> &str {
        &self.stored_passcode
    }

    /// Returns to the initial state: passcode prompt, empty buffer,
    /// indicator off.
    pub fn reset(&mut self) -> GpioResult<()> {
        self.screen.clear()?;
        self.screen.set_cursor(0, 0)?;
        self.screen.put_str("Input PassWord")?;

        self.mode = Mode::InputPassword;
        self.entry.clear();

        self.screen.set_cursor(0, 1)?;
        self.indicator.off()?;
        Ok(())
    }

    /// Handles one key event according to the current mode.
    pub fn handle_key(&mut self, key: KeypadKey) -> GpioResult<()> {
        match self.mode {
            Mode::InputPassword => self.on_input_password_key(key),
            Mode::AdminMode => self.on_admin_key(key),
            Mode::ChangePassword => self.on_change_password_key(key),
        }
    }

    fn on_input_password_key(&mut self, key: KeypadKey) -> GpioResult<()> {
        match key {
            KeypadKey::KeyAsterisk => self.backspace(),
            KeypadKey::KeyHash => {
                let entered = self.entry.as_string();
                if entered.len() == PASSCODE_LENGTH {
                    if entered == self.stored_passcode {
                        info!("Correct passcode entered, opening.");
                        self.screen.clear()?;
                        self.screen.set_cursor(0, 0)?;
                        self.screen.put_str("OPEN")?;
                        self.indicator.set_color(Color::GREEN)?;
                        self.hold.hold(self.open_hold);
                        self.indicator.set_color(Color::YELLOW)?;
                        self.hold.hold(IDLE_HOLD);
                        self.reset()
                    } else {
                        warn!("Incorrect passcode entered.");
                        self.reject("Not PassWord")
                    }
                } else if entered.len() == ADMIN_PASSCODE.len() {
                    if entered == ADMIN_PASSCODE {
                        info!("Admin passcode entered.");
                        self.enter_admin_mode()
                    } else {
                        warn!("Incorrect admin passcode entered.");
                        self.reject("Not Admin PWD")
                    }
                } else {
                    // Wrong length is not a failure: hint, then let the user
                    // keep typing with the buffer untouched.
                    self.entry_hint("7 or 5 digits")
                }
            }
            digit => self.append_digit(digit),
        }
    }

    fn on_admin_key(&mut self, key: KeypadKey) -> GpioResult<()> {
        match key {
            KeypadKey::KeyHash => self.enter_change_password_mode(),
            KeypadKey::KeyAsterisk => self.reset(),
            _ => {
                self.blank_entry_line()?;
                self.screen.put_str("Invalid Key")?;
                self.hold.hold(HINT_HOLD);
                self.blank_entry_line()?;
                self.screen.put_str("# for New PWD")?;
                Ok(())
            }
        }
    }

    fn on_change_password_key(&mut self, key: KeypadKey) -> GpioResult<()> {
        match key {
            KeypadKey::KeyAsterisk => self.backspace(),
            KeypadKey::KeyHash => {
                if self.entry.len() == PASSCODE_LENGTH {
                    // The only place the stored passcode is ever mutated.
                    self.stored_passcode = self.entry.as_string();
                    info!("Stored passcode changed.");
                    self.screen.clear()?;
                    self.screen.set_cursor(0, 0)?;
                    self.screen.put_str("PWD Changed!")?;
                    self.indicator.set_color(Color::GREEN)?;
                    self.hold.hold(CHANGED_HOLD);
                    self.indicator.set_color(Color::YELLOW)?;
                    self.hold.hold(IDLE_HOLD);
                    self.reset()
                } else {
                    self.entry_hint("7 digits Req")
                }
            }
            digit => self.append_digit(digit),
        }
    }

    /// Appends a digit to the entry buffer and echoes it. A full buffer
    /// drops the key silently.
    fn append_digit(&mut self, key: KeypadKey) -> GpioResult<()> {
        if self.entry.push(key.to_char()) {
            self.screen.put_char(key.to_char())?;
        }
        Ok(())
    }

    /// Removes the last entered character and blanks its cell. No-op on an
    /// empty buffer.
    fn backspace(&mut self) -> GpioResult<()> {
        if self.entry.pop().is_some() {
            let col = self.entry.len();
            self.screen.set_cursor(col, 1)?;
            self.screen.put_char(' ')?;
            self.screen.set_cursor(col, 1)?;
        }
        Ok(())
    }

    /// Wrong credential: message on the first line, failure light, then a
    /// full reset. The user starts over from scratch.
    fn reject(&mut self, message: &str) -> GpioResult<()> {
        self.screen.clear()?;
        self.screen.set_cursor(0, 0)?;
        self.screen.put_str(message)?;
        self.indicator.set_color(Color::RED)?;
        self.hold.hold(REJECT_HOLD);
        self.indicator.set_color(Color::YELLOW)?;
        self.hold.hold(IDLE_HOLD);
        self.reset()
    }

    /// Shows a transient hint on the entry line, then restores the entered
    /// characters so the user can continue. Mode and buffer stay unchanged.
    fn entry_hint(&mut self, hint: &str) -> GpioResult<()> {
        self.blank_entry_line()?;
        self.screen.put_str(hint)?;
        self.hold.hold(HINT_HOLD);
        self.blank_entry_line()?;
        for c in self.entry.as_string().chars() {
            self.screen.put_char(c)?;
        }
        Ok(())
    }

    fn blank_entry_line(&mut self) -> GpioResult<()> {
        self.screen.set_cursor(0, 1)?;
        for _ in 0..SCREEN_COLS {
            self.screen.put_char(' ')?;
        }
        self.screen.set_cursor(0, 1)
    }

    fn enter_admin_mode(&mut self) -> GpioResult<()> {
        self.screen.clear()?;
        self.screen.set_cursor(0, 0)?;
        self.screen.put_str("Admin Mode")?;
        self.screen.set_cursor(0, 1)?;
        self.screen.put_str("# for New PWD")?;

        self.mode = Mode::AdminMode;
        self.entry.clear();
        Ok(())
    }

    fn enter_change_password_mode(&mut self) -> GpioResult<()> {
        self.screen.clear()?;
        self.screen.set_cursor(0, 0)?;
        self.screen.put_str("Enter New PWD")?;
        self.screen.set_cursor(0, 1)?;

        self.mode = Mode::ChangePassword;
        self.entry.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct ScreenState {
        cells: [[char; SCREEN_COLS]; 2],
        col: usize,
        row: usize,
        messages: Vec<String>,
    }

    /// Shared view of the fake 16x2 screen. The handle stays with the test
    /// while the [Screen] half is borrowed by the app.
    #[derive(Clone, Default)]
    struct ScreenLog {
        state: Rc<RefCell<ScreenState>>,
    }

    impl ScreenLog {
        fn new() -> (ScreenLog, MockScreen) {
            let log = ScreenLog::default();
            log.state.borrow_mut().cells = [[' '; SCREEN_COLS]; 2];
            let screen = MockScreen {
                state: Rc::clone(&log.state),
            };
            (log, screen)
        }

        fn line(&self, row: usize) -> String {
            self.state.borrow().cells[row]
                .iter()
                .collect::<String>()
                .trim_end()
                .to_string()
        }

        fn saw_message(&self, message: &str) -> bool {
            self.state.borrow().messages.iter().any(|m| m == message)
        }
    }

    /// A 16x2 screen in memory, with a cursor that advances on writes and a
    /// log of every string drawn.
    struct MockScreen {
        state: Rc<RefCell<ScreenState>>,
    }

    impl Screen for MockScreen {
        fn clear(&mut self) -> GpioResult<()> {
            let mut state = self.state.borrow_mut();
            state.cells = [[' '; SCREEN_COLS]; 2];
            state.col = 0;
            state.row = 0;
            Ok(())
        }

        fn set_cursor(&mut self, col: usize, row: usize) -> GpioResult<()> {
            let mut state = self.state.borrow_mut();
            state.col = col;
            state.row = row;
            Ok(())
        }

        fn put_char(&mut self, c: char) -> GpioResult<()> {
            let mut state = self.state.borrow_mut();
            let (col, row) = (state.col, state.row);
            if col < SCREEN_COLS {
                state.cells[row][col] = c;
                state.col += 1;
            }
            Ok(())
        }

        fn put_str(&mut self, s: &str) -> GpioResult<()> {
            self.state.borrow_mut().messages.push(s.to_string());
            for c in s.chars() {
                self.put_char(c)?;
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct MockIndicator {
        colors: RefCell<Vec<Color>>,
    }

    impl Indicator for MockIndicator {
        fn set_color(&self, color: Color) -> GpioResult<()> {
            self.colors.borrow_mut().push(color);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHold {
        holds: RefCell<Vec<Duration>>,
    }

    impl Hold for RecordingHold {
        fn hold(&self, duration: Duration) {
            self.holds.borrow_mut().push(duration);
        }
    }

    fn key(c: char) -> KeypadKey {
        use KeypadKey::*;

        match c {
            '0' => Key0,
            '1' => Key1,
            '2' => Key2,
            '3' => Key3,
            '4' => Key4,
            '5' => Key5,
            '6' => Key6,
            '7' => Key7,
            '8' => Key8,
            '9' => Key9,
            '*' => KeyAsterisk,
            '#' => KeyHash,
            _ => panic!("not a keypad symbol: {c:?}"),
        }
    }

    fn feed(app: &mut App<'_>, keys: &str) {
        for c in keys.chars() {
            app.handle_key(key(c)).unwrap();
        }
    }

    fn app<'a>(
        screen: &'a mut MockScreen,
        indicator: &'a MockIndicator,
        hold: &'a RecordingHold,
    ) -> App<'a> {
        let mut app = App::new(Config::default(), screen, indicator, hold);
        app.reset().unwrap();
        app
    }

    fn millis(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&ms| Duration::from_millis(ms)).collect()
    }

    #[test]
    fn correct_passcode_opens_and_resets() {
        let (log, mut screen) = ScreenLog::new();
        let (indicator, hold) = (MockIndicator::default(), RecordingHold::default());
        let mut app = app(&mut screen, &indicator, &hold);

        feed(&mut app, "1234567#");

        assert_eq!(
            *indicator.colors.borrow(),
            vec![Color::OFF, Color::GREEN, Color::YELLOW, Color::OFF]
        );
        assert_eq!(*hold.holds.borrow(), millis(&[5000, 1000]));
        assert_eq!(app.mode(), Mode::InputPassword);
        assert!(app.entry().is_empty());
        assert!(log.saw_message("OPEN"));
        assert_eq!(log.line(0), "Input PassWord");
        assert_eq!(log.line(1), "");
    }

    #[test]
    fn wrong_passcode_signals_failure_and_resets() {
        let (log, mut screen) = ScreenLog::new();
        let (indicator, hold) = (MockIndicator::default(), RecordingHold::default());
        let mut app = app(&mut screen, &indicator, &hold);

        feed(&mut app, "0000000#");

        assert_eq!(
            *indicator.colors.borrow(),
            vec![Color::OFF, Color::RED, Color::YELLOW, Color::OFF]
        );
        assert_eq!(*hold.holds.borrow(), millis(&[2000, 1000]));
        assert_eq!(app.mode(), Mode::InputPassword);
        assert!(app.entry().is_empty());
        assert!(log.saw_message("Not PassWord"));
        assert_eq!(log.line(0), "Input PassWord");
    }

    #[test]
    fn wrong_admin_passcode_signals_failure_and_resets() {
        let (log, mut screen) = ScreenLog::new();
        let (indicator, hold) = (MockIndicator::default(), RecordingHold::default());
        let mut app = app(&mut screen, &indicator, &hold);

        feed(&mut app, "11111#");

        assert!(log.saw_message("Not Admin PWD"));
        assert_eq!(app.mode(), Mode::InputPassword);
        assert!(indicator.colors.borrow().contains(&Color::RED));
    }

    #[test]
    fn admin_flow_changes_the_stored_passcode() {
        let (log, mut screen) = ScreenLog::new();
        let (indicator, hold) = (MockIndicator::default(), RecordingHold::default());
        let mut app = app(&mut screen, &indicator, &hold);

        feed(&mut app, "98765#");
        assert_eq!(app.mode(), Mode::AdminMode);
        assert_eq!(log.line(0), "Admin Mode");
        assert_eq!(log.line(1), "# for New PWD");

        feed(&mut app, "#");
        assert_eq!(app.mode(), Mode::ChangePassword);
        assert_eq!(log.line(0), "Enter New PWD");

        feed(&mut app, "7654321#");
        assert_eq!(app.stored_passcode(), "7654321");
        assert_eq!(app.mode(), Mode::InputPassword);
        assert!(log.saw_message("PWD Changed!"));
        assert!(hold.holds.borrow().contains(&Duration::from_millis(3000)));

        // The old passcode no longer opens; the new one does.
        feed(&mut app, "1234567#");
        assert!(log.saw_message("Not PassWord"));
        feed(&mut app, "7654321#");
        assert!(log.saw_message("OPEN"));
    }

    #[test]
    fn odd_length_submission_changes_nothing() {
        let (log, mut screen) = ScreenLog::new();
        let (indicator, hold) = (MockIndicator::default(), RecordingHold::default());
        let mut app = app(&mut screen, &indicator, &hold);

        feed(&mut app, "123#");

        assert_eq!(app.mode(), Mode::InputPassword);
        assert_eq!(app.stored_passcode(), "1234567");
        assert_eq!(app.entry().as_string(), "123");
        assert!(log.saw_message("7 or 5 digits"));
        assert!(hold.holds.borrow().contains(&Duration::from_millis(1000)));
        // The entered digits are back on the entry line, ready to continue.
        assert_eq!(log.line(1), "123");

        // Continuing to a full passcode still works.
        feed(&mut app, "4567#");
        assert!(log.saw_message("OPEN"));
    }

    #[test]
    fn backspace_removes_the_last_character() {
        let (log, mut screen) = ScreenLog::new();
        let (indicator, hold) = (MockIndicator::default(), RecordingHold::default());
        let mut app = app(&mut screen, &indicator, &hold);

        feed(&mut app, "12*");
        assert_eq!(app.entry().as_string(), "1");
        assert_eq!(log.line(1), "1");

        feed(&mut app, "*");
        assert!(app.entry().is_empty());
        assert_eq!(log.line(1), "");

        // Backspace on an empty buffer is a no-op.
        feed(&mut app, "*");
        assert!(app.entry().is_empty());
        assert_eq!(app.mode(), Mode::InputPassword);
    }

    #[test]
    fn digits_beyond_the_seventh_are_dropped() {
        let (log, mut screen) = ScreenLog::new();
        let (indicator, hold) = (MockIndicator::default(), RecordingHold::default());
        let mut app = app(&mut screen, &indicator, &hold);

        feed(&mut app, "123456789");
        assert_eq!(app.entry().as_string(), "1234567");
        assert_eq!(log.line(1), "1234567");
    }

    #[test]
    fn invalid_key_in_admin_mode_keeps_the_state() {
        let (log, mut screen) = ScreenLog::new();
        let (indicator, hold) = (MockIndicator::default(), RecordingHold::default());
        let mut app = app(&mut screen, &indicator, &hold);

        feed(&mut app, "98765#");
        feed(&mut app, "5");

        assert_eq!(app.mode(), Mode::AdminMode);
        assert!(app.entry().is_empty());
        assert!(log.saw_message("Invalid Key"));
        assert_eq!(log.line(1), "# for New PWD");
    }

    #[test]
    fn short_new_passcode_is_hinted_and_kept() {
        let (log, mut screen) = ScreenLog::new();
        let (indicator, hold) = (MockIndicator::default(), RecordingHold::default());
        let mut app = app(&mut screen, &indicator, &hold);

        feed(&mut app, "98765##");
        assert_eq!(app.mode(), Mode::ChangePassword);

        feed(&mut app, "123#");
        assert_eq!(app.mode(), Mode::ChangePassword);
        assert_eq!(app.entry().as_string(), "123");
        assert_eq!(app.stored_passcode(), "1234567");
        assert!(log.saw_message("7 digits Req"));
        assert_eq!(log.line(1), "123");
    }

    #[test]
    fn backspace_works_while_changing_the_passcode() {
        let (log, mut screen) = ScreenLog::new();
        let (indicator, hold) = (MockIndicator::default(), RecordingHold::default());
        let mut app = app(&mut screen, &indicator, &hold);

        feed(&mut app, "98765##");
        feed(&mut app, "12*");

        assert_eq!(app.mode(), Mode::ChangePassword);
        assert_eq!(app.entry().as_string(), "1");
        assert_eq!(log.line(1), "1");
    }

    #[test]
    fn asterisk_leaves_admin_mode() {
        let (log, mut screen) = ScreenLog::new();
        let (indicator, hold) = (MockIndicator::default(), RecordingHold::default());
        let mut app = app(&mut screen, &indicator, &hold);

        feed(&mut app, "98765#");
        assert_eq!(app.mode(), Mode::AdminMode);

        feed(&mut app, "*");
        assert_eq!(app.mode(), Mode::InputPassword);
        assert_eq!(log.line(0), "Input PassWord");
    }

    #[test]
    fn entry_buffer_caps_at_the_passcode_length() {
        let mut entry = EntryBuffer::default();
        for c in "1234567".chars() {
            assert!(entry.push(c));
        }
        assert!(!entry.push('8'));
        assert_eq!(entry.len(), PASSCODE_LENGTH);
        assert_eq!(entry.pop(), Some('7'));
        assert_eq!(entry.as_string(), "123456");
        entry.clear();
        assert!(entry.is_empty());
    }
}
