mod gpio;

use crate::GpioResult;
use std::fmt::Debug;
pub use gpio::*;

/// The keys on the 4x3 matrix keypad.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeypadKey {
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    /// The `*` key.
    KeyAsterisk,
    /// The `#` key.
    KeyHash,
}

impl KeypadKey {
    /// The standard 4x3 layout, rows top to bottom.
    pub const LAYOUT_4X3: [[KeypadKey; 3]; 4] = {
        use KeypadKey::*;

        [
            [Key1, Key2, Key3],
            [Key4, Key5, Key6],
            [Key7, Key8, Key9],
            [KeyAsterisk, Key0, KeyHash],
        ]
    };

    /// Converts a `(row, column)` position on the standard layout to a key.
    pub fn from_position(pos: (u8, u8)) -> Option<KeypadKey> {
        if pos.0 < 4 && pos.1 < 3 {
            Some(Self::LAYOUT_4X3[pos.0 as usize][pos.1 as usize])
        } else {
            None
        }
    }

    /// Converts the key to its corresponding character.
    pub fn to_char(self) -> char {
        use KeypadKey::*;

        match self {
            Key0 => '0',
            Key1 => '1',
            Key2 => '2',
            Key3 => '3',
            Key4 => '4',
            Key5 => '5',
            Key6 => '6',
            Key7 => '7',
            Key8 => '8',
            Key9 => '9',
            KeyAsterisk => '*',
            KeyHash => '#',
        }
    }

    /// Whether the key is one of `0`-`9`.
    pub fn is_digit(self) -> bool {
        !matches!(self, KeypadKey::KeyAsterisk | KeypadKey::KeyHash)
    }
}

/// Debounced, one-shot keypad input.
pub trait Keypad: Debug {
    type Key;

    /// Polls the keypad once.
    ///
    /// Returns `None` immediately when nothing is pressed. When a key is
    /// down, the call blocks until the key has been released again and
    /// reports the press exactly once, no matter how long it was held.
    fn poll(&self) -> GpioResult<Option<Self::Key>>;
}
