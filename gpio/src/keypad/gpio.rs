use crate::keypad::{Keypad, KeypadKey};
use crate::{GpioBusInput, GpioBusOutput, GpioResult};
use log::trace;
use std::fmt::{Debug, Formatter};
use std::thread::sleep;
use std::time::Duration;

/// A GPIO-based matrix keypad with `R` rows and `C` columns.
///
/// The columns are driven active one at a time and the rows are sampled while
/// a column is selected. Scanning order is fixed: lower column index first,
/// then lower row index within the column, and the first active intersection
/// wins. If several keys are asserted at once, that ordering is the tie-break.
pub struct GpioKeypad<'a, const R: usize, const C: usize> {
    cols: &'a dyn GpioBusOutput<C>,
    rows: &'a dyn GpioBusInput<R>,
    layout: [[KeypadKey; C]; R],
    settle_delay: Duration,
    debounce_delay: Duration,
}

impl<const R: usize, const C: usize> Debug for GpioKeypad<'_, R, C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpioKeypad({:?}, {:?})", self.cols, self.rows)
    }
}

impl<'a, const R: usize, const C: usize> GpioKeypad<'a, R, C> {
    /// Creates a keypad over the given column outputs and row inputs, with
    /// `layout[row][col]` naming the key at each intersection.
    pub fn new(
        cols: &'a dyn GpioBusOutput<C>,
        rows: &'a dyn GpioBusInput<R>,
        layout: [[KeypadKey; C]; R],
    ) -> Self {
        GpioKeypad {
            cols,
            rows,
            layout,
            settle_delay: Duration::from_micros(20),
            debounce_delay: Duration::from_millis(50),
        }
    }

    /// Sets the delay between selecting a column and sampling the rows.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the delay used to confirm a press and to let the switch go quiet
    /// after release.
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    /// Runs one raw scan pass over all columns.
    ///
    /// All columns are left inactive afterwards, also when the scan stops at
    /// the first hit.
    fn scan_once(&self) -> GpioResult<Option<KeypadKey>> {
        let mut found = None;

        'cols: for col in 0..C {
            let mut drive = [false; C];
            drive[col] = true;
            self.cols.write(&drive)?;
            sleep(self.settle_delay);

            let rows = self.rows.read()?;
            for (row, &active) in rows.iter().enumerate() {
                if active {
                    found = Some(self.layout[row][col]);
                    break 'cols;
                }
            }
        }

        self.cols.write(&[false; C])?;

        Ok(found)
    }
}

impl<'a> GpioKeypad<'a, 4, 3> {
    /// Creates a keypad with the standard 4x3 layout.
    pub fn standard(cols: &'a dyn GpioBusOutput<3>, rows: &'a dyn GpioBusInput<4>) -> Self {
        Self::new(cols, rows, KeypadKey::LAYOUT_4X3)
    }
}

impl<const R: usize, const C: usize> Keypad for GpioKeypad<'_, R, C> {
    type Key = KeypadKey;

    fn poll(&self) -> GpioResult<Option<KeypadKey>> {
        let Some(key) = self.scan_once()? else {
            return Ok(None);
        };

        // The raw hit has to survive the debounce window before it is
        // trusted; a contact that opened again in the meantime was bounce.
        sleep(self.debounce_delay);
        if self.scan_once()? != Some(key) {
            trace!("Discarding bounce on {:?}", key);
            return Ok(None);
        }

        trace!("Key {:?} down, waiting for release", key);
        while self.scan_once()?.is_some() {}
        sleep(self.debounce_delay);

        trace!("Key {:?} released", key);
        Ok(Some(key))
    }
}
