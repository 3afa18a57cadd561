use crate::delay::Delay;
use crate::lcd::hd44780::driver::{
    CursorDirection, DisplayMode, GpioHD44780Driver, HD44780Driver,
};
use crate::lcd::hd44780::{
    LcdError, LcdResult, PinAssignment, PinBinding, Timing, COLUMNS, LINES,
};
use crate::GpioDriver;
use log::{debug, info, warn};
use std::time::Duration;

/// Lifecycle of a display.
///
/// `Uninitialized → Initializing → Ready | Faulted`. Initialization may be started again from any
/// state; everything else requires [DisplayState::Ready].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DisplayState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Faulted,
}

/// A logical cursor position.
///
/// `column == COLUMNS` means the line is full; the next printed character wraps.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CursorAddress {
    pub line: usize,
    pub column: usize,
}

impl CursorAddress {
    pub const HOME: CursorAddress = CursorAddress { line: 0, column: 0 };

    /// DDRAM address of the first column of each line.
    const LINE_ADDRESSES: [u8; LINES] = [0x00, 0x40];

    /// # Errors
    /// - [LcdError::OutOfBounds] unless `line < LINES` and `column < COLUMNS`.
    pub fn new(line: usize, column: usize) -> LcdResult<Self> {
        if line >= LINES || column >= COLUMNS {
            return Err(LcdError::OutOfBounds {
                line,
                column: column as i64,
            });
        }
        Ok(CursorAddress { line, column })
    }

    /// The DDRAM address of this position, as used by the set DDRAM address command.
    pub fn ddram_address(&self) -> u8 {
        Self::LINE_ADDRESSES[self.line] + self.column as u8
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScrollDirection {
    Left,
    Right,
}

impl From<ScrollDirection> for CursorDirection {
    fn from(direction: ScrollDirection) -> Self {
        match direction {
            ScrollDirection::Left => CursorDirection::Left,
            ScrollDirection::Right => CursorDirection::Right,
        }
    }
}

/// Settings of a display instance.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LcdConfig {
    pub mode: DisplayMode,
    pub timing: Timing,
    /// How long each scroll step stays visible. This is an effect, not a protocol wait.
    pub scroll_delay: Duration,
    /// Repaint the display when text is read from the start.
    pub repaint_on_read: bool,
}

impl Default for LcdConfig {
    fn default() -> Self {
        LcdConfig {
            mode: DisplayMode::default(),
            timing: Timing::default(),
            scroll_delay: Duration::from_millis(250),
            repaint_on_read: false,
        }
    }
}

/// A 16x2 HD44780 display: its state, logical cursor and the driver talking to it.
#[derive(Debug)]
pub struct Hd44780Display<'a, T: Delay> {
    driver: GpioHD44780Driver<'a, T>,
    config: LcdConfig,
    state: DisplayState,
    cursor: CursorAddress,
}

impl<'a, T: Delay> Hd44780Display<'a, T> {
    pub fn new(delay: T, config: LcdConfig) -> Self {
        Hd44780Display {
            driver: GpioHD44780Driver::new(delay, config.timing),
            config,
            state: DisplayState::Uninitialized,
            cursor: CursorAddress::HOME,
        }
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn cursor(&self) -> CursorAddress {
        self.cursor
    }

    pub fn config(&self) -> &LcdConfig {
        &self.config
    }

    pub fn driver(&self) -> &GpioHD44780Driver<'a, T> {
        &self.driver
    }

    pub fn set_scroll_delay(&mut self, scroll_delay: Duration) {
        self.config.scroll_delay = scroll_delay;
    }

    /// Binds `assignment` and runs the power-on handshake.
    ///
    /// Any previous binding is released first, so the new assignment may reuse its lines. On
    /// failure the display is left [DisplayState::Faulted] with no pins bound.
    ///
    /// # Errors
    /// - [LcdError::TimingBelowFloor] if the configured timing is below the datasheet minimums.
    /// - [LcdError::PinUnavailable] if a line cannot be acquired.
    /// - [LcdError::InitFailed] if a line write failed during the handshake.
    pub fn initialize<D: GpioDriver>(
        &mut self,
        gpio: &'a D,
        assignment: PinAssignment,
    ) -> LcdResult<()> {
        debug!("Display {:?} -> {:?}", self.state, DisplayState::Initializing);
        self.state = DisplayState::Initializing;
        self.driver.release();

        match self.bring_up(gpio, assignment) {
            Ok(()) => {
                self.state = DisplayState::Ready;
                self.cursor = CursorAddress::HOME;
                info!("LCD ready on {:?}", assignment);
                Ok(())
            }
            Err(err) => {
                warn!("LCD initialization failed: {}", err);
                self.driver.release();
                self.state = DisplayState::Faulted;
                Err(err)
            }
        }
    }

    fn bring_up<D: GpioDriver>(&mut self, gpio: &'a D, assignment: PinAssignment) -> LcdResult<()> {
        self.config.timing.validate()?;
        self.driver.set_timing(self.config.timing);
        self.driver.attach(PinBinding::bind(gpio, assignment)?);
        self.driver.init(self.config.mode)
    }

    /// Releases the pins, driving them low. The display has to be initialized again before use.
    pub fn release(&mut self) {
        self.driver.release();
        self.state = DisplayState::Uninitialized;
    }

    fn ensure_ready(&self) -> LcdResult<()> {
        match self.state {
            DisplayState::Ready => Ok(()),
            state => Err(LcdError::NotReady(state)),
        }
    }

    /// Runs `op` on a ready display. A GPIO failure halfway through a command leaves the
    /// controller in an unknown mode, so it faults the display.
    fn run<R>(&mut self, op: impl FnOnce(&mut Self) -> LcdResult<R>) -> LcdResult<R> {
        self.ensure_ready()?;
        let result = op(self);
        if let Err(LcdError::Gpio(err)) = &result {
            warn!("LCD faulted: {}", err);
            self.state = DisplayState::Faulted;
        }
        result
    }

    /// Clears the display and moves the cursor home.
    pub fn clear(&mut self) -> LcdResult<()> {
        self.run(|display| {
            display.driver.clear_display()?;
            display.cursor = CursorAddress::HOME;
            Ok(())
        })
    }

    /// Moves the cursor home and undoes any scrolling, keeping the contents.
    pub fn home(&mut self) -> LcdResult<()> {
        self.run(|display| {
            display.driver.return_home()?;
            display.cursor = CursorAddress::HOME;
            Ok(())
        })
    }

    /// # Errors
    /// - [LcdError::OutOfBounds] if the position is outside the panel. Nothing is sent then.
    pub fn set_cursor(&mut self, line: usize, column: usize) -> LcdResult<()> {
        self.run(|display| {
            let cursor = CursorAddress::new(line, column)?;
            display.driver.set_ddram_address(cursor.ddram_address())?;
            display.cursor = cursor;
            Ok(())
        })
    }

    /// Prints `text` from the current cursor position.
    ///
    /// Reaching the end of the first line continues at the start of the second. Whatever does not
    /// fit before the end of the second line is dropped. Returns the number of bytes shown.
    pub fn print(&mut self, text: &[u8]) -> LcdResult<usize> {
        self.run(|display| {
            let mut shown = 0;
            for &byte in text {
                if display.cursor.column >= COLUMNS {
                    if display.cursor.line + 1 >= LINES {
                        break;
                    }
                    let next = CursorAddress {
                        line: display.cursor.line + 1,
                        column: 0,
                    };
                    display.driver.set_ddram_address(next.ddram_address())?;
                    display.cursor = next;
                }
                display.driver.send_data(byte)?;
                display.cursor.column += 1;
                shown += 1;
            }

            if shown < text.len() {
                debug!("Dropped {} bytes past the end of the display", text.len() - shown);
            }
            Ok(shown)
        })
    }

    /// Shifts the whole display `count` times, holding each step for the configured scroll delay.
    pub fn scroll(&mut self, direction: ScrollDirection, count: usize) -> LcdResult<()> {
        self.run(|display| {
            for _ in 0..count {
                display.driver.cursor_shift(true, direction.into())?;
                display.driver.wait(display.config.scroll_delay);
            }
            Ok(())
        })
    }

    /// Turns the display, the cursor and its blinking on or off.
    pub fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> LcdResult<()> {
        self.run(|display| {
            display
                .driver
                .set_display_control(display_on, cursor_on, blink_on)
        })
    }
}
