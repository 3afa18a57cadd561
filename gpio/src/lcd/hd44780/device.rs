use crate::delay::Delay;
use crate::lcd::hd44780::{
    DisplayState, Hd44780Display, LcdConfig, LcdError, LcdResult, PinAssignment,
    ScrollDirection, TextBuffer,
};
use crate::GpioDriver;
use log::{debug, warn};
use std::fmt::{Debug, Formatter};

/// Control commands understood by [LcdDevice::control].
///
/// Arguments are signed, as they arrive from outside; negative values are rejected, not clamped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LcdCommand {
    Clear,
    /// Moves the cursor to the given column of the first line.
    SetLine1(i32),
    /// Moves the cursor to the given column of the second line.
    SetLine2(i32),
    ScrollLeft(i32),
    ScrollRight(i32),
    /// Releases the current pins and brings the display up on new ones.
    Reinitialize(PinAssignment),
}

/// Outcome of [LcdDevice::write].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Written {
    pub requested: usize,
    pub accepted: usize,
}

impl Written {
    /// Whether part of the write was dropped.
    pub fn truncated(&self) -> bool {
        self.accepted < self.requested
    }
}

/// The display as a byte-stream device: written text replaces what is shown, reads return the
/// last written text, and a small command set controls the cursor, scrolling and the pins.
///
/// All operations block until the display has processed them.
pub struct LcdDevice<'a, D: GpioDriver, T: Delay> {
    gpio: &'a D,
    display: Hd44780Display<'a, T>,
    buffer: TextBuffer,
}

impl<'a, D: GpioDriver, T: Delay> LcdDevice<'a, D, T> {
    /// Creates an uninitialized device. See [LcdDevice::initialize].
    pub fn new(gpio: &'a D, delay: T, config: LcdConfig) -> Self {
        LcdDevice {
            gpio,
            display: Hd44780Display::new(delay, config),
            buffer: TextBuffer::new(),
        }
    }

    /// Creates a device and brings the display up on `assignment`.
    pub fn open(
        gpio: &'a D,
        delay: T,
        config: LcdConfig,
        assignment: PinAssignment,
    ) -> LcdResult<Self> {
        let mut device = Self::new(gpio, delay, config);
        device.initialize(assignment)?;
        Ok(device)
    }

    /// Binds `assignment` and runs the power-on handshake, replacing any previous binding.
    pub fn initialize(&mut self, assignment: PinAssignment) -> LcdResult<()> {
        self.display.initialize(self.gpio, assignment)
    }

    pub fn state(&self) -> DisplayState {
        self.display.state()
    }

    pub fn display(&self) -> &Hd44780Display<'a, T> {
        &self.display
    }

    /// The last written text.
    pub fn text(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Replaces the shown text with `bytes`, starting at the top left corner.
    ///
    /// At most [MAX_TEXT_LEN](crate::lcd::hd44780::MAX_TEXT_LEN) bytes are kept; the rest is
    /// dropped, which [Written::truncated] reports.
    ///
    /// # Errors
    /// - [LcdError::NotReady] if the display is not initialized. The stored text is kept then.
    pub fn write(&mut self, bytes: &[u8]) -> LcdResult<Written> {
        if self.display.state() != DisplayState::Ready {
            return Err(LcdError::NotReady(self.display.state()));
        }

        let accepted = self.buffer.replace(bytes);
        let written = Written {
            requested: bytes.len(),
            accepted,
        };
        if written.truncated() {
            warn!(
                "LCD write truncated to {} of {} bytes",
                written.accepted, written.requested
            );
        }

        self.repaint()?;
        Ok(written)
    }

    /// Copies the stored text from `offset` into `buf` and advances `offset`.
    ///
    /// Returns 0 once `offset` is at the end of the text, however often it is called. Never touches
    /// the display, except for the optional repaint when reading from the start, whose failure is
    /// only logged.
    pub fn read(&mut self, buf: &mut [u8], offset: &mut usize) -> usize {
        if *offset == 0 && self.display.config().repaint_on_read {
            if let Err(err) = self.repaint() {
                warn!("LCD repaint on read failed: {}", err);
            }
        }

        let n = self.buffer.read_at(*offset, buf);
        *offset += n;
        n
    }

    /// Clears the display and prints the stored text again.
    pub fn repaint(&mut self) -> LcdResult<()> {
        self.display.clear()?;
        self.display.print(self.buffer.as_bytes())?;
        Ok(())
    }

    /// Runs a control command.
    ///
    /// # Errors
    /// - [LcdError::OutOfBounds] for a column outside `0..16`.
    /// - [LcdError::InvalidArgument] for a negative scroll count.
    /// - [LcdError::NotReady] for anything but [LcdCommand::Reinitialize] on a display that is
    ///   not ready.
    ///
    /// Invalid arguments are rejected before anything is sent to the display.
    pub fn control(&mut self, command: LcdCommand) -> LcdResult<()> {
        debug!("LCD control {:?}", command);

        match command {
            LcdCommand::Clear => self.display.clear(),
            LcdCommand::SetLine1(column) => self.display.set_cursor(0, to_column(0, column)?),
            LcdCommand::SetLine2(column) => self.display.set_cursor(1, to_column(1, column)?),
            LcdCommand::ScrollLeft(count) => {
                self.display.scroll(ScrollDirection::Left, to_count(count)?)
            }
            LcdCommand::ScrollRight(count) => {
                self.display.scroll(ScrollDirection::Right, to_count(count)?)
            }
            LcdCommand::Reinitialize(assignment) => self.initialize(assignment),
        }
    }

    /// Releases the pins, leaving every line low. Safe to call more than once.
    pub fn close(&mut self) {
        self.display.release();
    }
}

fn to_column(line: usize, column: i32) -> LcdResult<usize> {
    usize::try_from(column).map_err(|_| LcdError::OutOfBounds {
        line,
        column: column.into(),
    })
}

fn to_count(count: i32) -> LcdResult<usize> {
    usize::try_from(count)
        .map_err(|_| LcdError::InvalidArgument("scroll count must not be negative"))
}

impl<D: GpioDriver, T: Delay> Debug for LcdDevice<'_, D, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LcdDevice({:?}, {:?}, {} bytes)",
            self.gpio,
            self.display.state(),
            self.buffer.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::hd44780::testing::{bytes, transfers, PINS};
    use crate::lcd::hd44780::{CursorAddress, MAX_TEXT_LEN};
    use crate::mock::{MockDelay, MockGpioDriver};

    fn open(gpio: &MockGpioDriver) -> LcdDevice<'_, MockGpioDriver, MockDelay> {
        let device = LcdDevice::open(gpio, gpio.delay(), LcdConfig::default(), PINS).unwrap();
        gpio.clear_trace();
        device
    }

    fn read_all(device: &mut LcdDevice<'_, MockGpioDriver, MockDelay>, max_len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; max_len];
        let mut offset = 0;
        let n = device.read(&mut buf, &mut offset);
        buf.truncate(n);
        buf
    }

    #[test]
    fn test_write_clears_and_prints() {
        let gpio = MockGpioDriver::new(32);
        let mut device = open(&gpio);

        let written = device.write(b"Hi").unwrap();
        assert_eq!(written, Written { requested: 2, accepted: 2 });
        assert!(!written.truncated());
        assert_eq!(
            bytes(&transfers(&gpio, PINS)),
            vec![(false, 0x01), (true, b'H'), (true, b'i')]
        );
    }

    #[test]
    fn test_write_then_read() {
        let gpio = MockGpioDriver::new(32);
        let mut device = open(&gpio);

        device.write(b"Hello World!!!").unwrap();
        assert_eq!(read_all(&mut device, 32), b"Hello World!!!");
    }

    #[test]
    fn test_write_truncates() {
        let gpio = MockGpioDriver::new(32);
        let mut device = open(&gpio);
        let input = [b'#'; 40];

        let written = device.write(&input).unwrap();
        assert_eq!(written.accepted, MAX_TEXT_LEN);
        assert!(written.truncated());
        assert_eq!(device.text(), &input[..MAX_TEXT_LEN]);

        let shown = bytes(&transfers(&gpio, PINS))
            .into_iter()
            .filter(|(rs, _)| *rs)
            .count();
        assert_eq!(shown, MAX_TEXT_LEN);
    }

    #[test]
    fn test_read_end_of_data_is_idempotent() {
        let gpio = MockGpioDriver::new(32);
        let mut device = open(&gpio);
        device.write(b"abc").unwrap();

        let mut buf = [0u8; 2];
        let mut offset = 0;
        assert_eq!(device.read(&mut buf, &mut offset), 2);
        assert_eq!(device.read(&mut buf, &mut offset), 1);
        assert_eq!(buf[0], b'c');
        assert_eq!(device.read(&mut buf, &mut offset), 0);
        assert_eq!(device.read(&mut buf, &mut offset), 0);
        assert_eq!(offset, 3);
    }

    #[test]
    fn test_read_does_not_touch_display() {
        let gpio = MockGpioDriver::new(32);
        let mut device = open(&gpio);
        device.write(b"abc").unwrap();
        gpio.clear_trace();

        read_all(&mut device, 8);
        assert!(gpio.trace().is_empty());
    }

    #[test]
    fn test_read_repaints_when_configured() {
        let gpio = MockGpioDriver::new(32);
        let config = LcdConfig {
            repaint_on_read: true,
            ..Default::default()
        };
        let mut device = LcdDevice::open(&gpio, gpio.delay(), config, PINS).unwrap();
        device.write(b"ab").unwrap();
        gpio.clear_trace();

        assert_eq!(read_all(&mut device, 8), b"ab");
        assert_eq!(
            bytes(&transfers(&gpio, PINS)),
            vec![(false, 0x01), (true, b'a'), (true, b'b')]
        );
    }

    #[test]
    fn test_read_works_without_display() {
        let gpio = MockGpioDriver::new(32);
        let config = LcdConfig {
            repaint_on_read: true,
            ..Default::default()
        };
        let mut device = LcdDevice::new(&gpio, gpio.delay(), config);
        assert_eq!(read_all(&mut device, 8), b"");
    }

    #[test]
    fn test_write_requires_ready() {
        let gpio = MockGpioDriver::new(32);
        let mut device = LcdDevice::new(&gpio, gpio.delay(), LcdConfig::default());

        assert_eq!(
            device.write(b"abc"),
            Err(LcdError::NotReady(DisplayState::Uninitialized))
        );
        assert!(device.text().is_empty());
    }

    #[test]
    fn test_set_line_commands() {
        let gpio = MockGpioDriver::new(32);
        let mut device = open(&gpio);

        device.control(LcdCommand::SetLine1(0)).unwrap();
        device.control(LcdCommand::SetLine2(5)).unwrap();

        assert_eq!(
            bytes(&transfers(&gpio, PINS)),
            vec![(false, 0x80), (false, 0xC5)]
        );
        assert_eq!(device.display().cursor(), CursorAddress { line: 1, column: 5 });
    }

    #[test]
    fn test_set_line_out_of_bounds_has_no_effect() {
        let gpio = MockGpioDriver::new(32);
        let mut device = open(&gpio);
        device.write(b"keep").unwrap();
        device.control(LcdCommand::SetLine2(2)).unwrap();
        gpio.clear_trace();

        assert_eq!(
            device.control(LcdCommand::SetLine1(20)),
            Err(LcdError::OutOfBounds { line: 0, column: 20 })
        );
        assert_eq!(
            device.control(LcdCommand::SetLine2(-1)),
            Err(LcdError::OutOfBounds { line: 1, column: -1 })
        );
        assert!(gpio.trace().is_empty());
        assert_eq!(device.display().cursor(), CursorAddress { line: 1, column: 2 });
        assert_eq!(device.text(), b"keep");
    }

    #[test]
    fn test_scroll_commands() {
        let gpio = MockGpioDriver::new(32);
        let mut device = open(&gpio);

        device.control(LcdCommand::ScrollLeft(2)).unwrap();
        device.control(LcdCommand::ScrollRight(1)).unwrap();
        assert_eq!(
            bytes(&transfers(&gpio, PINS)),
            vec![(false, 0x18), (false, 0x18), (false, 0x1C)]
        );

        gpio.clear_trace();
        assert_eq!(
            device.control(LcdCommand::ScrollRight(-3)),
            Err(LcdError::InvalidArgument("scroll count must not be negative"))
        );
        assert!(gpio.trace().is_empty());
    }

    #[test]
    fn test_reinitialize_command() {
        let gpio = MockGpioDriver::new(32);
        let mut device = open(&gpio);
        device.write(b"text").unwrap();

        let other = PinAssignment::new(1, 2, [3, 4, 5, 7]);
        device.control(LcdCommand::Reinitialize(other)).unwrap();
        assert_eq!(device.state(), DisplayState::Ready);
        assert!(!gpio.is_used(PINS.register_select));
        assert_eq!(device.text(), b"text");
    }

    #[test]
    fn test_failed_reinitialize_faults_until_fixed() {
        let gpio = MockGpioDriver::new(32).with_unavailable(&[9]);
        let mut device = open(&gpio);

        let bad = PinAssignment::new(9, 2, [3, 4, 5, 7]);
        assert!(matches!(
            device.control(LcdCommand::Reinitialize(bad)),
            Err(LcdError::PinUnavailable { .. })
        ));
        assert_eq!(device.state(), DisplayState::Faulted);
        assert_eq!(
            device.control(LcdCommand::Clear),
            Err(LcdError::NotReady(DisplayState::Faulted))
        );
        assert_eq!(
            device.write(b"x"),
            Err(LcdError::NotReady(DisplayState::Faulted))
        );

        device.control(LcdCommand::Reinitialize(PINS)).unwrap();
        assert_eq!(device.state(), DisplayState::Ready);
    }

    #[test]
    fn test_close_is_idempotent() {
        let gpio = MockGpioDriver::new(32);
        let mut device = open(&gpio);
        device.write(b"\xff\xff").unwrap();

        device.close();
        device.close();
        assert_eq!(device.state(), DisplayState::Uninitialized);
        assert!(gpio.levels().iter().all(|&level| !level));
        assert!((0..32).all(|line| !gpio.is_used(line)));
    }
}
