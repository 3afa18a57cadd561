use crate::delay::Delay;
use crate::lcd::hd44780::driver::{
    DisplayMode, HD44780Driver, InitAction, InitStep, CLEAR_DISPLAY, RETURN_HOME,
};
use crate::lcd::hd44780::{DisplayState, LcdError, LcdResult, PinBinding, Timing};
use log::{debug, trace};
use std::time::Duration;

/// GpioHD44780Driver drives an HD44780 controller over a 4-bit GPIO bus.
///
/// Every nibble is latched with an E pulse of [Timing::enable_pulse], followed by
/// [Timing::settle], which covers the execution time of all commands except clear display and
/// return home. Those two get an additional [Timing::clear] wait.
///
/// The R/W line is not used and must be tied to GND; the driver never reads the busy flag.
#[derive(Debug)]
pub struct GpioHD44780Driver<'a, T: Delay> {
    binding: Option<PinBinding<'a>>,
    delay: T,
    timing: Timing,
}

impl<'a, T: Delay> GpioHD44780Driver<'a, T> {
    /// Creates a driver without any pins bound. See [GpioHD44780Driver::attach].
    pub fn new(delay: T, timing: Timing) -> Self {
        GpioHD44780Driver {
            binding: None,
            delay,
            timing,
        }
    }

    /// Uses `binding` for all further transfers, releasing the previous one.
    pub fn attach(&mut self, binding: PinBinding<'a>) {
        self.release();
        self.binding = Some(binding);
    }

    /// Releases the bound pins, driving them low. Does nothing if no pins are bound.
    pub fn release(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.release();
        }
    }

    pub fn binding(&self) -> Option<&PinBinding<'a>> {
        self.binding.as_ref()
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn set_timing(&mut self, timing: Timing) {
        self.timing = timing;
    }

    /// Blocks for `duration` using the driver's delay.
    pub fn wait(&mut self, duration: Duration) {
        if !duration.is_zero() {
            self.delay.delay(duration);
        }
    }

    /// Presents `value` on the data lines and pulses E so the display latches it.
    ///
    /// Bit 0 of `value` goes to the first data line (DB4).
    pub fn send_nibble(&mut self, value: u8, rs: bool) -> LcdResult<()> {
        if value > 0b1111 {
            return Err(LcdError::InvalidArgument("nibble wider than 4 bits"));
        }
        let binding = self
            .binding
            .as_ref()
            .ok_or(LcdError::NotReady(DisplayState::Uninitialized))?;

        binding.set_register_select(rs)?;
        binding.set_data(value)?;

        binding.set_enable(true)?;
        self.delay.delay(self.timing.enable_pulse);
        binding.set_enable(false)?;
        self.delay.delay(self.timing.settle);
        Ok(())
    }

    fn send(&mut self, data: u8, rs: bool) -> LcdResult<()> {
        trace!("Sending data: {:08b}, RS: {}", data, rs);

        let high_nibble = (data >> 4) & 0x0F;
        let low_nibble = data & 0x0F;
        self.send_nibble(high_nibble, rs)?;
        self.send_nibble(low_nibble, rs)
    }

    fn run_init_step(&mut self, step: InitStep, mode: DisplayMode) -> LcdResult<()> {
        match step.action(&self.timing, mode) {
            InitAction::Wait(duration) => self.wait(duration),
            InitAction::Nibble { value, then } => {
                self.send_nibble(value, false)?;
                self.wait(then);
            }
            InitAction::Command(command) => self.send_command(command)?,
        }
        Ok(())
    }
}

impl<T: Delay> HD44780Driver for GpioHD44780Driver<'_, T> {
    /// Runs every [InitStep] in order. A failure stops the sequence and is reported as
    /// [LcdError::InitFailed] with the step that failed.
    fn init(&mut self, mode: DisplayMode) -> LcdResult<()> {
        for step in InitStep::sequence() {
            debug!("HD44780 init step {:?}", step);
            self.run_init_step(step, mode)
                .map_err(|err| LcdError::InitFailed {
                    step,
                    source: Box::new(err),
                })?;
        }
        Ok(())
    }

    fn send_command(&mut self, command: u8) -> LcdResult<()> {
        self.send(command, false)?;
        if command == CLEAR_DISPLAY || (command & !1) == RETURN_HOME {
            self.wait(self.timing.clear);
        }
        Ok(())
    }

    fn send_data(&mut self, data: u8) -> LcdResult<()> {
        self.send(data, true)
    }
}
