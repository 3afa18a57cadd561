use crate::lcd::hd44780::{LcdError, LcdResult};
use crate::{GpioBusOutput, GpioDriver, GpioError, GpioOutput, GpioResult};
use log::{debug, warn};
use std::fmt::{Debug, Display, Formatter};

/// Line numbers of the six signals used to talk to the display in 4-bit mode.
///
/// `data[0]` is wired to the display's DB4, `data[3]` to DB7.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PinAssignment {
    pub register_select: usize,
    pub enable: usize,
    pub data: [usize; 4],
}

impl PinAssignment {
    pub const fn new(register_select: usize, enable: usize, data: [usize; 4]) -> Self {
        PinAssignment {
            register_select,
            enable,
            data,
        }
    }

    /// Fails on the first role whose line is already used by an earlier role.
    fn check_distinct(&self) -> LcdResult<()> {
        let duplicate = |role| LcdError::PinUnavailable {
            role,
            source: GpioError::InvalidArgument,
        };

        if self.enable == self.register_select {
            return Err(duplicate(PinRole::Enable(self.enable)));
        }
        let data = self.data;
        if data.iter().enumerate().any(|(i, pin)| {
            *pin == self.register_select || *pin == self.enable || data[..i].contains(pin)
        }) {
            return Err(duplicate(PinRole::Data(data)));
        }
        Ok(())
    }
}

/// The role a line plays in a [PinAssignment], with its line number(s).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PinRole {
    RegisterSelect(usize),
    Enable(usize),
    Data([usize; 4]),
}

impl Display for PinRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PinRole::RegisterSelect(pin) => write!(f, "RS pin {}", pin),
            PinRole::Enable(pin) => write!(f, "E pin {}", pin),
            PinRole::Data(pins) => write!(f, "data pins {:?}", pins),
        }
    }
}

/// The live GPIO lines of a [PinAssignment], all configured as outputs.
///
/// Dropping the binding drives every line low and hands the lines back to the GPIO driver.
pub struct PinBinding<'a> {
    assignment: PinAssignment,
    register_select: Box<dyn GpioOutput + 'a>,
    enable: Box<dyn GpioOutput + 'a>,
    data: Box<dyn GpioBusOutput<4> + 'a>,
}

impl<'a> PinBinding<'a> {
    /// Acquires the six lines of `assignment` as outputs, driven low.
    ///
    /// # Errors
    /// - [LcdError::PinUnavailable] naming the first line that could not be acquired. Lines
    ///   acquired before it are released again.
    /// - [LcdError::PinUnavailable] with [GpioError::InvalidArgument] if a line is assigned twice.
    ///   Nothing is acquired then.
    pub fn bind<D: GpioDriver>(gpio: &'a D, assignment: PinAssignment) -> LcdResult<Self> {
        debug!("Binding LCD pins {:?} on {:?}", assignment, gpio);
        assignment.check_distinct()?;

        let register_select = gpio
            .get_output(assignment.register_select)
            .map_err(|source| LcdError::PinUnavailable {
                role: PinRole::RegisterSelect(assignment.register_select),
                source,
            })?;

        let enable = gpio
            .get_output(assignment.enable)
            .map_err(|source| LcdError::PinUnavailable {
                role: PinRole::Enable(assignment.enable),
                source,
            })?;

        let data = gpio
            .get_output_bus(assignment.data)
            .map_err(|source| LcdError::PinUnavailable {
                role: PinRole::Data(assignment.data),
                source,
            })?;

        Ok(PinBinding {
            assignment,
            register_select,
            enable,
            data,
        })
    }

    pub fn assignment(&self) -> PinAssignment {
        self.assignment
    }

    pub fn set_register_select(&self, value: bool) -> GpioResult<()> {
        self.register_select.write(value)
    }

    pub fn set_enable(&self, value: bool) -> GpioResult<()> {
        self.enable.write(value)
    }

    /// Drives the data lines to `nibble`, bit 0 on `data[0]`.
    pub fn set_data(&self, nibble: u8) -> GpioResult<()> {
        self.data.write_nibble(nibble)
    }

    /// Drives all lines low and relinquishes them.
    pub fn release(self) {
        drop(self);
    }

    fn drive_low(&self) -> GpioResult<()> {
        self.enable.write(false)?;
        self.register_select.write(false)?;
        self.data.write_nibble(0)
    }
}

impl Debug for PinBinding<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PinBinding(RS: {:?}, E: {:?}, data: {:?})",
            self.register_select, self.enable, self.data
        )
    }
}

impl Drop for PinBinding<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.drive_low() {
            warn!("Failed to drive LCD pins low on release: {}", err);
        }
        debug!("Released LCD pins {:?}", self.assignment);
    }
}
