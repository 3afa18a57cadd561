pub mod delay;
pub mod gpiod;
pub mod lcd;
pub mod mock;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Whether a line index appears more than once in a single request.
pub(crate) fn has_duplicates(indices: &[usize]) -> bool {
    indices
        .iter()
        .enumerate()
        .any(|(i, index)| indices[..i].contains(index))
}

/// A source of GPIO lines.
///
/// Lines handed out by a driver are configured as outputs and stay reserved until the returned
/// handle is dropped. Requesting a line that is out of range fails with
/// [`GpioError::InvalidArgument`], requesting one that is still reserved fails with
/// [`GpioError::AlreadyInUse`].
pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO lines available.
    fn count(&self) -> GpioResult<usize>;

    /// Requests the line at the given index as an output, driven low.
    fn get_output(&self, index: usize) -> GpioResult<Box<dyn GpioOutput + '_>>;

    /// Requests the lines at the given indices as an output bus, all driven low.
    ///
    /// The lines are acquired together: either every line is reserved, or none is.
    fn get_output_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>>;
}

pub trait GpioOutput: Debug {
    /// Writes the state of the GPIO pin.
    fn write(&self, value: bool) -> GpioResult<()>;
}

pub trait GpioBusOutput<const N: usize>: Debug {
    /// Writes the states of all pins in the bus, `values[0]` going to the first pin.
    fn write(&self, values: &[bool; N]) -> GpioResult<()>;
}

impl dyn GpioBusOutput<4> + '_ {
    /// Writes the values to the GPIO pins in the bus.
    /// The values are written as a nibble, LSb first.
    pub fn write_nibble(&self, value: u8) -> GpioResult<()> {
        if value > 0b1111 {
            return Err(GpioError::InvalidArgument);
        }

        let mut values = [false; 4];
        for (i, line) in values.iter_mut().enumerate() {
            *line = (value & (1 << i)) != 0;
        }
        self.write(&values)
    }
}
