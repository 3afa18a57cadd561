//! GpiodDriver implementation for driving GPIO lines through the Linux GPIO character device,
//! using the gpiod library.
use crate::{has_duplicates, GpioBusOutput, GpioDriver, GpioError, GpioOutput, GpioResult};
use bitvec::vec::BitVec;
use log::trace;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::AtomicU8;

/// GpiodDriver is a GPIO driver that uses the gpiod library to manage GPIO lines.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    used_pins: BitVec<AtomicU8>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        let bits = BitVec::repeat(false, n);
        Self {
            chip,
            used_pins: bits,
        }
    }

    /// Opens the GPIO chip at the given path, e.g. `/dev/gpiochip0`.
    pub fn open(path: &str) -> GpioResult<Self> {
        Ok(Self::new(gpiod::Chip::new(path)?))
    }

    fn reserve(&self, indices: &[usize]) -> GpioResult<()> {
        let n = self.count()?;

        if indices.iter().any(|&index| index >= n) {
            return Err(GpioError::InvalidArgument);
        }

        if has_duplicates(indices) {
            return Err(GpioError::InvalidArgument);
        }

        if indices.iter().any(|&index| self.used_pins[index]) {
            return Err(GpioError::AlreadyInUse);
        }

        for &index in indices {
            self.used_pins.set_aliased(index, true);
        }
        Ok(())
    }

    fn unreserve(&self, indices: &[usize]) {
        for &index in indices {
            self.used_pins.set_aliased(index, false);
        }
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn get_output(&self, index: usize) -> GpioResult<Box<dyn GpioOutput + '_>> {
        self.reserve(&[index])?;

        let line = self
            .chip
            .request_lines(gpiod::Options::output([index as u32]).consumer(env!("CARGO_PKG_NAME")));
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                self.unreserve(&[index]);
                return Err(err.into());
            }
        };

        let output = GpiodOutput {
            driver: self,
            pin_index: index,
            line,
        };
        output.write(false)?;
        trace!("{:?} requested", output);
        Ok(Box::new(output))
    }

    fn get_output_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>> {
        self.reserve(&indices)?;

        let line = self.chip.request_lines(
            gpiod::Options::output(
                indices
                    .iter()
                    .map(|&index| index as u32)
                    .collect::<Vec<_>>(),
            )
            .consumer(env!("CARGO_PKG_NAME")),
        );
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                self.unreserve(&indices);
                return Err(err.into());
            }
        };

        let output = GpiodBusOutput {
            driver: self,
            pin_indices: indices,
            line,
        };
        output.write(&[false; N])?;
        trace!("{:?} requested", output);
        Ok(Box::new(output))
    }
}

struct GpiodOutput<'a> {
    driver: &'a GpiodDriver,
    pin_index: usize,
    line: gpiod::Lines<gpiod::Output>,
}

impl Debug for GpiodOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][output]", self.driver, self.pin_index)
    }
}

impl GpioOutput for GpiodOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.line.set_values([value])?;
        Ok(())
    }
}

impl Drop for GpiodOutput<'_> {
    fn drop(&mut self) {
        self.driver.unreserve(&[self.pin_index]);
    }
}

struct GpiodBusOutput<'a, const N: usize> {
    driver: &'a GpiodDriver,
    pin_indices: [usize; N],
    line: gpiod::Lines<gpiod::Output>,
}

impl<const N: usize> Debug for GpiodBusOutput<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}{:?}[output]", self.driver, self.pin_indices)
    }
}

impl<const N: usize> GpioBusOutput<N> for GpiodBusOutput<'_, N> {
    fn write(&self, values: &[bool; N]) -> GpioResult<()> {
        self.line.set_values(*values)?;
        Ok(())
    }
}

impl<const N: usize> Drop for GpiodBusOutput<'_, N> {
    fn drop(&mut self) {
        self.driver.unreserve(&self.pin_indices);
    }
}
