//! In-memory GPIO backend.
//!
//! [MockGpioDriver] hands out lines that only exist in memory and records every level change,
//! together with every wait requested through a [MockDelay] obtained from it, into one shared
//! trace. It lets protocol code be checked edge by edge without hardware and without sleeping.

use crate::delay::Delay;
use crate::{has_duplicates, GpioBusOutput, GpioDriver, GpioError, GpioOutput, GpioResult};
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MockEvent {
    /// A line was driven to a level.
    Write { line: usize, value: bool },
    /// A delay was requested.
    Delay(Duration),
}

#[derive(Debug, Default)]
struct MockState {
    trace: Vec<MockEvent>,
    levels: Vec<bool>,
    used: Vec<bool>,
    unavailable: Vec<usize>,
    fail_writes: bool,
}

impl MockState {
    fn write(&mut self, line: usize, value: bool) -> GpioResult<()> {
        if self.fail_writes {
            return Err(GpioError::Io(std::io::ErrorKind::BrokenPipe));
        }
        self.levels[line] = value;
        self.trace.push(MockEvent::Write { line, value });
        Ok(())
    }
}

/// A GPIO driver with `count` in-memory lines, all starting low.
pub struct MockGpioDriver {
    state: Rc<RefCell<MockState>>,
}

impl MockGpioDriver {
    pub fn new(count: usize) -> Self {
        let state = MockState {
            levels: vec![false; count],
            used: vec![false; count],
            ..Default::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Marks lines that exist but can never be acquired, like lines claimed by another consumer.
    pub fn with_unavailable(self, lines: &[usize]) -> Self {
        self.state.borrow_mut().unavailable.extend_from_slice(lines);
        self
    }

    /// Makes every following write fail with an IO error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    /// Creates a delay that records into this driver's trace instead of sleeping.
    pub fn delay(&self) -> MockDelay {
        MockDelay {
            state: Rc::clone(&self.state),
        }
    }

    pub fn trace(&self) -> Vec<MockEvent> {
        self.state.borrow().trace.clone()
    }

    pub fn clear_trace(&self) {
        self.state.borrow_mut().trace.clear();
    }

    /// Current level of every line.
    pub fn levels(&self) -> Vec<bool> {
        self.state.borrow().levels.clone()
    }

    pub fn is_used(&self, line: usize) -> bool {
        self.state.borrow().used.get(line).copied().unwrap_or(false)
    }

    /// Sum of all recorded delays.
    pub fn total_delay(&self) -> Duration {
        self.state
            .borrow()
            .trace
            .iter()
            .filter_map(|event| match event {
                MockEvent::Delay(d) => Some(*d),
                _ => None,
            })
            .sum()
    }

    /// Replays the trace and samples `lines` at every falling edge of `strobe`.
    ///
    /// This is what a device latching on the strobe's falling edge would have seen.
    pub fn latched(&self, strobe: usize, lines: &[usize]) -> Vec<Vec<bool>> {
        let state = self.state.borrow();
        let mut levels = vec![false; state.levels.len()];
        let mut latched = Vec::new();

        for event in &state.trace {
            if let MockEvent::Write { line, value } = *event {
                let falling = line == strobe && levels[line] && !value;
                levels[line] = value;
                if falling {
                    latched.push(lines.iter().map(|&l| levels[l]).collect());
                }
            }
        }

        latched
    }

    fn reserve(&self, indices: &[usize]) -> GpioResult<()> {
        let mut state = self.state.borrow_mut();

        if indices.iter().any(|&index| index >= state.used.len()) {
            return Err(GpioError::InvalidArgument);
        }

        if has_duplicates(indices) {
            return Err(GpioError::InvalidArgument);
        }

        if indices
            .iter()
            .any(|&index| state.used[index] || state.unavailable.contains(&index))
        {
            return Err(GpioError::AlreadyInUse);
        }

        for &index in indices {
            state.used[index] = true;
        }
        Ok(())
    }
}

impl Debug for MockGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockGpioDriver({})", self.state.borrow().levels.len())
    }
}

impl GpioDriver for MockGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.state.borrow().levels.len())
    }

    fn get_output(&self, index: usize) -> GpioResult<Box<dyn GpioOutput + '_>> {
        self.reserve(&[index])?;
        let output = MockOutput {
            state: Rc::clone(&self.state),
            line: index,
        };
        output.write(false)?;
        Ok(Box::new(output))
    }

    fn get_output_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>> {
        self.reserve(&indices)?;
        let output = MockBusOutput {
            state: Rc::clone(&self.state),
            lines: indices,
        };
        output.write(&[false; N])?;
        Ok(Box::new(output))
    }
}

struct MockOutput {
    state: Rc<RefCell<MockState>>,
    line: usize,
}

impl Debug for MockOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockGpio[{}][output]", self.line)
    }
}

impl GpioOutput for MockOutput {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.state.borrow_mut().write(self.line, value)
    }
}

impl Drop for MockOutput {
    fn drop(&mut self) {
        self.state.borrow_mut().used[self.line] = false;
    }
}

struct MockBusOutput<const N: usize> {
    state: Rc<RefCell<MockState>>,
    lines: [usize; N],
}

impl<const N: usize> Debug for MockBusOutput<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockGpio{:?}[output]", self.lines)
    }
}

impl<const N: usize> GpioBusOutput<N> for MockBusOutput<N> {
    fn write(&self, values: &[bool; N]) -> GpioResult<()> {
        let mut state = self.state.borrow_mut();
        for (&line, &value) in self.lines.iter().zip(values) {
            state.write(line, value)?;
        }
        Ok(())
    }
}

impl<const N: usize> Drop for MockBusOutput<N> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        for &line in &self.lines {
            state.used[line] = false;
        }
    }
}

/// A [Delay] that records the requested duration into the [MockGpioDriver] trace it came from.
#[derive(Clone)]
pub struct MockDelay {
    state: Rc<RefCell<MockState>>,
}

impl Debug for MockDelay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockDelay")
    }
}

impl Delay for MockDelay {
    fn delay(&mut self, duration: Duration) {
        self.state.borrow_mut().trace.push(MockEvent::Delay(duration));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_reserved_until_dropped() {
        let gpio = MockGpioDriver::new(4);
        let out = gpio.get_output(2).unwrap();
        assert!(gpio.is_used(2));
        assert_eq!(gpio.get_output(2).unwrap_err(), GpioError::AlreadyInUse);
        drop(out);
        assert!(!gpio.is_used(2));
        assert!(gpio.get_output(2).is_ok());
    }

    #[test]
    fn test_out_of_range_line() {
        let gpio = MockGpioDriver::new(4);
        assert_eq!(gpio.get_output(4).unwrap_err(), GpioError::InvalidArgument);
    }

    #[test]
    fn test_bus_is_all_or_nothing() {
        let gpio = MockGpioDriver::new(8).with_unavailable(&[6]);
        assert_eq!(
            gpio.get_output_bus([4, 5, 6, 7]).unwrap_err(),
            GpioError::AlreadyInUse
        );
        assert!((0..8).all(|line| !gpio.is_used(line)));
    }

    #[test]
    fn test_bus_rejects_repeated_lines() {
        let gpio = MockGpioDriver::new(8);
        assert_eq!(
            gpio.get_output_bus([4, 4, 5, 6]).unwrap_err(),
            GpioError::InvalidArgument
        );
        assert!((0..8).all(|line| !gpio.is_used(line)));
        assert!(gpio.trace().is_empty());
    }

    #[test]
    fn test_latched_samples_on_falling_edge() {
        let gpio = MockGpioDriver::new(3);
        let strobe = gpio.get_output(0).unwrap();
        let data = gpio.get_output(1).unwrap();

        data.write(true).unwrap();
        strobe.write(true).unwrap();
        data.write(false).unwrap();
        strobe.write(false).unwrap();
        data.write(true).unwrap();

        assert_eq!(gpio.latched(0, &[1]), vec![vec![false]]);
    }

    #[test]
    fn test_delay_is_recorded_not_slept() {
        let gpio = MockGpioDriver::new(1);
        let mut delay = gpio.delay();
        delay.delay_ms(1000);
        delay.delay_us(5);
        assert_eq!(
            gpio.trace(),
            vec![
                MockEvent::Delay(Duration::from_secs(1)),
                MockEvent::Delay(Duration::from_micros(5)),
            ]
        );
        assert_eq!(gpio.total_delay(), Duration::from_micros(1_000_005));
    }
}
