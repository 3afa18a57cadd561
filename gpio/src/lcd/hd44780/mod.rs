//! HD44780 LCD module, for 16x2 panels wired in 4-bit mode.
//!
//! The stack is layered, each layer only talking to the one below it:
//!
//! - [LcdDevice] is the control surface: write/read text through a bounded [TextBuffer] and
//!   dispatch [LcdCommand]s.
//! - [Hd44780Display] tracks the [DisplayState] and the logical cursor, and implements printing
//!   with line wrap, cursor addressing, clearing and scrolling.
//! - [GpioHD44780Driver] implements the [HD44780Driver] command set: it sends bytes as two nibbles
//!   and runs the power-on handshake ([InitStep]).
//! - [PinBinding] owns the six GPIO lines described by a [PinAssignment].
//!
//! Every wait goes through a [Delay](crate::delay::Delay), with the durations taken from [Timing].

mod buffer;
mod device;
mod display;
pub mod driver;
mod pins;
#[cfg(test)]
mod testing;
mod timing;

pub use buffer::*;
pub use device::*;
pub use display::*;
pub use driver::*;
pub use pins::*;
pub use timing::*;

use crate::GpioError;
use std::time::Duration;
use thiserror::Error;

/// Number of lines on the panel.
pub const LINES: usize = 2;
/// Number of visible columns per line.
pub const COLUMNS: usize = 16;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum LcdError {
    /// A line of the pin assignment could not be acquired or configured.
    #[error("{role} unavailable: {source}")]
    PinUnavailable { role: PinRole, source: GpioError },
    /// The display has not been brought up, or faulted.
    #[error("display not ready (state: {0:?})")]
    NotReady(DisplayState),
    #[error("cursor position ({line}, {column}) is out of bounds")]
    OutOfBounds { line: usize, column: i64 },
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("{name} of {requested:?} is below the minimum of {floor:?}")]
    TimingBelowFloor {
        name: &'static str,
        requested: Duration,
        floor: Duration,
    },
    #[error("initialization failed at {step:?}: {source}")]
    InitFailed {
        step: InitStep,
        source: Box<LcdError>,
    },
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
}

pub type LcdResult<T> = Result<T, LcdError>;
