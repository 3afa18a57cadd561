//! HD44780 command set.
//!
//! [HD44780Driver] encodes the controller's instructions on top of two raw primitives,
//! [HD44780Driver::send_command] and [HD44780Driver::send_data], which the bus-specific driver
//! implements. [GpioHD44780Driver] is the 4-bit GPIO implementation.

mod gpio;
mod init;

use crate::lcd::hd44780::{LcdError, LcdResult};
pub use gpio::*;
pub use init::*;
use std::fmt::Debug;

pub const CLEAR_DISPLAY: u8 = 0b00000001;
pub const RETURN_HOME: u8 = 0b00000010;

pub trait HD44780Driver: Debug {
    /// Runs the power-on handshake and leaves the display on, empty, in 4-bit mode.
    fn init(&mut self, mode: DisplayMode) -> LcdResult<()>;

    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) -> LcdResult<()> {
        self.send_command(CLEAR_DISPLAY)
    }

    /// Sets the cursor to the home position and undoes any display shift.
    fn return_home(&mut self) -> LcdResult<()> {
        self.send_command(RETURN_HOME)
    }

    /// Sets the display to the specified entry mode.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> LcdResult<()> {
        self.send_command(entry_mode_command(cursor_direction, shift))
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> LcdResult<()> {
        self.send_command(display_control_command(display_on, cursor_on, blink_on))
    }

    /// Moves the cursor or shifts the display.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> LcdResult<()> {
        let mut command = 0b00010000;
        if display_shift {
            command |= 0b00001000;
        }
        if direction == CursorDirection::Right {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the function set. The data length bit is always cleared, as only the 4-bit interface
    /// is wired.
    fn function_set(&mut self, two_lines: bool, font: Font) -> LcdResult<()> {
        self.send_command(function_set_command(two_lines, font))
    }

    /// Sets the DDRAM address.
    fn set_ddram_address(&mut self, address: u8) -> LcdResult<()> {
        if address > 0b01111111 {
            return Err(LcdError::InvalidArgument("DDRAM address wider than 7 bits"));
        }
        let command = 0b10000000 | address;
        self.send_command(command)
    }

    // Low-level commands
    // These raw commands are used by the high-level functions above.
    // They are not meant to be used directly, but implemented by the driver implementation.

    /// Sends a command to the HD44780 controller.
    /// Sets the RS pin to 0 (command).
    fn send_command(&mut self, command: u8) -> LcdResult<()>;

    /// Sends data to the HD44780 controller.
    /// Sets the RS pin to 1 (data).
    fn send_data(&mut self, data: u8) -> LcdResult<()>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing/reading data.
    Left,
    /// Moves the cursor to the right after writing/reading data.
    Right,
}

/// Character font selected by the function set command.
///
/// Most panels only support 5x10 dots in one-line mode, so two-line panels normally stay at the
/// default.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Font {
    #[default]
    Dots5x8,
    Dots5x10,
}

/// Display settings applied at the end of the power-on handshake.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DisplayMode {
    pub font: Font,
    pub cursor: bool,
    pub blink: bool,
}

pub(crate) fn entry_mode_command(cursor_direction: CursorDirection, shift: bool) -> u8 {
    let mut command = 0b00000100;
    if cursor_direction == CursorDirection::Right {
        command |= 0b00000010;
    }
    if shift {
        command |= 0b00000001;
    }
    command
}

pub(crate) fn display_control_command(display_on: bool, cursor_on: bool, blink_on: bool) -> u8 {
    let mut command = 0b00001000;
    if display_on {
        command |= 0b00000100;
    }
    if cursor_on {
        command |= 0b00000010;
    }
    if blink_on {
        command |= 0b00000001;
    }
    command
}

pub(crate) fn function_set_command(two_lines: bool, font: Font) -> u8 {
    let mut command = 0b00100000;
    if two_lines {
        command |= 0b00001000;
    }
    if font == Font::Dots5x10 {
        command |= 0b00000100;
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_encoding() {
        assert_eq!(function_set_command(true, Font::Dots5x8), 0x28);
        assert_eq!(function_set_command(true, Font::Dots5x10), 0x2C);
        assert_eq!(display_control_command(false, false, false), 0x08);
        assert_eq!(display_control_command(true, false, false), 0x0C);
        assert_eq!(display_control_command(true, true, true), 0x0F);
        assert_eq!(entry_mode_command(CursorDirection::Right, false), 0x06);
    }
}
