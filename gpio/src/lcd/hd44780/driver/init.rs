use crate::lcd::hd44780::driver::{
    display_control_command, entry_mode_command, function_set_command, CursorDirection,
    DisplayMode, CLEAR_DISPLAY,
};
use crate::lcd::hd44780::Timing;
use std::time::Duration;

/// Steps of the 4-bit power-on handshake, in the order they run.
///
/// The three wake nibbles put the controller into 8-bit mode whatever state it was left in
/// (including halfway through a 4-bit transfer), so the following `0x2` nibble is always read as
/// the switch to 4-bit mode. Skipping or reordering steps can leave the controller interpreting
/// every later nibble pair out of phase.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InitStep {
    /// Wait for the supply to stabilize.
    PowerOn,
    FirstWake,
    SecondWake,
    ThirdWake,
    /// Nibble `0x2`: switch to the 4-bit interface.
    FourBitMode,
    /// Two lines, selected font.
    FunctionSet,
    DisplayOff,
    Clear,
    /// Auto-increment, no shift.
    EntryMode,
    DisplayOn,
}

/// What the driver does for a single [InitStep].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InitAction {
    Wait(Duration),
    /// Sends a single command nibble, then waits `then` on top of the regular settle time.
    Nibble { value: u8, then: Duration },
    Command(u8),
}

impl InitStep {
    pub const FIRST: InitStep = InitStep::PowerOn;

    pub fn next(self) -> Option<InitStep> {
        use InitStep::*;

        match self {
            PowerOn => Some(FirstWake),
            FirstWake => Some(SecondWake),
            SecondWake => Some(ThirdWake),
            ThirdWake => Some(FourBitMode),
            FourBitMode => Some(FunctionSet),
            FunctionSet => Some(DisplayOff),
            DisplayOff => Some(Clear),
            Clear => Some(EntryMode),
            EntryMode => Some(DisplayOn),
            DisplayOn => None,
        }
    }

    pub fn action(self, timing: &Timing, mode: DisplayMode) -> InitAction {
        use InitStep::*;

        const WAKE: u8 = 0b0011;
        const FOUR_BIT: u8 = 0b0010;

        match self {
            PowerOn => InitAction::Wait(timing.power_on),
            FirstWake => InitAction::Nibble {
                value: WAKE,
                then: timing.wake_first_gap,
            },
            SecondWake | ThirdWake => InitAction::Nibble {
                value: WAKE,
                then: timing.wake_gap,
            },
            FourBitMode => InitAction::Nibble {
                value: FOUR_BIT,
                then: Duration::ZERO,
            },
            FunctionSet => InitAction::Command(function_set_command(true, mode.font)),
            DisplayOff => InitAction::Command(display_control_command(false, false, false)),
            Clear => InitAction::Command(CLEAR_DISPLAY),
            EntryMode => InitAction::Command(entry_mode_command(CursorDirection::Right, false)),
            DisplayOn => {
                InitAction::Command(display_control_command(true, mode.cursor, mode.blink))
            }
        }
    }

    /// Iterates over all steps, starting at [InitStep::FIRST].
    pub fn sequence() -> impl Iterator<Item = InitStep> {
        std::iter::successors(Some(Self::FIRST), |&step| step.next())
    }
}
