use crate::lcd::hd44780::{LcdError, LcdResult};
use std::time::Duration;

/// Waits of the HD44780 protocol.
///
/// Each value is a lower bound: the display may be slower than its datasheet, never faster, so
/// [Timing::default] keeps a margin above [Timing::MINIMUM].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Timing {
    /// How long E is held high for the display to latch a nibble.
    pub enable_pulse: Duration,
    /// Wait after every nibble, covering the execution time of ordinary commands.
    pub settle: Duration,
    /// Wait after power-up before the first command.
    pub power_on: Duration,
    /// Wait after the first wake nibble.
    pub wake_first_gap: Duration,
    /// Wait after the second and third wake nibbles.
    pub wake_gap: Duration,
    /// Execution time of clear display and return home.
    pub clear: Duration,
}

impl Timing {
    /// Datasheet minimums.
    pub const MINIMUM: Timing = Timing {
        enable_pulse: Duration::from_nanos(450),
        settle: Duration::from_micros(37),
        power_on: Duration::from_millis(40),
        wake_first_gap: Duration::from_micros(4100),
        wake_gap: Duration::from_micros(100),
        clear: Duration::from_micros(1520),
    };

    /// Checks every wait against [Timing::MINIMUM].
    ///
    /// # Errors
    /// - [LcdError::TimingBelowFloor] for the first wait shorter than its minimum.
    pub fn validate(&self) -> LcdResult<()> {
        let min = Self::MINIMUM;
        let checks = [
            ("enable pulse", self.enable_pulse, min.enable_pulse),
            ("settle time", self.settle, min.settle),
            ("power-on wait", self.power_on, min.power_on),
            ("first wake gap", self.wake_first_gap, min.wake_first_gap),
            ("wake gap", self.wake_gap, min.wake_gap),
            ("clear time", self.clear, min.clear),
        ];

        for (name, requested, floor) in checks {
            if requested < floor {
                return Err(LcdError::TimingBelowFloor {
                    name,
                    requested,
                    floor,
                });
            }
        }
        Ok(())
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            enable_pulse: Duration::from_micros(2),
            settle: Duration::from_micros(50),
            power_on: Duration::from_millis(50),
            wake_first_gap: Duration::from_millis(5),
            wake_gap: Duration::from_micros(150),
            clear: Duration::from_millis(2),
        }
    }
}
