//! Blocking delays used by the display protocol.
//!
//! Every wait in the HD44780 protocol goes through [Delay], so the protocol code can be run
//! against [MockDelay](crate::mock::MockDelay) without touching the wall clock.

use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;

pub trait Delay: Debug {
    /// Blocks for at least `duration`.
    fn delay(&mut self, duration: Duration);

    fn delay_us(&mut self, us: u64) {
        self.delay(Duration::from_micros(us));
    }

    fn delay_ms(&mut self, ms: u64) {
        self.delay(Duration::from_millis(ms));
    }
}

/// Sleeps the calling thread. The OS may oversleep, never undersleep.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay(&mut self, duration: Duration) {
        if !duration.is_zero() {
            sleep(duration);
        }
    }
}
