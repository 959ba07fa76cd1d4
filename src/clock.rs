//! This module provides the two countdown timers of a CHIP-8 machine. Both
//! decrement toward zero at 60Hz, but the cadence belongs entirely to the
//! host: [`Clock::tick`] performs one decrement and keeps no internal time,
//! however often the host chooses to call it.

/// Delay and sound timers for the [`super::Chip8`]. The host observes the
/// sound timer reaching zero to stop audio playback.
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
#[derive(Default)]
pub struct Clock {
    /// The current value of the delay timer.
    pub delay_timer: u8,
    /// The current value of the sound timer.
    pub sound_timer: u8,
}

impl Clock {
    /// Creates a new [`Clock`] with both timers at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decrements both timers, each floored at zero. Call this once per 60Hz
    /// frame tick, independent of instruction throughput.
    pub fn tick(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_decrements_both_timers() {
        let mut clock = Clock::new();
        clock.delay_timer = 3;
        clock.sound_timer = 1;
        clock.tick();
        assert_eq!(clock.delay_timer, 2);
        assert_eq!(clock.sound_timer, 0);
    }

    #[test]
    fn timers_floor_at_zero() {
        let mut clock = Clock::new();
        clock.delay_timer = 1;
        for _ in 0..5 {
            clock.tick();
        }
        assert_eq!(clock.delay_timer, 0);
        assert_eq!(clock.sound_timer, 0);
    }

    #[test]
    fn timers_decrement_independently() {
        let mut clock = Clock::new();
        clock.delay_timer = 2;
        clock.sound_timer = 5;
        clock.tick();
        clock.tick();
        assert_eq!(clock.delay_timer, 0);
        assert_eq!(clock.sound_timer, 3);
    }
}
