//! Interpreter configuration, resolved once before the interpreter is built.
use std::time::Duration;

use crate::error::{Chip8Error, Chip8Result};

pub const DEFAULT_DISPLAY_WIDTH: usize = 64;
pub const DEFAULT_DISPLAY_HEIGHT: usize = 32;
pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 500;
pub const DEFAULT_TIMER_RATE: u32 = 60;
/// Roughly 500 Hz CPU against a 60 Hz refresh.
pub const DEFAULT_DISPLAY_RATIO: u32 = 8;
/// Fastest rate whose period is still at least one nanosecond.
pub const MAX_RATE_HZ: u32 = 1_000_000_000;

/// Behavioral variants between interpreters.
///
/// The defaults match the COSMAC VIP interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quirks {
    /// `8xy6`/`8xyE` copy Vy into Vx before shifting.
    pub shift_uses_vy: bool,
    /// `Fx55`/`Fx65` leave I advanced past the last register copied.
    pub increment_index: bool,
    /// `8xy1`/`8xy2`/`8xy3` zero VF afterwards.
    pub logic_resets_vf: bool,
    /// Sprite bodies wrap around the screen edges instead of clipping.
    pub wrap_sprites: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            shift_uses_vy: true,
            increment_index: true,
            logic_resets_vf: true,
            wrap_sprites: false,
        }
    }
}

/// Scheduling tunables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub instruction_hz: u32,
    pub timer_hz: u32,
    /// Executed instructions per display presentation.
    pub display_ratio: u32,
}

impl Timing {
    pub fn instruction_period(&self) -> Duration {
        Duration::from_secs(1) / self.instruction_hz
    }

    pub fn timer_period(&self) -> Duration {
        Duration::from_secs(1) / self.timer_hz
    }

    pub fn display_period(&self) -> Duration {
        self.instruction_period() * self.display_ratio
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            instruction_hz: DEFAULT_INSTRUCTIONS_PER_SECOND,
            timer_hz: DEFAULT_TIMER_RATE,
            display_ratio: DEFAULT_DISPLAY_RATIO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub quirks: Quirks,
    pub timing: Timing,
    pub display_width: usize,
    pub display_height: usize,
    /// Maximum call depth. `None` leaves the stack unbounded.
    pub stack_limit: Option<usize>,
    /// Seed for `Cxkk`; entropy from the OS when absent.
    pub seed: Option<u64>,
}

impl Settings {
    pub fn validate(&self) -> Chip8Result<()> {
        if !(1..=MAX_RATE_HZ).contains(&self.timing.instruction_hz) {
            return Err(Chip8Error::InvalidSettings(
                "instruction rate must be between 1 Hz and 1 GHz",
            ));
        }
        if !(1..=MAX_RATE_HZ).contains(&self.timing.timer_hz) {
            return Err(Chip8Error::InvalidSettings(
                "timer rate must be between 1 Hz and 1 GHz",
            ));
        }
        if self.timing.display_ratio == 0 {
            return Err(Chip8Error::InvalidSettings("display ratio must be positive"));
        }
        if self.display_width == 0 || self.display_height == 0 {
            return Err(Chip8Error::InvalidSettings("display must not be empty"));
        }
        if self.stack_limit == Some(0) {
            return Err(Chip8Error::InvalidSettings("stack limit must be positive"));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            quirks: Quirks::default(),
            timing: Timing::default(),
            display_width: DEFAULT_DISPLAY_WIDTH,
            display_height: DEFAULT_DISPLAY_HEIGHT,
            stack_limit: None,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_periods() {
        let timing = Timing::default();
        assert_eq!(timing.instruction_period(), Duration::from_millis(2));
        assert_eq!(timing.display_period(), Duration::from_millis(16));
        assert_eq!(timing.timer_period(), Duration::from_nanos(16_666_666));
    }

    #[test]
    fn test_validate() {
        assert!(Settings::default().validate().is_ok());

        let mut settings = Settings::default();
        settings.timing.timer_hz = 0;
        assert!(matches!(
            settings.validate(),
            Err(Chip8Error::InvalidSettings(_))
        ));

        let settings = Settings {
            display_height: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_periods() {
        let mut settings = Settings::default();
        settings.timing.timer_hz = 2_000_000_000;
        assert_eq!(settings.timing.timer_period(), Duration::ZERO);
        assert!(matches!(
            settings.validate(),
            Err(Chip8Error::InvalidSettings(_))
        ));

        let mut settings = Settings::default();
        settings.timing.instruction_hz = MAX_RATE_HZ + 1;
        assert!(settings.validate().is_err());

        settings.timing.instruction_hz = MAX_RATE_HZ;
        settings.timing.timer_hz = MAX_RATE_HZ;
        assert_eq!(settings.timing.timer_period(), Duration::from_nanos(1));
        assert!(settings.validate().is_ok());
    }
}
