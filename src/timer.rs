//! Delay and sound timers, decayed from wall-clock time.
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::debug;

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

pub struct SystemClock(Instant);

impl SystemClock {
    pub fn new() -> Self {
        Self(Instant::now())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.0.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<Duration>>);

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// Signals for the audio collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioCue {
    ToneOn,
    ToneOff,
}

/// An 8-bit down counter. A running timer remembers when it last ticked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    value: u8,
    last_tick: Option<Duration>,
}

impl Timer {
    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn set(&mut self, value: u8, now: Duration) {
        self.value = value;
        self.last_tick = (value > 0).then_some(now);
    }

    /// Consumes every whole period elapsed since the last tick.
    ///
    /// Returns `true` when this call brought the timer to zero.
    pub fn tick(&mut self, now: Duration, period: Duration) -> bool {
        let Some(last_tick) = self.last_tick else {
            return false;
        };
        if period.is_zero() {
            return false;
        }

        let elapsed = now.saturating_sub(last_tick);
        let ticks = elapsed.as_nanos() / period.as_nanos();
        if ticks == 0 {
            return false;
        }

        if ticks >= u128::from(self.value) {
            self.value = 0;
            self.last_tick = None;
            return true;
        }

        // ticks < value <= 255 here
        let ticks = ticks as u32;
        self.value -= ticks as u8;
        // Keep the fractional remainder for the next tick.
        self.last_tick = Some(last_tick + period * ticks);
        false
    }
}

pub struct Timers {
    pub delay: Timer,
    pub sound: Timer,
    period: Duration,
}

impl Timers {
    pub fn new(period: Duration) -> Self {
        Timers {
            delay: Timer::default(),
            sound: Timer::default(),
            period,
        }
    }

    pub fn set_delay(&mut self, value: u8, now: Duration) {
        self.delay.set(value, now);
    }

    pub fn set_sound(&mut self, value: u8, now: Duration) -> Option<AudioCue> {
        let was_running = self.sound.value() > 0;
        self.sound.set(value, now);
        if value > 0 {
            Some(AudioCue::ToneOn)
        } else if was_running {
            Some(AudioCue::ToneOff)
        } else {
            None
        }
    }

    pub fn tick(&mut self, now: Duration) -> Option<AudioCue> {
        if self.delay.tick(now, self.period) {
            debug!("delay timer expired");
        }
        self.sound
            .tick(now, self.period)
            .then_some(AudioCue::ToneOff)
    }

    pub fn reset(&mut self) {
        self.delay = Timer::default();
        self.sound = Timer::default();
    }
}
