//! Paces instructions, timers and presentation against the wall clock.
use std::time::Duration;

use log::{error, info};

use crate::devices::{Beeper, InputEvent, InputSource, Renderer};
use crate::error::{Chip8Error, Fault};
use crate::interpreter::Interpreter;
use crate::timer::{AudioCue, Clock, SystemClock};

/// Budgets never hold more than this much unspent time, so a long stall
/// is not followed by a burst of catch-up work.
const MAX_BACKLOG: Duration = Duration::from_millis(250);

/// Time accumulated towards one kind of periodic work.
struct Budget {
    period: Duration,
    accumulated: Duration,
}

impl Budget {
    fn new(period: Duration) -> Self {
        Budget {
            period,
            accumulated: Duration::ZERO,
        }
    }

    fn add(&mut self, elapsed: Duration) {
        let cap = self.period.max(MAX_BACKLOG);
        self.accumulated = (self.accumulated + elapsed).min(cap);
    }

    /// Spends one period if a full one is available.
    fn take(&mut self) -> bool {
        if self.accumulated >= self.period {
            self.accumulated -= self.period;
            true
        } else {
            false
        }
    }

    fn remaining(&self) -> Duration {
        self.period.saturating_sub(self.accumulated)
    }
}

/// What a single scheduler pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub executed: bool,
    pub timers_ticked: bool,
    pub presented: bool,
}

pub struct Scheduler<C: Clock = SystemClock> {
    interpreter: Interpreter<C>,
    last_pass: Duration,
    cpu: Budget,
    timers: Budget,
    display: Budget,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(interpreter: Interpreter<C>) -> Self {
        let timing = interpreter.settings().timing;
        let last_pass = interpreter.clock().now();
        Scheduler {
            interpreter,
            last_pass,
            cpu: Budget::new(timing.instruction_period()),
            timers: Budget::new(timing.timer_period()),
            display: Budget::new(timing.display_period()),
        }
    }

    pub fn interpreter(&self) -> &Interpreter<C> {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter<C> {
        &mut self.interpreter
    }

    /// At most one instruction, one timer decay and one presentation.
    /// Unspent time carries over to the next pass.
    pub fn pass<R, B>(&mut self, renderer: &mut R, beeper: &mut B) -> Result<PassReport, Fault>
    where
        R: Renderer + ?Sized,
        B: Beeper + ?Sized,
    {
        let now = self.interpreter.clock().now();
        let elapsed = now.saturating_sub(self.last_pass);
        self.last_pass = now;
        self.cpu.add(elapsed);
        self.timers.add(elapsed);
        self.display.add(elapsed);

        let mut report = PassReport::default();

        if self.cpu.take() {
            self.interpreter.step().map_err(|err| self.fault(err))?;
            report.executed = true;
        }

        if self.timers.take() {
            self.interpreter.tick_timers();
            report.timers_ticked = true;
        }

        for cue in self.interpreter.drain_audio_cues() {
            match cue {
                AudioCue::ToneOn => beeper.tone_on(),
                AudioCue::ToneOff => beeper.tone_off(),
            }
        }

        if self.display.take() && self.interpreter.display().is_dirty() {
            let damage = self.interpreter.display_mut().take_damage();
            renderer
                .present(self.interpreter.display(), &damage)
                .map_err(|err| self.fault(err.into()))?;
            report.presented = true;
        }

        Ok(report)
    }

    /// Feeds input and runs passes until the input source asks to quit.
    pub fn run<I, R, B>(
        &mut self,
        input: &mut I,
        renderer: &mut R,
        beeper: &mut B,
    ) -> Result<(), Fault>
    where
        I: InputSource + ?Sized,
        R: Renderer + ?Sized,
        B: Beeper + ?Sized,
    {
        loop {
            while let Some(event) = input.poll() {
                match event {
                    InputEvent::KeyDown(key) => self.interpreter.key_down(key),
                    InputEvent::KeyUp(key) => self.interpreter.key_up(key),
                    InputEvent::Quit => {
                        info!("quit requested");
                        beeper.tone_off();
                        return Ok(());
                    }
                }
            }

            let report = self.pass(renderer, beeper)?;
            if !report.executed {
                std::thread::sleep(self.idle_time());
            }
        }
    }

    /// Time until the next piece of work is due.
    fn idle_time(&self) -> Duration {
        self.cpu
            .remaining()
            .min(self.timers.remaining())
            .min(self.display.remaining())
    }

    fn fault(&self, error: Chip8Error) -> Fault {
        let snapshot = self.interpreter.snapshot();
        error!("fatal: {error}");
        Fault {
            error,
            snapshot: Box::new(snapshot),
        }
    }
}
