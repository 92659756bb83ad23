//! Hooks for the IO devices around the interpreter.
use crate::display::{Damage, DisplayBuffer};

/// Events from the keypad source, already mapped to hex keys 0x0-0xF.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(u8),
    KeyUp(u8),
    /// Stop the run loop.
    Quit,
}

pub trait InputSource {
    /// Next pending event, without blocking.
    fn poll(&mut self) -> Option<InputEvent>;
}

pub trait Renderer {
    /// Show the buffer. `damage` lists what changed since the previous call.
    fn present(&mut self, display: &DisplayBuffer, damage: &Damage) -> std::io::Result<()>;
}

/// Turns the buzzer on or off. There is no pitch control.
pub trait Beeper {
    fn tone_on(&mut self);
    fn tone_off(&mut self);
}
