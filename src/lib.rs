pub mod devices;
pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod quirks;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod timer;

pub mod prelude {
    pub use super::{
        devices::{Beeper, InputEvent, InputSource, Renderer},
        display::{Damage, DisplayBuffer, Rect},
        error::{Chip8Error, Chip8Result, Fault},
        interpreter::Interpreter,
        quirks::{Quirks, Settings, Timing},
        scheduler::{PassReport, Scheduler},
        snapshot::Snapshot,
        state::Register,
        timer::{AudioCue, Clock, ManualClock, SystemClock},
    };
}
