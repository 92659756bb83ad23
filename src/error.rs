//! Result and errors.
use crate::snapshot::Snapshot;
use crate::state::Address;

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    /// No instruction matches the fetched word.
    #[error("invalid opcode: {0:#06X}")]
    InvalidOpcode(u16),

    /// The program counter or a computed memory index fell outside RAM.
    #[error("address out of bounds: {0:#05X}")]
    AddressBounds(Address),

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,

    /// Only raised when a stack limit is configured.
    #[error("stack overflow: call depth exceeds {0}")]
    StackOverflow(usize),

    /// Font lookup for a value that has no glyph.
    #[error("invalid font digit: {0:#04X}")]
    InvalidDigit(u8),

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("invalid settings: {0}")]
    InvalidSettings(&'static str),

    /// A collaborator (renderer, input source) failed.
    #[error("device i/o failed: {0}")]
    Device(#[from] std::io::Error),
}

/// A fatal error together with the machine state at the moment it happened.
#[derive(Debug, thiserror::Error)]
#[error("{error} (pc {:#05X})", .snapshot.pc)]
pub struct Fault {
    #[source]
    pub error: Chip8Error,
    pub snapshot: Box<Snapshot>,
}
