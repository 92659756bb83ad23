use crate::error::{Chip8Error, Chip8Result};
use crate::state::{Address, Register};

/// Every addressing view of a raw instruction word.
///
/// All views are extracted up front so one decode step serves every operand
/// shape; handlers pick the fields they need.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operands {
    /// First nibble. Represents the operation class.
    pub opcode: u8,
    /// Second nibble. Used to look up one of the 16 registers.
    pub x: Register,
    /// Third nibble. Used to look up one of the 16 registers.
    pub y: Register,
    /// Fourth nibble. A 4-bit number.
    pub n: u8,
    /// The second byte (third and fourth nibbles). An 8-bit immediate number.
    pub kk: u8,
    /// The second, third, and fourth nibbles. A 12-bit immediate address.
    pub nnn: Address,
}

impl Operands {
    pub fn new(raw: u16) -> Self {
        Operands {
            opcode: (raw >> 12) as u8,
            x: Register::from_nibble((raw >> 8) as u8),
            y: Register::from_nibble((raw >> 4) as u8),
            n: (raw & 0x0F) as u8,
            kk: (raw & 0x00FF) as u8,
            nnn: usize::from(raw & 0x0FFF),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0`
    ClearScreen,
    /// `00EE`
    SubroutineReturn,
    /// `1nnn`
    Jump(Operands),
    /// `2nnn`
    SubroutineCall(Operands),
    /// `3xkk`
    SkipEqImmediate(Operands),
    /// `4xkk`
    SkipNeqImmediate(Operands),
    /// `5xy0`
    SkipEqRegister(Operands),
    /// `6xkk`
    SetImmediate(Operands),
    /// `7xkk`
    AddImmediate(Operands),
    /// `8xy0`
    SetXToY(Operands),
    /// `8xy1`
    BinaryOr(Operands),
    /// `8xy2`
    BinaryAnd(Operands),
    /// `8xy3`
    BinaryXor(Operands),
    /// `8xy4`
    AddRegister(Operands),
    /// `8xy5`
    SubtractYFromX(Operands),
    /// `8xy6`
    RightShift(Operands),
    /// `8xy7`
    SubtractXFromY(Operands),
    /// `8xyE`
    LeftShift(Operands),
    /// `9xy0`
    SkipNeqRegister(Operands),
    /// `Annn`
    SetIndex(Operands),
    /// `Bnnn`
    JumpWithOffset(Operands),
    /// `Cxkk`
    Random(Operands),
    /// `Dxyn`
    Draw(Operands),
    /// `Ex9E`
    SkipIfKeyPressed(Operands),
    /// `ExA1`
    SkipIfKeyNotPressed(Operands),
    /// `Fx07`
    GetDelayTimer(Operands),
    /// `Fx0A`
    WaitForKey(Operands),
    /// `Fx15`
    SetDelayTimer(Operands),
    /// `Fx18`
    SetSoundTimer(Operands),
    /// `Fx1E`
    AddToIndex(Operands),
    /// `Fx29`
    FontChar(Operands),
    /// `Fx33`
    BinaryCodedDecimal(Operands),
    /// `Fx55`
    Store(Operands),
    /// `Fx65`
    Load(Operands),
}

/// The `F` class is sparse, so its members are keyed by the low byte.
const F_CLASS: [(u8, fn(Operands) -> Instruction); 9] = [
    (0x07, Instruction::GetDelayTimer),
    (0x0A, Instruction::WaitForKey),
    (0x15, Instruction::SetDelayTimer),
    (0x18, Instruction::SetSoundTimer),
    (0x1E, Instruction::AddToIndex),
    (0x29, Instruction::FontChar),
    (0x33, Instruction::BinaryCodedDecimal),
    (0x55, Instruction::Store),
    (0x65, Instruction::Load),
];

pub fn decode(raw: u16) -> Chip8Result<Instruction> {
    let decoded = Operands::new(raw);
    let invalid = Chip8Error::InvalidOpcode(raw);

    let instruction = match decoded.opcode {
        0x0 => match decoded.nnn {
            0x0E0 => Instruction::ClearScreen,
            0x0EE => Instruction::SubroutineReturn,
            // Machine language routines (0nnn) are not supported.
            _ => return Err(invalid),
        },
        0x1 => Instruction::Jump(decoded),
        0x2 => Instruction::SubroutineCall(decoded),
        0x3 => Instruction::SkipEqImmediate(decoded),
        0x4 => Instruction::SkipNeqImmediate(decoded),
        0x5 if decoded.n == 0 => Instruction::SkipEqRegister(decoded),
        0x6 => Instruction::SetImmediate(decoded),
        0x7 => Instruction::AddImmediate(decoded),
        0x8 => match decoded.n {
            0x0 => Instruction::SetXToY(decoded),
            0x1 => Instruction::BinaryOr(decoded),
            0x2 => Instruction::BinaryAnd(decoded),
            0x3 => Instruction::BinaryXor(decoded),
            0x4 => Instruction::AddRegister(decoded),
            0x5 => Instruction::SubtractYFromX(decoded),
            0x6 => Instruction::RightShift(decoded),
            0x7 => Instruction::SubtractXFromY(decoded),
            0xE => Instruction::LeftShift(decoded),
            _ => return Err(invalid),
        },
        0x9 if decoded.n == 0 => Instruction::SkipNeqRegister(decoded),
        0xA => Instruction::SetIndex(decoded),
        0xB => Instruction::JumpWithOffset(decoded),
        0xC => Instruction::Random(decoded),
        0xD => Instruction::Draw(decoded),
        0xE => match decoded.kk {
            0x9E => Instruction::SkipIfKeyPressed(decoded),
            0xA1 => Instruction::SkipIfKeyNotPressed(decoded),
            _ => return Err(invalid),
        },
        0xF => match F_CLASS.iter().find(|(low, _)| *low == decoded.kk) {
            Some((_, build)) => build(decoded),
            None => return Err(invalid),
        },
        _ => return Err(invalid),
    };

    Ok(instruction)
}
