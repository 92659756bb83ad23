use crate::error::{Chip8Error, Chip8Result};

pub type Address = usize;
pub type CallStack = Vec<Address>;

pub const MEM_SIZE: usize = 4096;
pub const FONT_ADDR: Address = 0x000;
pub const FONT_HEIGHT: usize = 5;
pub const PC_START_ADDR: Address = 0x200;
/// Highest address an instruction may start at; the low byte lives at 0xFFF.
pub const PC_END_ADDR: Address = MEM_SIZE - 2;
pub const MAX_ROM_SIZE: usize = MEM_SIZE - PC_START_ADDR;
pub const NUM_REGISTERS: usize = 16;
/// I is 16 bits wide but only the low 12 bits address memory.
pub const INDEX_MASK: Address = 0x0FFF;

const FONT_DATA: [u8; 16 * FONT_HEIGHT] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Flat 4 KiB RAM with the hex font baked into the bottom.
pub struct Memory {
    data: [u8; MEM_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        let data = {
            let mut data = [0; MEM_SIZE];
            data[FONT_ADDR..FONT_ADDR + FONT_DATA.len()].copy_from_slice(&FONT_DATA);
            data
        };

        Memory { data }
    }

    pub fn read(&self, addr: Address) -> Chip8Result<u8> {
        self.data
            .get(addr)
            .copied()
            .ok_or(Chip8Error::AddressBounds(addr))
    }

    pub fn write(&mut self, addr: Address, value: u8) -> Chip8Result<()> {
        let cell = self
            .data
            .get_mut(addr)
            .ok_or(Chip8Error::AddressBounds(addr))?;
        *cell = value;
        Ok(())
    }

    /// Big-endian instruction word at `addr`.
    pub fn read_word(&self, addr: Address) -> Chip8Result<u16> {
        let high_byte = u16::from(self.read(addr)?);
        let low_byte = u16::from(self.read(addr + 1)?);
        Ok((high_byte << 8) | low_byte)
    }

    /// Wipes program space and copies `rom` to the program start address.
    pub fn load_rom(&mut self, rom: &[u8]) -> Chip8Result<()> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }
        self.data[PC_START_ADDR..].fill(0);
        self.data[PC_START_ADDR..PC_START_ADDR + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    pub fn slice(&self, addr: Address, len: usize) -> Chip8Result<&[u8]> {
        let end = addr + len;
        if end > MEM_SIZE {
            // Report the first byte that is actually out of range.
            return Err(Chip8Error::AddressBounds(addr.max(MEM_SIZE)));
        }
        Ok(&self.data[addr..end])
    }

    pub fn as_bytes(&self) -> &[u8; MEM_SIZE] {
        &self.data
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}

impl Register {
    const ALL: [Register; NUM_REGISTERS] = [
        Register::V0,
        Register::V1,
        Register::V2,
        Register::V3,
        Register::V4,
        Register::V5,
        Register::V6,
        Register::V7,
        Register::V8,
        Register::V9,
        Register::VA,
        Register::VB,
        Register::VC,
        Register::VD,
        Register::VE,
        Register::VF,
    ];

    /// Only the low nibble is significant, so this never fails.
    pub fn from_nibble(nibble: u8) -> Self {
        Self::ALL[usize::from(nibble & 0x0F)]
    }

    /// V0 through `self`, inclusive.
    pub fn up_to(self) -> impl Iterator<Item = Register> {
        Self::ALL.into_iter().take(self as usize + 1)
    }
}

pub struct RegisterBank {
    registers: [u8; NUM_REGISTERS],
}

impl RegisterBank {
    pub fn new() -> Self {
        RegisterBank {
            registers: [0; NUM_REGISTERS],
        }
    }

    pub fn read(&self, reg: Register) -> u8 {
        self.registers[reg as usize]
    }

    pub fn write(&mut self, reg: Register, value: u8) {
        self.registers[reg as usize] = value;
    }

    /// Writes the flag register. Callers do this after the data write so a
    /// flag result wins when the destination is VF itself.
    pub fn set_flag(&mut self, set: bool) {
        self.write(Register::VF, u8::from(set));
    }

    pub fn as_array(&self) -> [u8; NUM_REGISTERS] {
        self.registers
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

/// Memory plus the register file.
pub struct Chip8State {
    pub memory: Memory,
    pub registers: RegisterBank,
    pub pc: Address,
    pub index: Address,
    pub stack: CallStack,
}

impl Chip8State {
    pub fn new() -> Self {
        Chip8State {
            memory: Memory::new(),
            registers: RegisterBank::new(),
            pc: PC_START_ADDR,
            index: 0,
            stack: Vec::new(),
        }
    }

    /// Clears everything except memory contents.
    pub fn reset(&mut self) {
        self.registers = RegisterBank::new();
        self.pc = PC_START_ADDR;
        self.index = 0;
        self.stack.clear();
    }

    pub fn fetch(&self) -> Chip8Result<u16> {
        if !(PC_START_ADDR..=PC_END_ADDR).contains(&self.pc) {
            return Err(Chip8Error::AddressBounds(self.pc));
        }
        self.memory.read_word(self.pc)
    }
}

impl Default for Chip8State {
    fn default() -> Self {
        Self::new()
    }
}
