//! Fetch, decode and execute.
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::display::DisplayBuffer;
use crate::error::{Chip8Error, Chip8Result};
use crate::input::{KeyWait, Keypad};
use crate::instruction::{Instruction, Operands, decode};
use crate::quirks::{Quirks, Settings};
use crate::snapshot::Snapshot;
use crate::state::{Address, Chip8State, FONT_ADDR, FONT_HEIGHT, INDEX_MASK, Register};
use crate::timer::{AudioCue, Clock, SystemClock, Timers};

/// What happens to the program counter after an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    /// Advance to the following instruction.
    Next,
    /// Advance past the following instruction.
    Skip,
    Jump(Address),
    /// Stay on this instruction; it runs again next cycle.
    Wait,
}

impl Flow {
    fn skip_if(condition: bool) -> Self {
        if condition { Flow::Skip } else { Flow::Next }
    }
}

pub struct Interpreter<C: Clock = SystemClock> {
    state: Chip8State,
    display: DisplayBuffer,
    timers: Timers,
    keypad: Keypad,
    key_wait: KeyWait,
    settings: Settings,
    clock: C,
    rng: StdRng,
    audio_cues: Vec<AudioCue>,
}

impl<C: Clock> Interpreter<C> {
    pub fn new(settings: Settings, clock: C) -> Chip8Result<Self> {
        settings.validate()?;
        info!("interpreter settings: {settings:?}");

        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Interpreter {
            state: Chip8State::new(),
            display: DisplayBuffer::new(
                settings.display_width,
                settings.display_height,
                settings.quirks.wrap_sprites,
            ),
            timers: Timers::new(settings.timing.timer_period()),
            keypad: Keypad::new(),
            key_wait: KeyWait::Idle,
            settings,
            clock,
            rng,
            audio_cues: Vec::new(),
        })
    }

    /// Copies `rom` to the program area and resets the machine to run it.
    pub fn load_rom(&mut self, rom: &[u8]) -> Chip8Result<()> {
        self.state.memory.load_rom(rom)?;
        self.state.reset();
        self.display.clear();
        if self.timers.sound.value() > 0 {
            self.audio_cues.push(AudioCue::ToneOff);
        }
        self.timers.reset();
        self.keypad.release_all();
        self.key_wait = KeyWait::Idle;
        info!("loaded {} byte ROM", rom.len());
        Ok(())
    }

    /// Runs a single instruction.
    ///
    /// On error the program counter still points at the failing instruction.
    pub fn step(&mut self) -> Chip8Result<()> {
        let raw = self.state.fetch()?;
        trace!("{:03X}: {raw:04X}", self.state.pc);

        let instruction = decode(raw)?;
        match self.execute(instruction)? {
            Flow::Next => self.state.pc += 2,
            Flow::Skip => self.state.pc += 4,
            Flow::Jump(addr) => self.state.pc = addr,
            Flow::Wait => {}
        }
        Ok(())
    }

    /// Decays both timers against the clock.
    pub fn tick_timers(&mut self) {
        let now = self.clock.now();
        if let Some(cue) = self.timers.tick(now) {
            debug!("sound timer expired");
            self.audio_cues.push(cue);
        }
    }

    pub fn key_down(&mut self, key: u8) {
        self.keypad.press_key(key);
        self.key_wait.key_down(key);
    }

    pub fn key_up(&mut self, key: u8) {
        self.keypad.release_key(key);
        if let Some((register, key)) = self.key_wait.key_up(key) {
            debug!("key {key:X} released, stored in {register:?}");
            self.state.registers.write(register, key);
            self.state.pc += 2;
        }
    }

    pub fn is_waiting_for_key(&self) -> bool {
        self.key_wait.is_waiting()
    }

    pub fn display(&self) -> &DisplayBuffer {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayBuffer {
        &mut self.display
    }

    /// Audio signals raised since the last call, oldest first.
    pub fn drain_audio_cues(&mut self) -> std::vec::Drain<'_, AudioCue> {
        self.audio_cues.drain(..)
    }

    pub fn state(&self) -> &Chip8State {
        &self.state
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.state.registers.read(reg)
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay.value()
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound.value()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pc: self.state.pc,
            index: self.state.index,
            registers: self.state.registers.as_array(),
            delay_timer: self.timers.delay.value(),
            sound_timer: self.timers.sound.value(),
            stack: self.state.stack.clone(),
            memory: Box::new(*self.state.memory.as_bytes()),
        }
    }

    fn quirks(&self) -> Quirks {
        self.settings.quirks
    }

    fn execute(&mut self, instruction: Instruction) -> Chip8Result<Flow> {
        use Instruction::*;

        let flow = match instruction {
            ClearScreen => {
                self.display.clear();
                Flow::Next
            }
            SubroutineReturn => {
                let return_address = self.state.stack.pop().ok_or(Chip8Error::StackUnderflow)?;
                Flow::Jump(return_address)
            }
            Jump(ops) => Flow::Jump(ops.nnn),
            SubroutineCall(ops) => {
                if let Some(limit) = self.settings.stack_limit {
                    if self.state.stack.len() >= limit {
                        return Err(Chip8Error::StackOverflow(limit));
                    }
                }
                self.state.stack.push(self.state.pc + 2);
                Flow::Jump(ops.nnn)
            }
            SkipEqImmediate(ops) => Flow::skip_if(self.vx(ops) == ops.kk),
            SkipNeqImmediate(ops) => Flow::skip_if(self.vx(ops) != ops.kk),
            SkipEqRegister(ops) => Flow::skip_if(self.vx(ops) == self.vy(ops)),
            SkipNeqRegister(ops) => Flow::skip_if(self.vx(ops) != self.vy(ops)),
            SetImmediate(ops) => {
                self.state.registers.write(ops.x, ops.kk);
                Flow::Next
            }
            AddImmediate(ops) => {
                let sum = self.vx(ops).wrapping_add(ops.kk);
                self.state.registers.write(ops.x, sum);
                Flow::Next
            }
            SetXToY(ops) => {
                self.state.registers.write(ops.x, self.vy(ops));
                Flow::Next
            }
            BinaryOr(ops) => self.logic(ops, |x, y| x | y),
            BinaryAnd(ops) => self.logic(ops, |x, y| x & y),
            BinaryXor(ops) => self.logic(ops, |x, y| x ^ y),
            AddRegister(ops) => {
                let (sum, carry) = self.vx(ops).overflowing_add(self.vy(ops));
                self.state.registers.write(ops.x, sum);
                self.state.registers.set_flag(carry);
                Flow::Next
            }
            SubtractYFromX(ops) => self.subtract(ops.x, self.vx(ops), self.vy(ops)),
            SubtractXFromY(ops) => self.subtract(ops.x, self.vy(ops), self.vx(ops)),
            RightShift(ops) => {
                let value = self.shift_source(ops);
                self.state.registers.write(ops.x, value >> 1);
                self.state.registers.set_flag(value & 0x01 == 1);
                Flow::Next
            }
            LeftShift(ops) => {
                let value = self.shift_source(ops);
                self.state.registers.write(ops.x, value << 1);
                self.state.registers.set_flag(value & 0x80 != 0);
                Flow::Next
            }
            SetIndex(ops) => {
                self.state.index = ops.nnn;
                Flow::Next
            }
            JumpWithOffset(ops) => {
                let offset = usize::from(self.state.registers.read(Register::V0));
                Flow::Jump(ops.nnn + offset)
            }
            Random(ops) => {
                let value = self.rng.random::<u8>() & ops.kk;
                self.state.registers.write(ops.x, value);
                Flow::Next
            }
            Draw(ops) => {
                let (x, y) = (self.vx(ops), self.vy(ops));
                let collision =
                    self.display
                        .draw_sprite(x, y, ops.n, &self.state.memory, self.state.index)?;
                self.state.registers.set_flag(collision);
                Flow::Next
            }
            SkipIfKeyPressed(ops) => Flow::skip_if(self.keypad.is_key_pressed(self.vx(ops))),
            SkipIfKeyNotPressed(ops) => Flow::skip_if(!self.keypad.is_key_pressed(self.vx(ops))),
            GetDelayTimer(ops) => {
                self.state.registers.write(ops.x, self.timers.delay.value());
                Flow::Next
            }
            WaitForKey(ops) => {
                if !self.key_wait.is_waiting() {
                    debug!("waiting for key into {:?}", ops.x);
                }
                self.key_wait.begin(ops.x);
                Flow::Wait
            }
            SetDelayTimer(ops) => {
                let now = self.clock.now();
                self.timers.set_delay(self.vx(ops), now);
                Flow::Next
            }
            SetSoundTimer(ops) => {
                let now = self.clock.now();
                if let Some(cue) = self.timers.set_sound(self.vx(ops), now) {
                    debug!("sound timer set: {cue:?}");
                    self.audio_cues.push(cue);
                }
                Flow::Next
            }
            AddToIndex(ops) => {
                let sum = self.state.index + usize::from(self.vx(ops));
                self.state.index = sum & INDEX_MASK;
                Flow::Next
            }
            FontChar(ops) => {
                let digit = self.vx(ops);
                if digit > 0xF {
                    return Err(Chip8Error::InvalidDigit(digit));
                }
                self.state.index = FONT_ADDR + usize::from(digit) * FONT_HEIGHT;
                Flow::Next
            }
            BinaryCodedDecimal(ops) => {
                let value = self.vx(ops);
                let bcd = [value / 100, (value / 10) % 10, value % 10];
                for (offset, digit) in bcd.into_iter().enumerate() {
                    self.state.memory.write(self.state.index + offset, digit)?;
                }
                Flow::Next
            }
            Store(ops) => {
                let base = self.state.index;
                for (offset, reg) in ops.x.up_to().enumerate() {
                    let value = self.state.registers.read(reg);
                    self.state.memory.write(base + offset, value)?;
                }
                self.advance_index(ops.x);
                Flow::Next
            }
            Load(ops) => {
                let base = self.state.index;
                for (offset, reg) in ops.x.up_to().enumerate() {
                    let value = self.state.memory.read(base + offset)?;
                    self.state.registers.write(reg, value);
                }
                self.advance_index(ops.x);
                Flow::Next
            }
        };

        Ok(flow)
    }

    fn vx(&self, ops: Operands) -> u8 {
        self.state.registers.read(ops.x)
    }

    fn vy(&self, ops: Operands) -> u8 {
        self.state.registers.read(ops.y)
    }

    fn logic(&mut self, ops: Operands, op: impl Fn(u8, u8) -> u8) -> Flow {
        let result = op(self.vx(ops), self.vy(ops));
        self.state.registers.write(ops.x, result);
        if self.quirks().logic_resets_vf {
            self.state.registers.set_flag(false);
        }
        Flow::Next
    }

    /// `dest = minuend - subtrahend`, VF set when no borrow occurs.
    fn subtract(&mut self, dest: Register, minuend: u8, subtrahend: u8) -> Flow {
        self.state
            .registers
            .write(dest, minuend.wrapping_sub(subtrahend));
        self.state.registers.set_flag(minuend >= subtrahend);
        Flow::Next
    }

    fn shift_source(&mut self, ops: Operands) -> u8 {
        if self.quirks().shift_uses_vy {
            let value = self.vy(ops);
            self.state.registers.write(ops.x, value);
        }
        self.vx(ops)
    }

    fn advance_index(&mut self, last: Register) {
        if self.quirks().increment_index {
            let count = last as usize + 1;
            self.state.index = (self.state.index + count) & INDEX_MASK;
        }
    }
}
