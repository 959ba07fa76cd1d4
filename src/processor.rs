//! This module contains the CHIP-8 central processing unit. The CPU fetches
//! the instruction at the program counter, decodes it, and applies the
//! corresponding state transition to its registers and to the rest of the
//! machine through the [`Bus`].

use crate::error::Error;
use crate::instruction::Instruction;
use crate::memory::{FONT_BASE, GLYPH_SIZE, PROGRAM_START};

use super::Bus;

/// Maximum call depth before `2NNN` reports a stack overflow.
const STACK_DEPTH: usize = 16;

/// Describes how the program counter should move after executing an
/// instruction. The fetch has already advanced it past the current
/// instruction, so `Next` leaves it alone.
enum ProgramCounterUpdate {
    /// Proceed to the instruction the fetch advanced to.
    Next,

    /// Skip one instruction (pc + 2).
    SkipNext,

    /// Jump to the given address.
    Jump(u16),

    /// Re-execute the current instruction on the next step.
    Repeat,
}

/// This struct represents the central processing unit of a CHIP-8 machine.
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Cpu {
    /// The sixteen 8-bit general purpose registers V0 to VF. VF doubles as
    /// the flag output of the arithmetic, shift, and draw instructions.
    pub v: [u8; 16],

    /// The 16-bit index register.
    pub i: u16,

    /// The program counter.
    pub pc: u16,

    /// The stack pointer; indexes the first free stack slot.
    pub sp: usize,

    /// The call stack of saved program counter values.
    pub stack: [u16; STACK_DEPTH],
}

impl Cpu {
    /// Create a new [`Cpu`] with the program counter at the program entry point.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            stack: [0; STACK_DEPTH],
        }
    }

    /// Execute one instruction: fetch the two bytes at the program counter,
    /// advance it, decode, and dispatch.
    ///
    /// # Errors
    ///
    /// Returns the failure the instruction reported; see [`Error`] for the
    /// conditions and their recoveries. State is never left corrupted, so the
    /// host may keep stepping after a non-fatal error.
    pub fn step(&mut self, bus: &mut Bus) -> Result<(), Error> {
        let address = self.pc;
        let high = bus.memory.read(address)?;
        let low = bus.memory.read(address.wrapping_add(1))?;
        let opcode = u16::from(high) << 8 | u16::from(low);
        self.pc = self.pc.wrapping_add(2);

        let instruction = match Instruction::decode(opcode) {
            Ok(instruction) => instruction,
            Err(err) => {
                log::error!("unrecognized instruction {opcode:#06X} at {address:#06X}");
                return Err(err);
            }
        };
        log::trace!("{address:#06X}: {instruction}");

        match self.execute(instruction, bus)? {
            ProgramCounterUpdate::Next => {}
            ProgramCounterUpdate::SkipNext => self.pc = self.pc.wrapping_add(2),
            ProgramCounterUpdate::Jump(addr) => self.pc = addr,
            ProgramCounterUpdate::Repeat => self.pc = self.pc.wrapping_sub(2),
        }
        Ok(())
    }

    fn execute(
        &mut self,
        instruction: Instruction,
        bus: &mut Bus,
    ) -> Result<ProgramCounterUpdate, Error> {
        match instruction {
            Instruction::ClearScreen => Self::op_00e0(bus),
            Instruction::Return => self.op_00ee(),
            Instruction::Jump { nnn } => Self::op_1nnn(nnn),
            Instruction::Call { nnn } => self.op_2nnn(nnn),
            Instruction::SkipEqImm { x, nn } => self.op_3xnn(x, nn),
            Instruction::SkipNeImm { x, nn } => self.op_4xnn(x, nn),
            Instruction::SkipEqReg { x, y } => self.op_5xy0(x, y),
            Instruction::LoadImm { x, nn } => self.op_6xnn(x, nn),
            Instruction::AddImm { x, nn } => self.op_7xnn(x, nn),
            Instruction::Move { x, y } => self.op_8xy0(x, y),
            Instruction::Or { x, y } => self.op_8xy1(x, y),
            Instruction::And { x, y } => self.op_8xy2(x, y),
            Instruction::Xor { x, y } => self.op_8xy3(x, y),
            Instruction::Add { x, y } => self.op_8xy4(x, y),
            Instruction::Sub { x, y } => self.op_8xy5(x, y),
            Instruction::ShiftRight { x } => self.op_8xy6(x),
            Instruction::SubFrom { x, y } => self.op_8xy7(x, y),
            Instruction::ShiftLeft { x } => self.op_8xye(x),
            Instruction::SkipNeReg { x, y } => self.op_9xy0(x, y),
            Instruction::LoadIndex { nnn } => self.op_annn(nnn),
            Instruction::JumpOffset { nnn } => self.op_bnnn(nnn),
            Instruction::Random { x, nn } => self.op_cxnn(x, nn),
            Instruction::Draw { x, y, n } => self.op_dxyn(bus, x, y, n),
            Instruction::SkipKeyPressed { x } => self.op_ex9e(bus, x),
            Instruction::SkipKeyNotPressed { x } => self.op_exa1(bus, x),
            Instruction::ReadDelay { x } => self.op_fx07(bus, x),
            Instruction::WaitKey { x } => self.op_fx0a(bus, x),
            Instruction::SetDelay { x } => self.op_fx15(bus, x),
            Instruction::SetSound { x } => self.op_fx18(bus, x),
            Instruction::AddIndex { x } => self.op_fx1e(x),
            Instruction::LoadGlyph { x } => self.op_fx29(x),
            Instruction::StoreBcd { x } => self.op_fx33(bus, x),
            Instruction::StoreRegisters { x } => self.op_fx55(bus, x),
            Instruction::LoadRegisters { x } => self.op_fx65(bus, x),
        }
    }

    /// Index register plus a small offset, checked against address overflow.
    fn index_addr(&self, offset: u16) -> Result<u16, Error> {
        self.i
            .checked_add(offset)
            .ok_or(Error::OutOfBounds { address: self.i })
    }

    fn op_00e0(bus: &mut Bus) -> Result<ProgramCounterUpdate, Error> {
        bus.graphics.clear();
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_00ee(&mut self) -> Result<ProgramCounterUpdate, Error> {
        if self.sp == 0 {
            // defined recovery: restart at the program entry point
            self.pc = PROGRAM_START;
            return Err(Error::StackUnderflow);
        }
        self.sp -= 1;
        Ok(ProgramCounterUpdate::Jump(self.stack[self.sp]))
    }

    fn op_1nnn(nnn: u16) -> Result<ProgramCounterUpdate, Error> {
        Ok(ProgramCounterUpdate::Jump(nnn))
    }

    fn op_2nnn(&mut self, nnn: u16) -> Result<ProgramCounterUpdate, Error> {
        if self.sp == STACK_DEPTH {
            return Err(Error::StackOverflow);
        }
        // pc already points past the call, so it is the return address
        self.stack[self.sp] = self.pc;
        self.sp += 1;
        Ok(ProgramCounterUpdate::Jump(nnn))
    }

    fn op_3xnn(&mut self, x: usize, nn: u8) -> Result<ProgramCounterUpdate, Error> {
        if self.v[x] == nn {
            Ok(ProgramCounterUpdate::SkipNext)
        } else {
            Ok(ProgramCounterUpdate::Next)
        }
    }

    fn op_4xnn(&mut self, x: usize, nn: u8) -> Result<ProgramCounterUpdate, Error> {
        if self.v[x] != nn {
            Ok(ProgramCounterUpdate::SkipNext)
        } else {
            Ok(ProgramCounterUpdate::Next)
        }
    }

    fn op_5xy0(&mut self, x: usize, y: usize) -> Result<ProgramCounterUpdate, Error> {
        if self.v[x] == self.v[y] {
            Ok(ProgramCounterUpdate::SkipNext)
        } else {
            Ok(ProgramCounterUpdate::Next)
        }
    }

    fn op_6xnn(&mut self, x: usize, nn: u8) -> Result<ProgramCounterUpdate, Error> {
        self.v[x] = nn;
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_7xnn(&mut self, x: usize, nn: u8) -> Result<ProgramCounterUpdate, Error> {
        self.v[x] = self.v[x].wrapping_add(nn);
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_8xy0(&mut self, x: usize, y: usize) -> Result<ProgramCounterUpdate, Error> {
        self.v[x] = self.v[y];
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_8xy1(&mut self, x: usize, y: usize) -> Result<ProgramCounterUpdate, Error> {
        self.v[x] |= self.v[y];
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_8xy2(&mut self, x: usize, y: usize) -> Result<ProgramCounterUpdate, Error> {
        self.v[x] &= self.v[y];
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_8xy3(&mut self, x: usize, y: usize) -> Result<ProgramCounterUpdate, Error> {
        self.v[x] ^= self.v[y];
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_8xy4(&mut self, x: usize, y: usize) -> Result<ProgramCounterUpdate, Error> {
        let (result, carry) = self.v[x].overflowing_add(self.v[y]);
        self.v[x] = result;
        self.v[0xF] = u8::from(carry);
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_8xy5(&mut self, x: usize, y: usize) -> Result<ProgramCounterUpdate, Error> {
        let (result, borrow) = self.v[x].overflowing_sub(self.v[y]);
        self.v[x] = result;
        self.v[0xF] = u8::from(!borrow);
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_8xy6(&mut self, x: usize) -> Result<ProgramCounterUpdate, Error> {
        // the shifted-out bit is captured before the shift
        let bit = self.v[x] & 1;
        self.v[x] >>= 1;
        self.v[0xF] = bit;
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_8xy7(&mut self, x: usize, y: usize) -> Result<ProgramCounterUpdate, Error> {
        let (result, borrow) = self.v[y].overflowing_sub(self.v[x]);
        self.v[x] = result;
        self.v[0xF] = u8::from(!borrow);
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_8xye(&mut self, x: usize) -> Result<ProgramCounterUpdate, Error> {
        let bit = (self.v[x] >> 7) & 1;
        self.v[x] <<= 1;
        self.v[0xF] = bit;
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_9xy0(&mut self, x: usize, y: usize) -> Result<ProgramCounterUpdate, Error> {
        if self.v[x] != self.v[y] {
            Ok(ProgramCounterUpdate::SkipNext)
        } else {
            Ok(ProgramCounterUpdate::Next)
        }
    }

    fn op_annn(&mut self, nnn: u16) -> Result<ProgramCounterUpdate, Error> {
        self.i = nnn;
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_bnnn(&mut self, nnn: u16) -> Result<ProgramCounterUpdate, Error> {
        Ok(ProgramCounterUpdate::Jump(nnn + u16::from(self.v[0])))
    }

    fn op_cxnn(&mut self, x: usize, nn: u8) -> Result<ProgramCounterUpdate, Error> {
        let mut buf = [0u8; 1];
        getrandom::getrandom(&mut buf).unwrap();
        self.v[x] = buf[0] & nn;
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_dxyn(
        &mut self,
        bus: &mut Bus,
        x: usize,
        y: usize,
        n: usize,
    ) -> Result<ProgramCounterUpdate, Error> {
        let left = usize::from(self.v[x]);
        let top = usize::from(self.v[y]);

        self.v[0xF] = 0;
        let mut collision = false;
        for row in 0..n {
            let data = bus.memory.read(self.index_addr(row as u16)?)?;
            collision |= bus.graphics.draw_byte(left, top + row, data);
        }
        self.v[0xF] = u8::from(collision);
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_ex9e(&mut self, bus: &mut Bus, x: usize) -> Result<ProgramCounterUpdate, Error> {
        if bus.input.is_key_pressed(self.v[x] & 0xF) {
            Ok(ProgramCounterUpdate::SkipNext)
        } else {
            Ok(ProgramCounterUpdate::Next)
        }
    }

    fn op_exa1(&mut self, bus: &mut Bus, x: usize) -> Result<ProgramCounterUpdate, Error> {
        if bus.input.is_key_pressed(self.v[x] & 0xF) {
            Ok(ProgramCounterUpdate::Next)
        } else {
            Ok(ProgramCounterUpdate::SkipNext)
        }
    }

    fn op_fx07(&mut self, bus: &mut Bus, x: usize) -> Result<ProgramCounterUpdate, Error> {
        self.v[x] = bus.clock.delay_timer;
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_fx0a(&mut self, bus: &mut Bus, x: usize) -> Result<ProgramCounterUpdate, Error> {
        match bus.input.first_pressed() {
            Some(key) => {
                self.v[x] = key;
                Ok(ProgramCounterUpdate::Next)
            }
            // no key yet: re-execute this instruction on the next step
            None => Ok(ProgramCounterUpdate::Repeat),
        }
    }

    fn op_fx15(&mut self, bus: &mut Bus, x: usize) -> Result<ProgramCounterUpdate, Error> {
        bus.clock.delay_timer = self.v[x];
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_fx18(&mut self, bus: &mut Bus, x: usize) -> Result<ProgramCounterUpdate, Error> {
        bus.clock.sound_timer = self.v[x];
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_fx1e(&mut self, x: usize) -> Result<ProgramCounterUpdate, Error> {
        self.i = self.i.wrapping_add(u16::from(self.v[x]));
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_fx29(&mut self, x: usize) -> Result<ProgramCounterUpdate, Error> {
        let digit = u16::from(self.v[x] & 0xF);
        self.i = FONT_BASE + digit * GLYPH_SIZE;
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_fx33(&mut self, bus: &mut Bus, x: usize) -> Result<ProgramCounterUpdate, Error> {
        let value = self.v[x];
        bus.memory.write(self.index_addr(0)?, value / 100)?;
        bus.memory.write(self.index_addr(1)?, (value / 10) % 10)?;
        bus.memory.write(self.index_addr(2)?, value % 10)?;
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_fx55(&mut self, bus: &mut Bus, x: usize) -> Result<ProgramCounterUpdate, Error> {
        // V0 through VX inclusive; I itself is left unmodified
        for offset in 0..=x {
            bus.memory.write(self.index_addr(offset as u16)?, self.v[offset])?;
        }
        Ok(ProgramCounterUpdate::Next)
    }

    fn op_fx65(&mut self, bus: &mut Bus, x: usize) -> Result<ProgramCounterUpdate, Error> {
        for offset in 0..=x {
            self.v[offset] = bus.memory.read(self.index_addr(offset as u16)?)?;
        }
        Ok(ProgramCounterUpdate::Next)
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
