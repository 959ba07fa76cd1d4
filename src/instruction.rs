//! Decoding of 16-bit CHIP-8 instructions into tagged variants.
//!
//! Behavior is cased on the high nibble, and for the `0x0`, `0x8`, `0xE` and
//! `0xF` families on a secondary nibble or byte. Operand fields sit at fixed
//! bit positions shared by every instruction that uses them:
//!
//! - `X`   bits 8-11, a register index
//! - `Y`   bits 4-7, a register index
//! - `N`   bits 0-3, a 4-bit immediate
//! - `NN`  bits 0-7, an 8-bit immediate
//! - `NNN` bits 0-11, a 12-bit address

use std::fmt;

use crate::error::Error;

/// One decoded CHIP-8 instruction. Execution matches on this exhaustively, so
/// a missing opcode is a compile error rather than a silent fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0` - clear the display buffer.
    ClearScreen,
    /// `00EE` - return from a subroutine.
    Return,
    /// `1NNN` - jump to `NNN`.
    Jump { nnn: u16 },
    /// `2NNN` - call the subroutine at `NNN`.
    Call { nnn: u16 },
    /// `3XNN` - skip the next instruction if `VX == NN`.
    SkipEqImm { x: usize, nn: u8 },
    /// `4XNN` - skip the next instruction if `VX != NN`.
    SkipNeImm { x: usize, nn: u8 },
    /// `5XY0` - skip the next instruction if `VX == VY`.
    SkipEqReg { x: usize, y: usize },
    /// `6XNN` - `VX = NN`.
    LoadImm { x: usize, nn: u8 },
    /// `7XNN` - `VX += NN`, wrapping, no flag.
    AddImm { x: usize, nn: u8 },
    /// `8XY0` - `VX = VY`.
    Move { x: usize, y: usize },
    /// `8XY1` - `VX |= VY`.
    Or { x: usize, y: usize },
    /// `8XY2` - `VX &= VY`.
    And { x: usize, y: usize },
    /// `8XY3` - `VX ^= VY`.
    Xor { x: usize, y: usize },
    /// `8XY4` - `VX += VY`, `VF` = carry.
    Add { x: usize, y: usize },
    /// `8XY5` - `VX -= VY`, `VF` = no borrow.
    Sub { x: usize, y: usize },
    /// `8XY6` - `VX >>= 1`, `VF` = bit shifted out.
    ShiftRight { x: usize },
    /// `8XY7` - `VX = VY - VX`, `VF` = no borrow.
    SubFrom { x: usize, y: usize },
    /// `8XYE` - `VX <<= 1`, `VF` = bit shifted out.
    ShiftLeft { x: usize },
    /// `9XY0` - skip the next instruction if `VX != VY`.
    SkipNeReg { x: usize, y: usize },
    /// `ANNN` - `I = NNN`.
    LoadIndex { nnn: u16 },
    /// `BNNN` - jump to `NNN + V0`.
    JumpOffset { nnn: u16 },
    /// `CXNN` - `VX = random byte & NN`.
    Random { x: usize, nn: u8 },
    /// `DXYN` - XOR-draw an 8xN sprite from `[I]` at `(VX, VY)`, `VF` = collision.
    Draw { x: usize, y: usize, n: usize },
    /// `EX9E` - skip the next instruction if key `VX` is pressed.
    SkipKeyPressed { x: usize },
    /// `EXA1` - skip the next instruction if key `VX` is not pressed.
    SkipKeyNotPressed { x: usize },
    /// `FX07` - `VX = delay timer`.
    ReadDelay { x: usize },
    /// `FX0A` - block until a key is pressed, then `VX` = that key.
    WaitKey { x: usize },
    /// `FX15` - `delay timer = VX`.
    SetDelay { x: usize },
    /// `FX18` - `sound timer = VX`.
    SetSound { x: usize },
    /// `FX1E` - `I += VX`, no flag.
    AddIndex { x: usize },
    /// `FX29` - `I` = address of the font glyph for the low nibble of `VX`.
    LoadGlyph { x: usize },
    /// `FX33` - store the BCD digits of `VX` at `[I]`, `[I+1]`, `[I+2]`.
    StoreBcd { x: usize },
    /// `FX55` - store `V0..=VX` into memory starting at `I`.
    StoreRegisters { x: usize },
    /// `FX65` - load `V0..=VX` from memory starting at `I`.
    LoadRegisters { x: usize },
}

// Operand extraction is single-sourced here; nothing else in the crate picks
// fields out of a raw opcode.

fn x(opcode: u16) -> usize {
    usize::from((opcode & 0x0F00) >> 8)
}

fn y(opcode: u16) -> usize {
    usize::from((opcode & 0x00F0) >> 4)
}

fn n(opcode: u16) -> usize {
    usize::from(opcode & 0x000F)
}

fn nn(opcode: u16) -> u8 {
    (opcode & 0x00FF) as u8
}

fn nnn(opcode: u16) -> u16 {
    opcode & 0x0FFF
}

impl Instruction {
    /// Decodes a raw 16-bit instruction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownInstruction`] carrying the raw value for any
    /// bit pattern outside the 35-instruction ISA, including the `0NNN`
    /// machine-language escape.
    pub fn decode(opcode: u16) -> Result<Self, Error> {
        let unknown = Err(Error::UnknownInstruction { opcode });

        match (opcode & 0xF000) >> 12 {
            0x0 => match opcode {
                0x00E0 => Ok(Self::ClearScreen),
                0x00EE => Ok(Self::Return),
                _ => unknown,
            },
            0x1 => Ok(Self::Jump { nnn: nnn(opcode) }),
            0x2 => Ok(Self::Call { nnn: nnn(opcode) }),
            0x3 => Ok(Self::SkipEqImm {
                x: x(opcode),
                nn: nn(opcode),
            }),
            0x4 => Ok(Self::SkipNeImm {
                x: x(opcode),
                nn: nn(opcode),
            }),
            0x5 => match opcode & 0x000F {
                0x0 => Ok(Self::SkipEqReg {
                    x: x(opcode),
                    y: y(opcode),
                }),
                _ => unknown,
            },
            0x6 => Ok(Self::LoadImm {
                x: x(opcode),
                nn: nn(opcode),
            }),
            0x7 => Ok(Self::AddImm {
                x: x(opcode),
                nn: nn(opcode),
            }),
            0x8 => {
                let (x, y) = (x(opcode), y(opcode));
                match opcode & 0x000F {
                    0x0 => Ok(Self::Move { x, y }),
                    0x1 => Ok(Self::Or { x, y }),
                    0x2 => Ok(Self::And { x, y }),
                    0x3 => Ok(Self::Xor { x, y }),
                    0x4 => Ok(Self::Add { x, y }),
                    0x5 => Ok(Self::Sub { x, y }),
                    0x6 => Ok(Self::ShiftRight { x }),
                    0x7 => Ok(Self::SubFrom { x, y }),
                    0xE => Ok(Self::ShiftLeft { x }),
                    _ => unknown,
                }
            }
            0x9 => match opcode & 0x000F {
                0x0 => Ok(Self::SkipNeReg {
                    x: x(opcode),
                    y: y(opcode),
                }),
                _ => unknown,
            },
            0xA => Ok(Self::LoadIndex { nnn: nnn(opcode) }),
            0xB => Ok(Self::JumpOffset { nnn: nnn(opcode) }),
            0xC => Ok(Self::Random {
                x: x(opcode),
                nn: nn(opcode),
            }),
            0xD => Ok(Self::Draw {
                x: x(opcode),
                y: y(opcode),
                n: n(opcode),
            }),
            0xE => match opcode & 0x00FF {
                0x9E => Ok(Self::SkipKeyPressed { x: x(opcode) }),
                0xA1 => Ok(Self::SkipKeyNotPressed { x: x(opcode) }),
                _ => unknown,
            },
            0xF => match opcode & 0x00FF {
                0x07 => Ok(Self::ReadDelay { x: x(opcode) }),
                0x0A => Ok(Self::WaitKey { x: x(opcode) }),
                0x15 => Ok(Self::SetDelay { x: x(opcode) }),
                0x18 => Ok(Self::SetSound { x: x(opcode) }),
                0x1E => Ok(Self::AddIndex { x: x(opcode) }),
                0x29 => Ok(Self::LoadGlyph { x: x(opcode) }),
                0x33 => Ok(Self::StoreBcd { x: x(opcode) }),
                0x55 => Ok(Self::StoreRegisters { x: x(opcode) }),
                0x65 => Ok(Self::LoadRegisters { x: x(opcode) }),
                _ => unknown,
            },
            _ => unreachable!("high nibble is four bits"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ClearScreen => write!(f, "Clear the screen"),
            Self::Return => write!(f, "Return from subroutine"),
            Self::Jump { nnn } => write!(f, "Jump to addr {nnn:#06X}"),
            Self::Call { nnn } => write!(f, "Call subroutine at {nnn:#06X}"),
            Self::SkipEqImm { x, nn } => write!(f, "Skip next instr if V{x:X} == {nn:#04X}"),
            Self::SkipNeImm { x, nn } => write!(f, "Skip next instr if V{x:X} != {nn:#04X}"),
            Self::SkipEqReg { x, y } => write!(f, "Skip next instr if V{x:X} == V{y:X}"),
            Self::LoadImm { x, nn } => write!(f, "Set V{x:X} to {nn:#04X}"),
            Self::AddImm { x, nn } => write!(f, "Add {nn:#04X} to V{x:X}"),
            Self::Move { x, y } => write!(f, "Set V{x:X} to V{y:X}"),
            Self::Or { x, y } => write!(f, "Set V{x:X} to V{x:X} OR V{y:X}"),
            Self::And { x, y } => write!(f, "Set V{x:X} to V{x:X} AND V{y:X}"),
            Self::Xor { x, y } => write!(f, "Set V{x:X} to V{x:X} XOR V{y:X}"),
            Self::Add { x, y } => write!(f, "Set V{x:X} to V{x:X} + V{y:X}, VF = carry"),
            Self::Sub { x, y } => write!(f, "Set V{x:X} to V{x:X} - V{y:X}, VF = no borrow"),
            Self::ShiftRight { x } => write!(f, "Shift V{x:X} right, VF = bit out"),
            Self::SubFrom { x, y } => write!(f, "Set V{x:X} to V{y:X} - V{x:X}, VF = no borrow"),
            Self::ShiftLeft { x } => write!(f, "Shift V{x:X} left, VF = bit out"),
            Self::SkipNeReg { x, y } => write!(f, "Skip next instr if V{x:X} != V{y:X}"),
            Self::LoadIndex { nnn } => write!(f, "Set I to {nnn:#06X}"),
            Self::JumpOffset { nnn } => write!(f, "Jump to {nnn:#06X} + V0"),
            Self::Random { x, nn } => write!(f, "Set V{x:X} to rand AND {nn:#04X}"),
            Self::Draw { x, y, n } => {
                write!(f, "Draw {n} byte sprite from I at (V{x:X}, V{y:X})")
            }
            Self::SkipKeyPressed { x } => write!(f, "Skip next instr if key V{x:X} pressed"),
            Self::SkipKeyNotPressed { x } => {
                write!(f, "Skip next instr if key V{x:X} not pressed")
            }
            Self::ReadDelay { x } => write!(f, "Set V{x:X} to delay timer"),
            Self::WaitKey { x } => write!(f, "Store next key press in V{x:X}"),
            Self::SetDelay { x } => write!(f, "Set delay timer to V{x:X}"),
            Self::SetSound { x } => write!(f, "Set sound timer to V{x:X}"),
            Self::AddIndex { x } => write!(f, "Add V{x:X} to I"),
            Self::LoadGlyph { x } => write!(f, "Set I to addr of glyph V{x:X}"),
            Self::StoreBcd { x } => write!(f, "Store BCD of V{x:X} starting at I"),
            Self::StoreRegisters { x } => write!(f, "Store V0 to V{x:X} starting at I"),
            Self::LoadRegisters { x } => write!(f, "Read memory at I into V0 to V{x:X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_fields_sit_at_fixed_positions() {
        assert_eq!(
            Instruction::decode(0xD123).unwrap(),
            Instruction::Draw {
                x: 0x1,
                y: 0x2,
                n: 0x3
            }
        );
        assert_eq!(
            Instruction::decode(0x3ABC).unwrap(),
            Instruction::SkipEqImm { x: 0xA, nn: 0xBC }
        );
        assert_eq!(
            Instruction::decode(0x1ABC).unwrap(),
            Instruction::Jump { nnn: 0xABC }
        );
    }

    #[test]
    fn decodes_every_family() {
        let cases = [
            (0x00E0, Instruction::ClearScreen),
            (0x00EE, Instruction::Return),
            (0x1234, Instruction::Jump { nnn: 0x234 }),
            (0x2345, Instruction::Call { nnn: 0x345 }),
            (0x3122, Instruction::SkipEqImm { x: 1, nn: 0x22 }),
            (0x4122, Instruction::SkipNeImm { x: 1, nn: 0x22 }),
            (0x5120, Instruction::SkipEqReg { x: 1, y: 2 }),
            (0x6122, Instruction::LoadImm { x: 1, nn: 0x22 }),
            (0x7122, Instruction::AddImm { x: 1, nn: 0x22 }),
            (0x8120, Instruction::Move { x: 1, y: 2 }),
            (0x8121, Instruction::Or { x: 1, y: 2 }),
            (0x8122, Instruction::And { x: 1, y: 2 }),
            (0x8123, Instruction::Xor { x: 1, y: 2 }),
            (0x8124, Instruction::Add { x: 1, y: 2 }),
            (0x8125, Instruction::Sub { x: 1, y: 2 }),
            (0x8126, Instruction::ShiftRight { x: 1 }),
            (0x8127, Instruction::SubFrom { x: 1, y: 2 }),
            (0x812E, Instruction::ShiftLeft { x: 1 }),
            (0x9120, Instruction::SkipNeReg { x: 1, y: 2 }),
            (0xAABC, Instruction::LoadIndex { nnn: 0xABC }),
            (0xBABC, Instruction::JumpOffset { nnn: 0xABC }),
            (0xC1FF, Instruction::Random { x: 1, nn: 0xFF }),
            (0xD125, Instruction::Draw { x: 1, y: 2, n: 5 }),
            (0xE19E, Instruction::SkipKeyPressed { x: 1 }),
            (0xE1A1, Instruction::SkipKeyNotPressed { x: 1 }),
            (0xF107, Instruction::ReadDelay { x: 1 }),
            (0xF10A, Instruction::WaitKey { x: 1 }),
            (0xF115, Instruction::SetDelay { x: 1 }),
            (0xF118, Instruction::SetSound { x: 1 }),
            (0xF11E, Instruction::AddIndex { x: 1 }),
            (0xF129, Instruction::LoadGlyph { x: 1 }),
            (0xF133, Instruction::StoreBcd { x: 1 }),
            (0xF155, Instruction::StoreRegisters { x: 1 }),
            (0xF165, Instruction::LoadRegisters { x: 1 }),
        ];
        for (opcode, expected) in cases {
            assert_eq!(Instruction::decode(opcode).unwrap(), expected, "{opcode:#06X}");
        }
    }

    #[test]
    fn rejects_unknown_patterns() {
        for opcode in [0x0000, 0x0123, 0x00E1, 0x5121, 0x8128, 0x812F, 0x9121, 0xE19F, 0xE100, 0xF100, 0xF1FF] {
            assert_eq!(
                Instruction::decode(opcode),
                Err(Error::UnknownInstruction { opcode }),
                "{opcode:#06X}"
            );
        }
    }

    #[test]
    fn disassembly_names_registers_in_hex() {
        assert_eq!(
            Instruction::decode(0x8A2E).unwrap().to_string(),
            "Shift VA left, VF = bit out"
        );
        assert_eq!(
            Instruction::decode(0x1ABC).unwrap().to_string(),
            "Jump to addr 0x0ABC"
        );
    }
}
