//! The `memory` module represents the 4096 addressable bytes of a CHIP-8
//! machine. The low 512 bytes belong to the interpreter and hold the built-in
//! font; programs are loaded at [`PROGRAM_START`]. All accesses go through
//! bounds-checked accessors that report a typed failure instead of panicking.

use crate::error::Error;

/// The total size of the CHIP-8 memory.
const MEMORY_SIZE: usize = 4096;

/// The address programs are loaded at and the program counter starts at.
pub const PROGRAM_START: u16 = 0x200;

/// The address the built-in font glyphs are preloaded at.
pub const FONT_BASE: u16 = 0x050;

/// The size of one hex digit glyph in bytes.
pub const GLYPH_SIZE: u16 = 5;

/// Built-in font data, one 5-byte glyph per hex digit.
const FONT: [u8; 80] = [
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

/// The [`Memory`] struct holds the fixed-size byte array of a CHIP-8 system.
/// The font is present from construction so `FX29` can be executed before any
/// explicit setup by the host.
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Memory {
    #[cfg_attr(feature = "persistence", serde(with = "serde_big_array::BigArray"))]
    memory: [u8; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        let base = FONT_BASE as usize;
        memory[base..base + FONT.len()].copy_from_slice(&FONT);
        Self { memory }
    }
}

impl Memory {
    /// Creates a new [`Memory`] with the font preloaded and everything else zeroed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the byte at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `address` is past the end of memory.
    pub fn read(&self, address: u16) -> Result<u8, Error> {
        self.memory
            .get(usize::from(address))
            .copied()
            .ok_or(Error::OutOfBounds { address })
    }

    /// Writes `value` to the byte at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `address` is past the end of memory.
    pub fn write(&mut self, address: u16, value: u8) -> Result<(), Error> {
        match self.memory.get_mut(usize::from(address)) {
            Some(byte) => {
                *byte = value;
                Ok(())
            }
            None => Err(Error::OutOfBounds { address }),
        }
    }

    /// Loads a ROM image at [`PROGRAM_START`]. Any previous program bytes are
    /// zeroed first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RomTooLarge`] if the image does not fit between the
    /// load address and the end of memory; nothing is written in that case.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), Error> {
        let start = PROGRAM_START as usize;
        let capacity = MEMORY_SIZE - start;
        if data.len() > capacity {
            return Err(Error::RomTooLarge {
                size: data.len(),
                capacity,
            });
        }

        self.memory[start..].fill(0);
        self.memory[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_is_preloaded_at_font_base() {
        let memory = Memory::new();
        // first byte of the '0' glyph and last byte of the 'F' glyph
        assert_eq!(memory.read(FONT_BASE).unwrap(), 0xF0);
        assert_eq!(memory.read(FONT_BASE + 16 * GLYPH_SIZE - 1).unwrap(), 0x80);
    }

    #[test]
    fn reads_and_writes_are_bounds_checked() {
        let mut memory = Memory::new();
        assert_eq!(memory.read(0x1000), Err(Error::OutOfBounds { address: 0x1000 }));
        assert_eq!(
            memory.write(0x1000, 0xAB),
            Err(Error::OutOfBounds { address: 0x1000 })
        );
        memory.write(0xFFF, 0xAB).unwrap();
        assert_eq!(memory.read(0xFFF).unwrap(), 0xAB);
    }

    #[test]
    fn load_rom_places_image_at_program_start() {
        let mut memory = Memory::new();
        memory.load_rom(&[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(memory.read(PROGRAM_START).unwrap(), 0xAA);
        assert_eq!(memory.read(PROGRAM_START + 2).unwrap(), 0xCC);
    }

    #[test]
    fn load_rom_zeroes_previous_program() {
        let mut memory = Memory::new();
        memory.load_rom(&[0x11, 0x22, 0x33, 0x44]).unwrap();
        memory.load_rom(&[0x55]).unwrap();
        assert_eq!(memory.read(PROGRAM_START).unwrap(), 0x55);
        assert_eq!(memory.read(PROGRAM_START + 1).unwrap(), 0);
        assert_eq!(memory.read(PROGRAM_START + 3).unwrap(), 0);
    }

    #[test]
    fn load_rom_rejects_oversized_image() {
        let mut memory = Memory::new();
        let image = vec![0u8; 3585];
        assert_eq!(
            memory.load_rom(&image),
            Err(Error::RomTooLarge {
                size: 3585,
                capacity: 3584
            })
        );
        // nothing was written
        assert_eq!(memory.read(PROGRAM_START).unwrap(), 0);
    }

    #[test]
    fn load_rom_accepts_maximum_sized_image() {
        let mut memory = Memory::new();
        let image = vec![0xEE; 3584];
        memory.load_rom(&image).unwrap();
        assert_eq!(memory.read(0xFFF).unwrap(), 0xEE);
    }
}
