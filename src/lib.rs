//! A CHIP-8 virtual machine core. Given a loaded program image, the machine
//! repeatedly fetches a 16-bit instruction, decodes it, and applies the
//! corresponding state transition to registers, memory, the display buffer,
//! and the two countdown timers.
//!
//! The crate deliberately contains no I/O: the embedding host owns the
//! cadence (some number of [`Chip8::step`] calls per frame, then one
//! [`Chip8::tick_timers`] at 60Hz), feeds keypad state in through
//! [`Chip8::set_key`], renders [`Chip8::frame`], and watches
//! [`Chip8::sound_timer`] for the audio-stop edge.

use crate::processor::Cpu;

pub mod clock;
pub mod error;
pub mod graphics;
pub mod input;
pub mod instruction;
pub mod memory;
pub mod processor;

pub use error::Error;

/// The [`Bus`] struct groups the components the CPU reaches through: the
/// timers, the display buffer, the keypad state, and memory.
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
#[derive(Default)]
pub struct Bus {
    /// The delay and sound timers.
    pub clock: clock::Clock,

    /// The 64x32 one-bit display buffer.
    pub graphics: graphics::Buffer,

    /// The 16-key keypad state, written by the host's input adapter.
    pub input: input::Input,

    /// The 4096 bytes of addressable memory.
    pub memory: memory::Memory,
}

/// The [`Chip8`] struct represents one whole CHIP-8 machine: a [`Cpu`] wired
/// to a [`Bus`]. All components are zeroed together on [`Chip8::reset`] and
/// persist for the lifetime of one loaded program.
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
#[derive(Default)]
pub struct Chip8 {
    /// The CPU executing the instructions in memory.
    pub processor: Cpu,

    /// The components the CPU operates on.
    pub bus: Bus,
}

impl Chip8 {
    /// Creates a new machine with zeroed state, the font preloaded, and the
    /// program counter at the program entry point.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes one instruction.
    ///
    /// # Errors
    ///
    /// Forwards the failure the instruction reported; see [`Error`]. State is
    /// never corrupted by a failed step, so the host chooses whether to skip,
    /// log, or halt.
    pub fn step(&mut self) -> Result<(), Error> {
        self.processor.step(&mut self.bus)
    }

    /// Decrements the delay and sound timers, each floored at zero. Call once
    /// per 60Hz frame tick, independent of how many [`Chip8::step`] calls
    /// happened in between.
    pub fn tick_timers(&mut self) {
        self.bus.clock.tick();
    }

    /// Loads a ROM image at the program entry point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RomTooLarge`] if the image does not fit in memory.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), Error> {
        self.bus.memory.load_rom(data)
    }

    /// Updates the pressed state of a keypad key (`0x0..=0xF`; anything else
    /// is ignored). Called by the host's input adapter before stepping.
    pub fn set_key(&mut self, key_code: u8, pressed: bool) {
        self.bus.input.update(key_code, pressed);
    }

    /// Resets the machine: registers, stack, timers, keypad, and display are
    /// zeroed, the font is restored, and the program counter returns to the
    /// entry point. The program image is cleared too; load a ROM afterwards.
    pub fn reset(&mut self) {
        self.processor = Cpu::new();
        self.bus = Bus::default();
    }

    /// Resets the machine and loads the given ROM image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RomTooLarge`] if the image does not fit in memory.
    pub fn reset_and_load(&mut self, data: &[u8]) -> Result<(), Error> {
        self.reset();
        self.load_rom(data)
    }

    /// The display surface as a flat row-major array of 0/1 values, for the
    /// host's renderer.
    #[must_use]
    pub fn frame(&self) -> &[u8; graphics::PIXEL_COUNT] {
        self.bus.graphics.pixels()
    }

    /// The current delay timer value.
    #[must_use]
    pub fn delay_timer(&self) -> u8 {
        self.bus.clock.delay_timer
    }

    /// The current sound timer value. The host stops audio when this reaches
    /// zero.
    #[must_use]
    pub fn sound_timer(&self) -> u8 {
        self.bus.clock.sound_timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Packs 16-bit instructions into a big-endian ROM image.
    fn rom(words: &[u16]) -> Vec<u8> {
        words
            .iter()
            .flat_map(|word| word.to_be_bytes())
            .collect()
    }

    #[test]
    fn golden_trace_of_a_straight_line_program() {
        let mut machine = Chip8::new();
        machine
            .load_rom(&rom(&[
                0x6005, // V0 = 5
                0x6103, // V1 = 3
                0x8014, // V0 += V1
                0x3008, // skip next, V0 == 8
                0x6AFF, // skipped
                0x6B42, // VB = 0x42
            ]))
            .unwrap();

        for _ in 0..5 {
            machine.step().unwrap();
        }

        assert_eq!(machine.processor.v[0x0], 8);
        assert_eq!(machine.processor.v[0x1], 3);
        assert_eq!(machine.processor.v[0xA], 0);
        assert_eq!(machine.processor.v[0xB], 0x42);
        assert_eq!(machine.processor.v[0xF], 0);
        assert_eq!(machine.processor.pc, 0x20C);
    }

    #[test]
    fn unknown_instruction_is_reported_and_leaves_pc_past_it() {
        let mut machine = Chip8::new();
        machine.load_rom(&rom(&[0x0123, 0x6107])).unwrap();

        assert_eq!(
            machine.step(),
            Err(Error::UnknownInstruction { opcode: 0x0123 })
        );
        // the host may decide to keep going with the next instruction
        machine.step().unwrap();
        assert_eq!(machine.processor.v[1], 0x7);
    }

    #[test]
    fn timers_set_by_the_program_are_ticked_by_the_host() {
        let mut machine = Chip8::new();
        machine.load_rom(&rom(&[0x6202, 0xF215, 0xF218])).unwrap();
        for _ in 0..3 {
            machine.step().unwrap();
        }
        assert_eq!(machine.delay_timer(), 2);
        assert_eq!(machine.sound_timer(), 2);

        machine.tick_timers();
        machine.tick_timers();
        machine.tick_timers();
        assert_eq!(machine.delay_timer(), 0);
        assert_eq!(machine.sound_timer(), 0);
    }

    #[test]
    fn reset_zeroes_state_but_keeps_the_font() {
        let mut machine = Chip8::new();
        machine.load_rom(&rom(&[0x6005, 0xA300])).unwrap();
        machine.step().unwrap();
        machine.step().unwrap();
        machine.set_key(0x4, true);

        machine.reset();
        assert_eq!(machine.processor.pc, 0x200);
        assert_eq!(machine.processor.v, [0; 16]);
        assert_eq!(machine.processor.i, 0);
        assert!(!machine.bus.input.is_key_pressed(0x4));
        assert_eq!(machine.bus.memory.read(0x200).unwrap(), 0);
        assert_eq!(machine.bus.memory.read(0x050).unwrap(), 0xF0);
    }

    #[test]
    fn reset_and_load_starts_a_fresh_program() {
        let mut machine = Chip8::new();
        machine.load_rom(&rom(&[0x6005])).unwrap();
        machine.step().unwrap();

        machine.reset_and_load(&rom(&[0x6107])).unwrap();
        machine.step().unwrap();
        assert_eq!(machine.processor.v[0], 0);
        assert_eq!(machine.processor.v[1], 0x7);
    }

    #[test]
    fn wait_for_key_blocks_the_whole_machine_until_input() {
        let mut machine = Chip8::new();
        machine.load_rom(&rom(&[0xF30A, 0x6101])).unwrap();

        machine.step().unwrap();
        machine.step().unwrap();
        assert_eq!(machine.processor.pc, 0x200);

        machine.set_key(0x9, true);
        machine.step().unwrap();
        assert_eq!(machine.processor.v[3], 0x9);
        machine.step().unwrap();
        assert_eq!(machine.processor.v[1], 0x1);
    }
}
