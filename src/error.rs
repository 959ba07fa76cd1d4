//! Failure conditions reported by the interpreter core.

/// Errors the core reports to its host. None of these leave machine state
/// corrupted; the host decides whether to halt, log, or keep stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The fetched bit pattern matches no CHIP-8 instruction.
    #[error("unknown instruction {opcode:#06X}")]
    UnknownInstruction {
        /// The raw 16-bit instruction that failed to decode.
        opcode: u16,
    },

    /// `00EE` executed with an empty call stack. The program counter has
    /// already been reset to the program entry point when this is returned.
    #[error("return with empty call stack")]
    StackUnderflow,

    /// `2NNN` would exceed the call stack depth limit. The call was not made.
    #[error("call stack depth limit exceeded")]
    StackOverflow,

    /// A memory access fell outside the 4096-byte address space.
    #[error("memory access out of bounds at {address:#06X}")]
    OutOfBounds {
        /// The offending address.
        address: u16,
    },

    /// The ROM image does not fit in the program area.
    #[error("ROM is {size} bytes but only {capacity} bytes fit at the load address")]
    RomTooLarge {
        /// Size of the rejected image in bytes.
        size: usize,
        /// Bytes available between the load address and the end of memory.
        capacity: usize,
    },
}
