use crate::state::Address;

/// Faults the machine reports to its host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("Stack overflow: call at {pc:#05X} with all 16 stack levels in use")]
    StackOverflow { pc: Address },

    #[error("Stack underflow: return at {pc:#05X} with an empty call stack")]
    StackUnderflow { pc: Address },

    #[error("Invalid key index: {0}")]
    InvalidKey(u8),
}
