use thiserror::Error;

/// Conditions that stop the 6502 engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    /// The fetched byte has no entry in the opcode table.
    #[error("illegal opcode ${opcode:02X} at ${pc:04X}")]
    IllegalOpcode { opcode: u8, pc: u16 },

    /// A program image needs at least the two load-address bytes.
    #[error("program image is {len} byte(s); at least 2 are required for the load address")]
    ProgramTooShort { len: usize },

    /// The payload does not fit between its load address and $FFFF.
    #[error("program of {len} byte(s) at ${start:04X} runs past the end of the address space")]
    ProgramOverflow { start: u16, len: usize },
}
