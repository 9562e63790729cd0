use thiserror::Error;

/// Fatal conditions that abort the machine with a diagnostic.
///
/// None of these are recoverable from the guest program's perspective: the
/// only in-band "recoverable" condition is end-of-input on the input
/// opcode, which is signaled as a register value (`0xFFFFFFFF`), not as a
/// `UmError`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UmError {
    #[error("program file {path:?} could not be opened: {reason}")]
    ProgramUnreadable { path: String, reason: String },

    #[error("program file {path:?} has length {len} bytes, not a multiple of 4")]
    TruncatedProgram { path: String, len: u64 },

    #[error("division by zero at pc={pc}")]
    DivisionByZero { pc: u32 },

    #[error("output value {value} at pc={pc} exceeds a single byte (0..255)")]
    OutputOutOfRange { pc: u32, value: u32 },

    #[error("segment {id} is unmapped or was never mapped (pc={pc})")]
    UnmappedSegment { id: u32, pc: u32 },

    #[error("offset {offset} is outside segment {id} of length {len} (pc={pc})")]
    SegmentOutOfBounds {
        id: u32,
        offset: u32,
        len: usize,
        pc: u32,
    },

    #[error("cannot unmap segment 0 (pc={pc})")]
    UnmapSegmentZero { pc: u32 },

    #[error("opcode {opcode} at pc={pc} is not a valid instruction (must be 0..=13)")]
    InvalidOpcode { opcode: u32, pc: u32 },
}
