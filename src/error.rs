use std::path::PathBuf;
use thiserror::Error;

use crate::loader::Instruction;

/// Errors surfaced by wiring, loading and verification.
///
/// Wiring errors leave the graph in its pre-call state; loader errors abort
/// the load but leave already-written instructions in program memory.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("{component}: input index {index} out of range (max {max})")]
    InputIndexOutOfRange {
        component: String,
        index: usize,
        max: usize,
    },

    #[error("{component}: accepts no inputs")]
    SourceHasNoInputs { component: String },

    #[error("{component}: expected {expected} wires, got {got}")]
    WidthMismatch {
        component: String,
        expected: usize,
        got: usize,
    },

    #[error("opcode {opcode} out of range for {bits}-bit opcodes")]
    OpcodeOutOfRange { opcode: u16, bits: usize },

    #[error("could not open program file {path:?}: {source}")]
    ProgramFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: expected `opcode C A B`, got {got:?}")]
    MalformedLine { line: usize, got: String },

    #[error("line {line}: {field:?} is not a {width}-bit binary literal")]
    BadField {
        line: usize,
        field: String,
        width: usize,
    },

    #[error("program too long: program memory holds {capacity} instructions")]
    ProgramTooLong { capacity: usize },

    #[error("verify failed at address {address}: wrote {wrote:?}, read back {read:?}")]
    VerifyMismatch {
        address: usize,
        wrote: Instruction,
        read: Instruction,
    },
}
