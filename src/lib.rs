//! Structural gate-level logic simulator that builds a 3-bit computer
//! bottom-up: Boolean gates into adders, latches and registers, registers
//! into memories and datapath units, and all of it into an
//! instruction-fetch/decode/execute loop over a fixed 3-bit ISA.

pub mod circuits;
pub mod computer;
pub mod cpu;
pub mod error;
pub mod graph;
pub mod loader;

pub use circuits::*;
pub use computer::Computer;
pub use cpu::Cpu;
pub use error::SimError;
pub use graph::*;
pub use loader::Instruction;
