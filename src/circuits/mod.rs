//! Structural composites, leaves first: adders and shifters, latches and
//! registers, decoders, the datapath units and the two memories, and the
//! control unit that sequences them.

pub mod adder;
pub mod adder_subtractor;
pub mod alu;
pub mod arithmetic_unit;
pub mod comparator;
pub mod control_unit;
pub mod decoder;
pub mod divider_sequential;
pub mod flip_flop;
pub mod full_adder;
pub mod half_adder;
pub mod logic_unit;
pub mod main_memory;
pub mod memory_bit;
pub mod multiplier;
pub mod multiplier_sequential;
pub mod program_memory;
pub mod register;
pub mod shift;

pub use adder::*;
pub use adder_subtractor::*;
pub use alu::{Alu, AluEnables, AluOp, NUM_ALU_OPS};
pub use arithmetic_unit::*;
pub use comparator::*;
pub use control_unit::*;
pub use decoder::*;
pub use divider_sequential::*;
pub use flip_flop::*;
pub use full_adder::*;
pub use half_adder::*;
pub use logic_unit::*;
pub use main_memory::*;
pub use memory_bit::*;
pub use multiplier::*;
pub use multiplier_sequential::*;
pub use program_memory::*;
pub use register::*;
pub use shift::*;
