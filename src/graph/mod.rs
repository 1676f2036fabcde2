//! The simulation core: an arena of tagged gate nodes connected by
//! single-bit [Wire] handles, evaluated under the crate-wide two-phase
//! (evaluate, then update) clock contract.

#[macro_use]
mod node;
mod circuit;

pub use circuit::*;
pub use node::{NodeIndex, Wire, ONE, ZERO};
