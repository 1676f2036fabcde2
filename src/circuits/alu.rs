use super::arithmetic_unit::{ArithmeticEnables, ArithmeticUnit};
use super::comparator::Comparator;
use super::logic_unit::{LogicEnables, LogicUnit};
use crate::error::SimError;
use crate::graph::*;
use std::ops::Range;
use strum_macros::{Display, EnumIter, EnumString};

fn mkname(name: String) -> String {
    format!("ALU:{}", name)
}

/// The operations an ALU enable line can select, in pinout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum AluOp {
    Add = 0,
    Sub,
    Inc,
    Dec,
    Mul,
    And,
    Or,
    Xor,
    Not,
    Rsh,
    Lsh,
}

/// Number of ALU enable lines.
pub const NUM_ALU_OPS: usize = 11;

/// One enable wire per [AluOp], in pinout order.
#[derive(Debug, Clone, Copy)]
pub struct AluEnables {
    wires: [Wire; NUM_ALU_OPS],
}

impl AluEnables {
    pub fn new(wires: [Wire; NUM_ALU_OPS]) -> AluEnables {
        AluEnables { wires }
    }

    pub fn wire(&self, op: AluOp) -> Wire {
        self.wires[op as usize]
    }
}

/// Full ALU: arithmetic unit, logic unit and comparator sharing the A and B
/// operand buses.
///
/// A and B enter through buffer pins so a containing CPU can re-point them
/// at its data sources after construction. The result is the per-bit OR of
/// the two internally-gated datapaths (zero when nothing is enabled); the
/// comparator runs every cycle regardless of the enables and its six
/// outputs are the ALU's flag bits.
#[derive(Debug, Clone)]
pub struct Alu {
    a_pins: Vec<Wire>,
    b_pins: Vec<Wire>,
    pub result: Vec<Wire>,
    comparator: Comparator,
    span: Range<usize>,
}

impl Alu {
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        num_bits: usize,
        enables: AluEnables,
        name: S,
    ) -> Alu {
        let name = mkname(name.into());
        let mark = g.mark();

        let a_pins: Vec<Wire> = (0..num_bits)
            .map(|_| g.buffer1(ZERO, name.clone()))
            .collect();
        let b_pins: Vec<Wire> = (0..num_bits)
            .map(|_| g.buffer1(ZERO, name.clone()))
            .collect();

        let arithmetic = ArithmeticUnit::new(
            g,
            &a_pins,
            &b_pins,
            ArithmeticEnables {
                add_en: enables.wire(AluOp::Add),
                sub_en: enables.wire(AluOp::Sub),
                inc_en: enables.wire(AluOp::Inc),
                dec_en: enables.wire(AluOp::Dec),
                mul_en: enables.wire(AluOp::Mul),
            },
            name.clone(),
        );
        let logic = LogicUnit::new(
            g,
            &a_pins,
            &b_pins,
            LogicEnables {
                and_en: enables.wire(AluOp::And),
                or_en: enables.wire(AluOp::Or),
                xor_en: enables.wire(AluOp::Xor),
                not_en: enables.wire(AluOp::Not),
                rsh_en: enables.wire(AluOp::Rsh),
                lsh_en: enables.wire(AluOp::Lsh),
            },
            name.clone(),
        );
        let comparator = Comparator::new(g, &a_pins, &b_pins, name.clone());

        let result = arithmetic
            .out
            .iter()
            .zip(logic.out.iter())
            .map(|(arith, log)| g.or2(*arith, *log, name.clone()))
            .collect();

        Alu {
            a_pins,
            b_pins,
            result,
            comparator,
            span: g.span_from(mark),
        }
    }

    /// Re-points the A operand pins at `sources`.
    pub fn connect_a(&self, g: &mut Circuit, sources: &[Wire]) -> Result<(), SimError> {
        rebind_pins(g, &self.a_pins, sources, "ALU operand a")
    }

    /// Re-points the B operand pins at `sources`.
    pub fn connect_b(&self, g: &mut Circuit, sources: &[Wire]) -> Result<(), SimError> {
        rebind_pins(g, &self.b_pins, sources, "ALU operand b")
    }

    pub fn evaluate(&self, g: &mut Circuit) {
        g.eval_span(&self.span);
    }

    /// The flags in register order: EQ, NEQ, LT_U, GT_U, LT_S, GT_S.
    pub fn flags(&self) -> [Wire; 6] {
        self.comparator.flags()
    }
}

/// Re-points a bank of buffer pins at new source wires, width-checked.
pub(crate) fn rebind_pins(
    g: &mut Circuit,
    pins: &[Wire],
    sources: &[Wire],
    what: &str,
) -> Result<(), SimError> {
    if pins.len() != sources.len() {
        return Err(SimError::WidthMismatch {
            component: what.into(),
            expected: pins.len(),
            got: sources.len(),
        });
    }
    for (pin, source) in pins.iter().zip(sources.iter()) {
        g.d0(*pin, *source);
    }
    Ok(())
}
