use super::full_adder::full_adder_subtractor;
use crate::graph::*;
use std::ops::Range;

fn mkname(name: String) -> String {
    format!("ADDSUB:{}", name)
}

/// n-bit ripple adder-subtractor.
///
/// `sub_enable` feeds the first cell's carry-in and every cell's subtract
/// pin (two's-complement subtraction); `output_enable` gates each sum bit
/// through an AND, so the visible output is zero while disabled.
///
/// The ungated sum and the final carry stay exposed as `raw` and
/// `carry_out`; the comparator derives its flags from them.
#[derive(Debug, Clone)]
pub struct AdderSubtractor {
    pub out: Vec<Wire>,
    pub raw: Vec<Wire>,
    pub carry_out: Wire,
    span: Range<usize>,
}

impl AdderSubtractor {
    /// # Panics
    ///
    /// Will panic if `a.len()` != `b.len()`.
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        a: &[Wire],
        b: &[Wire],
        sub_enable: Wire,
        output_enable: Wire,
        name: S,
    ) -> AdderSubtractor {
        assert_eq!(a.len(), b.len());
        let name = mkname(name.into());
        let mark = g.mark();

        let mut cin = sub_enable;
        let mut raw = Vec::with_capacity(a.len());
        let mut out = Vec::with_capacity(a.len());
        for (a_bit, b_bit) in a.iter().zip(b.iter()) {
            let cell = full_adder_subtractor(g, *a_bit, *b_bit, cin, sub_enable, name.clone());
            raw.push(cell.sum);
            out.push(g.and2(cell.sum, output_enable, name.clone()));
            cin = cell.carry;
        }

        AdderSubtractor {
            out,
            raw,
            carry_out: cin,
            span: g.span_from(mark),
        }
    }

    pub fn evaluate(&self, g: &mut Circuit) {
        g.eval_span(&self.span);
    }
}
