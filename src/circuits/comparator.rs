use super::adder_subtractor::AdderSubtractor;
use crate::graph::*;
use std::ops::Range;

fn mkname(name: String) -> String {
    format!("CMP:{}", name)
}

/// n-bit comparator: computes `a - b` through an internal adder-subtractor
/// and derives six flags from the raw difference.
///
/// With the subtract pin constantly high, the effective sign of B for
/// overflow detection is the inverted MSB:
/// `V = (a_msb == !b_msb) & (a_msb != diff_msb)`.
#[derive(Debug, Clone)]
pub struct Comparator {
    pub eq: Wire,
    pub neq: Wire,
    pub lt_u: Wire,
    pub gt_u: Wire,
    pub lt_s: Wire,
    pub gt_s: Wire,
    span: Range<usize>,
}

impl Comparator {
    /// # Panics
    ///
    /// Will panic if `a.len()` != `b.len()` or the width is 0.
    pub fn new<S: Into<String>>(g: &mut Circuit, a: &[Wire], b: &[Wire], name: S) -> Comparator {
        assert_eq!(a.len(), b.len());
        let bits = a.len();
        assert!(bits > 0);
        let name = mkname(name.into());
        let mark = g.mark();

        let diff = AdderSubtractor::new(g, a, b, ONE, ONE, name.clone());
        let diff_msb = diff.raw[bits - 1];

        let zero = g.norx(diff.raw.iter().copied(), name.clone());
        let negative = diff_msb;
        let carry = diff.carry_out;

        let b_sign_effective = g.not1(b[bits - 1], name.clone());
        let signs_xor = g.xor2(a[bits - 1], b_sign_effective, name.clone());
        let signs_agree = g.not1(signs_xor, name.clone());
        let sign_flipped = g.xor2(a[bits - 1], diff_msb, name.clone());
        let overflow = g.and2(signs_agree, sign_flipped, name.clone());

        let not_zero = g.not1(zero, name.clone());
        let lt_u = g.not1(carry, name.clone());
        let gt_u = g.and2(carry, not_zero, name.clone());
        let lt_s = g.xor2(negative, overflow, name.clone());
        let ge_s = g.not1(lt_s, name.clone());
        let gt_s = g.and2(ge_s, not_zero, name);

        Comparator {
            eq: zero,
            neq: not_zero,
            lt_u,
            gt_u,
            lt_s,
            gt_s,
            span: g.span_from(mark),
        }
    }

    pub fn evaluate(&self, g: &mut Circuit) {
        g.eval_span(&self.span);
    }

    /// The flags in register order: EQ, NEQ, LT_U, GT_U, LT_S, GT_S.
    pub fn flags(&self) -> [Wire; 6] {
        [self.eq, self.neq, self.lt_u, self.gt_u, self.lt_s, self.gt_s]
    }
}
