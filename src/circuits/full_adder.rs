use super::half_adder::{half_adder, HalfAdder};
use crate::graph::*;

fn mkname(name: String) -> String {
    format!("FULLADDER:{}", name)
}

/// One-bit full adder: two half adders and an OR over their carries.
#[derive(Debug, Clone, Copy)]
pub struct FullAdder {
    pub sum: Wire,
    pub carry: Wire,
}

pub fn full_adder<S: Into<String>>(
    g: &mut Circuit,
    a: Wire,
    b: Wire,
    cin: Wire,
    name: S,
) -> FullAdder {
    let name = mkname(name.into());

    let HalfAdder {
        sum: partial,
        carry: carry_ab,
    } = half_adder(g, a, b, name.clone());
    let HalfAdder {
        sum,
        carry: carry_cin,
    } = half_adder(g, partial, cin, name.clone());
    let carry = g.or2(carry_ab, carry_cin, name);

    FullAdder { sum, carry }
}

/// One-bit adder-subtractor cell: `b` is XORed with `sub` before entering
/// the full adder. The containing ripple feeds `sub` into the chain's first
/// carry-in to complete the two's-complement negation.
pub fn full_adder_subtractor<S: Into<String>>(
    g: &mut Circuit,
    a: Wire,
    b: Wire,
    cin: Wire,
    sub: Wire,
    name: S,
) -> FullAdder {
    let name = name.into();
    let b_sub = g.xor2(b, sub, mkname(name.clone()));
    full_adder(g, a, b_sub, cin, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_adder_truth_table() {
        for pattern in 0..8u64 {
            let mut g = Circuit::new();
            let input = g.source(3, "input");
            g.set_source(input, pattern);

            let mark = g.mark();
            let fa = full_adder(&mut g, input.wire(0), input.wire(1), input.wire(2), "fa");
            let span = g.span_from(mark);
            g.eval_span(&span);

            let ones = pattern.count_ones();
            assert_eq!(g.value(fa.sum), ones % 2 == 1, "sum {:03b}", pattern);
            assert_eq!(g.value(fa.carry), ones >= 2, "carry {:03b}", pattern);
        }
    }

    #[test]
    fn test_full_adder_subtractor_truth_table() {
        for pattern in 0..16u64 {
            let mut g = Circuit::new();
            let input = g.source(4, "input");
            g.set_source(input, pattern);

            let mark = g.mark();
            let fas = full_adder_subtractor(
                &mut g,
                input.wire(0),
                input.wire(1),
                input.wire(2),
                input.wire(3),
                "fas",
            );
            let span = g.span_from(mark);
            g.eval_span(&span);

            let a = pattern & 1;
            let b = (pattern >> 1) & 1;
            let cin = (pattern >> 2) & 1;
            let sub = (pattern >> 3) & 1;
            let total = a + (b ^ sub) + cin;
            assert_eq!(g.value(fas.sum), total & 1 == 1, "sum {:04b}", pattern);
            assert_eq!(g.value(fas.carry), total >= 2, "carry {:04b}", pattern);
        }
    }
}
