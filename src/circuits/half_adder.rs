use crate::graph::*;

fn mkname(name: String) -> String {
    format!("HALFADDER:{}", name)
}

/// One-bit half adder built from the classic four-NAND fabric plus an
/// inverter for the carry.
#[derive(Debug, Clone, Copy)]
pub struct HalfAdder {
    pub sum: Wire,
    pub carry: Wire,
}

pub fn half_adder<S: Into<String>>(g: &mut Circuit, a: Wire, b: Wire, name: S) -> HalfAdder {
    let name = mkname(name.into());

    let nand_ab = g.nand2(a, b, name.clone());
    let nand_a = g.nand2(a, nand_ab, name.clone());
    let nand_b = g.nand2(nand_ab, b, name.clone());
    let sum = g.nand2(nand_a, nand_b, name.clone());
    let carry = g.not1(nand_ab, name);

    HalfAdder { sum, carry }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_adder_truth_table() {
        for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
            let mut g = Circuit::new();
            let input = g.source(2, "input");
            g.set_source_bit(input, 0, a);
            g.set_source_bit(input, 1, b);

            let mark = g.mark();
            let ha = half_adder(&mut g, input.wire(0), input.wire(1), "ha");
            let span = g.span_from(mark);
            g.eval_span(&span);

            assert_eq!(g.value(ha.sum), a ^ b, "sum a:{} b:{}", a, b);
            assert_eq!(g.value(ha.carry), a && b, "carry a:{} b:{}", a, b);
        }
    }
}
