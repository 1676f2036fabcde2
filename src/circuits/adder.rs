use super::full_adder::full_adder;
use crate::graph::*;
use std::ops::Range;

fn mkname(name: String) -> String {
    format!("ADDER:{}", name)
}

/// n-bit ripple-carry adder with carry-in tied low.
///
/// The final carry is exposed: the multiplier widens through it and the
/// program counter's halt-on-overflow line is declared off it.
#[derive(Debug, Clone)]
pub struct Adder {
    pub sum: Vec<Wire>,
    pub carry: Wire,
    span: Range<usize>,
}

impl Adder {
    /// # Panics
    ///
    /// Will panic if `a.len()` != `b.len()`.
    pub fn new<S: Into<String>>(g: &mut Circuit, a: &[Wire], b: &[Wire], name: S) -> Adder {
        assert_eq!(a.len(), b.len());
        let name = mkname(name.into());
        let mark = g.mark();

        let mut cin = ZERO;
        let mut sum = Vec::with_capacity(a.len());
        for (a_bit, b_bit) in a.iter().zip(b.iter()) {
            let fa = full_adder(g, *a_bit, *b_bit, cin, name.clone());
            sum.push(fa.sum);
            cin = fa.carry;
        }

        Adder {
            sum,
            carry: cin,
            span: g.span_from(mark),
        }
    }

    pub fn evaluate(&self, g: &mut Circuit) {
        g.eval_span(&self.span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adder_exhaustive_4bit() {
        let mut g = Circuit::new();
        let a = g.source(4, "a");
        let b = g.source(4, "b");
        let adder = Adder::new(&mut g, &a.wires(), &b.wires(), "adder");

        for av in 0..16u64 {
            for bv in 0..16u64 {
                g.set_source(a, av);
                g.set_source(b, bv);
                adder.evaluate(&mut g);

                assert_eq!(g.read_bits(&adder.sum), (av + bv) & 0xf, "{} + {}", av, bv);
                assert_eq!(g.value(adder.carry), av + bv > 15, "carry {} + {}", av, bv);
            }
        }
    }

    #[test]
    fn test_adder_constant_one_increments() {
        // The program counter incrementer shape: a = 1, b = counter value.
        let mut g = Circuit::new();
        let b = g.source(4, "b");
        let one = [ONE, ZERO, ZERO, ZERO];
        let adder = Adder::new(&mut g, &one, &b.wires(), "inc");

        for bv in 0..16u64 {
            g.set_source(b, bv);
            adder.evaluate(&mut g);
            assert_eq!(g.read_bits(&adder.sum), (bv + 1) & 0xf);
        }
    }
}
