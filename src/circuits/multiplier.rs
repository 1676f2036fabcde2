use super::adder::Adder;
use crate::graph::*;
use std::ops::Range;

fn mkname(name: String) -> String {
    format!("MUL:{}", name)
}

/// n-bit combinational array multiplier: an n-by-n partial-product AND
/// array accumulated through a cascade of n-1 ripple adders of increasing
/// width. All 2n product bits are gated by `output_enable`.
#[derive(Debug, Clone)]
pub struct Multiplier {
    pub product: Vec<Wire>,
    span: Range<usize>,
}

impl Multiplier {
    /// # Panics
    ///
    /// Will panic if `a.len()` != `b.len()` or the width is 0.
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        a: &[Wire],
        b: &[Wire],
        output_enable: Wire,
        name: S,
    ) -> Multiplier {
        assert_eq!(a.len(), b.len());
        let bits = a.len();
        assert!(bits > 0);
        let name = mkname(name.into());
        let mark = g.mark();

        // Partial products: rows[r][c] = a[c] & b[r], weight r + c.
        let rows: Vec<Vec<Wire>> = b
            .iter()
            .map(|b_bit| {
                a.iter()
                    .map(|a_bit| g.and2(*a_bit, *b_bit, name.clone()))
                    .collect()
            })
            .collect();

        // Accumulate row r shifted left by r; each stage adder is one bit
        // wider than the last so no carry is ever dropped.
        let mut acc: Vec<Wire> = rows[0].clone();
        for (r, row) in rows.iter().enumerate().skip(1) {
            let width = acc.len().max(r + bits);
            let lhs: Vec<Wire> = pad(&acc, width);
            let mut shifted = vec![ZERO; r];
            shifted.extend_from_slice(row);
            let rhs: Vec<Wire> = pad(&shifted, width);

            let adder = Adder::new(g, &lhs, &rhs, name.clone());
            acc = adder.sum;
            acc.push(adder.carry);
        }
        let acc = pad(&acc, 2 * bits);

        let product = acc
            .iter()
            .map(|bit| g.and2(*bit, output_enable, name.clone()))
            .collect();

        Multiplier {
            product,
            span: g.span_from(mark),
        }
    }

    pub fn evaluate(&self, g: &mut Circuit) {
        g.eval_span(&self.span);
    }

    /// The low half of the product, as wide as the operands.
    pub fn low_bits(&self) -> &[Wire] {
        &self.product[..self.product.len() / 2]
    }
}

fn pad(wires: &[Wire], width: usize) -> Vec<Wire> {
    let mut out = wires.to_vec();
    out.resize(width, ZERO);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_exhaustive_4bit() {
        let mut g = Circuit::new();
        let a = g.source(4, "a");
        let b = g.source(4, "b");
        let mul = Multiplier::new(&mut g, &a.wires(), &b.wires(), ONE, "mul");

        for av in 0..16u64 {
            for bv in 0..16u64 {
                g.set_source(a, av);
                g.set_source(b, bv);
                mul.evaluate(&mut g);

                assert_eq!(g.read_bits(&mul.product), av * bv, "{} * {}", av, bv);
                assert_eq!(g.read_bits(mul.low_bits()), (av * bv) & 0xf);
            }
        }
    }

    #[test]
    fn test_multiplier_output_enable() {
        let mut g = Circuit::new();
        let a = g.source(3, "a");
        let b = g.source(3, "b");
        let enable = g.source(1, "enable");
        let mul = Multiplier::new(&mut g, &a.wires(), &b.wires(), enable.bit(), "mul");

        g.set_source(a, 5);
        g.set_source(b, 6);
        mul.evaluate(&mut g);
        assert_eq!(g.read_bits(&mul.product), 0);

        g.drive_high(enable);
        mul.evaluate(&mut g);
        assert_eq!(g.read_bits(&mul.product), 30);
    }

    #[test]
    fn test_multiplier_width_one() {
        let mut g = Circuit::new();
        let input = g.source(2, "input");
        let mul = Multiplier::new(
            &mut g,
            &[input.wire(0)],
            &[input.wire(1)],
            ONE,
            "mul",
        );

        for pattern in 0..4u64 {
            g.set_source(input, pattern);
            mul.evaluate(&mut g);
            let expected = (pattern & 1) * ((pattern >> 1) & 1);
            assert_eq!(g.read_bits(&mul.product), expected);
        }
    }
}
