use super::adder_subtractor::AdderSubtractor;
use super::multiplier::Multiplier;
use crate::graph::*;
use std::ops::Range;

fn mkname(name: String) -> String {
    format!("AU:{}", name)
}

/// Enable lines for the arithmetic unit. At most one should be high;
/// with several high the result is the OR of the enabled datapaths.
#[derive(Debug, Clone, Copy)]
pub struct ArithmeticEnables {
    pub add_en: Wire,
    pub sub_en: Wire,
    pub inc_en: Wire,
    pub dec_en: Wire,
    pub mul_en: Wire,
}

/// Arithmetic datapath: one adder-subtractor shared by add/sub/inc/dec and
/// a combinational multiplier for mul.
///
/// `sub | dec` drives the subtract pin; `add | sub | inc | dec` the
/// adder-subtractor's output enable. Operand B is gated per bit:
/// the provided B for add/sub, the constant 1 for inc/dec.
#[derive(Debug, Clone)]
pub struct ArithmeticUnit {
    pub out: Vec<Wire>,
    span: Range<usize>,
}

impl ArithmeticUnit {
    /// # Panics
    ///
    /// Will panic if `a.len()` != `b.len()`.
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        a: &[Wire],
        b: &[Wire],
        en: ArithmeticEnables,
        name: S,
    ) -> ArithmeticUnit {
        assert_eq!(a.len(), b.len());
        let name = mkname(name.into());
        let mark = g.mark();

        let sub_or_dec = g.or2(en.sub_en, en.dec_en, name.clone());
        let add_or_sub = g.or2(en.add_en, en.sub_en, name.clone());
        let inc_or_dec = g.or2(en.inc_en, en.dec_en, name.clone());
        let addsub_enable = g.or2(add_or_sub, inc_or_dec, name.clone());

        // Operand B: the caller's B for add/sub, the constant 1 for inc/dec.
        let b_operand: Vec<Wire> = b
            .iter()
            .enumerate()
            .map(|(i, b_bit)| {
                let provided = g.and2(*b_bit, add_or_sub, name.clone());
                let one_bit = if i == 0 { ONE } else { ZERO };
                let constant = g.and2(one_bit, inc_or_dec, name.clone());
                g.or2(provided, constant, name.clone())
            })
            .collect();

        let addsub =
            AdderSubtractor::new(g, a, &b_operand, sub_or_dec, addsub_enable, name.clone());
        let mul = Multiplier::new(g, a, b, en.mul_en, name.clone());

        // Both datapaths gate to zero when disabled, so a plain OR merges
        // them into the unit's result.
        let out = addsub
            .out
            .iter()
            .zip(mul.low_bits().iter())
            .map(|(s, m)| g.or2(*s, *m, name.clone()))
            .collect();

        ArithmeticUnit {
            out,
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

    fn unit(g: &mut Circuit) -> (SourceHandle, SourceHandle, SourceHandle, ArithmeticUnit) {
        let a = g.source(4, "a");
        let b = g.source(4, "b");
        let enables = g.source(5, "enables"); // add, sub, inc, dec, mul
        let au = ArithmeticUnit::new(
            g,
            &a.wires(),
            &b.wires(),
            ArithmeticEnables {
                add_en: enables.wire(0),
                sub_en: enables.wire(1),
                inc_en: enables.wire(2),
                dec_en: enables.wire(3),
                mul_en: enables.wire(4),
            },
            "au",
        );
        (a, b, enables, au)
    }

    #[test]
    fn test_arithmetic_unit_exhaustive_4bit() {
        let mut g = Circuit::new();
        let (a, b, enables, au) = unit(&mut g);

        for av in 0..16u64 {
            for bv in 0..16u64 {
                g.set_source(a, av);
                g.set_source(b, bv);

                let cases = [
                    (0b00001, (av + bv) & 0xf),
                    (0b00010, av.wrapping_sub(bv) & 0xf),
                    (0b00100, (av + 1) & 0xf),
                    (0b01000, av.wrapping_sub(1) & 0xf),
                    (0b10000, (av * bv) & 0xf),
                ];
                for (enable, expected) in cases {
                    g.set_source(enables, enable);
                    au.evaluate(&mut g);
                    assert_eq!(
                        g.read_bits(&au.out),
                        expected,
                        "a:{} b:{} enable:{:05b}",
                        av,
                        bv,
                        enable
                    );
                }
            }
        }
    }

    #[test]
    fn test_arithmetic_unit_disabled_is_zero() {
        let mut g = Circuit::new();
        let (a, b, enables, au) = unit(&mut g);

        g.set_source(a, 9);
        g.set_source(b, 4);
        g.set_source(enables, 0);
        au.evaluate(&mut g);
        assert_eq!(g.read_bits(&au.out), 0);
    }
}
