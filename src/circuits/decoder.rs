use crate::graph::*;
use std::ops::Range;

fn mkname(name: String) -> String {
    format!("DECODER:{}", name)
}

/// n-to-2^n one-hot decoder: one inverter per address bit and a 2^n-wide
/// AND fabric. Line k is high iff the binary input pattern equals k.
#[derive(Debug, Clone)]
pub struct Decoder {
    pub lines: Vec<Wire>,
    span: Range<usize>,
}

impl Decoder {
    pub fn new<S: Into<String>>(g: &mut Circuit, address: &[Wire], name: S) -> Decoder {
        let name = mkname(name.into());
        let mark = g.mark();

        let inverted: Vec<Wire> = address
            .iter()
            .map(|bit| g.not1(*bit, name.clone()))
            .collect();

        let lines = (0..1usize << address.len())
            .map(|k| {
                let inputs = address
                    .iter()
                    .zip(inverted.iter())
                    .enumerate()
                    .map(
                        |(bit, (a, na))| {
                            if (k >> bit) & 1 != 0 {
                                *a
                            } else {
                                *na
                            }
                        },
                    )
                    .collect::<Vec<_>>();
                g.andx(inputs, name.clone())
            })
            .collect();

        Decoder {
            lines,
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
    fn test_decoder_one_hot() {
        let mut g = Circuit::new();
        let address = g.source(3, "address");
        let decoder = Decoder::new(&mut g, &address.wires(), "decoder");

        for value in 0..8u64 {
            g.set_source(address, value);
            decoder.evaluate(&mut g);
            assert_eq!(
                g.read_bits(&decoder.lines),
                1 << value,
                "address {}",
                value
            );
        }
    }
}
