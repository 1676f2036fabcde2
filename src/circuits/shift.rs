use crate::graph::*;

/// One-place shift toward higher bit indices with zero fill:
/// `out[i] = a[i-1]`, `out[0] = 0`. Pure routing, no gates.
pub fn r_shift(a: &[Wire]) -> Vec<Wire> {
    let mut out = Vec::with_capacity(a.len());
    out.push(ZERO);
    out.extend_from_slice(&a[..a.len() - 1]);
    out
}

/// One-place shift toward lower bit indices with zero fill:
/// `out[i] = a[i+1]`, `out[n-1] = 0`.
pub fn l_shift(a: &[Wire]) -> Vec<Wire> {
    let mut out = Vec::with_capacity(a.len());
    out.extend_from_slice(&a[1..]);
    out.push(ZERO);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_routing() {
        let mut g = Circuit::new();
        let word = g.source(4, "word");

        let right = r_shift(&word.wires());
        let left = l_shift(&word.wires());

        for value in 0..16u64 {
            g.set_source(word, value);
            // Routed wires read the source cells directly.
            assert_eq!(g.read_bits(&right), (value << 1) & 0xf, "r_shift {}", value);
            assert_eq!(g.read_bits(&left), value >> 1, "l_shift {}", value);
        }
    }
}
