use crate::graph::*;

fn mkname(name: String) -> String {
    format!("FLIPFLOP:{}", name)
}

/// SR latch: active-high Set/Reset through two inverters into a pair of
/// cross-coupled NANDs. Powers up with Q low.
///
/// Settling runs the NAND pair twice, which is exactly enough for the
/// feedback to reach its final latched value; glitches in between are not
/// modelled. `S = R = 1` is not guarded and settles to whatever the two
/// passes produce.
#[derive(Debug, Clone)]
pub struct FlipFlop {
    inv_s: Wire,
    inv_r: Wire,
    nand_q: Wire,
    nand_nq: Wire,
    pub q: Wire,
}

impl FlipFlop {
    pub fn new<S: Into<String>>(g: &mut Circuit, s: Wire, r: Wire, name: S) -> FlipFlop {
        let name = mkname(name.into());

        let inv_s = g.not1(s, name.clone());
        let inv_r = g.not1(r, name.clone());

        // ZERO is a placeholder for the cross-coupling, bound just below.
        let nand_q = g.nand2(inv_s, ZERO, name.clone());
        let nand_nq = g.nand2(nand_q, inv_r, name);
        g.dx(nand_q, 1, nand_nq);

        // Power-up state: Q = 0, not-Q = 1.
        g.force(nand_nq, true);

        FlipFlop {
            inv_s,
            inv_r,
            nand_q,
            nand_nq,
            q: nand_q,
        }
    }

    /// Settles the latch from the current S/R wire values: the observable
    /// output changes at evaluate time.
    pub fn evaluate(&self, g: &mut Circuit) {
        g.eval_wire(self.inv_s);
        g.eval_wire(self.inv_r);
        g.eval_wire(self.nand_q);
        g.eval_wire(self.nand_nq);
        // Second pass so the cross-coupled feedback settles.
        g.eval_wire(self.nand_q);
        g.eval_wire(self.nand_nq);
    }

    pub fn update(&self, g: &mut Circuit) {
        self.evaluate(g);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reset_hold() {
        let mut g = Circuit::new();
        let control = g.source(2, "control");
        let ff = FlipFlop::new(&mut g, control.wire(0), control.wire(1), "ff");

        assert_eq!(g.value(ff.q), false);

        // Set.
        g.set_source(control, 0b01);
        ff.update(&mut g);
        assert_eq!(g.value(ff.q), true);

        // Hold.
        g.set_source(control, 0b00);
        ff.update(&mut g);
        assert_eq!(g.value(ff.q), true);

        // Reset.
        g.set_source(control, 0b10);
        ff.update(&mut g);
        assert_eq!(g.value(ff.q), false);

        // Hold.
        g.set_source(control, 0b00);
        ff.update(&mut g);
        assert_eq!(g.value(ff.q), false);
    }

    #[test]
    fn test_hold_across_many_updates() {
        let mut g = Circuit::new();
        let control = g.source(2, "control");
        let ff = FlipFlop::new(&mut g, control.wire(0), control.wire(1), "ff");

        g.set_source(control, 0b01);
        ff.update(&mut g);
        g.set_source(control, 0b00);
        for _ in 0..10 {
            ff.update(&mut g);
            assert_eq!(g.value(ff.q), true);
        }
    }
}
