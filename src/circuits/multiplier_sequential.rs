use super::adder::Adder;
use super::flip_flop::FlipFlop;
use super::register::Register;
use crate::graph::*;

fn mkname(name: String) -> String {
    format!("MULSEQ:{}", name)
}

/// Iterative shift-and-add multiplier: `n` internal cycles per product.
///
/// `start` loads the operands and raises the busy latch; each `step` adds
/// the multiplicand into the accumulator when the multiplier's LSB is set,
/// doubles the multiplicand and halves the multiplier. After `n` steps the
/// busy latch drops and the 2n accumulator bits hold the product.
///
/// The shift feedback paths run through buffers so each register latches
/// the pre-step value of its neighbours instead of cascading within one
/// update. Not used by the 3-bit machine; wider CPUs trade the area of the
/// array multiplier for these cycles.
pub struct MultiplierSequential {
    num_bits: usize,
    a_inputs: Vec<Wire>,
    b_inputs: Vec<Wire>,

    accumulator: Register,
    multiplicand: Register,
    multiplier: Register,
    busy: FlipFlop,
    busy_set: SourceHandle,
    busy_clear: SourceHandle,
    step_we: SourceHandle,

    adder: Adder,
    shift_nodes: Vec<NodeIndex>,
    mux_nodes: Vec<NodeIndex>,
    accumulator_mux: Vec<Wire>,
    multiplicand_shift: Vec<Wire>,
    multiplier_shift: Vec<Wire>,

    cycle_count: usize,
}

impl MultiplierSequential {
    /// # Panics
    ///
    /// Will panic if `a.len()` != `b.len()`.
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        a: &[Wire],
        b: &[Wire],
        name: S,
    ) -> MultiplierSequential {
        assert_eq!(a.len(), b.len());
        let bits = a.len();
        let name = mkname(name.into());

        let busy_set = g.source(1, name.clone());
        let busy_clear = g.source(1, name.clone());
        let step_we = g.source(1, name.clone());
        let busy = FlipFlop::new(g, busy_set.bit(), busy_clear.bit(), name.clone());

        // Registers; data inputs are re-bound to the feedback paths after
        // the operands are loaded in `start`.
        let accumulator = Register::new(g, &vec![ZERO; 2 * bits], step_we.bit(), ONE, name.clone());
        let multiplicand = Register::new(g, &vec![ZERO; 2 * bits], step_we.bit(), ONE, name.clone());
        let multiplier = Register::new(g, &vec![ZERO; bits], step_we.bit(), ONE, name.clone());

        let adder = Adder::new(g, accumulator.outputs(), multiplicand.outputs(), name.clone());

        // Shift feedback through buffers: multiplicand doubles, the
        // multiplier halves.
        let mut shift_nodes = Vec::new();
        let multiplicand_shift: Vec<Wire> = (0..2 * bits)
            .map(|i| {
                let src = if i == 0 {
                    ZERO
                } else {
                    multiplicand.outputs()[i - 1]
                };
                let buf = g.buffer1(src, name.clone());
                shift_nodes.push(buf.node);
                buf
            })
            .collect();
        let multiplier_shift: Vec<Wire> = (0..bits)
            .map(|i| {
                let src = if i == bits - 1 {
                    ZERO
                } else {
                    multiplier.outputs()[i + 1]
                };
                let buf = g.buffer1(src, name.clone());
                shift_nodes.push(buf.node);
                buf
            })
            .collect();

        // Accumulator next value: the running sum when the multiplier LSB
        // is set, otherwise recirculate.
        let lsb = multiplier.outputs()[0];
        let mut mux_nodes = Vec::new();
        let not_lsb = g.not1(lsb, name.clone());
        mux_nodes.push(not_lsb.node);
        let accumulator_mux: Vec<Wire> = (0..2 * bits)
            .map(|i| {
                let add_term = g.and2(adder.sum[i], lsb, name.clone());
                let hold_term = g.and2(accumulator.outputs()[i], not_lsb, name.clone());
                let mux = g.or2(add_term, hold_term, name.clone());
                mux_nodes.push(add_term.node);
                mux_nodes.push(hold_term.node);
                mux_nodes.push(mux.node);
                mux
            })
            .collect();

        MultiplierSequential {
            num_bits: bits,
            a_inputs: a.to_vec(),
            b_inputs: b.to_vec(),
            accumulator,
            multiplicand,
            multiplier,
            busy,
            busy_set,
            busy_clear,
            step_we,
            adder,
            shift_nodes,
            mux_nodes,
            accumulator_mux,
            multiplicand_shift,
            multiplier_shift,
            cycle_count: 0,
        }
    }

    /// Loads the operands, clears the accumulator and raises busy.
    pub fn start(&mut self, g: &mut Circuit) {
        // Point the register data inputs at the operands for the load.
        for i in 0..2 * self.num_bits {
            self.accumulator.rebind_data(g, i, ZERO);
            let source = if i < self.num_bits {
                self.a_inputs[i]
            } else {
                ZERO
            };
            self.multiplicand.rebind_data(g, i, source);
        }
        for (i, b) in self.b_inputs.iter().enumerate() {
            self.multiplier.rebind_data(g, i, *b);
        }

        g.drive_high(self.step_we);
        self.accumulator.update(g);
        self.multiplicand.update(g);
        self.multiplier.update(g);
        g.drive_low(self.step_we);

        // Back onto the feedback paths for the stepping cycles.
        for i in 0..2 * self.num_bits {
            self.accumulator.rebind_data(g, i, self.accumulator_mux[i]);
            self.multiplicand
                .rebind_data(g, i, self.multiplicand_shift[i]);
        }
        for i in 0..self.num_bits {
            self.multiplier.rebind_data(g, i, self.multiplier_shift[i]);
        }

        g.drive_high(self.busy_set);
        self.busy.update(g);
        g.drive_low(self.busy_set);
        self.cycle_count = 0;
    }

    /// One internal cycle; does nothing once busy has dropped.
    pub fn step(&mut self, g: &mut Circuit) {
        if !self.is_busy(g) {
            return;
        }

        // Combinational phase: capture the shifts and the conditional sum.
        g.eval_nodes(&self.shift_nodes);
        self.adder.evaluate(g);
        g.eval_nodes(&self.mux_nodes);

        // Latch phase.
        g.drive_high(self.step_we);
        self.accumulator.update(g);
        self.multiplicand.update(g);
        self.multiplier.update(g);
        g.drive_low(self.step_we);

        self.cycle_count += 1;
        if self.cycle_count >= self.num_bits {
            g.drive_high(self.busy_clear);
            self.busy.update(g);
            g.drive_low(self.busy_clear);
        }
    }

    pub fn is_busy(&self, g: &Circuit) -> bool {
        g.value(self.busy.q)
    }

    /// The 2n product bits, valid once busy has dropped.
    pub fn product(&self) -> &[Wire] {
        self.accumulator.outputs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiply(g: &mut Circuit, unit: &mut MultiplierSequential, steps_limit: usize) -> u64 {
        let mut steps = 0;
        while unit.is_busy(g) {
            unit.step(g);
            steps += 1;
            assert!(steps <= steps_limit, "multiplier never went idle");
        }
        g.read_bits(unit.product())
    }

    #[test]
    fn test_sequential_multiply_exhaustive_4bit() {
        let mut g = Circuit::new();
        let a = g.source(4, "a");
        let b = g.source(4, "b");
        let mut unit = MultiplierSequential::new(&mut g, &a.wires(), &b.wires(), "mulseq");

        for av in 0..16u64 {
            for bv in 0..16u64 {
                g.set_source(a, av);
                g.set_source(b, bv);
                unit.start(&mut g);
                assert!(unit.is_busy(&g));
                assert_eq!(multiply(&mut g, &mut unit, 4), av * bv, "{} * {}", av, bv);
            }
        }
    }

    #[test]
    fn test_step_after_done_is_inert() {
        let mut g = Circuit::new();
        let a = g.source(4, "a");
        let b = g.source(4, "b");
        let mut unit = MultiplierSequential::new(&mut g, &a.wires(), &b.wires(), "mulseq");

        g.set_source(a, 7);
        g.set_source(b, 9);
        unit.start(&mut g);
        for _ in 0..10 {
            unit.step(&mut g);
        }
        assert!(!unit.is_busy(&g));
        assert_eq!(g.read_bits(unit.product()), 63);
    }
}
