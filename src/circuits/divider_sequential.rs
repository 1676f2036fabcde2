use super::adder_subtractor::AdderSubtractor;
use super::flip_flop::FlipFlop;
use super::register::Register;
use crate::graph::*;

fn mkname(name: String) -> String {
    format!("DIVSEQ:{}", name)
}

/// Iterative restoring divider: `n` internal cycles per quotient.
///
/// `start` snapshots the dividend, loads the divisor and raises busy.
/// Each `step` shifts the next dividend bit (MSB first) into the
/// remainder, trial-subtracts the divisor, and keeps the difference iff it
/// did not borrow; the no-borrow carry is also the next quotient bit, fed
/// straight into the quotient's shift feedback.
///
/// The shift feedback paths run through buffers so each register latches
/// its pre-step neighbours. Quotient and remainder leave through AND gates
/// driven by `output_enable`. Not used by the 3-bit machine.
pub struct DividerSequential {
    num_bits: usize,
    dividend_inputs: Vec<Wire>,

    quotient: Register,
    remainder: Register,
    divisor: Register,
    busy: FlipFlop,
    busy_set: SourceHandle,
    busy_clear: SourceHandle,
    step_we: SourceHandle,
    load_we: SourceHandle,
    dividend_bit: SourceHandle,

    subtractor: AdderSubtractor,
    shift_nodes: Vec<NodeIndex>,
    mux_nodes: Vec<NodeIndex>,
    output_nodes: Vec<NodeIndex>,
    remainder_next: Vec<Wire>,
    quotient_next: Vec<Wire>,
    quotient_out: Vec<Wire>,
    remainder_out: Vec<Wire>,

    dividend: u64,
    cycle_count: usize,
}

impl DividerSequential {
    /// # Panics
    ///
    /// Will panic if `dividend.len()` != `divisor.len()`.
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        dividend: &[Wire],
        divisor_in: &[Wire],
        output_enable: Wire,
        name: S,
    ) -> DividerSequential {
        assert_eq!(dividend.len(), divisor_in.len());
        let bits = dividend.len();
        let name = mkname(name.into());

        let busy_set = g.source(1, name.clone());
        let busy_clear = g.source(1, name.clone());
        let step_we = g.source(1, name.clone());
        let load_we = g.source(1, name.clone());
        let dividend_bit = g.source(1, name.clone());
        let busy = FlipFlop::new(g, busy_set.bit(), busy_clear.bit(), name.clone());

        // The divisor loads once and then holds; the working registers
        // latch every step.
        let divisor = Register::new(g, divisor_in, load_we.bit(), ONE, name.clone());
        let remainder = Register::new(g, &vec![ZERO; bits], step_we.bit(), ONE, name.clone());
        let quotient = Register::new(g, &vec![ZERO; bits], step_we.bit(), ONE, name.clone());

        // Shifted remainder with the incoming dividend bit at the bottom.
        let mut shift_nodes = Vec::new();
        let shifted: Vec<Wire> = (0..bits)
            .map(|i| {
                let src = if i == 0 {
                    dividend_bit.bit()
                } else {
                    remainder.outputs()[i - 1]
                };
                let buf = g.buffer1(src, name.clone());
                shift_nodes.push(buf.node);
                buf
            })
            .collect();

        // Trial subtraction; carry high means no borrow, so the shifted
        // remainder was large enough and the quotient gains a 1.
        let subtractor =
            AdderSubtractor::new(g, &shifted, divisor.outputs(), ONE, ONE, name.clone());
        let no_borrow = subtractor.carry_out;

        let mut mux_nodes = Vec::new();
        let borrow = g.not1(no_borrow, name.clone());
        mux_nodes.push(borrow.node);
        let remainder_next: Vec<Wire> = (0..bits)
            .map(|i| {
                let keep_difference = g.and2(subtractor.out[i], no_borrow, name.clone());
                let restore = g.and2(shifted[i], borrow, name.clone());
                let mux = g.or2(keep_difference, restore, name.clone());
                mux_nodes.push(keep_difference.node);
                mux_nodes.push(restore.node);
                mux_nodes.push(mux.node);
                mux
            })
            .collect();

        // Quotient shift feedback: the trial carry enters at the bottom.
        let mut quotient_next = Vec::with_capacity(bits);
        quotient_next.push(no_borrow);
        for i in 1..bits {
            let buf = g.buffer1(quotient.outputs()[i - 1], name.clone());
            shift_nodes.push(buf.node);
            quotient_next.push(buf);
        }

        for i in 0..bits {
            remainder.rebind_data(g, i, remainder_next[i]);
            quotient.rebind_data(g, i, quotient_next[i]);
        }

        // Gated outputs.
        let mut output_nodes = Vec::new();
        let mut gate = |g: &mut Circuit, bits_in: &[Wire]| -> Vec<Wire> {
            bits_in
                .iter()
                .map(|bit| {
                    let and = g.and2(*bit, output_enable, name.clone());
                    output_nodes.push(and.node);
                    and
                })
                .collect()
        };
        let quotient_out = gate(g, quotient.outputs());
        let remainder_out = gate(g, remainder.outputs());

        DividerSequential {
            num_bits: bits,
            dividend_inputs: dividend.to_vec(),
            quotient,
            remainder,
            divisor,
            busy,
            busy_set,
            busy_clear,
            step_we,
            load_we,
            dividend_bit,
            subtractor,
            shift_nodes,
            mux_nodes,
            output_nodes,
            remainder_next,
            quotient_next,
            quotient_out,
            remainder_out,
            dividend: 0,
            cycle_count: 0,
        }
    }

    /// Snapshots the dividend, loads the divisor, clears the working
    /// registers and raises busy.
    pub fn start(&mut self, g: &mut Circuit) {
        self.dividend = g.read_bits(&self.dividend_inputs);

        g.drive_high(self.load_we);
        self.divisor.update(g);
        g.drive_low(self.load_we);

        // Latch both working registers from zero, then return them to
        // their feedback paths.
        for i in 0..self.num_bits {
            self.remainder.rebind_data(g, i, ZERO);
            self.quotient.rebind_data(g, i, ZERO);
        }
        g.drive_high(self.step_we);
        self.remainder.update(g);
        self.quotient.update(g);
        g.drive_low(self.step_we);
        for i in 0..self.num_bits {
            self.remainder.rebind_data(g, i, self.remainder_next[i]);
            self.quotient.rebind_data(g, i, self.quotient_next[i]);
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

        let bit_index = self.num_bits - 1 - self.cycle_count;
        let bit = (self.dividend >> bit_index) & 1 != 0;
        g.set_source_bit(self.dividend_bit, 0, bit);

        // Combinational phase: shifts, trial subtraction, restore mux.
        g.eval_nodes(&self.shift_nodes);
        self.subtractor.evaluate(g);
        g.eval_nodes(&self.mux_nodes);

        // Latch phase.
        g.drive_high(self.step_we);
        self.remainder.update(g);
        self.quotient.update(g);
        g.drive_low(self.step_we);

        self.cycle_count += 1;
        if self.cycle_count >= self.num_bits {
            g.drive_high(self.busy_clear);
            self.busy.update(g);
            g.drive_low(self.busy_clear);
        }
        g.eval_nodes(&self.output_nodes);
    }

    pub fn is_busy(&self, g: &Circuit) -> bool {
        g.value(self.busy.q)
    }

    /// Quotient bits behind the output-enable gates.
    pub fn quotient(&self) -> &[Wire] {
        &self.quotient_out
    }

    /// Remainder bits behind the output-enable gates.
    pub fn remainder(&self) -> &[Wire] {
        &self.remainder_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn divide(g: &mut Circuit, unit: &mut DividerSequential) -> (u64, u64) {
        let mut steps = 0;
        while unit.is_busy(g) {
            unit.step(g);
            steps += 1;
            assert!(steps <= 8, "divider never went idle");
        }
        (g.read_bits(unit.quotient()), g.read_bits(unit.remainder()))
    }

    #[test]
    fn test_sequential_divide_exhaustive_4bit() {
        let mut g = Circuit::new();
        let dividend = g.source(4, "dividend");
        let divisor = g.source(4, "divisor");
        let mut unit =
            DividerSequential::new(&mut g, &dividend.wires(), &divisor.wires(), ONE, "divseq");

        for av in 0..16u64 {
            for bv in 1..16u64 {
                g.set_source(dividend, av);
                g.set_source(divisor, bv);
                unit.start(&mut g);
                let (q, r) = divide(&mut g, &mut unit);
                assert_eq!(q, av / bv, "{} / {}", av, bv);
                assert_eq!(r, av % bv, "{} % {}", av, bv);
            }
        }
    }

    #[test]
    fn test_output_enable_gates_results() {
        let mut g = Circuit::new();
        let dividend = g.source(4, "dividend");
        let divisor = g.source(4, "divisor");
        let enable = g.source(1, "enable");
        let mut unit = DividerSequential::new(
            &mut g,
            &dividend.wires(),
            &divisor.wires(),
            enable.bit(),
            "divseq",
        );

        g.set_source(dividend, 13);
        g.set_source(divisor, 3);
        unit.start(&mut g);
        while unit.is_busy(&g) {
            unit.step(&mut g);
        }
        assert_eq!(g.read_bits(unit.quotient()), 0, "outputs gated while disabled");

        g.drive_high(enable);
        let output_nodes = unit.output_nodes.clone();
        g.eval_nodes(&output_nodes);
        assert_eq!(g.read_bits(unit.quotient()), 4);
        assert_eq!(g.read_bits(unit.remainder()), 1);
    }
}
