use super::flip_flop::FlipFlop;
use crate::graph::*;

fn mkname(name: String) -> String {
    format!("MEMBIT:{}", name)
}

/// One stored bit: `S = data & WE`, `R = !data & WE` into an SR latch,
/// readout `Q & RE`.
///
/// `evaluate` refreshes the conditioning gates and the readout but leaves
/// the latch alone; `update` re-reads the conditioning gates and settles
/// the latch. A write therefore becomes readable only on the cycle after
/// the update that latched it.
#[derive(Debug, Clone)]
pub struct MemoryBit {
    data_inv: Wire,
    set_and: Wire,
    reset_and: Wire,
    flip_flop: FlipFlop,
    out: Wire,
}

impl MemoryBit {
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        data: Wire,
        write_enable: Wire,
        read_enable: Wire,
        name: S,
    ) -> MemoryBit {
        let name = mkname(name.into());

        let data_inv = g.not1(data, name.clone());
        let set_and = g.and2(data, write_enable, name.clone());
        let reset_and = g.and2(data_inv, write_enable, name.clone());
        let flip_flop = FlipFlop::new(g, set_and, reset_and, name.clone());
        let out = g.and2(flip_flop.q, read_enable, name);

        MemoryBit {
            data_inv,
            set_and,
            reset_and,
            flip_flop,
            out,
        }
    }

    fn eval_conditioning(&self, g: &mut Circuit) {
        g.eval_wire(self.data_inv);
        g.eval_wire(self.set_and);
        g.eval_wire(self.reset_and);
    }

    pub fn evaluate(&self, g: &mut Circuit) {
        self.eval_conditioning(g);
        g.eval_wire(self.out);
    }

    pub fn update(&self, g: &mut Circuit) {
        self.eval_conditioning(g);
        self.flip_flop.update(g);
        g.eval_wire(self.out);
    }

    /// Re-points the data input; the write-enable and read-enable wires are
    /// fixed for the life of the bit.
    pub fn rebind_data(&self, g: &mut Circuit, data: Wire) {
        g.d0(self.data_inv, data);
        g.d0(self.set_and, data);
    }

    /// The gated readout, `Q & RE`.
    pub fn output(&self) -> Wire {
        self.out
    }

    /// The raw latch state, bypassing the read-enable gate. Debug readouts
    /// use this to dump memory without driving a port.
    pub fn latched(&self) -> Wire {
        self.flip_flop.q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut g = Circuit::new();
        let pins = g.source(3, "pins"); // data, we, re
        let bit = MemoryBit::new(&mut g, pins.wire(0), pins.wire(1), pins.wire(2), "bit");

        // data=1, WE=1: not visible until update, then only with RE.
        g.set_source(pins, 0b011);
        bit.evaluate(&mut g);
        assert_eq!(g.value(bit.output()), false);

        bit.update(&mut g);
        assert_eq!(g.value(bit.latched()), true);
        assert_eq!(g.value(bit.output()), false); // RE still low

        g.set_source(pins, 0b100);
        bit.evaluate(&mut g);
        assert_eq!(g.value(bit.output()), true);
    }

    #[test]
    fn test_write_disabled_holds() {
        let mut g = Circuit::new();
        let pins = g.source(3, "pins");
        let bit = MemoryBit::new(&mut g, pins.wire(0), pins.wire(1), pins.wire(2), "bit");

        g.set_source(pins, 0b011);
        bit.update(&mut g);

        // WE low: data churn must not disturb the stored bit.
        for data in [false, true, false] {
            g.set_source_bit(pins, 0, data);
            g.set_source_bit(pins, 1, false);
            bit.update(&mut g);
            assert_eq!(g.value(bit.latched()), true);
        }
    }
}
