use super::adder::Adder;
use super::alu::rebind_pins;
use super::decoder::Decoder;
use super::flip_flop::FlipFlop;
use super::register::Register;
use crate::error::SimError;
use crate::graph::*;

fn mkname(name: String) -> String {
    format!("CU:{}", name)
}

/// Width of the comparator flag register: EQ, NEQ, LT_U, GT_U, LT_S, GT_S.
pub const NUM_FLAGS: usize = 6;

/// Control unit: program counter with incrementer and jump mux, opcode
/// decoder, comparator flag register, RAM-page register and the run/halt
/// latch.
///
/// Per bit, the next PC value is
/// `(pc_plus_one[i] & !jump_enable & !halt) | (jump_addr[i] & jump_enable)`.
/// The `!halt` term comes from an immediate inverter on the halt OR, not
/// from the latch, so a halt gates the PC in the same cycle it is seen.
/// The same immediate line drives the PC's write-enable: while halted the
/// PC holds its value rather than latching the zeroed mux output.
///
/// The halt OR combines the externally wired halt-opcode line (input 0)
/// with a PC-carry line (input 1); both default to [ZERO], and the run/halt
/// latch is initialized to running by pulsing its Set source high during
/// construction.
pub struct ControlUnit {
    pc_bits: usize,
    opcode_bits: usize,

    halt_or: Wire,
    halt_inverter: Wire,
    run_halt: FlipFlop,

    incrementer: Adder,
    jump_enable_pin: Wire,
    jump_addr_pins: Vec<Wire>,
    jump_enable_inverter: Wire,
    pc_mux_nodes: Vec<NodeIndex>,
    pc: Register,

    opcode_pins: Vec<Wire>,
    decoder: Decoder,

    flag_register: Register,
    page_register: Register,
    page_we_pin: Wire,
}

impl ControlUnit {
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        opcode_bits: usize,
        pc_bits: usize,
        name: S,
    ) -> ControlUnit {
        let name = mkname(name.into());

        // Run/halt control. Input 0 of the OR is the halt opcode line,
        // input 1 the PC carry; both are wired externally.
        let halt_or = g.or2(ZERO, ZERO, name.clone());
        let halt_inverter = g.not1(halt_or, name.clone());
        let halt_set = g.source(1, name.clone());
        let run_halt = FlipFlop::new(g, halt_set.bit(), halt_or, name.clone());

        // Initialize to running: pulse Set high, settle, bring it back low.
        g.drive_high(halt_set);
        run_halt.evaluate(g);
        g.drive_low(halt_set);

        // PC storage first, data inputs re-bound to the mux below.
        let pc = Register::new(g, &vec![ZERO; pc_bits], halt_inverter, ONE, name.clone());

        // PC incrementer: constant 1 plus the current PC.
        let mut one = vec![ZERO; pc_bits];
        one[0] = ONE;
        let incrementer = Adder::new(g, &one, pc.outputs(), name.clone());

        // Jump mux.
        let jump_enable_pin = g.buffer1(ZERO, name.clone());
        let jump_addr_pins: Vec<Wire> = (0..pc_bits)
            .map(|_| g.buffer1(ZERO, name.clone()))
            .collect();
        let jump_enable_inverter = g.not1(jump_enable_pin, name.clone());

        let mut pc_mux_nodes = Vec::with_capacity(3 * pc_bits);
        for i in 0..pc_bits {
            let increment_and = g.andx(
                [
                    incrementer.sum[i],
                    jump_enable_inverter,
                    halt_inverter,
                ],
                name.clone(),
            );
            let jump_and = g.and2(jump_addr_pins[i], jump_enable_pin, name.clone());
            let mux = g.or2(increment_and, jump_and, name.clone());
            pc_mux_nodes.push(increment_and.node);
            pc_mux_nodes.push(jump_and.node);
            pc_mux_nodes.push(mux.node);
            pc.rebind_data(g, i, mux);
        }

        // Opcode decoder behind buffer pins.
        let opcode_pins: Vec<Wire> = (0..opcode_bits)
            .map(|_| g.buffer1(ZERO, name.clone()))
            .collect();
        let decoder = Decoder::new(g, &opcode_pins, name.clone());

        // Comparator flags write every cycle and are always readable.
        let flag_register = Register::new(g, &vec![ZERO; NUM_FLAGS], ONE, ONE, name.clone());

        // RAM-page register; write-enable and data are wired externally.
        let page_we_pin = g.buffer1(ZERO, name.clone());
        let page_register = Register::new(g, &vec![ZERO; pc_bits], page_we_pin, ONE, name);

        ControlUnit {
            pc_bits,
            opcode_bits,
            halt_or,
            halt_inverter,
            run_halt,
            incrementer,
            jump_enable_pin,
            jump_addr_pins,
            jump_enable_inverter,
            pc_mux_nodes,
            pc,
            opcode_pins,
            decoder,
            flag_register,
            page_register,
            page_we_pin,
        }
    }

    /// Combinational phase, in dependency order: halt control, PC+1, jump
    /// mux, PC readout, opcode decode, then the flag and page registers.
    pub fn evaluate(&self, g: &mut Circuit) {
        g.eval_wire(self.halt_or);
        g.eval_wire(self.halt_inverter);
        self.run_halt.evaluate(g);

        self.incrementer.evaluate(g);

        g.eval_wire(self.jump_enable_pin);
        g.eval_wire(self.jump_enable_inverter);
        for pin in &self.jump_addr_pins {
            g.eval_wire(*pin);
        }
        g.eval_nodes(&self.pc_mux_nodes);
        self.pc.evaluate(g);

        for pin in &self.opcode_pins {
            g.eval_wire(*pin);
        }
        self.decoder.evaluate(g);

        self.flag_register.evaluate(g);

        g.eval_wire(self.page_we_pin);
        self.page_register.evaluate(g);
    }

    /// Latch phase. The incrementer and mux are NOT re-run here; doing so
    /// would advance the PC twice per cycle.
    pub fn update(&self, g: &mut Circuit) {
        self.run_halt.update(g);
        self.flag_register.update(g);
        self.pc.update(g);
        self.page_register.update(g);
    }

    /// Wires the jump target address into the PC mux.
    pub fn connect_jump_address(&self, g: &mut Circuit, sources: &[Wire]) -> Result<(), SimError> {
        rebind_pins(g, &self.jump_addr_pins, sources, "jump address")
    }

    pub fn connect_jump_enable(&self, g: &mut Circuit, source: Wire) {
        g.d0(self.jump_enable_pin, source);
    }

    /// Wires the opcode field into the decoder.
    pub fn connect_opcode_input(&self, g: &mut Circuit, sources: &[Wire]) -> Result<(), SimError> {
        rebind_pins(g, &self.opcode_pins, sources, "opcode input")
    }

    /// Wires the six comparator flags into the flag register.
    pub fn connect_comparator_flags(
        &self,
        g: &mut Circuit,
        sources: &[Wire],
    ) -> Result<(), SimError> {
        if sources.len() != NUM_FLAGS {
            return Err(SimError::WidthMismatch {
                component: "comparator flags".into(),
                expected: NUM_FLAGS,
                got: sources.len(),
            });
        }
        for (i, source) in sources.iter().enumerate() {
            self.flag_register.rebind_data(g, i, *source);
        }
        Ok(())
    }

    /// Wires a decoded halt line into the run/halt latch; once the line
    /// goes high the latch resets and stays reset.
    pub fn connect_halt_signal(&self, g: &mut Circuit, source: Wire) {
        g.dx(self.halt_or, 0, source);
    }

    /// Wires a PC overflow signal into the halt OR, so running off the end
    /// of program memory stops the machine.
    pub fn connect_pc_carry(&self, g: &mut Circuit, source: Wire) {
        g.dx(self.halt_or, 1, source);
    }

    pub fn connect_ram_page_data(&self, g: &mut Circuit, sources: &[Wire]) -> Result<(), SimError> {
        if sources.len() != self.pc_bits {
            return Err(SimError::WidthMismatch {
                component: "RAM page data".into(),
                expected: self.pc_bits,
                got: sources.len(),
            });
        }
        for (i, source) in sources.iter().enumerate() {
            self.page_register.rebind_data(g, i, *source);
        }
        Ok(())
    }

    pub fn connect_ram_page_write_enable(&self, g: &mut Circuit, source: Wire) {
        g.d0(self.page_we_pin, source);
    }

    pub fn pc_outputs(&self) -> &[Wire] {
        self.pc.outputs()
    }

    pub fn decoder_outputs(&self) -> &[Wire] {
        &self.decoder.lines
    }

    pub fn stored_flags(&self) -> &[Wire] {
        self.flag_register.outputs()
    }

    pub fn page_outputs(&self) -> &[Wire] {
        self.page_register.outputs()
    }

    /// The run/halt latch output: high while running.
    pub fn run_halt_bit(&self) -> Wire {
        self.run_halt.q
    }

    pub fn is_running(&self, g: &Circuit) -> bool {
        g.value(self.run_halt.q)
    }

    pub fn pc_bits(&self) -> usize {
        self.pc_bits
    }

    pub fn opcode_bits(&self) -> usize {
        self.opcode_bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn step(g: &mut Circuit, cu: &ControlUnit) {
        cu.evaluate(g);
        cu.update(g);
    }

    #[test]
    fn test_pc_increments_modulo() {
        let mut g = Circuit::new();
        let cu = ControlUnit::new(&mut g, 2, 4, "cu");

        for expected in 1..40u64 {
            step(&mut g, &cu);
            assert_eq!(g.read_bits(cu.pc_outputs()), expected % 16);
        }
    }

    #[test]
    fn test_jump_loads_pc() {
        let mut g = Circuit::new();
        let jump_addr = g.source(4, "jump_addr");
        let jump_enable = g.source(1, "jump_enable");
        let cu = ControlUnit::new(&mut g, 2, 4, "cu");
        cu.connect_jump_address(&mut g, &jump_addr.wires()).unwrap();
        cu.connect_jump_enable(&mut g, jump_enable.bit());

        step(&mut g, &cu);
        step(&mut g, &cu);
        assert_eq!(g.read_bits(cu.pc_outputs()), 2);

        g.set_source(jump_addr, 11);
        g.drive_high(jump_enable);
        step(&mut g, &cu);
        assert_eq!(g.read_bits(cu.pc_outputs()), 11);

        g.drive_low(jump_enable);
        step(&mut g, &cu);
        assert_eq!(g.read_bits(cu.pc_outputs()), 12);
    }

    #[test]
    fn test_halt_freezes_pc_and_latches() {
        let mut g = Circuit::new();
        let halt = g.source(1, "halt");
        let cu = ControlUnit::new(&mut g, 2, 4, "cu");
        cu.connect_halt_signal(&mut g, halt.bit());

        assert!(cu.is_running(&g));
        step(&mut g, &cu);
        step(&mut g, &cu);
        step(&mut g, &cu);
        assert_eq!(g.read_bits(cu.pc_outputs()), 3);

        g.drive_high(halt);
        step(&mut g, &cu);
        assert!(!cu.is_running(&g));
        assert_eq!(g.read_bits(cu.pc_outputs()), 3, "halt freezes the PC");

        // Held high, the PC stays frozen cycle after cycle.
        step(&mut g, &cu);
        step(&mut g, &cu);
        assert_eq!(g.read_bits(cu.pc_outputs()), 3);

        // The latch stays reset even after the halt line drops.
        g.drive_low(halt);
        step(&mut g, &cu);
        assert!(!cu.is_running(&g));
    }

    #[test]
    fn test_flag_register_latches_at_update() {
        let mut g = Circuit::new();
        let flags = g.source(NUM_FLAGS, "flags");
        let cu = ControlUnit::new(&mut g, 2, 4, "cu");
        cu.connect_comparator_flags(&mut g, &flags.wires()).unwrap();

        g.set_source(flags, 0b010110);
        step(&mut g, &cu);
        cu.evaluate(&mut g);
        assert_eq!(g.read_bits(cu.stored_flags()), 0b010110);

        g.set_source(flags, 0b000001);
        step(&mut g, &cu);
        cu.evaluate(&mut g);
        assert_eq!(g.read_bits(cu.stored_flags()), 0b000001);
    }

    #[test]
    fn test_page_register() {
        let mut g = Circuit::new();
        let page = g.source(4, "page");
        let page_we = g.source(1, "page_we");
        let cu = ControlUnit::new(&mut g, 2, 4, "cu");
        cu.connect_ram_page_data(&mut g, &page.wires()).unwrap();
        cu.connect_ram_page_write_enable(&mut g, page_we.bit());

        g.set_source(page, 9);
        step(&mut g, &cu);
        cu.evaluate(&mut g);
        assert_eq!(g.read_bits(cu.page_outputs()), 0, "WE low, nothing stored");

        g.drive_high(page_we);
        step(&mut g, &cu);
        g.drive_low(page_we);
        g.set_source(page, 2);
        step(&mut g, &cu);
        cu.evaluate(&mut g);
        assert_eq!(g.read_bits(cu.page_outputs()), 9);
    }

    #[test]
    fn test_control_unit_random_walk() {
        let mut g = Circuit::new();
        let opcode = g.source(4, "opcode");
        let flags = g.source(NUM_FLAGS, "flags");
        let cu = ControlUnit::new(&mut g, 4, 8, "cu");
        cu.connect_opcode_input(&mut g, &opcode.wires()).unwrap();
        cu.connect_comparator_flags(&mut g, &flags.wires()).unwrap();

        let mut rng = rand::thread_rng();
        let mut expected_pc = 0u64;
        for _ in 0..10_000 {
            let op = rng.gen_range(0..16u64);
            g.set_source(opcode, op);
            g.set_source(flags, rng.gen_range(0..64u64));
            step(&mut g, &cu);

            expected_pc = (expected_pc + 1) % 256;
            assert_eq!(g.read_bits(cu.pc_outputs()), expected_pc);
            cu.evaluate(&mut g);
            assert_eq!(g.read_bits(cu.decoder_outputs()), 1 << op);
        }
    }
}
