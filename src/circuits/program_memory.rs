use super::alu::rebind_pins;
use super::decoder::Decoder;
use super::register::Register;
use crate::error::SimError;
use crate::graph::*;

fn mkname(name: String) -> String {
    format!("PM:{}", name)
}

/// Number of instruction fields per address slot: opcode, C, A, B.
pub const PM_FIELDS: usize = 4;

struct Slot {
    registers: Vec<Register>,
}

/// Program memory: 2^A address slots, each holding four D-bit registers
/// (opcode, C, A, B) behind decoder-gated write/read selects.
///
/// The address, data, WE and RE inputs enter through buffer pins; the
/// loader re-points the address pins at its own signal bank while writing
/// and back at the program counter afterwards. Reads are combinational:
/// each output bit ORs the gated register outputs across all slots, and
/// unary addressing guarantees at most one slot contributes.
pub struct ProgramMemory {
    address_bits: usize,
    data_bits: usize,
    addr_pins: Vec<Wire>,
    data_pins: Vec<Wire>,
    we_pin: Wire,
    re_pin: Wire,
    decoder: Decoder,
    slots: Vec<Slot>,
    select_nodes: Vec<NodeIndex>,
    readout_nodes: Vec<NodeIndex>,
    outputs: Vec<Wire>,
}

impl ProgramMemory {
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        address_bits: usize,
        data_bits: usize,
        name: S,
    ) -> ProgramMemory {
        let name = mkname(name.into());
        let num_slots = 1usize << address_bits;

        let addr_pins: Vec<Wire> = (0..address_bits)
            .map(|_| g.buffer1(ZERO, name.clone()))
            .collect();
        let data_pins: Vec<Wire> = (0..PM_FIELDS * data_bits)
            .map(|_| g.buffer1(ZERO, name.clone()))
            .collect();
        let we_pin = g.buffer1(ZERO, name.clone());
        let re_pin = g.buffer1(ZERO, name.clone());

        let decoder = Decoder::new(g, &addr_pins, name.clone());

        let mut select_nodes = Vec::with_capacity(2 * num_slots);
        let slots: Vec<Slot> = (0..num_slots)
            .map(|k| {
                let line = decoder.lines[k];
                let write_select = g.and2(line, we_pin, name.clone());
                let read_select = g.and2(line, re_pin, name.clone());
                select_nodes.push(write_select.node);
                select_nodes.push(read_select.node);

                let registers = (0..PM_FIELDS)
                    .map(|field| {
                        let data = &data_pins[field * data_bits..(field + 1) * data_bits];
                        Register::new(g, data, write_select, read_select, name.clone())
                    })
                    .collect();

                Slot { registers }
            })
            .collect();

        // Per-bit OR readout across slots; the register outputs are already
        // gated by the slot read selects.
        let mut readout_nodes = Vec::with_capacity(PM_FIELDS * data_bits);
        let outputs: Vec<Wire> = (0..PM_FIELDS * data_bits)
            .map(|bit| {
                let field = bit / data_bits;
                let bit_in_field = bit % data_bits;
                let sources: Vec<Wire> = slots
                    .iter()
                    .map(|slot| slot.registers[field].outputs()[bit_in_field])
                    .collect();
                let or = g.orx(sources, name.clone());
                readout_nodes.push(or.node);
                or
            })
            .collect();

        ProgramMemory {
            address_bits,
            data_bits,
            addr_pins,
            data_pins,
            we_pin,
            re_pin,
            decoder,
            slots,
            select_nodes,
            readout_nodes,
            outputs,
        }
    }

    /// Combinational lookup: pins, address decode, selects, register
    /// readouts and the output OR fabric. Never latches.
    pub fn evaluate(&self, g: &mut Circuit) {
        for pin in &self.addr_pins {
            g.eval_wire(*pin);
        }
        for pin in &self.data_pins {
            g.eval_wire(*pin);
        }
        g.eval_wire(self.we_pin);
        g.eval_wire(self.re_pin);
        self.decoder.evaluate(g);
        g.eval_nodes(&self.select_nodes);
        for slot in &self.slots {
            for register in &slot.registers {
                register.evaluate(g);
            }
        }
        g.eval_nodes(&self.readout_nodes);
    }

    /// Latches the addressed slot's registers; only the slot whose decoder
    /// line is high sees its write-enable, so a write pulse touches exactly
    /// one slot. Combinational logic is not re-run here.
    pub fn update(&self, g: &mut Circuit) {
        for slot in &self.slots {
            for register in &slot.registers {
                register.update(g);
            }
        }
    }

    /// Re-points the address pins (the loader swaps between its own signal
    /// bank and the program counter).
    pub fn connect_address(&self, g: &mut Circuit, sources: &[Wire]) -> Result<(), SimError> {
        rebind_pins(g, &self.addr_pins, sources, "program memory address")
    }

    /// Re-points the 4 x D data pins (opcode, C, A, B fields, LSB first).
    pub fn connect_data(&self, g: &mut Circuit, sources: &[Wire]) -> Result<(), SimError> {
        rebind_pins(g, &self.data_pins, sources, "program memory data")
    }

    pub fn connect_write_enable(&self, g: &mut Circuit, source: Wire) {
        g.d0(self.we_pin, source);
    }

    pub fn connect_read_enable(&self, g: &mut Circuit, source: Wire) {
        g.d0(self.re_pin, source);
    }

    /// All 4 x D output bits: opcode, then C, A, B.
    pub fn outputs(&self) -> &[Wire] {
        &self.outputs
    }

    /// The output bits of one instruction field (0 = opcode, 1 = C,
    /// 2 = A, 3 = B).
    pub fn field(&self, index: usize) -> &[Wire] {
        &self.outputs[index * self.data_bits..(index + 1) * self.data_bits]
    }

    pub fn address_bits(&self) -> usize {
        self.address_bits
    }

    pub fn data_bits(&self) -> usize {
        self.data_bits
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }
}
