use super::alu::rebind_pins;
use super::decoder::Decoder;
use super::register::Register;
use crate::error::SimError;
use crate::graph::*;

fn mkname(name: String) -> String {
    format!("RAM:{}", name)
}

/// Triple-ported main memory (2R1W): 2^A slots of D bits, three address
/// ports and one write-data port.
///
/// Port C addresses the write (`WS_k = decC_k & WE`), ports A and B address
/// the two reads. One global read-enable (RE_A) drives every register; the
/// port muxing happens at the readout, where
/// `outA[bit] = OR_k (RSA_k & Q_k[bit])` and likewise for port B.
///
/// Writes latch in `update` only, so a read and a write of the same
/// address in one cycle return the pre-write value; the write shows up the
/// next cycle on both read ports.
pub struct MainMemory {
    data_bits: usize,
    addr_a_pins: Vec<Wire>,
    addr_b_pins: Vec<Wire>,
    addr_c_pins: Vec<Wire>,
    data_pins: Vec<Wire>,
    we_pin: Wire,
    re_a_pin: Wire,
    re_b_pin: Wire,
    decoder_a: Decoder,
    decoder_b: Decoder,
    decoder_c: Decoder,
    registers: Vec<Register>,
    select_nodes: Vec<NodeIndex>,
    readout_nodes: Vec<NodeIndex>,
    out_a: Vec<Wire>,
    out_b: Vec<Wire>,
}

impl MainMemory {
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        address_bits: usize,
        data_bits: usize,
        name: S,
    ) -> MainMemory {
        let name = mkname(name.into());
        let num_slots = 1usize << address_bits;

        let mut pin_bank = |g: &mut Circuit, n: usize| -> Vec<Wire> {
            (0..n).map(|_| g.buffer1(ZERO, name.clone())).collect()
        };
        let addr_a_pins = pin_bank(g, address_bits);
        let addr_b_pins = pin_bank(g, address_bits);
        let addr_c_pins = pin_bank(g, address_bits);
        let data_pins = pin_bank(g, data_bits);
        let we_pin = g.buffer1(ZERO, name.clone());
        let re_a_pin = g.buffer1(ZERO, name.clone());
        let re_b_pin = g.buffer1(ZERO, name.clone());

        let decoder_a = Decoder::new(g, &addr_a_pins, name.clone());
        let decoder_b = Decoder::new(g, &addr_b_pins, name.clone());
        let decoder_c = Decoder::new(g, &addr_c_pins, name.clone());

        let mut select_nodes = Vec::with_capacity(3 * num_slots);
        let mut read_a_selects = Vec::with_capacity(num_slots);
        let mut read_b_selects = Vec::with_capacity(num_slots);
        let registers: Vec<Register> = (0..num_slots)
            .map(|k| {
                let write_select = g.and2(decoder_c.lines[k], we_pin, name.clone());
                let read_a_select = g.and2(decoder_a.lines[k], re_a_pin, name.clone());
                let read_b_select = g.and2(decoder_b.lines[k], re_b_pin, name.clone());
                select_nodes.push(write_select.node);
                select_nodes.push(read_a_select.node);
                select_nodes.push(read_b_select.node);
                read_a_selects.push(read_a_select);
                read_b_selects.push(read_b_select);

                // One global read enable at the cell; the ports are muxed
                // on the readout below.
                Register::new(g, &data_pins, write_select, re_a_pin, name.clone())
            })
            .collect();

        let mut readout_nodes = Vec::new();
        let mut port = |g: &mut Circuit, selects: &[Wire]| -> Vec<Wire> {
            (0..data_bits)
                .map(|bit| {
                    let gated: Vec<Wire> = registers
                        .iter()
                        .zip(selects.iter())
                        .map(|(register, select)| {
                            let and = g.and2(*select, register.outputs()[bit], name.clone());
                            readout_nodes.push(and.node);
                            and
                        })
                        .collect();
                    let or = g.orx(gated, name.clone());
                    readout_nodes.push(or.node);
                    or
                })
                .collect()
        };
        let out_a = port(g, &read_a_selects);
        let out_b = port(g, &read_b_selects);

        MainMemory {
            data_bits,
            addr_a_pins,
            addr_b_pins,
            addr_c_pins,
            data_pins,
            we_pin,
            re_a_pin,
            re_b_pin,
            decoder_a,
            decoder_b,
            decoder_c,
            registers,
            select_nodes,
            readout_nodes,
            out_a,
            out_b,
        }
    }

    /// Combinational read: pins, decoders, selects, register readouts and
    /// both port OR fabrics. Never latches.
    pub fn evaluate(&self, g: &mut Circuit) {
        for pin in self
            .addr_a_pins
            .iter()
            .chain(&self.addr_b_pins)
            .chain(&self.addr_c_pins)
            .chain(&self.data_pins)
        {
            g.eval_wire(*pin);
        }
        g.eval_wire(self.we_pin);
        g.eval_wire(self.re_a_pin);
        g.eval_wire(self.re_b_pin);
        self.decoder_a.evaluate(g);
        self.decoder_b.evaluate(g);
        self.decoder_c.evaluate(g);
        g.eval_nodes(&self.select_nodes);
        for register in &self.registers {
            register.evaluate(g);
        }
        g.eval_nodes(&self.readout_nodes);
    }

    /// Latches the write: only the slot whose port-C decoder line is high
    /// has its write-select up. Combinational logic is not re-run.
    pub fn update(&self, g: &mut Circuit) {
        for register in &self.registers {
            register.update(g);
        }
    }

    pub fn connect_address_a(&self, g: &mut Circuit, sources: &[Wire]) -> Result<(), SimError> {
        rebind_pins(g, &self.addr_a_pins, sources, "RAM address a")
    }

    pub fn connect_address_b(&self, g: &mut Circuit, sources: &[Wire]) -> Result<(), SimError> {
        rebind_pins(g, &self.addr_b_pins, sources, "RAM address b")
    }

    pub fn connect_address_c(&self, g: &mut Circuit, sources: &[Wire]) -> Result<(), SimError> {
        rebind_pins(g, &self.addr_c_pins, sources, "RAM address c")
    }

    pub fn connect_data(&self, g: &mut Circuit, sources: &[Wire]) -> Result<(), SimError> {
        rebind_pins(g, &self.data_pins, sources, "RAM write data")
    }

    pub fn connect_write_enable(&self, g: &mut Circuit, source: Wire) {
        g.d0(self.we_pin, source);
    }

    pub fn connect_read_enable_a(&self, g: &mut Circuit, source: Wire) {
        g.d0(self.re_a_pin, source);
    }

    pub fn connect_read_enable_b(&self, g: &mut Circuit, source: Wire) {
        g.d0(self.re_b_pin, source);
    }

    /// Port A data output.
    pub fn out_a(&self) -> &[Wire] {
        &self.out_a
    }

    /// Port B data output.
    pub fn out_b(&self) -> &[Wire] {
        &self.out_b
    }

    pub fn data_bits(&self) -> usize {
        self.data_bits
    }

    pub fn num_slots(&self) -> usize {
        self.registers.len()
    }

    /// Reads one slot's raw latch contents without driving any port.
    pub fn peek(&self, g: &Circuit, slot: usize) -> u64 {
        self.registers[slot].peek(g)
    }
}
