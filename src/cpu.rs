use crate::circuits::{Alu, AluEnables, AluOp, ControlUnit, ProgramMemory, NUM_ALU_OPS};
use crate::error::SimError;
use crate::graph::*;
use indexmap::IndexMap;
use log::warn;
use std::ops::Range;
use std::str::FromStr;
use strum::IntoEnumIterator;

fn mkname(name: String) -> String {
    format!("CPU:{}", name)
}

/// A control unit and an ALU behind a parsed opcode table.
///
/// The table maps numeric opcodes to operation names. Every name that is
/// an [AluOp] gets its decoder line fanned into that operation's enable
/// OR; all other names (HALT, NOP, JMP, CMP, ...) are control operations
/// the containing computer wires to its own fabric.
pub struct Cpu {
    num_bits: usize,
    opcode_bits: usize,
    control_unit: ControlUnit,
    alu: Alu,
    name_to_opcode: IndexMap<String, u16>,
    opcode_to_name: Vec<Option<String>>,
    enable_span: Range<usize>,
    literal_inputs: Vec<Wire>,
}

impl Cpu {
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        num_bits: usize,
        opcode_table: &str,
        pc_bits: usize,
        name: S,
    ) -> Cpu {
        let name = mkname(name.into());
        let opcode_bits = num_bits;

        let (name_to_opcode, opcode_to_name) = parse_opcode_table(opcode_table, opcode_bits);

        let control_unit = ControlUnit::new(g, opcode_bits, pc_bits, name.clone());

        // One OR per ALU operation, fanning in every decoder line whose
        // opcode names that operation; unmapped lines contribute ZERO.
        let mark = g.mark();
        let mut enables = [ZERO; NUM_ALU_OPS];
        for op in AluOp::iter() {
            let inputs: Vec<Wire> = control_unit
                .decoder_outputs()
                .iter()
                .enumerate()
                .map(|(opcode, line)| {
                    let mapped = opcode_to_name[opcode]
                        .as_deref()
                        .map_or(false, |n| AluOp::from_str(n) == Ok(op));
                    if mapped {
                        *line
                    } else {
                        ZERO
                    }
                })
                .collect();
            enables[op as usize] = g.orx(inputs, format!("{}:{}_enable", name, op));
        }
        let enable_span = g.span_from(mark);

        let alu = Alu::new(g, num_bits, AluEnables::new(enables), name);
        control_unit
            .connect_comparator_flags(g, &alu.flags())
            .expect("flag register width is fixed at six");

        Cpu {
            num_bits,
            opcode_bits,
            control_unit,
            alu,
            name_to_opcode,
            opcode_to_name,
            enable_span,
            literal_inputs: Vec::new(),
        }
    }

    /// Control unit first, then the enable fans, then the ALU.
    pub fn evaluate(&self, g: &mut Circuit) {
        self.control_unit.evaluate(g);
        g.eval_span(&self.enable_span);
        self.alu.evaluate(g);
    }

    pub fn update(&self, g: &mut Circuit) {
        self.control_unit.update(g);
    }

    /// One full cycle; returns the run/halt bit.
    pub fn clock_tick(&self, g: &mut Circuit) -> bool {
        self.evaluate(g);
        self.update(g);
        self.control_unit.is_running(g)
    }

    /// Wires the decoded line of `opcode` into the control unit's halt
    /// input.
    pub fn wire_halt_opcode(&self, g: &mut Circuit, opcode: u16) -> Result<(), SimError> {
        let lines = self.control_unit.decoder_outputs();
        let line = *lines
            .get(opcode as usize)
            .ok_or(SimError::OpcodeOutOfRange {
                opcode,
                bits: self.opcode_bits,
            })?;
        self.control_unit.connect_halt_signal(g, line);
        Ok(())
    }

    /// Wires program memory to the CPU in both directions: the PM opcode
    /// field into the decoder, and the PC onto the PM address pins.
    pub fn connect_program_memory(
        &self,
        g: &mut Circuit,
        pm: &ProgramMemory,
    ) -> Result<(), SimError> {
        self.control_unit
            .connect_opcode_input(g, &pm.field(0)[..self.opcode_bits])?;
        pm.connect_address(g, self.control_unit.pc_outputs())
    }

    /// Wires the two read-port buses onto the ALU operands. `c_sources` is
    /// the literal bus, reserved for CPUs that route a third data bus into
    /// the ALU; it is kept accessible through [Cpu::literal_inputs].
    pub fn connect_data_inputs(
        &mut self,
        g: &mut Circuit,
        c_sources: &[Wire],
        a_sources: &[Wire],
        b_sources: &[Wire],
    ) -> Result<(), SimError> {
        self.alu.connect_a(g, a_sources)?;
        self.alu.connect_b(g, b_sources)?;
        self.literal_inputs = c_sources.to_vec();
        Ok(())
    }

    pub fn pc_outputs(&self) -> &[Wire] {
        self.control_unit.pc_outputs()
    }

    pub fn result_outputs(&self) -> &[Wire] {
        &self.alu.result
    }

    pub fn decoder_outputs(&self) -> &[Wire] {
        self.control_unit.decoder_outputs()
    }

    pub fn stored_flags(&self) -> &[Wire] {
        self.control_unit.stored_flags()
    }

    pub fn literal_inputs(&self) -> &[Wire] {
        &self.literal_inputs
    }

    pub fn is_running(&self, g: &Circuit) -> bool {
        self.control_unit.is_running(g)
    }

    pub fn opcode_for_operation(&self, operation: &str) -> Option<u16> {
        self.name_to_opcode.get(operation).copied()
    }

    pub fn operation_for_opcode(&self, opcode: u16) -> Option<&str> {
        self.opcode_to_name
            .get(opcode as usize)?
            .as_deref()
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn opcode_bits(&self) -> usize {
        self.opcode_bits
    }
}

/// Parses a newline-separated `"<bits> <name>"` opcode table.
///
/// Blank and `#` lines are skipped; a line whose bit string is not exactly
/// `opcode_bits` binary digits, or that does not have exactly two tokens,
/// is skipped with a warning. Later duplicates silently overwrite.
fn parse_opcode_table(
    table: &str,
    opcode_bits: usize,
) -> (IndexMap<String, u16>, Vec<Option<String>>) {
    let mut name_to_opcode = IndexMap::new();
    let mut opcode_to_name = vec![None; 1 << opcode_bits];

    for line in table.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let (bits, op_name) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(bits), Some(op_name), None) => (bits, op_name),
            _ => {
                warn!("opcode table: skipping unparseable line {:?}", line);
                continue;
            }
        };
        if bits.len() != opcode_bits || !bits.bytes().all(|b| b == b'0' || b == b'1') {
            warn!(
                "opcode table: {:?} is not a {}-bit binary opcode, skipping",
                bits, opcode_bits
            );
            continue;
        }
        let opcode = bits
            .bytes()
            .fold(0u16, |acc, b| (acc << 1) | u16::from(b == b'1'));

        name_to_opcode.insert(op_name.to_string(), opcode);
        opcode_to_name[opcode as usize] = Some(op_name.to_string());
    }

    (name_to_opcode, opcode_to_name)
}
