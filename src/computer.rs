use crate::circuits::{MainMemory, ProgramMemory};
use crate::cpu::Cpu;
use crate::error::SimError;
use crate::graph::*;
use crate::loader::{self, Instruction};
use log::{debug, info};
use std::io::{self, BufRead, Write as _};
use std::ops::Range;
use std::path::Path;

/// Data width of the 3-bit machine.
pub const NUM_BITS: usize = 3;
/// Program-counter width: 512 program-memory slots.
pub const PC_BITS: usize = 9;
/// RAM slots behind the 3-bit address ports.
pub const NUM_RAM_SLOTS: usize = 1 << NUM_BITS;

/// The 3-bit ISA v2 opcode table.
pub const ISA_V2_OPCODES: &str = "\
000 HALT
001 MOVL
010 ADD
011 SUB
100 CMP
101 JEQ
110 JGT
111 NOP
";

const MOVL_OPCODE: usize = 1;
const ADD_OPCODE: usize = 2;

/// The 3-bit computer: a CPU, a 512-slot program memory and an 8-slot
/// triple-ported RAM wired into a single-cycle fetch/decode/execute loop.
///
/// Wiring: PM output fields are `[opcode | C | A | B]`; the A and B fields
/// address the RAM read ports and the C field the write port; the RAM read
/// buses feed the ALU; per bit the RAM write data is
/// `(MOVL & A_field) | (!MOVL & alu_result)`; the write-enable fires on
/// MOVL or ADD. The CMP/JEQ/JGT jump path latches flags but deliberately
/// leaves the jump-enable and jump-address pins undriven.
pub struct Computer {
    g: Circuit,
    cpu: Cpu,
    pm: ProgramMemory,
    ram: MainMemory,
    load_addr: SourceHandle,
    load_data: SourceHandle,
    load_we: SourceHandle,
    write_control: Range<usize>,
}

impl Computer {
    pub fn new() -> Computer {
        let mut g = Circuit::new();

        // Signal banks that drive program memory during loading.
        let load_addr = g.source(PC_BITS, "pm_load_address");
        let load_data = g.source(4 * NUM_BITS, "pm_load_data");
        let load_we = g.source(1, "pm_load_write_enable");

        let mut cpu = Cpu::new(&mut g, NUM_BITS, ISA_V2_OPCODES, PC_BITS, "cpu_3bit");
        cpu.wire_halt_opcode(&mut g, 0)
            .expect("HALT opcode 0 is always in range");

        let pm = ProgramMemory::new(&mut g, PC_BITS, NUM_BITS, "pm_3bit");
        pm.connect_data(&mut g, &load_data.wires())
            .expect("load bank width matches the PM data pins");
        pm.connect_write_enable(&mut g, load_we.bit());
        pm.connect_read_enable(&mut g, ONE);
        cpu.connect_program_memory(&mut g, &pm)
            .expect("PC and opcode widths match the PM pinout");

        let ram = MainMemory::new(&mut g, NUM_BITS, NUM_BITS, "ram_3bit");
        ram.connect_address_a(&mut g, pm.field(2))
            .expect("A field width matches the RAM address port");
        ram.connect_address_b(&mut g, pm.field(3))
            .expect("B field width matches the RAM address port");
        ram.connect_address_c(&mut g, pm.field(1))
            .expect("C field width matches the RAM address port");
        ram.connect_read_enable_a(&mut g, ONE);
        ram.connect_read_enable_b(&mut g, ONE);

        // RAM read buses feed the ALU; the PM A field is the literal bus.
        cpu.connect_data_inputs(&mut g, pm.field(2), ram.out_a(), ram.out_b())
            .expect("RAM data buses match the ALU operand width");

        // Write-data mux and write-enable gating.
        let mark = g.mark();
        let movl = cpu.decoder_outputs()[MOVL_OPCODE];
        let not_movl = g.not1(movl, "ram_data_mux_not_movl");
        let write_data: Vec<Wire> = (0..NUM_BITS)
            .map(|i| {
                let literal = g.and2(movl, pm.field(2)[i], "ram_data_mux_literal");
                let result = g.and2(not_movl, cpu.result_outputs()[i], "ram_data_mux_result");
                g.or2(literal, result, "ram_data_mux")
            })
            .collect();
        let write_enable = g.or2(
            cpu.decoder_outputs()[MOVL_OPCODE],
            cpu.decoder_outputs()[ADD_OPCODE],
            "ram_write_enable",
        );
        let write_control = g.span_from(mark);

        ram.connect_data(&mut g, &write_data)
            .expect("mux width matches the RAM data pins");
        ram.connect_write_enable(&mut g, write_enable);

        Computer {
            g,
            cpu,
            pm,
            ram,
            load_addr,
            load_data,
            load_we,
            write_control,
        }
    }

    /// The combinational half of a cycle: PM lookup, RAM read, CPU, then
    /// the write-control gates and a second RAM pass so the write selects
    /// see the freshly computed write-enable before anything latches.
    fn evaluate(&mut self) {
        self.pm.evaluate(&mut self.g);
        self.ram.evaluate(&mut self.g);
        self.cpu.evaluate(&mut self.g);
        self.g.eval_span(&self.write_control);
        self.ram.evaluate(&mut self.g);
    }

    /// One full clock cycle; returns the run/halt bit. Program memory is
    /// re-evaluated after the latch phase so the outputs already show the
    /// instruction at the new PC.
    pub fn clock_tick(&mut self) -> bool {
        self.evaluate();
        self.cpu.update(&mut self.g);
        self.ram.update(&mut self.g);
        self.pm.evaluate(&mut self.g);
        self.cpu.is_running(&self.g)
    }

    /// Loads a program file, trying the loader's fallback locations if the
    /// path does not resolve directly.
    pub fn load_program(&mut self, path: &Path) -> Result<usize, SimError> {
        let resolved = loader::resolve_path(path).unwrap_or_else(|| path.to_path_buf());
        let source = std::fs::read_to_string(&resolved).map_err(|e| SimError::ProgramFile {
            path: resolved.clone(),
            source: e,
        })?;
        info!("loading program from {:?}", resolved);
        self.load_source(&source)
    }

    /// Parses and loads program text. Nothing is written to program memory
    /// unless the whole text parses.
    pub fn load_source(&mut self, source: &str) -> Result<usize, SimError> {
        let program = loader::parse_source(source, NUM_BITS)?;
        self.load_instructions(&program)
    }

    /// Writes `program` into program memory one slot at a time, verifies
    /// it by reading every slot back, then hands the address pins to the
    /// program counter.
    pub fn load_instructions(&mut self, program: &[Instruction]) -> Result<usize, SimError> {
        if program.len() > self.pm.num_slots() {
            return Err(SimError::ProgramTooLong {
                capacity: self.pm.num_slots(),
            });
        }

        let load_addr_wires = self.load_addr.wires();
        self.pm.connect_address(&mut self.g, &load_addr_wires)?;

        for (address, instruction) in program.iter().enumerate() {
            self.g.set_source(self.load_addr, address as u64);
            self.g.set_source(self.load_data, instruction.pack(NUM_BITS));
            self.g.drive_high(self.load_we);
            self.pm.evaluate(&mut self.g);
            self.pm.update(&mut self.g);
            self.g.drive_low(self.load_we);
            debug!("[{:03}] {:?}", address, instruction);
        }

        // Read every written slot back before handing the bus over.
        for (address, instruction) in program.iter().enumerate() {
            self.g.set_source(self.load_addr, address as u64);
            self.pm.evaluate(&mut self.g);
            let read = self.current_instruction();
            if read != *instruction {
                return Err(SimError::VerifyMismatch {
                    address,
                    wrote: *instruction,
                    read,
                });
            }
        }

        self.pm.connect_address(&mut self.g, self.cpu.pc_outputs())?;
        self.g.set_source(self.load_data, 0);
        self.pm.evaluate(&mut self.g);

        info!("loaded {} instructions", program.len());
        Ok(program.len())
    }

    /// Steps until halt or `max_cycles`; returns the number of cycles run.
    pub fn run_to_halt(&mut self, max_cycles: usize) -> usize {
        for cycle in 1..=max_cycles {
            if !self.clock_tick() {
                return cycle;
            }
        }
        max_cycles
    }

    /// Interactive single-step loop: print the machine state, wait for
    /// Enter (step) or q (quit), stop cleanly on HALT.
    pub fn run_interactive(&mut self) {
        println!("\nPress Enter to execute each instruction, q to quit.");
        self.pm.evaluate(&mut self.g);

        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            self.print_state();
            print!("\nstep> ");
            io::stdout().flush().unwrap();

            match lines.next() {
                Some(Ok(line)) if line.trim().eq_ignore_ascii_case("q") => {
                    println!("Execution stopped by user.");
                    break;
                }
                Some(Ok(_)) => {}
                // EOF or read error: stop stepping.
                _ => break,
            }

            if !self.clock_tick() {
                println!("\n=== program halted ===");
                self.print_state();
                break;
            }
        }
    }

    /// Prints the PC, the current instruction with its mnemonic, and every
    /// RAM slot.
    pub fn print_state(&self) {
        let pc = self.pc_value();
        let instruction = self.current_instruction();
        let mnemonic = self
            .cpu
            .operation_for_opcode(u16::from(instruction.opcode))
            .unwrap_or("???");

        println!("{}", "=".repeat(50));
        println!("PC: {:03} ({})", pc, binary(pc, PC_BITS));
        println!(
            "Instruction: {} {} {} {} ; {}",
            binary(u64::from(instruction.opcode), NUM_BITS),
            binary(u64::from(instruction.c), NUM_BITS),
            binary(u64::from(instruction.a), NUM_BITS),
            binary(u64::from(instruction.b), NUM_BITS),
            mnemonic
        );
        println!("\nRAM contents:");
        for slot in 0..NUM_RAM_SLOTS {
            let value = self.ram.peek(&self.g, slot);
            println!("  [{}]: {} ({})", slot, binary(value, NUM_BITS), value);
        }
        println!("{}", "=".repeat(50));
    }

    /// The instruction currently on the PM output bus.
    pub fn current_instruction(&self) -> Instruction {
        Instruction {
            opcode: self.g.read_bits(self.pm.field(0)) as u8,
            c: self.g.read_bits(self.pm.field(1)) as u8,
            a: self.g.read_bits(self.pm.field(2)) as u8,
            b: self.g.read_bits(self.pm.field(3)) as u8,
        }
    }

    pub fn pc_value(&self) -> u64 {
        self.g.read_bits(self.cpu.pc_outputs())
    }

    /// The raw latched contents of one RAM slot.
    pub fn ram_slot(&self, slot: usize) -> u64 {
        self.ram.peek(&self.g, slot)
    }

    pub fn stored_flags(&self) -> u64 {
        self.g.read_bits(self.cpu.stored_flags())
    }

    pub fn is_running(&self) -> bool {
        self.cpu.is_running(&self.g)
    }
}

impl Default for Computer {
    fn default() -> Self {
        Self::new()
    }
}

fn binary(value: u64, bits: usize) -> String {
    format!("{:0width$b}", value, width = bits)
}
