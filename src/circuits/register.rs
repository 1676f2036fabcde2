use super::memory_bit::MemoryBit;
use crate::graph::*;

fn mkname(name: String) -> String {
    format!("REGISTER:{}", name)
}

/// n-bit register: memory bits sharing one write-enable and one
/// read-enable. Latches on `update` with WE high; with RE high the outputs
/// reflect the stored bits, otherwise they read zero.
#[derive(Debug, Clone)]
pub struct Register {
    bits: Vec<MemoryBit>,
    outputs: Vec<Wire>,
}

impl Register {
    pub fn new<S: Into<String>>(
        g: &mut Circuit,
        data: &[Wire],
        write_enable: Wire,
        read_enable: Wire,
        name: S,
    ) -> Register {
        let name = mkname(name.into());

        let bits: Vec<MemoryBit> = data
            .iter()
            .map(|d| MemoryBit::new(g, *d, write_enable, read_enable, name.clone()))
            .collect();
        let outputs = bits.iter().map(|b| b.output()).collect();

        Register { bits, outputs }
    }

    pub fn evaluate(&self, g: &mut Circuit) {
        for bit in &self.bits {
            bit.evaluate(g);
        }
    }

    pub fn update(&self, g: &mut Circuit) {
        for bit in &self.bits {
            bit.update(g);
        }
    }

    /// Re-points the data input of bit `i`; used when the producer is only
    /// connected after construction (flag and page registers).
    pub fn rebind_data(&self, g: &mut Circuit, i: usize, data: Wire) {
        self.bits[i].rebind_data(g, data);
    }

    pub fn outputs(&self) -> &[Wire] {
        &self.outputs
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Reads the raw latch contents, bypassing the read-enable gate.
    pub fn peek(&self, g: &Circuit) -> u64 {
        let latched: Vec<Wire> = self.bits.iter().map(|b| b.latched()).collect();
        g.read_bits(&latched)
    }
}
