use super::node::*;
use crate::error::SimError;
use concat_idents::concat_idents;
use log::warn;
use smallvec::{smallvec, SmallVec};
use std::ops::Range;

/// Creates `gatename`, `gatename2` and `gatenamex` constructors for every
/// gate kind with a variable number of inputs. The constructors create
/// gates with n unbound, 2 bound and x bound inputs respectively.
macro_rules! gate_constructors {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            /// Returns the [Wire] of a new gate with `arity` unbound inputs.
            ///
            /// Inputs are bound afterwards with [Circuit::dx]; an input left
            /// unbound reads as low and warns once per evaluation.
            ///
            /// Providing a good name pays off whenever a diagnostic fires.
            pub fn $name<S: Into<String>>(&mut self, arity: usize, name: S) -> Wire {
                self.add_gate(NodeKind::$kind, smallvec![None; arity], name)
            }

            concat_idents!(name2 = $name, 2 {
                /// Returns the [Wire] of a new gate with 2 bound inputs.
                pub fn name2<S: Into<String>>(&mut self, a: Wire, b: Wire, name: S) -> Wire {
                    self.add_gate(NodeKind::$kind, smallvec![Some(a), Some(b)], name)
                }
            });

            concat_idents!(namex = $name, x {
                /// Returns the [Wire] of a new gate with one bound input per
                /// item of `deps`, taken in order.
                pub fn namex<S: Into<String>, I: IntoIterator<Item = Wire>>(
                    &mut self,
                    deps: I,
                    name: S,
                ) -> Wire {
                    let deps: SmallVec<[Option<Wire>; NODE_INPUTS_TINYVEC_SIZE]> =
                        deps.into_iter().map(Some).collect();
                    self.add_gate(NodeKind::$kind, deps, name)
                }
            });
        )*
    };
}

/// Handle to a signal-generator node: zero inputs, `bits` driven output
/// cells. The drive methods on [Circuit] change its outputs directly;
/// binding an input to a source is a wiring error.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SourceHandle {
    pub(crate) node: NodeIndex,
    bits: u16,
}

impl SourceHandle {
    /// Returns the [Wire] of output cell `bit`.
    ///
    /// # Panics
    ///
    /// Will panic if `bit` >= the number of bits in the source.
    pub fn wire(&self, bit: usize) -> Wire {
        assert!(
            bit < self.bits as usize,
            "source bit {} out of range (bits: {})",
            bit,
            self.bits
        );
        Wire::new(self.node, bit as u16)
    }

    /// Returns the [Wire] of the first output cell, for 1-bit sources.
    pub fn bit(&self) -> Wire {
        self.wire(0)
    }

    /// Returns all output cells as wires, LSB first.
    pub fn wires(&self) -> Vec<Wire> {
        (0..self.bits as usize).map(|i| self.wire(i)).collect()
    }

    /// Returns the number of output bits.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.bits as usize
    }
}

/// Arena of simulation nodes connected by [Wire] handles.
///
/// The circuit always contains the constants [ZERO] and [ONE] at indices
/// 0 and 1. Nodes are appended and never removed, so the index of a node
/// created later is always greater than the indices of the nodes its bound
/// inputs refer to; a composite built producer-before-consumer can
/// therefore evaluate its nodes in creation order.
///
/// Evaluation is two-phase throughout the crate: [Circuit::eval] and the
/// schedule walkers recompute combinational outputs and never latch;
/// stateful composites latch in their own `update` methods.
///
/// # Examples
/// Simple gates.
/// ```
/// use gatework::graph::{Circuit, ONE, ZERO};
/// let mut g = Circuit::new();
///
/// let or = g.or2(ONE, ZERO, "or");
/// let and = g.and2(ONE, ZERO, "and");
/// g.eval_wire(or);
/// g.eval_wire(and);
///
/// assert_eq!(g.value(or), true);
/// assert_eq!(g.value(and), false);
/// ```
///
/// Sources.
/// ```
/// use gatework::graph::Circuit;
/// let mut g = Circuit::new();
///
/// let word = g.source(4, "word");
/// g.set_source(word, 0b1010);
///
/// assert_eq!(g.read_bits(&word.wires()), 0b1010);
/// ```
#[derive(Debug, Clone)]
pub struct Circuit {
    nodes: Vec<Node>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    /// Returns a new [Circuit] containing only [ZERO] and [ONE].
    pub fn new() -> Circuit {
        let mut nodes = Vec::new();
        nodes.push(Node::new(NodeKind::Zero, smallvec![], 1, "ZERO".into()));
        let mut one = Node::new(NodeKind::One, smallvec![], 1, "ONE".into());
        one.outputs[0] = true;
        nodes.push(one);
        Circuit { nodes }
    }

    fn add_gate<S: Into<String>>(
        &mut self,
        kind: NodeKind,
        inputs: SmallVec<[Option<Wire>; NODE_INPUTS_TINYVEC_SIZE]>,
        name: S,
    ) -> Wire {
        let idx = ni!(self.nodes.len());
        self.nodes.push(Node::new(kind, inputs, 1, name.into()));
        Wire::new(idx, 0)
    }

    // Create constructors for all gate kinds with variable inputs.
    gate_constructors!(and => And, or => Or, nand => Nand, nor => Nor, xor => Xor);

    /// Returns the [Wire] of a new inverter bound to `dep`.
    pub fn not1<S: Into<String>>(&mut self, dep: Wire, name: S) -> Wire {
        self.add_gate(NodeKind::Not, smallvec![Some(dep)], name)
    }

    /// Returns the [Wire] of a new buffer bound to `dep`.
    ///
    /// A buffer forwards its input unchanged; composites use buffers as
    /// re-bindable pins for inputs whose producer is connected after
    /// construction.
    pub fn buffer1<S: Into<String>>(&mut self, dep: Wire, name: S) -> Wire {
        self.add_gate(NodeKind::Buffer, smallvec![Some(dep)], name)
    }

    /// Returns a [SourceHandle] for a new signal generator with `bits`
    /// output cells, all low.
    pub fn source<S: Into<String>>(&mut self, bits: usize, name: S) -> SourceHandle {
        assert!(bits >= 1 && bits <= 64, "source bits out of range: {}", bits);
        let idx = ni!(self.nodes.len());
        self.nodes
            .push(Node::new(NodeKind::Source, smallvec![], bits, name.into()));
        SourceHandle {
            node: idx,
            bits: bits as u16,
        }
    }

    /// Sets all output bits of `source` high.
    pub fn drive_high(&mut self, source: SourceHandle) {
        for bit in &mut self.nodes[source.node.idx].outputs {
            *bit = true;
        }
    }

    /// Sets all output bits of `source` low.
    pub fn drive_low(&mut self, source: SourceHandle) {
        for bit in &mut self.nodes[source.node.idx].outputs {
            *bit = false;
        }
    }

    /// Drives the output bits of `source` from `value`, LSB first.
    pub fn set_source(&mut self, source: SourceHandle, value: u64) {
        let outputs = &mut self.nodes[source.node.idx].outputs;
        for (i, bit) in outputs.iter_mut().enumerate() {
            *bit = (value >> i) & 1 != 0;
        }
    }

    /// Drives a single output bit of `source`.
    pub fn set_source_bit(&mut self, source: SourceHandle, bit: usize, value: bool) {
        self.nodes[source.node.idx].outputs[bit] = value;
    }

    /// Binds input `index` of `gate` to read from `src`. At most one writer
    /// per input; binding over an existing binding replaces it.
    ///
    /// On error the graph is unchanged: the index may be out of range, or
    /// `gate` may be a node that forbids inputs (constants, sources).
    pub fn try_bind(&mut self, gate: Wire, index: usize, src: Wire) -> Result<(), SimError> {
        let node = &mut self.nodes[gate.node.idx];
        if !node.kind.accepts_inputs() {
            return Err(SimError::SourceHasNoInputs {
                component: node.name.clone(),
            });
        }
        if index >= node.inputs.len() {
            return Err(SimError::InputIndexOutOfRange {
                component: node.name.clone(),
                index,
                max: node.inputs.len().saturating_sub(1),
            });
        }
        node.inputs[index] = Some(src);
        Ok(())
    }

    /// Binds input `index` of `gate` to read from `src`.
    ///
    /// # Panics
    ///
    /// Will panic on the wiring errors [Circuit::try_bind] reports.
    pub fn dx(&mut self, gate: Wire, index: usize, src: Wire) {
        if let Err(e) = self.try_bind(gate, index, src) {
            panic!("wiring error: {}", e);
        }
    }

    /// Binds input 0 of `gate` to read from `src`.
    ///
    /// # Panics
    ///
    /// Will panic on the wiring errors [Circuit::try_bind] reports.
    pub fn d0(&mut self, gate: Wire, src: Wire) {
        self.dx(gate, 0, src)
    }

    /// Recomputes the outputs of one node from the current values of its
    /// input wires. Pure and idempotent for combinational kinds; constants
    /// and sources are left untouched.
    ///
    /// An unbound input reads as low and emits one named diagnostic per
    /// offending input per call.
    pub fn eval(&mut self, idx: NodeIndex) {
        use NodeKind::*;
        let kind = self.nodes[idx.idx].kind;
        if !kind.accepts_inputs() {
            return;
        }

        let node = &self.nodes[idx.idx];
        let mut values: SmallVec<[bool; 8]> = SmallVec::with_capacity(node.inputs.len());
        for (i, input) in node.inputs.iter().enumerate() {
            match input {
                Some(w) => values.push(self.nodes[w.node.idx].outputs[w.bit as usize]),
                None => {
                    warn!("{}: input {} is unbound, reading as low", node.name, i);
                    values.push(false);
                }
            }
        }

        let new_state = match kind {
            And => values.iter().all(|v| *v),
            Or => values.iter().any(|v| *v),
            Nand => !values.iter().all(|v| *v),
            Nor => !values.iter().any(|v| *v),
            Xor => values.iter().filter(|v| **v).count() == 1,
            Not => !values[0],
            Buffer => values[0],
            Zero | One | Source => unreachable!("nodes without inputs are never recomputed"),
        };
        self.nodes[idx.idx].outputs[0] = new_state;
    }

    /// Evaluates the node that owns `wire`.
    pub fn eval_wire(&mut self, wire: Wire) {
        self.eval(wire.node)
    }

    /// Evaluates `nodes` in order.
    pub fn eval_nodes(&mut self, nodes: &[NodeIndex]) {
        for idx in nodes {
            self.eval(*idx);
        }
    }

    /// Evaluates every node in `span` in creation order.
    ///
    /// Valid for spans of purely combinational nodes built
    /// producer-before-consumer; stateful composites schedule their nodes
    /// explicitly instead.
    pub fn eval_span(&mut self, span: &Range<usize>) {
        for i in span.clone() {
            self.eval(ni!(i));
        }
    }

    /// Returns the current arena length; paired with [Circuit::span_from]
    /// to capture the evaluation schedule of a composite under
    /// construction.
    pub fn mark(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the span of all nodes created since `mark`.
    pub fn span_from(&self, mark: usize) -> Range<usize> {
        mark..self.nodes.len()
    }

    /// Returns the current value of `wire`.
    pub fn value(&self, wire: Wire) -> bool {
        self.nodes[wire.node.idx].outputs[wire.bit as usize]
    }

    /// Collects up to 64 wires into an integer, LSB first.
    pub fn read_bits(&self, wires: &[Wire]) -> u64 {
        let mut out = 0;
        for (i, wire) in wires.iter().take(64).enumerate() {
            if self.value(*wire) {
                out |= 1 << i;
            }
        }
        out
    }

    /// Overwrites the output cell of `wire` without evaluating; used to
    /// establish latch power-up state.
    pub(crate) fn force(&mut self, wire: Wire, value: bool) {
        self.nodes[wire.node.idx].outputs[wire.bit as usize] = value;
    }

    /// Returns the diagnostic name of the node that owns `wire`.
    pub fn name_of(&self, wire: Wire) -> &str {
        &self.nodes[wire.node.idx].name
    }

    /// Returns the number of nodes in the circuit.
    // The circuit always contains ZERO and ONE.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{ONE, ZERO};
    use super::*;

    fn eval_all(g: &mut Circuit) {
        let span = g.span_from(0);
        g.eval_span(&span);
    }

    #[test]
    fn test_constants() {
        let g = Circuit::new();
        assert_eq!(g.value(ZERO), false);
        assert_eq!(g.value(ONE), true);
        assert!(ZERO.is_const() && ONE.is_const());
        assert!(!ZERO.is_one() && ONE.is_one());
    }

    #[test]
    fn test_two_input_truth_tables() {
        for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
            let mut g = Circuit::new();
            let ab = g.source(2, "ab");
            g.set_source_bit(ab, 0, a);
            g.set_source_bit(ab, 1, b);

            let and = g.and2(ab.wire(0), ab.wire(1), "and");
            let or = g.or2(ab.wire(0), ab.wire(1), "or");
            let nand = g.nand2(ab.wire(0), ab.wire(1), "nand");
            let nor = g.nor2(ab.wire(0), ab.wire(1), "nor");
            let xor = g.xor2(ab.wire(0), ab.wire(1), "xor");
            eval_all(&mut g);

            assert_eq!(g.value(and), a && b);
            assert_eq!(g.value(or), a || b);
            assert_eq!(g.value(nand), !(a && b));
            assert_eq!(g.value(nor), !(a || b));
            assert_eq!(g.value(xor), a ^ b);
        }
    }

    #[test]
    fn test_multi_input_truth_tables() {
        // Arities 1 through 4, exhaustive over input patterns.
        for arity in 1..=4usize {
            for pattern in 0..1u64 << arity {
                let mut g = Circuit::new();
                let word = g.source(arity, "word");
                g.set_source(word, pattern);

                let and = g.andx(word.wires(), "and");
                let or = g.orx(word.wires(), "or");
                let nand = g.nandx(word.wires(), "nand");
                let nor = g.norx(word.wires(), "nor");
                let xor = g.xorx(word.wires(), "xor");
                eval_all(&mut g);

                let ones = pattern.count_ones() as usize;
                assert_eq!(g.value(and), ones == arity, "and/{} {:b}", arity, pattern);
                assert_eq!(g.value(or), ones > 0, "or/{} {:b}", arity, pattern);
                assert_eq!(g.value(nand), ones != arity, "nand/{} {:b}", arity, pattern);
                assert_eq!(g.value(nor), ones == 0, "nor/{} {:b}", arity, pattern);
                // Exactly-one-high semantics.
                assert_eq!(g.value(xor), ones == 1, "xor/{} {:b}", arity, pattern);
            }
        }
    }

    #[test]
    fn test_not_and_buffer() {
        let mut g = Circuit::new();
        let not_one = g.not1(ONE, "not_one");
        let not_zero = g.not1(ZERO, "not_zero");
        let buf = g.buffer1(ONE, "buf");
        eval_all(&mut g);

        assert_eq!(g.value(not_one), false);
        assert_eq!(g.value(not_zero), true);
        assert_eq!(g.value(buf), true);
    }

    #[test]
    fn test_unbound_input_reads_low() {
        let mut g = Circuit::new();
        let and = g.and(2, "and");
        g.dx(and, 0, ONE);
        // Input 1 left unbound on purpose.
        g.eval_wire(and);
        assert_eq!(g.value(and), false);
    }

    #[test]
    fn test_bind_replaces() {
        let mut g = Circuit::new();
        let buf = g.buffer1(ZERO, "buf");
        g.eval_wire(buf);
        assert_eq!(g.value(buf), false);

        g.dx(buf, 0, ONE);
        g.eval_wire(buf);
        assert_eq!(g.value(buf), true);
    }

    #[test]
    fn test_bind_errors() {
        let mut g = Circuit::new();
        let src = g.source(1, "src");
        let and = g.and2(ONE, ONE, "and");

        assert!(matches!(
            g.try_bind(src.bit(), 0, ONE),
            Err(SimError::SourceHasNoInputs { .. })
        ));
        assert!(matches!(
            g.try_bind(and, 2, ONE),
            Err(SimError::InputIndexOutOfRange { .. })
        ));
        // Graph unchanged: the gate still evaluates from its two inputs.
        g.eval_wire(and);
        assert_eq!(g.value(and), true);
    }

    #[test]
    fn test_source_drive() {
        let mut g = Circuit::new();
        let word = g.source(8, "word");

        g.set_source(word, 0b1001_0110);
        assert_eq!(g.read_bits(&word.wires()), 0b1001_0110);

        g.drive_high(word);
        assert_eq!(g.read_bits(&word.wires()), 0xff);

        g.drive_low(word);
        assert_eq!(g.read_bits(&word.wires()), 0);

        g.set_source_bit(word, 3, true);
        assert_eq!(g.read_bits(&word.wires()), 0b1000);
    }
}
