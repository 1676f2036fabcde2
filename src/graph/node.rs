use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};

/// Represents the index of a node in a [Circuit](super::Circuit).
#[repr(transparent)]
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct NodeIndex {
    pub(crate) idx: usize,
}

/// Returns a new NodeIndex from a provided usize.
macro_rules! ni {
    ( $x:expr ) => {{
        NodeIndex::new($x)
    }};
}

impl NodeIndex {
    pub(crate) const fn new(idx: usize) -> NodeIndex {
        NodeIndex { idx }
    }
}

impl Display for NodeIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.idx)
    }
}

/// Read-only handle to one output cell of one node: component id plus
/// output index. A wire has exactly one writer (the node that owns the
/// cell) and arbitrarily many readers.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct Wire {
    pub(crate) node: NodeIndex,
    pub(crate) bit: u16,
}

/// The [Wire] of the constant-low cell in any [Circuit](super::Circuit).
///
/// Having it be a constant means default and placeholder inputs never need
/// a dedicated signal-generator object.
pub const ZERO: Wire = Wire {
    node: ni!(0),
    bit: 0,
};
/// The [Wire] of the constant-high cell in any [Circuit](super::Circuit).
pub const ONE: Wire = Wire {
    node: ni!(1),
    bit: 0,
};

impl Wire {
    pub(crate) const fn new(node: NodeIndex, bit: u16) -> Wire {
        Wire { node, bit }
    }

    /// Returns true if `self` is the constant-low wire.
    pub fn is_zero(&self) -> bool {
        *self == ZERO
    }

    /// Returns true if `self` is the constant-high wire.
    pub fn is_one(&self) -> bool {
        *self == ONE
    }

    /// Returns true if `self` is [ZERO] or [ONE].
    pub fn is_const(&self) -> bool {
        *self == ZERO || *self == ONE
    }
}

/// Closed set of node variants in a circuit; dispatch is by tag.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(crate) enum NodeKind {
    Zero = 0,
    One,
    /// Signal generator: no inputs, one or more driven output bits.
    Source,
    And,
    Or,
    Nand,
    Nor,
    /// Exactly-one-input-high (sum of minterms); coincides with parity
    /// at two inputs.
    Xor,
    Not,
    /// Identity; fan-out and re-bindable pin point.
    Buffer,
}
use NodeKind::*;

impl NodeKind {
    /// Returns true if inputs may be bound to nodes of this kind.
    pub fn accepts_inputs(&self) -> bool {
        !matches!(self, Zero | One | Source)
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Zero => write!(f, stringify!(Zero)),
            One => write!(f, stringify!(One)),
            Source => write!(f, stringify!(Source)),
            And => write!(f, stringify!(And)),
            Or => write!(f, stringify!(Or)),
            Nand => write!(f, stringify!(Nand)),
            Nor => write!(f, stringify!(Nor)),
            Xor => write!(f, stringify!(Xor)),
            Not => write!(f, stringify!(Not)),
            Buffer => write!(f, stringify!(Buffer)),
        }
    }
}

/// Amount of inputs kept on the stack for a node.
/// Nodes with more inputs (readout OR fans, decoder ANDs) spill to the heap.
pub(crate) const NODE_INPUTS_TINYVEC_SIZE: usize = 2;

/// A node in the simulation graph: fixed-arity inputs referencing other
/// nodes' output cells, plus the output cells this node owns and writes.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub name: String,
    pub inputs: SmallVec<[Option<Wire>; NODE_INPUTS_TINYVEC_SIZE]>,
    pub outputs: SmallVec<[bool; 1]>,
}

impl Node {
    pub fn new(
        kind: NodeKind,
        inputs: SmallVec<[Option<Wire>; NODE_INPUTS_TINYVEC_SIZE]>,
        num_outputs: usize,
        name: String,
    ) -> Self {
        let mut outputs = SmallVec::new();
        outputs.resize(num_outputs, false);
        Node {
            kind,
            name,
            inputs,
            outputs,
        }
    }
}
