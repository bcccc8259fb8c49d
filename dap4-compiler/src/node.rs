use std::ops::Range;

use dap4_dmr::Variable;
use dap4_dtype::AtomicType;

/// Index of a node in the arena of a [`crate::CompiledData`].
pub(crate) type NodeId = usize;

/// One compiled instance: a variable, a field, a record or an array element.
#[derive(Debug)]
pub(crate) struct Node<'a> {
    pub(crate) template: &'a Variable,
    pub(crate) container: Option<NodeId>,
    pub(crate) byte_range: Range<usize>,
    pub(crate) kind: NodeKind,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Atomic(AtomicLayout),
    /// A single structure instance and its field nodes.
    Structure(Vec<NodeId>),
    /// One record of a sequence and its field nodes.
    Record(Vec<NodeId>),
    /// A single sequence instance and its record nodes.
    Sequence(Vec<NodeId>),
    /// Structure element nodes, row-major.
    StructArray(Vec<NodeId>),
    /// Sequence element nodes, row-major.
    SeqArray(Vec<NodeId>),
}

/// Where the elements of an atomic variable live.
#[derive(Debug)]
pub(crate) struct AtomicLayout {
    pub(crate) atype: AtomicType,
    pub(crate) count: u64,
    pub(crate) elements: Elements,
}

#[derive(Debug)]
pub(crate) enum Elements {
    /// `width`-byte elements packed from `offset`.
    Fixed { offset: usize, width: usize },
    /// The offset of each element's length prefix.
    Variable(Vec<usize>),
}
