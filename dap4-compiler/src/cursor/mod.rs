//! Cursors over compiled data.
//!
//! A [`Cursor`] points at one compiled instance: a top-level variable, a structure field, a
//! record of a sequence or an element of an array. Cursors are `Copy` handles into a
//! [`CompiledData`] and decode values only when asked.

use std::fmt::{Debug, Display, Formatter};
use std::ops::Range;

use dap4_dmr::Variable;
use static_assertions::assert_impl_all;

pub use array::*;
pub use atomic::*;
pub use sequence::*;
pub use structure::*;

use crate::CompiledData;
use crate::node::{Node, NodeId, NodeKind};

mod array;
mod atomic;
mod sequence;
mod structure;

/// The kind of instance a cursor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// An atomic variable, scalar or array.
    Atomic,
    /// A scalar structure.
    Structure,
    /// A scalar sequence.
    Sequence,
    /// One record of a sequence.
    Record,
    /// An array of structures.
    StructArray,
    /// An array of sequences.
    SeqArray,
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Atomic => write!(f, "atomic"),
            Scheme::Structure => write!(f, "structure"),
            Scheme::Sequence => write!(f, "sequence"),
            Scheme::Record => write!(f, "record"),
            Scheme::StructArray => write!(f, "structure array"),
            Scheme::SeqArray => write!(f, "sequence array"),
        }
    }
}

/// A handle to one compiled instance.
#[derive(Clone, Copy)]
pub enum Cursor<'a> {
    Atomic(AtomicCursor<'a>),
    Structure(StructureCursor<'a>),
    Sequence(SequenceCursor<'a>),
    Record(StructureCursor<'a>),
    StructArray(ArrayCursor<'a>),
    SeqArray(ArrayCursor<'a>),
}

assert_impl_all!(Cursor<'static>: Send, Sync, Copy);

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a CompiledData<'a>, id: NodeId) -> Self {
        let handle = Handle { data, id };
        match &handle.node().kind {
            NodeKind::Atomic(_) => Cursor::Atomic(AtomicCursor(handle)),
            NodeKind::Structure(_) => Cursor::Structure(StructureCursor(handle)),
            NodeKind::Record(_) => Cursor::Record(StructureCursor(handle)),
            NodeKind::Sequence(_) => Cursor::Sequence(SequenceCursor(handle)),
            NodeKind::StructArray(_) => Cursor::StructArray(ArrayCursor(handle)),
            NodeKind::SeqArray(_) => Cursor::SeqArray(ArrayCursor(handle)),
        }
    }

    fn handle(&self) -> Handle<'a> {
        match self {
            Cursor::Atomic(c) => c.0,
            Cursor::Structure(c) | Cursor::Record(c) => c.0,
            Cursor::Sequence(c) => c.0,
            Cursor::StructArray(c) | Cursor::SeqArray(c) => c.0,
        }
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Cursor::Atomic(_) => Scheme::Atomic,
            Cursor::Structure(_) => Scheme::Structure,
            Cursor::Sequence(_) => Scheme::Sequence,
            Cursor::Record(_) => Scheme::Record,
            Cursor::StructArray(_) => Scheme::StructArray,
            Cursor::SeqArray(_) => Scheme::SeqArray,
        }
    }

    /// The declaration this instance was compiled from.
    ///
    /// Records and array elements share the declaration of their sequence or array.
    pub fn template(&self) -> &'a Variable {
        self.handle().template()
    }

    /// The instance this one is part of, or `None` for a top-level variable.
    pub fn container(&self) -> Option<Cursor<'a>> {
        self.handle().container()
    }

    /// The bytes of the buffer this instance was compiled from, excluding any checksum.
    pub fn byte_range(&self) -> Range<usize> {
        self.handle().byte_range()
    }

    pub fn as_atomic(&self) -> Option<AtomicCursor<'a>> {
        match self {
            Cursor::Atomic(c) => Some(*c),
            _ => None,
        }
    }

    /// The structure or record this cursor points at.
    pub fn as_structure(&self) -> Option<StructureCursor<'a>> {
        match self {
            Cursor::Structure(c) | Cursor::Record(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<SequenceCursor<'a>> {
        match self {
            Cursor::Sequence(c) => Some(*c),
            _ => None,
        }
    }

    /// The array of structures or sequences this cursor points at.
    pub fn as_array(&self) -> Option<ArrayCursor<'a>> {
        match self {
            Cursor::StructArray(c) | Cursor::SeqArray(c) => Some(*c),
            _ => None,
        }
    }
}

impl Debug for Cursor<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("scheme", &self.scheme())
            .field("template", &self.template().name())
            .field("byte_range", &self.byte_range())
            .finish()
    }
}

impl Display for Cursor<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} at {}..{}",
            self.scheme(),
            self.template().name(),
            self.byte_range().start,
            self.byte_range().end
        )
    }
}

/// The state shared by every cursor kind.
#[derive(Clone, Copy)]
pub(crate) struct Handle<'a> {
    data: &'a CompiledData<'a>,
    id: NodeId,
}

impl<'a> Handle<'a> {
    fn node(&self) -> &'a Node<'a> {
        self.data.node(self.id)
    }

    fn template(&self) -> &'a Variable {
        self.node().template
    }

    fn container(&self) -> Option<Cursor<'a>> {
        self.node()
            .container
            .map(|id| Cursor::new(self.data, id))
    }

    fn byte_range(&self) -> Range<usize> {
        self.node().byte_range.clone()
    }

    fn cursor(&self, id: NodeId) -> Cursor<'a> {
        Cursor::new(self.data, id)
    }

    fn child(&self, id: NodeId) -> Handle<'a> {
        Handle {
            data: self.data,
            id,
        }
    }

    /// The child node ids of a compound node.
    fn children(&self) -> &'a [NodeId] {
        match &self.node().kind {
            NodeKind::Atomic(_) => &[],
            NodeKind::Structure(children)
            | NodeKind::Record(children)
            | NodeKind::Sequence(children)
            | NodeKind::StructArray(children)
            | NodeKind::SeqArray(children) => children,
        }
    }
}

impl Debug for Handle<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("template", &self.template().name())
            .field("node", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use dap4_buffer::DataWriter;
    use dap4_dmr::{Dataset, Dimension, Group};
    use dap4_dtype::{AtomicType, ByteOrder};

    use super::*;
    use crate::{ChecksumMode, CompileOptions, compile};

    #[test]
    fn containers_and_schemes() {
        let ds = Dataset::new(
            "test",
            Group::new("/").with_variable(Variable::structure(
                "s",
                [
                    Variable::atomic("a", AtomicType::Int16, []),
                    Variable::sequence(
                        "q",
                        [Variable::atomic("x", AtomicType::UInt8, [])],
                        [Dimension::anonymous(2)],
                    ),
                ],
                [],
            )),
        );
        let mut writer = DataWriter::new(ByteOrder::LittleEndian);
        writer
            .put(1i16)
            .put_count(1)
            .put(9u8)
            .put_count(0);
        let options = CompileOptions::default().with_checksum_mode(ChecksumMode::None);
        let data = compile(&ds, writer.finish(), &options).unwrap();

        let s = data.variable(0usize).unwrap();
        assert_eq!(s.scheme(), Scheme::Structure);
        assert!(s.container().is_none());

        let q = s.as_structure().unwrap().field("q").unwrap();
        assert_eq!(q.scheme(), Scheme::SeqArray);
        assert_eq!(q.byte_range(), 2..19);
        assert_eq!(q.container().map(|c| c.template().name()), Some("s"));

        let first = q.as_array().unwrap().element(0).unwrap();
        assert_eq!(first.scheme(), Scheme::Sequence);
        let record = first.as_sequence().unwrap().record(0).unwrap();
        let x = record.field("x").unwrap();
        assert_eq!(x.container().map(|c| c.scheme()), Some(Scheme::Record));
        assert_eq!(x.to_string(), "atomic x at 10..11");
    }
}
