use std::fmt::{Debug, Formatter};

use dap4_buffer::{Checksum, DataBuffer};
use dap4_dmr::{Dataset, Field, FieldPath};
use dap4_error::{Dap4Result, dap4_bail, dap4_err};
use itertools::Itertools;
use static_assertions::assert_impl_all;

use crate::Cursor;
use crate::node::{Node, NodeId};

/// A compiled data response: the buffer and the location of every variable instance in it.
///
/// Compiled data is immutable. Cursors are cheap `Copy` handles into it and can be shared
/// between threads.
pub struct CompiledData<'a> {
    dataset: &'a Dataset,
    buffer: DataBuffer,
    nodes: Vec<Node<'a>>,
    roots: Vec<NodeId>,
    checksums: Vec<Option<Checksum>>,
}

assert_impl_all!(CompiledData<'static>: Send, Sync);

impl Debug for CompiledData<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledData")
            .field("dataset", &self.dataset.name())
            .field("order", &self.buffer.order())
            .field("bytes", &self.buffer.len())
            .field("nodes", &self.nodes.len())
            .field("variables", &self.variables().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a> CompiledData<'a> {
    pub(crate) fn new(
        dataset: &'a Dataset,
        buffer: DataBuffer,
        nodes: Vec<Node<'a>>,
        roots: Vec<NodeId>,
        checksums: Vec<Option<Checksum>>,
    ) -> Self {
        Self {
            dataset,
            buffer,
            nodes,
            roots,
            checksums,
        }
    }

    /// The dataset the data was compiled against.
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// The buffer the cursors read from.
    pub fn buffer(&self) -> &DataBuffer {
        &self.buffer
    }

    /// The number of top-level variables.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Cursors over the top-level variables, in serialization order.
    pub fn variables(&self) -> impl Iterator<Item = Cursor<'_>> + '_ {
        self.roots.iter().map(|&id| Cursor::new(self, id))
    }

    /// Select a top-level variable by position, by name or by `/group/name` path.
    pub fn variable(&self, field: impl Into<Field>) -> Dap4Result<Cursor<'_>> {
        let idx = self.root_index(field.into())?;
        Ok(Cursor::new(self, self.roots[idx]))
    }

    /// The stored checksum of a top-level variable, if the response carried checksums.
    pub fn checksum(&self, field: impl Into<Field>) -> Dap4Result<Option<Checksum>> {
        let idx = self.root_index(field.into())?;
        Ok(self.checksums[idx])
    }

    /// Follow a path of field selections from a top-level variable.
    ///
    /// Every step after the first must select a field of a structure.
    pub fn select(&self, path: &FieldPath) -> Dap4Result<Cursor<'_>> {
        let Some((first, rest)) = path.path().split_first() else {
            dap4_bail!(Lookup: "cannot select the root");
        };
        let mut cursor = self.variable(first)?;
        for field in rest {
            cursor = match cursor {
                Cursor::Structure(structure) | Cursor::Record(structure) => {
                    structure.field(field)?
                }
                other => dap4_bail!(
                    Lookup: "cannot select {} inside {} {}",
                    field,
                    other.scheme(),
                    other.template().name()
                ),
            };
        }
        Ok(cursor)
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<'a> {
        &self.nodes[id]
    }

    fn root_index(&self, field: Field) -> Dap4Result<usize> {
        match field {
            Field::Index(idx) => {
                if idx >= self.roots.len() {
                    dap4_bail!(OutOfBounds: idx, 0, self.roots.len());
                }
                Ok(idx)
            }
            Field::Name(name) if name.contains('/') => {
                let variable = self
                    .dataset
                    .find_variable(&name)
                    .ok_or_else(|| dap4_err!(Lookup: "no variable at {}", name))?;
                self.roots
                    .iter()
                    .position(|&id| std::ptr::eq(self.nodes[id].template, variable))
                    .ok_or_else(|| dap4_err!(Lookup: "variable {} was not compiled", name))
            }
            Field::Name(name) => self
                .roots
                .iter()
                .position(|&id| self.nodes[id].template.name() == name)
                .ok_or_else(|| {
                    dap4_err!(
                        Lookup: "no variable named {}, expected one of {}",
                        name,
                        self.roots
                            .iter()
                            .map(|&id| self.nodes[id].template.name())
                            .format(", ")
                    )
                }),
        }
    }
}
