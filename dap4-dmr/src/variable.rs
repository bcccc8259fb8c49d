use std::fmt::{Display, Formatter};
use std::sync::Arc;

use dap4_dtype::{DapType, TypeSize};
use dap4_error::{Dap4Result, dap4_err};
use itertools::Itertools;

use crate::{Dimension, Field};

/// The serialized width of a count or length prefix.
const PREFIX_SIZE: u64 = 8;

/// The kind of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sort {
    /// A variable of a primitive or enumeration type.
    Atomic,
    /// A fixed group of fields.
    Structure,
    /// A variable-length list of records, each shaped like a structure.
    Sequence,
}

impl Display for Sort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Sort::Atomic => write!(f, "atomic"),
            Sort::Structure => write!(f, "structure"),
            Sort::Sequence => write!(f, "sequence"),
        }
    }
}

/// A variable declaration: a top-level variable, or a field of a structure or sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    name: Arc<str>,
    sort: Sort,
    base: Option<DapType>,
    dimensions: Vec<Dimension>,
    fields: Vec<Variable>,
}

impl Variable {
    /// An atomic variable.
    pub fn atomic(
        name: impl Into<Arc<str>>,
        base: impl Into<DapType>,
        dimensions: impl IntoIterator<Item = Dimension>,
    ) -> Self {
        Self {
            name: name.into(),
            sort: Sort::Atomic,
            base: Some(base.into()),
            dimensions: dimensions.into_iter().collect(),
            fields: Vec::new(),
        }
    }

    /// A structure with the given fields, in declaration order.
    pub fn structure(
        name: impl Into<Arc<str>>,
        fields: impl IntoIterator<Item = Variable>,
        dimensions: impl IntoIterator<Item = Dimension>,
    ) -> Self {
        Self {
            name: name.into(),
            sort: Sort::Structure,
            base: None,
            dimensions: dimensions.into_iter().collect(),
            fields: fields.into_iter().collect(),
        }
    }

    /// A sequence whose records have the given fields, in declaration order.
    pub fn sequence(
        name: impl Into<Arc<str>>,
        fields: impl IntoIterator<Item = Variable>,
        dimensions: impl IntoIterator<Item = Dimension>,
    ) -> Self {
        Self {
            name: name.into(),
            sort: Sort::Sequence,
            base: None,
            dimensions: dimensions.into_iter().collect(),
            fields: fields.into_iter().collect(),
        }
    }

    /// The variable's short name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variable's sort.
    pub fn sort(&self) -> Sort {
        self.sort
    }

    /// The base type of an atomic variable.
    pub fn base_type(&self) -> Option<&DapType> {
        self.base.as_ref()
    }

    /// The dimensions, outermost first.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// The number of dimensions. Zero for a scalar.
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Whether the variable has no dimensions.
    pub fn is_scalar(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// The size of each dimension, outermost first.
    pub fn dim_sizes(&self) -> Vec<u64> {
        self.dimensions.iter().map(Dimension::size).collect()
    }

    /// The number of instances: the product of the dimension sizes, or 1 for a scalar.
    pub fn element_count(&self) -> Dap4Result<u64> {
        self.dimensions.iter().try_fold(1u64, |acc, dim| {
            acc.checked_mul(dim.size()).ok_or_else(|| {
                dap4_err!(
                    Layout: "element count of {} overflows, dimensions {}",
                    self.name,
                    self.dimensions.iter().format(", ")
                )
            })
        })
    }

    /// The fields of a structure or sequence, in declaration order.
    pub fn fields(&self) -> &[Variable] {
        &self.fields
    }

    /// Select a field by name or position, returning its position and declaration.
    pub fn field(&self, field: impl Into<Field>) -> Option<(usize, &Variable)> {
        match field.into() {
            Field::Name(name) => self.fields.iter().find_position(|f| f.name() == name),
            Field::Index(idx) => self.fields.get(idx).map(|f| (idx, f)),
        }
    }

    /// The fewest bytes one instance of the variable can serialize to.
    ///
    /// Variable-length values and sequences count only their 8-byte prefix.
    pub fn min_instance_size(&self) -> Dap4Result<u64> {
        match self.sort {
            Sort::Atomic => Ok(match self.base.as_ref().map(DapType::serial_size) {
                Some(TypeSize::Fixed(width)) => width as u64,
                Some(TypeSize::Variable) | None => PREFIX_SIZE,
            }),
            Sort::Sequence => Ok(PREFIX_SIZE),
            Sort::Structure => self.fields.iter().try_fold(0u64, |acc, field| {
                let size = field.min_serial_size()?;
                acc.checked_add(size)
                    .ok_or_else(|| dap4_err!(Layout: "size of {} overflows", self.name))
            }),
        }
    }

    /// The fewest bytes every instance of the variable together can serialize to.
    pub fn min_serial_size(&self) -> Dap4Result<u64> {
        self.element_count()?
            .checked_mul(self.min_instance_size()?)
            .ok_or_else(|| dap4_err!(Layout: "size of {} overflows", self.name))
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.base {
            Some(base) => write!(f, "{} {}", base, self.name)?,
            None => write!(f, "{} {}", self.sort, self.name)?,
        }
        for dim in &self.dimensions {
            write!(f, "[{}]", dim)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dap4_dtype::AtomicType;

    use super::*;

    fn station() -> Variable {
        Variable::structure(
            "station",
            [
                Variable::atomic("id", AtomicType::Int32, []),
                Variable::atomic("name", AtomicType::String, []),
                Variable::sequence(
                    "obs",
                    [Variable::atomic("t", AtomicType::Float64, [])],
                    [],
                ),
            ],
            [Dimension::new("n", 3)],
        )
    }

    #[test]
    fn fields_by_name_and_index() {
        let station = station();
        assert_eq!(station.field("name").map(|(i, f)| (i, f.name())), Some((1, "name")));
        assert_eq!(station.field(2usize).map(|(_, f)| f.sort()), Some(Sort::Sequence));
        assert!(station.field("missing").is_none());
        assert!(station.field(3usize).is_none());
    }

    #[test]
    fn sizes() {
        let station = station();
        assert_eq!(station.element_count().unwrap(), 3);
        assert_eq!(station.min_instance_size().unwrap(), 4 + 8 + 8);
        assert_eq!(station.min_serial_size().unwrap(), 60);

        let grid = Variable::atomic(
            "grid",
            AtomicType::UInt8,
            [Dimension::anonymous(u64::MAX), Dimension::anonymous(2)],
        );
        assert!(grid.element_count().is_err());
    }

    #[test]
    fn display() {
        let v = Variable::atomic("temp", AtomicType::Float32, [Dimension::new("time", 4)]);
        assert_eq!(v.to_string(), "Float32 temp[time=4]");
        assert_eq!(station().to_string(), "structure station[n=3]");
    }
}
