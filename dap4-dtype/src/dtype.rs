use std::fmt::{Display, Formatter};
use std::sync::Arc;

use dap4_error::{Dap4Result, dap4_bail};
use itertools::Itertools;

use crate::{AtomicType, TypeSize};

/// One named constant of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumConst {
    name: Arc<str>,
    value: i64,
}

impl EnumConst {
    /// Create a new enumeration constant.
    pub fn new(name: impl Into<Arc<str>>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The constant's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The constant's integer value.
    pub fn value(&self) -> i64 {
        self.value
    }
}

/// An enumeration declared in the metadata, mapping names onto values of an integer base type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumDef {
    name: Arc<str>,
    base: AtomicType,
    constants: Vec<EnumConst>,
}

impl EnumDef {
    /// Create a new enumeration.
    ///
    /// The base type must be an integer type and constant names must be unique.
    pub fn try_new(
        name: impl Into<Arc<str>>,
        base: AtomicType,
        constants: Vec<EnumConst>,
    ) -> Dap4Result<Self> {
        let name = name.into();
        if !base.is_integer() {
            dap4_bail!(
                "enumeration {} must have an integer base type, found {}",
                name,
                base
            );
        }
        if let Some(dup) = constants.iter().map(|c| c.name()).duplicates().next() {
            dap4_bail!("enumeration {} declares {} more than once", name, dup);
        }
        Ok(Self {
            name,
            base,
            constants,
        })
    }

    /// The enumeration's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The integer type the enumeration is serialized as.
    pub fn base_type(&self) -> AtomicType {
        self.base
    }

    /// The declared constants, in declaration order.
    pub fn constants(&self) -> &[EnumConst] {
        &self.constants
    }

    /// Find the constant with the given value.
    pub fn lookup(&self, value: i64) -> Option<&EnumConst> {
        self.constants.iter().find(|c| c.value == value)
    }

    /// Find the constant with the given name.
    pub fn lookup_name(&self, name: &str) -> Option<&EnumConst> {
        self.constants.iter().find(|c| c.name() == name)
    }
}

/// The base type of an atomic variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DapType {
    /// A primitive type.
    Atomic(AtomicType),
    /// A reference to a declared enumeration.
    Enum(Arc<EnumDef>),
}

impl DapType {
    /// The primitive type values are serialized as, resolving enumerations to their base type.
    pub fn primitive(&self) -> AtomicType {
        match self {
            Self::Atomic(atype) => *atype,
            Self::Enum(def) => def.base_type(),
        }
    }

    /// The serialized width of one element.
    pub fn serial_size(&self) -> TypeSize {
        self.primitive().serial_size()
    }

    /// Whether the type is an enumeration.
    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }

    /// The enumeration definition, if this is an enumeration.
    pub fn as_enum(&self) -> Option<&EnumDef> {
        match self {
            Self::Enum(def) => Some(def.as_ref()),
            Self::Atomic(_) => None,
        }
    }
}

impl From<AtomicType> for DapType {
    fn from(value: AtomicType) -> Self {
        Self::Atomic(value)
    }
}

impl From<EnumDef> for DapType {
    fn from(value: EnumDef) -> Self {
        Self::Enum(Arc::new(value))
    }
}

impl From<Arc<EnumDef>> for DapType {
    fn from(value: Arc<EnumDef>) -> Self {
        Self::Enum(value)
    }
}

impl Display for DapType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Atomic(atype) => write!(f, "{}", atype),
            Self::Enum(def) => write!(f, "{}<{}>", def.name(), def.base_type()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> EnumDef {
        EnumDef::try_new(
            "colors",
            AtomicType::UInt8,
            vec![
                EnumConst::new("red", 1),
                EnumConst::new("green", 2),
                EnumConst::new("blue", 4),
            ],
        )
        .unwrap()
    }

    #[test]
    fn enum_resolves_to_base() {
        let dtype = DapType::from(colors());
        assert!(dtype.is_enum());
        assert_eq!(dtype.primitive(), AtomicType::UInt8);
        assert_eq!(dtype.serial_size(), TypeSize::Fixed(1));
        assert_eq!(dtype.to_string(), "colors<UInt8>");
    }

    #[test]
    fn enum_lookup() {
        let def = colors();
        assert_eq!(def.lookup(4).map(EnumConst::name), Some("blue"));
        assert!(def.lookup(3).is_none());
        assert_eq!(def.lookup_name("green").map(EnumConst::value), Some(2));
    }

    #[test]
    fn enum_rejects_bad_definitions() {
        assert!(EnumDef::try_new("f", AtomicType::Float32, vec![]).is_err());
        assert!(
            EnumDef::try_new(
                "dup",
                AtomicType::Int32,
                vec![EnumConst::new("a", 1), EnumConst::new("a", 2)]
            )
            .is_err()
        );
    }
}
