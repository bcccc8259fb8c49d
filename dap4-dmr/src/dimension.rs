use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// One dimension of a variable, either a shared named dimension or an anonymous size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimension {
    name: Option<Arc<str>>,
    size: u64,
}

impl Dimension {
    /// A named dimension.
    pub fn new(name: impl Into<Arc<str>>, size: u64) -> Self {
        Self {
            name: Some(name.into()),
            size,
        }
    }

    /// An anonymous dimension.
    pub fn anonymous(size: u64) -> Self {
        Self { name: None, size }
    }

    /// The dimension name, if it is a shared dimension.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The number of indices along the dimension.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl From<u64> for Dimension {
    fn from(size: u64) -> Self {
        Self::anonymous(size)
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}={}", name, self.size),
            None => write!(f, "{}", self.size),
        }
    }
}
