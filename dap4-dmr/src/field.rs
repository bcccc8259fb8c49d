//! Selectors for fields of structures and sequences, and for top-level variables.
//!
//! A `Field` selects one direct child by name or position. A `FieldPath` selects a nested
//! field by a sequence of such selectors.

use core::fmt;
use std::fmt::{Display, Formatter};

use itertools::Itertools;

/// A selector for a field, by name or by declaration position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Field {
    /// A field selector by name
    Name(String),
    /// A field selector by index (position)
    Index(usize),
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Name(value.into())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Name(value)
    }
}

impl From<&String> for Field {
    fn from(value: &String) -> Self {
        Field::Name(value.clone())
    }
}

impl From<usize> for Field {
    fn from(value: usize) -> Self {
        Field::Index(value)
    }
}

impl From<&Field> for Field {
    fn from(value: &Field) -> Self {
        value.clone()
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name(name) => write!(f, "{name}"),
            Field::Index(idx) => write!(f, "#{idx}"),
        }
    }
}

/// A path through nested structures, composed of a sequence of field selectors.
///
/// The first selector picks a top-level variable, the rest pick fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldPath(Vec<Field>);

impl FieldPath {
    /// The empty path.
    pub fn root() -> Self {
        Self(vec![])
    }

    /// A path with a single selector.
    pub fn from_name<F: Into<Field>>(name: F) -> Self {
        Self(vec![name.into()])
    }

    /// Parse a dotted path such as `station.readings`.
    pub fn parse(path: &str) -> Self {
        path.split('.')
            .filter(|part| !part.is_empty())
            .map(Field::from)
            .collect()
    }

    /// The selectors making up this path.
    pub fn path(&self) -> &[Field] {
        &self.0
    }

    /// Append a selector.
    pub fn push<F: Into<Field>>(&mut self, field: F) {
        self.0.push(field.into());
    }

    /// Whether the path has no selectors.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Field> for FieldPath {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        FieldPath(iter.into_iter().collect())
    }
}

impl From<Field> for FieldPath {
    fn from(value: Field) -> Self {
        FieldPath(vec![value])
    }
}

impl From<Vec<Field>> for FieldPath {
    fn from(value: Vec<Field>) -> Self {
        FieldPath(value)
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().format("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let path = FieldPath::parse("station.readings.value");
        assert_eq!(path.path().len(), 3);
        assert_eq!(path.to_string(), "station.readings.value");
        assert!(FieldPath::parse("").is_root());
    }

    #[test]
    fn build_path() {
        let mut path = FieldPath::from_name("s");
        path.push(1usize);
        assert_eq!(path.path(), &[Field::from("s"), Field::Index(1)]);
        assert_eq!(path.to_string(), "s.#1");
    }
}
