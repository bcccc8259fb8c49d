use std::sync::Arc;

use dap4_dtype::EnumDef;

use crate::{Dimension, Variable};

/// A group: a namespace of dimensions, enumerations, variables and nested groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    name: Arc<str>,
    dimensions: Vec<Dimension>,
    enums: Vec<Arc<EnumDef>>,
    variables: Vec<Variable>,
    groups: Vec<Group>,
}

impl Group {
    /// An empty group.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            dimensions: Vec::new(),
            enums: Vec::new(),
            variables: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Declare a shared dimension.
    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    /// Declare an enumeration.
    pub fn with_enum(mut self, def: impl Into<Arc<EnumDef>>) -> Self {
        self.enums.push(def.into());
        self
    }

    /// Declare a variable. Variables are serialized in declaration order.
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Nest a group.
    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    /// The group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared dimensions declared in this group.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// The enumerations declared in this group.
    pub fn enums(&self) -> &[Arc<EnumDef>] {
        &self.enums
    }

    /// The variables declared directly in this group.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The nested groups.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Find a shared dimension by name in this group.
    pub fn find_dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name() == Some(name))
    }

    /// Find an enumeration by name in this group.
    pub fn find_enum(&self, name: &str) -> Option<&Arc<EnumDef>> {
        self.enums.iter().find(|e| e.name() == name)
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a Variable>) {
        out.extend(self.variables.iter());
        for group in &self.groups {
            group.collect_variables(out);
        }
    }

    fn find_by_path(&self, path: &[&str]) -> Option<&Variable> {
        match path {
            [] => None,
            [name] => self.variables.iter().find(|v| v.name() == *name),
            [group, rest @ ..] => self
                .groups
                .iter()
                .find(|g| g.name() == *group)?
                .find_by_path(rest),
        }
    }
}

/// The root of a metadata tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dataset {
    name: Arc<str>,
    root: Group,
}

impl Dataset {
    /// A dataset whose root group is `root`.
    pub fn new(name: impl Into<Arc<str>>, root: Group) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// The dataset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root group.
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Every top-level variable, in serialization order.
    ///
    /// The order is depth-first over groups: a group's own variables come before those of its
    /// nested groups.
    pub fn top_variables(&self) -> Vec<&Variable> {
        let mut out = Vec::new();
        self.root.collect_variables(&mut out);
        out
    }

    /// Find a top-level variable.
    ///
    /// A path containing `/` is resolved group by group from the root, `/g/v` and `g/v` alike.
    /// A bare name matches the first top-level variable of that name in serialization order.
    pub fn find_variable(&self, path: &str) -> Option<&Variable> {
        if path.contains('/') {
            let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
            self.root.find_by_path(&parts)
        } else {
            self.top_variables().into_iter().find(|v| v.name() == path)
        }
    }
}

#[cfg(test)]
mod tests {
    use dap4_dtype::AtomicType;

    use super::*;

    fn dataset() -> Dataset {
        let inner = Group::new("inner")
            .with_variable(Variable::atomic("c", AtomicType::Int8, []))
            .with_variable(Variable::atomic("a", AtomicType::Int16, []));
        let root = Group::new("/")
            .with_dimension(Dimension::new("n", 2))
            .with_variable(Variable::atomic("a", AtomicType::Int32, []))
            .with_group(inner)
            .with_variable(Variable::atomic("b", AtomicType::Float64, []));
        Dataset::new("test", root)
    }

    #[test]
    fn serialization_order_is_depth_first() {
        let ds = dataset();
        let names: Vec<&str> = ds.top_variables().iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn find_variables() {
        let ds = dataset();
        let find_type = |path: &str| {
            ds.find_variable(path)
                .and_then(|v| v.base_type())
                .map(|t| t.primitive())
        };
        assert_eq!(find_type("a"), Some(AtomicType::Int32));
        assert_eq!(find_type("/inner/a"), Some(AtomicType::Int16));
        assert_eq!(find_type("inner/c"), Some(AtomicType::Int8));
        assert_eq!(find_type("/b"), Some(AtomicType::Float64));
        assert_eq!(find_type("/inner/b"), None);
        assert_eq!(find_type("missing"), None);
        assert_eq!(ds.root().find_dimension("n").map(Dimension::size), Some(2));
    }
}
