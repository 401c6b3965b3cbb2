use super::ids::BeadTypeId;
use super::parameter::{Parameter, ParameterPatch};
use indexmap::IndexMap;

/// One fully normalized interaction between a fixed sequence of bead types.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialInstance {
    /// Canonical schema name, e.g. `gaussian`.
    pub kind: String,
    pub name: String,
    /// True when `name` was generated from the kind and bead names.
    pub auto_named: bool,
    pub beads: Vec<BeadTypeId>,
    /// Serialized parameters in schema order.
    pub parameters: IndexMap<String, Parameter>,
    /// Parameters computed from other parameters and bead properties.
    pub derived: IndexMap<String, Parameter>,
    /// Fields the originating entry set explicitly.
    pub explicit: IndexMap<String, ParameterPatch>,
    /// Index of the originating entry within its potential list.
    pub source: usize,
}

impl PotentialInstance {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, beads: Vec<BeadTypeId>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            auto_named: false,
            beads,
            parameters: IndexMap::new(),
            derived: IndexMap::new(),
            explicit: IndexMap::new(),
            source: 0,
        }
    }

    pub fn arity(&self) -> usize {
        self.beads.len()
    }

    /// Looks up a serialized or derived parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .get(name)
            .or_else(|| self.derived.get(name))
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.parameter(name).map(|p| p.value)
    }

    /// Whether both instances resolve to the same serialized parameters.
    pub fn same_parameters(&self, other: &PotentialInstance) -> bool {
        self.parameters == other.parameters
    }

    /// Applies another instance's explicitly set fields on top of this one.
    pub fn layer(&mut self, other: &PotentialInstance) {
        for (name, patch) in &other.explicit {
            if let Some(param) = self.parameters.get_mut(name) {
                param.apply(patch);
            }
            self.explicit.entry(name.clone()).or_default().merge(patch);
        }
    }
}

/// Generated name for an instance: `<kind>_<bead>_<bead>...`.
pub fn auto_name<S: AsRef<str>>(kind: &str, bead_names: &[S]) -> String {
    let mut name = kind.to_string();
    for bead in bead_names {
        name.push('_');
        name.push_str(bead.as_ref());
    }
    name
}
