use serde::{Deserialize, Serialize};

/// A fully resolved potential parameter.
///
/// `fixed` parameters are held constant during optimization; free ones may be varied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub value: f64,
    pub fixed: bool,
}

impl Parameter {
    pub fn new(value: f64, fixed: bool) -> Self {
        Self { value, fixed }
    }

    pub fn free(value: f64) -> Self {
        Self::new(value, false)
    }

    pub fn fixed(value: f64) -> Self {
        Self::new(value, true)
    }

    /// Overwrites only the fields the patch sets.
    pub fn apply(&mut self, patch: &ParameterPatch) {
        if let Some(value) = patch.value {
            self.value = value;
        }
        if let Some(fixed) = patch.fixed {
            self.fixed = fixed;
        }
    }
}

/// A partial parameter specification as written in a force-field file.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParameterPatch {
    pub value: Option<f64>,
    pub fixed: Option<bool>,
}

impl ParameterPatch {
    pub fn new(value: Option<f64>, fixed: Option<bool>) -> Self {
        Self { value, fixed }
    }

    pub fn with_value(value: f64) -> Self {
        Self::new(Some(value), None)
    }

    pub fn with_fixed(fixed: bool) -> Self {
        Self::new(None, Some(fixed))
    }

    /// Layers `other` on top of `self`; fields set in `other` win.
    pub fn merge(&mut self, other: &ParameterPatch) {
        if other.value.is_some() {
            self.value = other.value;
        }
        if other.fixed.is_some() {
            self.fixed = other.fixed;
        }
    }
}

impl From<Parameter> for ParameterPatch {
    fn from(p: Parameter) -> Self {
        Self::new(Some(p.value), Some(p.fixed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_only_touches_fields_set_in_patch() {
        let mut p = Parameter::free(1.0);
        p.apply(&ParameterPatch::with_fixed(true));
        assert_eq!(p, Parameter::fixed(1.0));

        p.apply(&ParameterPatch::with_value(2.5));
        assert_eq!(p, Parameter::fixed(2.5));

        p.apply(&ParameterPatch::default());
        assert_eq!(p, Parameter::fixed(2.5));
    }

    #[test]
    fn merge_prefers_fields_of_the_later_patch() {
        let mut patch = ParameterPatch::new(Some(1.0), Some(false));
        patch.merge(&ParameterPatch::with_value(3.0));
        assert_eq!(patch, ParameterPatch::new(Some(3.0), Some(false)));
        patch.merge(&ParameterPatch::with_fixed(true));
        assert_eq!(patch, ParameterPatch::new(Some(3.0), Some(true)));
    }
}
