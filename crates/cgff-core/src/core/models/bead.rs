use crate::core::utils::identifiers::is_valid_bead_name;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SMEAR_LENGTH: f64 = 1.0;
pub const DEFAULT_CHARGE: f64 = 0.0;

/// A coarse-grained particle species.
///
/// The smear length is in nanometers and the charge in units of the elementary
/// charge. Bead types are identified by name within a force field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeadType {
    pub name: String,
    #[serde(default = "default_smear_length")]
    pub smear_length: f64,
    #[serde(default)]
    pub charge: f64,
}

fn default_smear_length() -> f64 {
    DEFAULT_SMEAR_LENGTH
}

/// Reason a bead type was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeadTypeDefect {
    Name,
    SmearLength,
    Charge,
}

impl BeadType {
    /// Creates a bead type with default smear length and zero charge.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            smear_length: DEFAULT_SMEAR_LENGTH,
            charge: DEFAULT_CHARGE,
        }
    }

    pub fn with_smear_length(mut self, smear_length: f64) -> Self {
        self.smear_length = smear_length;
        self
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    pub fn has_default_properties(&self) -> bool {
        self.smear_length == DEFAULT_SMEAR_LENGTH && self.charge == DEFAULT_CHARGE
    }

    pub fn check(&self) -> Result<(), BeadTypeDefect> {
        if !is_valid_bead_name(&self.name) {
            return Err(BeadTypeDefect::Name);
        }
        if !self.smear_length.is_finite() || self.smear_length <= 0.0 {
            return Err(BeadTypeDefect::SmearLength);
        }
        if !self.charge.is_finite() {
            return Err(BeadTypeDefect::Charge);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bead_type_uses_defaults() {
        let bt = BeadType::new("A");
        assert_eq!(bt.smear_length, 1.0);
        assert_eq!(bt.charge, 0.0);
        assert!(bt.has_default_properties());
    }

    #[test]
    fn builder_methods_override_defaults() {
        let bt = BeadType::new("B").with_smear_length(5.0).with_charge(1.0);
        assert_eq!(bt.smear_length, 5.0);
        assert_eq!(bt.charge, 1.0);
        assert!(!bt.has_default_properties());
    }

    #[test]
    fn check_reports_the_first_defect() {
        assert_eq!(BeadType::new("A;B").check(), Err(BeadTypeDefect::Name));
        assert_eq!(
            BeadType::new("A").with_smear_length(0.0).check(),
            Err(BeadTypeDefect::SmearLength)
        );
        assert_eq!(
            BeadType::new("A").with_charge(f64::NAN).check(),
            Err(BeadTypeDefect::Charge)
        );
        assert_eq!(BeadType::new("A").check(), Ok(()));
    }
}
