use crate::core::models::parameter::Parameter;
use indexmap::IndexMap;
use std::f64::consts::PI;

/// Built-in formulas for parameters that are computed rather than specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Derivation {
    /// Gaussian length scale, `0.5 / Σ smear_length²` (nm⁻²).
    GaussianKappa,
    /// Gaussian prefactor, `excl_vol · (Kappa/π)^1.5`.
    GaussianPrefactor,
    /// Force constant of an offset-free harmonic bond, `3 / (2 b²)` (kT/nm²).
    BondForceConstant,
}

impl Derivation {
    /// Serialized parameter this derivation is computed from, if any.
    pub fn source_parameter(&self) -> Option<&'static str> {
        match self {
            Derivation::GaussianKappa => None,
            Derivation::GaussianPrefactor => Some("excl_vol"),
            Derivation::BondForceConstant => Some("b"),
        }
    }

    pub fn is_invertible(&self) -> bool {
        self.source_parameter().is_some()
    }

    pub fn compute(
        &self,
        parameters: &IndexMap<String, Parameter>,
        smear_lengths: &[f64],
    ) -> Option<Parameter> {
        match self {
            Derivation::GaussianKappa => Some(Parameter::fixed(gaussian_kappa(smear_lengths)?)),
            Derivation::GaussianPrefactor => {
                let excl_vol = parameters.get("excl_vol")?;
                let kappa = gaussian_kappa(smear_lengths)?;
                Some(Parameter::new(
                    excl_vol.value * (kappa / PI).powf(1.5),
                    excl_vol.fixed,
                ))
            }
            Derivation::BondForceConstant => {
                let b = parameters.get("b")?;
                if b.value == 0.0 {
                    return None;
                }
                Some(Parameter::new(3.0 / (2.0 * b.value * b.value), b.fixed))
            }
        }
    }

    /// Value the source parameter must take for this derivation to equal `value`.
    pub fn invert(&self, value: f64, smear_lengths: &[f64]) -> Option<(&'static str, f64)> {
        match self {
            Derivation::GaussianKappa => None,
            Derivation::GaussianPrefactor => {
                let kappa = gaussian_kappa(smear_lengths)?;
                Some(("excl_vol", value / (kappa / PI).powf(1.5)))
            }
            Derivation::BondForceConstant => {
                if value <= 0.0 {
                    return None;
                }
                Some(("b", (3.0 / (2.0 * value)).sqrt()))
            }
        }
    }
}

fn gaussian_kappa(smear_lengths: &[f64]) -> Option<f64> {
    let sum: f64 = smear_lengths.iter().map(|a| a * a).sum();
    if sum > 0.0 { Some(0.5 / sum) } else { None }
}
