use super::derived::Derivation;
use super::registry::{ParameterSpec, PotentialSchema};
use crate::core::models::filter::SpeciesOrdering;
use phf::{Map, phf_map};

pub(crate) struct BuiltinParameter {
    name: &'static str,
    default: f64,
    fixed: bool,
    derivation: Option<Derivation>,
}

pub(crate) struct BuiltinSchema {
    name: &'static str,
    arity: usize,
    ordering: SpeciesOrdering,
    parameters: &'static [BuiltinParameter],
}

impl BuiltinSchema {
    pub(crate) fn to_schema(&self) -> PotentialSchema {
        PotentialSchema {
            name: self.name.to_string(),
            arity: self.arity,
            ordering: self.ordering,
            parameters: self
                .parameters
                .iter()
                .map(|p| ParameterSpec {
                    name: p.name.to_string(),
                    default: p.default,
                    fixed: p.fixed,
                    derivation: p.derivation,
                })
                .collect(),
        }
    }
}

static GAUSSIAN: BuiltinSchema = BuiltinSchema {
    name: "gaussian",
    arity: 2,
    ordering: SpeciesOrdering::Unordered,
    parameters: &[
        BuiltinParameter {
            name: "excl_vol",
            default: 0.0,
            fixed: false,
            derivation: None,
        },
        BuiltinParameter {
            name: "B",
            default: 0.0,
            fixed: false,
            derivation: Some(Derivation::GaussianPrefactor),
        },
        BuiltinParameter {
            name: "Kappa",
            default: 0.0,
            fixed: true,
            derivation: Some(Derivation::GaussianKappa),
        },
    ],
};

static HARMONIC_BOND: BuiltinSchema = BuiltinSchema {
    name: "harmonic_bond",
    arity: 2,
    ordering: SpeciesOrdering::Unordered,
    parameters: &[
        BuiltinParameter {
            name: "K",
            default: 1.0,
            fixed: false,
            derivation: None,
        },
        BuiltinParameter {
            name: "r0",
            default: 0.0,
            fixed: false,
            derivation: None,
        },
    ],
};

static HARMONIC_BOND_NO_OFFSET: BuiltinSchema = BuiltinSchema {
    name: "harmonic_bond_no_offset",
    arity: 2,
    ordering: SpeciesOrdering::Unordered,
    parameters: &[
        BuiltinParameter {
            name: "b",
            default: 1.0,
            fixed: false,
            derivation: None,
        },
        BuiltinParameter {
            name: "K",
            default: 0.0,
            fixed: true,
            derivation: Some(Derivation::BondForceConstant),
        },
    ],
};

pub(crate) static BUILTIN_SCHEMAS: Map<&'static str, &'static BuiltinSchema> = phf_map! {
    "gaussian" => &GAUSSIAN,
    "harmonic_bond" => &HARMONIC_BOND,
    "harmonic_bond_no_offset" => &HARMONIC_BOND_NO_OFFSET,
};

/// Extra spellings for built-in potentials, keyed by lookup form.
pub(crate) static BUILTIN_ALIASES: Map<&'static str, &'static str> = phf_map! {
    "gauss" => "gaussian",
    "bond" => "harmonic_bond",
    "harmonic" => "harmonic_bond",
    "nooffsetbond" => "harmonic_bond_no_offset",
    "harmonicnooffset" => "harmonic_bond_no_offset",
};
