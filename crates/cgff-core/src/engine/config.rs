use crate::core::models::forcefield::DEFAULT_KT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Unknown conflict policy '{0}' (expected error, override or layer)")]
    UnknownPolicy(String),
    #[error("Default kT must be finite and positive, got {0}")]
    InvalidDefaultKt(f64),
}

/// How repeated definitions of the same interaction are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Any repeated definition is rejected.
    Error,
    /// A later definition replaces the earlier one.
    #[default]
    Override,
    /// Fields set explicitly by a later definition are applied onto the earlier one.
    Layer,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictPolicy::Error => "error",
            ConflictPolicy::Override => "override",
            ConflictPolicy::Layer => "layer",
        };
        f.write_str(s)
    }
}

impl FromStr for ConflictPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(ConflictPolicy::Error),
            "override" => Ok(ConflictPolicy::Override),
            "layer" => Ok(ConflictPolicy::Layer),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    /// Overrides the policy declared in the document, if set.
    pub policy: Option<ConflictPolicy>,
    /// Declare bead types referenced by potentials but missing from `bead_types`.
    pub implicit_bead_types: bool,
    /// Used when the document does not set `kT`.
    pub default_kt: f64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            policy: None,
            implicit_bead_types: false,
            default_kt: DEFAULT_KT,
        }
    }
}

impl NormalizeConfig {
    /// Resolves the policy in effect: this config, then the document, then `override`.
    pub fn effective_policy(&self, document_policy: Option<ConflictPolicy>) -> ConflictPolicy {
        self.policy.or(document_policy).unwrap_or_default()
    }
}

#[derive(Default)]
pub struct NormalizeConfigBuilder {
    policy: Option<ConflictPolicy>,
    implicit_bead_types: Option<bool>,
    default_kt: Option<f64>,
}

impl NormalizeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = Some(policy);
        self
    }
    pub fn implicit_bead_types(mut self, enabled: bool) -> Self {
        self.implicit_bead_types = Some(enabled);
        self
    }
    pub fn default_kt(mut self, kt: f64) -> Self {
        self.default_kt = Some(kt);
        self
    }

    pub fn build(self) -> Result<NormalizeConfig, ConfigError> {
        let default_kt = self.default_kt.unwrap_or(DEFAULT_KT);
        if !default_kt.is_finite() || default_kt <= 0.0 {
            return Err(ConfigError::InvalidDefaultKt(default_kt));
        }
        Ok(NormalizeConfig {
            policy: self.policy,
            implicit_bead_types: self.implicit_bead_types.unwrap_or(false),
            default_kt,
        })
    }
}
