use super::WriteError;
use super::traits::ForceFieldWriter;
use super::yaml::write_header;
use crate::core::models::bead::BeadType;
use crate::core::models::forcefield::ForceField;
use crate::core::models::parameter::Parameter;
use crate::core::models::potential::PotentialInstance;
use crate::core::utils::identifiers::is_valid_bead_name;
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ShorthandDocument<'a> {
    #[serde(rename = "kT")]
    kt: f64,
    bead_types: Vec<String>,
    potentials: IndexMap<&'a str, Vec<ShorthandEntry>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ShorthandEntry {
    Inline(String),
    /// Used when the instance name cannot survive whitespace tokenization.
    Mapping(IndexMap<String, String>),
}

/// Canonical shorthand YAML: one line per bead type and per interaction.
#[derive(Debug, Clone, Default)]
pub struct ShorthandYaml {
    pub header: Option<String>,
}

impl ShorthandYaml {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ForceFieldWriter for ShorthandYaml {
    fn write_to(&self, forcefield: &ForceField, writer: &mut impl Write) -> Result<(), WriteError> {
        let mut potentials = IndexMap::new();
        for kind in forcefield.kinds() {
            let entries = forcefield
                .potentials_of(kind)
                .iter()
                .map(|p| shorthand_entry(forcefield, p))
                .collect::<Result<Vec<_>, WriteError>>()?;
            potentials.insert(kind, entries);
        }

        let document = ShorthandDocument {
            kt: forcefield.kt(),
            bead_types: forcefield.bead_types().map(shorthand_bead).collect(),
            potentials,
        };

        write_header(writer, self.header.as_deref())?;
        writer.write_all(serde_yaml::to_string(&document)?.as_bytes())?;
        Ok(())
    }
}

fn shorthand_bead(bead: &BeadType) -> String {
    if bead.has_default_properties() {
        bead.name.clone()
    } else {
        format!("{} {} {}", bead.name, bead.smear_length, bead.charge)
    }
}

fn shorthand_parameter(parameter: &Parameter) -> String {
    let flag = if parameter.fixed { "fixed" } else { "free" };
    format!("{};{}", parameter.value, flag)
}

fn shorthand_entry(
    forcefield: &ForceField,
    instance: &PotentialInstance,
) -> Result<ShorthandEntry, WriteError> {
    let species = forcefield.species_of(instance)?.join(" ");
    let explicit_name = (!instance.auto_named).then_some(instance.name.as_str());

    if let Some(name) = explicit_name {
        if !is_valid_bead_name(name) {
            let mut fields = IndexMap::new();
            fields.insert("species".to_string(), species);
            fields.insert("name".to_string(), name.to_string());
            for (param, value) in &instance.parameters {
                fields.insert(param.clone(), shorthand_parameter(value));
            }
            return Ok(ShorthandEntry::Mapping(fields));
        }
    }

    let mut line = species;
    if let Some(name) = explicit_name {
        line.push_str(" name;");
        line.push_str(name);
    }
    for (param, value) in &instance.parameters {
        line.push(' ');
        line.push_str(param);
        line.push(';');
        line.push_str(&shorthand_parameter(value));
    }
    Ok(ShorthandEntry::Inline(line))
}

/// Renders a force field as canonical shorthand YAML.
pub fn to_shorthand_yaml(forcefield: &ForceField) -> Result<String, WriteError> {
    ShorthandYaml::new().render(forcefield)
}
