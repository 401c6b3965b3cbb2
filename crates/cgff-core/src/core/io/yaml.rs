use super::WriteError;
use super::traits::ForceFieldWriter;
use crate::core::models::bead::BeadType;
use crate::core::models::forcefield::ForceField;
use crate::core::models::parameter::Parameter;
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ExplicitDocument<'a> {
    #[serde(rename = "kT")]
    kt: f64,
    bead_types: Vec<&'a BeadType>,
    potentials: IndexMap<&'a str, Vec<ExplicitPotential<'a>>>,
}

#[derive(Serialize)]
struct ExplicitPotential<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    species: Vec<&'a str>,
    #[serde(flatten)]
    parameters: &'a IndexMap<String, Parameter>,
}

/// Fully explicit YAML: every instance is listed with all of its serialized parameters.
///
/// Derived parameters are left out; they are recomputed when the file is loaded.
#[derive(Debug, Clone, Default)]
pub struct ExplicitYaml {
    pub header: Option<String>,
}

impl ExplicitYaml {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
        }
    }
}

impl ForceFieldWriter for ExplicitYaml {
    fn write_to(&self, forcefield: &ForceField, writer: &mut impl Write) -> Result<(), WriteError> {
        let mut potentials: IndexMap<&str, Vec<ExplicitPotential>> = IndexMap::new();
        for kind in forcefield.kinds() {
            let entries = forcefield
                .potentials_of(kind)
                .iter()
                .map(|p| {
                    Ok(ExplicitPotential {
                        name: (!p.auto_named).then_some(p.name.as_str()),
                        species: forcefield.species_of(p)?,
                        parameters: &p.parameters,
                    })
                })
                .collect::<Result<Vec<_>, WriteError>>()?;
            potentials.insert(kind, entries);
        }

        let document = ExplicitDocument {
            kt: forcefield.kt(),
            bead_types: forcefield.bead_types().collect(),
            potentials,
        };

        write_header(writer, self.header.as_deref())?;
        writer.write_all(serde_yaml::to_string(&document)?.as_bytes())?;
        Ok(())
    }
}

/// Writes `# <line>` for each header line followed by the document marker.
pub(crate) fn write_header(writer: &mut impl Write, header: Option<&str>) -> Result<(), WriteError> {
    if let Some(header) = header {
        for line in header.lines() {
            if line.is_empty() {
                writeln!(writer, "#")?;
            } else {
                writeln!(writer, "# {}", line)?;
            }
        }
    }
    writeln!(writer, "---")?;
    Ok(())
}

/// Renders a force field as explicit YAML.
pub fn to_explicit_yaml(forcefield: &ForceField, header: Option<&str>) -> Result<String, WriteError> {
    ExplicitYaml {
        header: header.map(str::to_string),
    }
    .render(forcefield)
}
