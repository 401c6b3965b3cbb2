use super::WriteError;
use super::traits::ForceFieldWriter;
use crate::core::models::forcefield::ForceField;
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Write;

const HEADER: [&str; 7] = [
    "potential",
    "name",
    "species",
    "parameter",
    "value",
    "fixed",
    "derived",
];

#[derive(Serialize)]
struct ParameterRow<'a> {
    potential: &'a str,
    name: &'a str,
    species: &'a str,
    parameter: &'a str,
    value: f64,
    fixed: bool,
    derived: bool,
}

/// One row per parameter, derived parameters included. Species are joined with `-`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterTable;

impl ForceFieldWriter for ParameterTable {
    fn write_to(&self, forcefield: &ForceField, writer: &mut impl Write) -> Result<(), WriteError> {
        write_parameter_table(forcefield, writer)
    }
}

pub fn write_parameter_table<W: Write>(
    forcefield: &ForceField,
    writer: W,
) -> Result<(), WriteError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HEADER)?;

    for instance in forcefield.potentials() {
        let species = forcefield.species_of(instance)?.join("-");
        let serialized = instance.parameters.iter().map(|(n, p)| (n, p, false));
        let derived = instance.derived.iter().map(|(n, p)| (n, p, true));
        for (parameter, value, is_derived) in serialized.chain(derived) {
            wtr.serialize(ParameterRow {
                potential: &instance.kind,
                name: &instance.name,
                species: &species,
                parameter,
                value: value.value,
                fixed: value.fixed,
                derived: is_derived,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}
