use super::WriteError;
use crate::core::models::forcefield::ForceField;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Common interface of the force-field output formats.
pub trait ForceFieldWriter {
    /// Writes the force field to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the writer reports an I/O error.
    fn write_to(&self, forcefield: &ForceField, writer: &mut impl Write) -> Result<(), WriteError>;

    /// Renders the force field into a string.
    fn render(&self, forcefield: &ForceField) -> Result<String, WriteError> {
        let mut buffer = Vec::new();
        self.write_to(forcefield, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| WriteError::Inconsistency(format!("output is not UTF-8: {}", e)))
    }

    /// Writes the force field to a file, creating or truncating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        &self,
        forcefield: &ForceField,
        path: P,
    ) -> Result<(), WriteError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(forcefield, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
