use super::OutputWriter;
use super::flatten::FlatTable;
use crate::error::Result;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Array of records. Every record carries every column, `null` when absent.
/// `serde_json` leaves non-ASCII text unescaped.
pub struct JsonOutput;

impl OutputWriter for JsonOutput {
    fn write(&self, table: &FlatTable, path: &Path) -> Result<()> {
        let records: Vec<Map<String, Value>> = table
            .rows
            .iter()
            .map(|row| {
                table
                    .columns
                    .iter()
                    .map(|column| {
                        let value = row.get(column).cloned().unwrap_or(Value::Null);
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect();

        let mut file = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut file, &records)?;
        file.flush()?;
        Ok(())
    }
}
