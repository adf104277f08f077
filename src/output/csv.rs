use super::OutputWriter;
use super::flatten::FlatTable;
use crate::error::Result;
use serde_json::Value;
use std::path::Path;

/// Comma-separated with a header row. Missing and null cells are empty.
pub struct CsvOutput;

impl OutputWriter for CsvOutput {
    fn write(&self, table: &FlatTable, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&table.columns)?;

        for row in &table.rows {
            let values: Vec<_> = table
                .columns
                .iter()
                .map(|column| match row.get(column) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(v) => v.to_string(),
                })
                .collect();
            writer.write_record(values)?;
        }

        writer.flush()?;
        Ok(())
    }
}
