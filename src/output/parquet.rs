use super::OutputWriter;
use super::flatten::FlatTable;
use crate::error::Result;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use parquet::arrow::ArrowWriter;
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Columnar output. Each column gets the narrowest type that holds all of its
/// non-null values; anything mixed falls back to text.
pub struct ParquetOutput;

impl OutputWriter for ParquetOutput {
    fn write(&self, table: &FlatTable, path: &Path) -> Result<()> {
        let mut fields = Vec::with_capacity(table.columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns.len());

        for column in &table.columns {
            let data_type = infer_type(table.column(column));
            arrays.push(build_array(&data_type, table.column(column)));
            fields.push(Field::new(column.as_str(), data_type, true));
        }

        let schema = Arc::new(Schema::new(fields));
        let options = RecordBatchOptions::new().with_row_count(Some(table.len()));
        let batch = RecordBatch::try_new_with_options(schema.clone(), arrays, &options)?;

        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }
}

fn infer_type<'a>(cells: impl Iterator<Item = Option<&'a Value>>) -> DataType {
    let mut all_int = true;
    let mut all_number = true;
    let mut all_bool = true;
    let mut any = false;

    for value in cells.flatten() {
        if value.is_null() {
            continue;
        }
        any = true;
        all_int &= value.is_i64();
        all_number &= value.is_number();
        all_bool &= value.is_boolean();
    }

    match (any, all_int, all_number, all_bool) {
        (false, ..) => DataType::Utf8,
        (true, true, _, _) => DataType::Int64,
        (true, _, true, _) => DataType::Float64,
        (true, _, _, true) => DataType::Boolean,
        _ => DataType::Utf8,
    }
}

fn build_array<'a>(data_type: &DataType, cells: impl Iterator<Item = Option<&'a Value>>) -> ArrayRef {
    match data_type {
        DataType::Int64 => Arc::new(Int64Array::from(
            cells.map(|v| v.and_then(Value::as_i64)).collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            cells.map(|v| v.and_then(Value::as_f64)).collect::<Vec<_>>(),
        )),
        DataType::Boolean => Arc::new(BooleanArray::from(
            cells.map(|v| v.and_then(Value::as_bool)).collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            cells
                .map(|v| match v {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(other) => Some(other.to_string()),
                })
                .collect::<Vec<_>>(),
        )),
    }
}
