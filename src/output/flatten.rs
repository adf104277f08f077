//! Normalizes nested feature records into flat rows with dotted column names.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Column name used when a record is not a JSON object.
const SCALAR_COLUMN: &str = "value";

#[derive(Debug, Clone, Default)]
pub struct FlatTable {
    /// Union of all row keys, in first-seen order.
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

impl FlatTable {
    pub fn from_features(features: &[Value]) -> Self {
        let mut columns = Vec::new();
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(features.len());

        for feature in features {
            let row = flatten_record(feature);
            for key in row.keys() {
                if seen.insert(key.clone()) {
                    columns.push(key.clone());
                }
            }
            rows.push(row);
        }

        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell values of one column, `None` where a row lacks the key.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Option<&'a Value>> + 'a {
        self.rows.iter().map(move |row| row.get(name))
    }
}

/// `{"attributes": {"A": 1}, "geometry": {"x": 2}}` becomes
/// `{"attributes.A": 1, "geometry.x": 2}`. Arrays and empty objects are kept
/// as leaf values. When a dotted path collides with a literal key
/// (`{"a.b": 1, "a": {"b": 2}}`), the value seen first wins.
pub fn flatten_record(record: &Value) -> Map<String, Value> {
    let mut row = Map::new();
    match record {
        Value::Object(map) => flatten_into(&mut row, None, map),
        other => {
            row.insert(SCALAR_COLUMN.to_string(), other.clone());
        }
    }
    row
}

fn flatten_into(row: &mut Map<String, Value>, prefix: Option<&str>, map: &Map<String, Value>) {
    for (key, value) in map {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => flatten_into(row, Some(&name), nested),
            _ => {
                row.entry(name).or_insert_with(|| value.clone());
            }
        }
    }
}
