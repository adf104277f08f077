use serde::{Deserialize, Serialize};

/// Filters for one layer query. Defaults select every record and every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerQuery {
    /// Path below the service URL, e.g. `0/query`.
    pub path: String,

    #[serde(rename = "where", default = "default_where")]
    pub where_clause: String,

    #[serde(default = "default_out_fields")]
    pub out_fields: String,

    /// Geometry filter passed through verbatim (JSON envelope, `x,y`, ...).
    #[serde(default)]
    pub geometry: Option<String>,
}

impl LayerQuery {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            where_clause: default_where(),
            out_fields: default_out_fields(),
            geometry: None,
        }
    }

    pub fn with_where(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = where_clause.into();
        self
    }

    pub fn with_out_fields(mut self, out_fields: impl Into<String>) -> Self {
        self.out_fields = out_fields.into();
        self
    }

    pub fn with_geometry(mut self, geometry: impl Into<String>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// Layer path without the trailing query action: `0/query` -> `0`.
    pub fn layer_path(&self) -> &str {
        layer_path(&self.path)
    }

    /// Text before the first `/`, used as the export file name.
    pub fn default_filename(&self) -> &str {
        self.path.split('/').next().unwrap_or_default()
    }

    /// Parameters of the first page, in the order the service receives them.
    pub fn page_params(&self, page_size: u32, token: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("where", self.where_clause.clone()),
            ("outFields", self.out_fields.clone()),
            ("f", "json".to_string()),
            ("resultOffset", "0".to_string()),
            ("resultRecordCount", page_size.to_string()),
        ];
        if let Some(geometry) = self.geometry.as_deref().filter(|g| !g.is_empty()) {
            params.push(("geometry", geometry.to_string()));
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            params.push(("token", token.to_string()));
        }
        params
    }
}

pub fn layer_path(query_path: &str) -> &str {
    query_path
        .split_once("/query")
        .map(|(layer, _)| layer)
        .unwrap_or(query_path)
}

fn default_where() -> String {
    "1=1".to_string()
}

fn default_out_fields() -> String {
    "*".to_string()
}
