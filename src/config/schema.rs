use crate::query::LayerQuery;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::{Validate, ValidationError};

/// Connection and export settings for one ArcGIS service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceConfig {
    #[validate(url)]
    pub base_url: String,

    #[serde(default = "default_export_directory")]
    pub export_directory: PathBuf,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1))]
    pub page_size: u32,

    /// Checked when exporting, not here.
    #[serde(default = "default_export_format")]
    pub export_format: String,

    /// Zero disables rate limiting.
    #[serde(default = "default_max_requests_per_second")]
    #[validate(range(min = 0.0))]
    pub max_requests_per_second: f64,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_client_errors")]
    pub retry_client_errors: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            export_directory: default_export_directory(),
            page_size: default_page_size(),
            export_format: default_export_format(),
            max_requests_per_second: default_max_requests_per_second(),
            token: None,
            max_retries: default_max_retries(),
            retry_client_errors: default_retry_client_errors(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// A layer to scrape, with an optional output file name.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LayerConfig {
    #[serde(flatten)]
    #[validate(custom = "validate_layer_path")]
    pub query: LayerQuery,

    #[serde(default)]
    pub filename: Option<String>,
}

impl From<LayerQuery> for LayerConfig {
    fn from(query: LayerQuery) -> Self {
        Self {
            query,
            filename: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobConfig {
    #[validate]
    pub service: ServiceConfig,

    #[validate(length(min = 1))]
    pub layers: Vec<LayerConfig>,
}

fn validate_layer_path(query: &LayerQuery) -> Result<(), ValidationError> {
    if query.path.trim().is_empty() {
        return Err(ValidationError::new("empty_layer_path"));
    }
    Ok(())
}

fn default_export_directory() -> PathBuf {
    PathBuf::from("./data")
}

fn default_page_size() -> u32 {
    1000
}

fn default_export_format() -> String {
    "csv".to_string()
}

fn default_max_requests_per_second() -> f64 {
    1.0
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_client_errors() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}
