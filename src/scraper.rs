//! Fetches layers page by page and hands the results to the exporter.

use crate::config::{LayerConfig, ServiceConfig};
use crate::error::{Error, Result};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::output::{ExportOutcome, Exporter};
use crate::query::{LayerQuery, layer_path};
use crate::rate_limit::RateLimiter;
use crate::requester::RetryingRequester;
use crate::transport::{HttpTransport, Transport};
use indicatif::ProgressBar;
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

pub struct ArcGisScraper {
    base_url: String,
    page_size: u32,
    token: Option<String>,
    requester: RetryingRequester,
    exporter: Exporter,
    metrics: MetricsCollector,
    progress: Option<ProgressBar>,
}

impl ArcGisScraper {
    /// Builds a scraper on the default HTTP transport.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(config.request_timeout_secs))?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates the export directory if needed.
    pub fn with_transport(config: &ServiceConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url);
        url::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid base URL {}: {}", config.base_url, e)))?;

        if config.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".to_string()));
        }

        fs::create_dir_all(&config.export_directory)?;

        let metrics = MetricsCollector::new();
        let requester = RetryingRequester::new(
            transport,
            RateLimiter::new(config.max_requests_per_second),
            config.max_retries,
            metrics.clone(),
        )
        .with_retry_client_errors(config.retry_client_errors);

        Ok(Self {
            base_url,
            page_size: config.page_size,
            token: config.token.clone().filter(|t| !t.is_empty()),
            requester,
            exporter: Exporter::new(&config.export_directory, &config.export_format),
            metrics,
            progress: None,
        })
    }

    /// Advances `progress` once per finished layer in batch scrapes.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Raw layer description (fields, geometry type, spatial reference).
    pub async fn fetch_metadata(&self, query_path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, layer_path(query_path));
        let mut params = vec![("f", "json".to_string())];
        if let Some(token) = &self.token {
            params.push(("token", token.clone()));
        }

        log::info!("Fetching metadata: {}", url);
        self.requester.request(&url, &params).await
    }

    /// Pages through the layer until the service returns no more features.
    pub async fn fetch_layer(&self, query: &LayerQuery) -> Result<Vec<Value>> {
        let url = format!("{}{}", self.base_url, query.path);
        let mut params = query.page_params(self.page_size, self.token.as_deref());
        let mut offset: u64 = 0;
        let mut features = Vec::new();

        loop {
            set_param(&mut params, "resultOffset", offset.to_string());
            let mut data = self.requester.request(&url, &params).await?;

            if let Some(error) = data.get("error") {
                log::warn!("Service reported an error for {}: {}", url, error);
            }

            let page = match data.get_mut("features").and_then(Value::as_array_mut) {
                Some(page) if !page.is_empty() => std::mem::take(page),
                _ => {
                    self.metrics.record_page(0);
                    break;
                }
            };

            log::debug!("Offset {}: {} features", offset, page.len());
            self.metrics.record_page(page.len());
            features.extend(page);
            offset += u64::from(self.page_size);
        }

        log::info!("Fetched {} features from {}", features.len(), query.path);
        Ok(features)
    }

    /// Fetches one layer and exports it. Without a file name the first path
    /// segment is used.
    pub async fn scrape_layer(
        &self,
        query: &LayerQuery,
        filename: Option<&str>,
    ) -> Result<ExportOutcome> {
        let features = self.fetch_layer(query).await?;
        let filename = match filename {
            Some(name) if !name.is_empty() => name,
            _ => query.default_filename(),
        };

        let outcome = self.exporter.export(&features, filename)?;
        if let ExportOutcome::Written { records, .. } = &outcome {
            self.metrics.record_export(*records);
        }
        Ok(outcome)
    }

    /// Scrapes each path in order with default filters. Stops at the first error.
    pub async fn scrape_layers(&self, query_paths: &[String]) -> Result<Vec<ExportOutcome>> {
        let layers: Vec<LayerConfig> = query_paths
            .iter()
            .map(|path| LayerConfig::from(LayerQuery::new(path.as_str())))
            .collect();
        self.scrape_queries(&layers).await
    }

    /// Like [`scrape_layers`](Self::scrape_layers), honouring per-layer
    /// filters and file names.
    pub async fn scrape_queries(&self, layers: &[LayerConfig]) -> Result<Vec<ExportOutcome>> {
        let total = layers.len();
        if let Some(pb) = &self.progress {
            pb.set_length(total as u64);
        }

        let mut outcomes = Vec::with_capacity(total);
        for (idx, layer) in layers.iter().enumerate() {
            log::info!("Scraping {}/{}: {}", idx + 1, total, layer.query.path);
            if let Some(pb) = &self.progress {
                pb.set_message(layer.query.path.clone());
            }

            let outcome = self
                .scrape_layer(&layer.query, layer.filename.as_deref())
                .await?;
            outcomes.push(outcome);

            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }
        Ok(outcomes)
    }
}

/// Strips every trailing `/` and appends exactly one.
pub fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}

fn set_param(params: &mut [(&'static str, String)], key: &str, value: String) {
    if let Some(param) = params.iter_mut().find(|(k, _)| *k == key) {
        param.1 = value;
    }
}
