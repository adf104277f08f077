pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod query;
pub mod rate_limit;
pub mod requester;
pub mod scraper;
pub mod transport;

pub use config::{ConfigLoader, JobConfig, LayerConfig, ServiceConfig};
pub use error::{Error, Result};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use output::{ExportFormat, ExportOutcome, Exporter};
pub use query::LayerQuery;
pub use rate_limit::RateLimiter;
pub use requester::RetryingRequester;
pub use scraper::ArcGisScraper;
pub use transport::{HttpTransport, Transport, TransportError};
