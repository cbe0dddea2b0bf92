//! # atlas-proxy
//!
//! Macroeconomic risk service over the FRED observations API:
//! - fetches unemployment, inflation, interest rate and GDP series
//! - derives a 0-100 risk score per metric
//! - picks a canned recommendation from the score's bucket
//!
//! ```rust,no_run
//! use atlas_proxy::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FredClient::new("my-key".into(), DEFAULT_FRED_URL.into(), Duration::from_secs(30))?;
//!     let analyzer = AtlasAnalyzer::new(Arc::new(client), Arc::new(RecommendationTable::new()));
//!     let report = analyzer.analyze(MetricKind::Inflation).await?;
//!     println!("{}: {} (risk {})", report.label, report.value, report.risk);
//!     Ok(())
//! }
//! ```

pub mod analysis_service;
pub mod api;
pub mod config;
pub mod fred;
pub mod metrics;
pub mod recommendations;
pub mod utils;

pub mod prelude {
    pub use crate::analysis_service::{AtlasAnalyzer, AtlasError, SharedAnalyzer};
    pub use crate::fred::{DEFAULT_FRED_URL, FetchError, FredClient, Observation, ObservationSource};
    pub use crate::metrics::{AnalysisError, MetricKind, MetricReport};
    pub use crate::recommendations::{RecommendationTable, RiskBucket};
}
