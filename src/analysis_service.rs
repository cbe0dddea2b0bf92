use crate::fred::{FetchError, SharedSource};
use crate::metrics::{AnalysisError, MetricKind, MetricReport, round_to_two_decimals};
use crate::recommendations::SharedRecommendations;
use crate::utils::Timer;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

pub type SharedAnalyzer = Arc<AtlasAnalyzer>;

/// Fetches a metric's series and turns it into a risk report.
pub struct AtlasAnalyzer {
    source: SharedSource,
    recommendations: SharedRecommendations,
    series_overrides: HashMap<MetricKind, String>,
}

impl AtlasAnalyzer {
    pub fn new(source: SharedSource, recommendations: SharedRecommendations) -> Self {
        Self {
            source,
            recommendations,
            series_overrides: HashMap::new(),
        }
    }

    pub fn with_series_overrides(mut self, overrides: HashMap<MetricKind, String>) -> Self {
        self.series_overrides = overrides;
        self
    }

    pub fn series_for(&self, kind: MetricKind) -> &str {
        self.series_overrides
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_series())
    }

    pub async fn analyze(&self, kind: MetricKind) -> Result<MetricReport, AtlasError> {
        let series_id = self.series_for(kind);

        let timer = Timer::start();
        let observations = self.source.fetch_series(series_id).await.map_err(|e| {
            warn!(metric = %kind, series_id, error = %e, "Series fetch failed");
            e
        })?;
        debug!(
            metric = %kind,
            series_id,
            observations = observations.len(),
            elapsed_ms = timer.elapsed_ms(),
            "Fetched series"
        );

        let values: Vec<f64> = observations.iter().map(|o| o.value).collect();
        let value = round_to_two_decimals(kind.derivation().apply(&values)?);
        let risk = round_to_two_decimals(kind.risk(value));
        let recommendation = self.recommendations.recommend(kind, risk)?;

        info!(metric = %kind, value, risk, "Computed metric risk");

        Ok(MetricReport {
            label: kind.label().to_string(),
            value,
            risk,
            recommendation: recommendation.to_string(),
            as_of: observations.last().and_then(|o| o.date),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fred::{Observation, ObservationSource};
    use crate::recommendations::RecommendationTable;
    use async_trait::async_trait;
    use chrono::{Months, NaiveDate};
    use std::sync::Mutex;

    /// Serves canned values per series id and records which ids were requested.
    #[derive(Default)]
    pub(crate) struct StubSource {
        series: HashMap<String, Vec<f64>>,
        pub(crate) requested: Mutex<Vec<String>>,
    }

    impl StubSource {
        pub(crate) fn with(mut self, series_id: &str, values: Vec<f64>) -> Self {
            self.series.insert(series_id.to_string(), values);
            self
        }
    }

    #[async_trait]
    impl ObservationSource for StubSource {
        async fn fetch_series(&self, series_id: &str) -> Result<Vec<Observation>, FetchError> {
            self.requested.lock().unwrap().push(series_id.to_string());
            let values = self.series.get(series_id).ok_or_else(|| FetchError::Status {
                status: reqwest::StatusCode::BAD_REQUEST,
                message: format!("unknown series {series_id}"),
            })?;
            let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
            Ok(values
                .iter()
                .enumerate()
                .map(|(i, value)| Observation {
                    date: start.checked_add_months(Months::new(i as u32)),
                    value: *value,
                })
                .collect())
        }
    }

    pub(crate) fn analyzer_with(source: StubSource) -> AtlasAnalyzer {
        AtlasAnalyzer::new(Arc::new(source), Arc::new(RecommendationTable::new()))
    }

    #[tokio::test]
    async fn test_unemployment_report() {
        let analyzer = analyzer_with(StubSource::default().with("UNRATE", vec![3.8, 6.2, 7.0]));

        let report = analyzer.analyze(MetricKind::Unemployment).await.unwrap();
        assert_eq!(report.label, "Unemployment Rate");
        assert_eq!(report.value, 7.0);
        assert_eq!(report.risk, 50.0);
        assert!(report.recommendation.starts_with("Critically high unemployment risk"));
        assert_eq!(report.as_of, NaiveDate::from_ymd_opt(2023, 3, 1));
    }

    #[tokio::test]
    async fn test_inflation_is_year_over_year_and_rounded() {
        let mut cpi = vec![300.0; 12];
        cpi.push(310.0);
        let analyzer = analyzer_with(StubSource::default().with("CPIAUCSL", cpi));

        let report = analyzer.analyze(MetricKind::Inflation).await.unwrap();
        // 10 / 300 * 100 = 3.333...
        assert_eq!(report.value, 3.33);
        // (3.33 - 2) / 3 * 100 = 44.333...
        assert_eq!(report.risk, 44.33);
        assert!(report.recommendation.starts_with("High inflation risk"));
    }

    #[tokio::test]
    async fn test_neutral_interest_rate_is_lowest_bucket() {
        let analyzer = analyzer_with(StubSource::default().with("FEDFUNDS", vec![5.33, 2.75]));

        let report = analyzer.analyze(MetricKind::InterestRate).await.unwrap();
        assert_eq!(report.risk, 0.0);
        assert!(report.recommendation.starts_with("Interest rates are at historically low levels"));
    }

    #[tokio::test]
    async fn test_empty_series_is_an_error() {
        let analyzer = analyzer_with(StubSource::default().with("UNRATE", vec![]));
        assert!(matches!(
            analyzer.analyze(MetricKind::Unemployment).await,
            Err(AtlasError::Analysis(AnalysisError::EmptySeries))
        ));
    }

    #[tokio::test]
    async fn test_short_gdp_history_is_insufficient() {
        let analyzer = analyzer_with(StubSource::default().with("GDPC1", vec![22000.0, 22100.0, 22300.0]));
        assert!(matches!(
            analyzer.analyze(MetricKind::GdpGrowth).await,
            Err(AtlasError::Analysis(AnalysisError::InsufficientData { required: 5, available: 3 }))
        ));
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let analyzer = analyzer_with(StubSource::default());
        assert!(matches!(
            analyzer.analyze(MetricKind::Unemployment).await,
            Err(AtlasError::Fetch(FetchError::Status { .. }))
        ));
    }

    #[tokio::test]
    async fn test_huge_level_keeps_a_finite_value() {
        let analyzer = analyzer_with(StubSource::default().with("UNRATE", vec![1e307]));

        let report = analyzer.analyze(MetricKind::Unemployment).await.unwrap();
        assert_eq!(report.value, 1e307);
        assert_eq!(report.risk, 100.0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["value"].as_f64(), Some(1e307));
    }

    struct UndatedSource;

    #[async_trait]
    impl ObservationSource for UndatedSource {
        async fn fetch_series(&self, _series_id: &str) -> Result<Vec<Observation>, FetchError> {
            Ok(vec![Observation { date: None, value: 2.75 }])
        }
    }

    #[tokio::test]
    async fn test_undated_series_omits_as_of() {
        let analyzer = AtlasAnalyzer::new(Arc::new(UndatedSource), Arc::new(RecommendationTable::new()));

        let report = analyzer.analyze(MetricKind::InterestRate).await.unwrap();
        assert_eq!(report.as_of, None);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("as_of").is_none());
        assert_eq!(json["risk"], 0.0);
    }

    #[tokio::test]
    async fn test_series_override_is_used() {
        let source = Arc::new(StubSource::default().with("LNS14000006", vec![6.1]));
        let analyzer = AtlasAnalyzer::new(source.clone(), Arc::new(RecommendationTable::new()))
            .with_series_overrides(HashMap::from([(
                MetricKind::Unemployment,
                "LNS14000006".to_string(),
            )]));

        assert_eq!(analyzer.series_for(MetricKind::Unemployment), "LNS14000006");
        assert_eq!(analyzer.series_for(MetricKind::Inflation), "CPIAUCSL");

        let report = analyzer.analyze(MetricKind::Unemployment).await.unwrap();
        assert_eq!(report.value, 6.1);
        assert_eq!(*source.requested.lock().unwrap(), vec!["LNS14000006".to_string()]);
    }
}
