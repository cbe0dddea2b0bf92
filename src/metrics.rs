use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("series contains no observations")]
    EmptySeries,

    #[error("need at least {required} observations, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("derived value is not a finite number")]
    NonFiniteValue,

    #[error("risk {0} does not fall into any recommendation bucket")]
    UnmappedRisk(f64),
}

#[derive(Debug, Error)]
#[error("unknown metric: {0}")]
pub struct UnknownMetric(pub String);

// --- Metric kinds ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Unemployment,
    Inflation,
    InterestRate,
    GdpGrowth,
}

/// How a metric turns an observation sequence into a single value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Derivation {
    /// Most recent observation.
    Level,
    /// Percentage change between the latest observation and the one
    /// `periods` steps earlier.
    ChangeOver { periods: usize },
}

impl Derivation {
    pub fn required_observations(&self) -> usize {
        match self {
            Derivation::Level => 1,
            Derivation::ChangeOver { periods } => periods + 1,
        }
    }

    pub fn apply(&self, values: &[f64]) -> Result<f64, AnalysisError> {
        let latest = *values.last().ok_or(AnalysisError::EmptySeries)?;

        let required = self.required_observations();
        if values.len() < required {
            return Err(AnalysisError::InsufficientData {
                required,
                available: values.len(),
            });
        }

        let value = match self {
            Derivation::Level => latest,
            Derivation::ChangeOver { periods } => {
                let base = values[values.len() - 1 - periods];
                (latest - base) / base * 100.0
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(AnalysisError::NonFiniteValue)
        }
    }
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Unemployment,
        MetricKind::Inflation,
        MetricKind::InterestRate,
        MetricKind::GdpGrowth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Unemployment => "unemployment",
            MetricKind::Inflation => "inflation",
            MetricKind::InterestRate => "interest_rate",
            MetricKind::GdpGrowth => "gdp_growth",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Unemployment => "Unemployment Rate",
            MetricKind::Inflation => "Inflation Rate",
            MetricKind::InterestRate => "Interest Rate",
            MetricKind::GdpGrowth => "GDP Growth Rate",
        }
    }

    /// FRED series used when the configuration does not override it.
    pub fn default_series(&self) -> &'static str {
        match self {
            MetricKind::Unemployment => "UNRATE",
            MetricKind::Inflation => "CPIAUCSL",
            MetricKind::InterestRate => "FEDFUNDS",
            MetricKind::GdpGrowth => "GDPC1",
        }
    }

    pub fn derivation(&self) -> Derivation {
        match self {
            MetricKind::Unemployment | MetricKind::InterestRate => Derivation::Level,
            // CPIAUCSL is monthly, GDPC1 quarterly: both become year-over-year.
            MetricKind::Inflation => Derivation::ChangeOver { periods: 12 },
            MetricKind::GdpGrowth => Derivation::ChangeOver { periods: 4 },
        }
    }

    /// Maps a derived value to a risk percentage in [0, 100].
    ///
    /// Unemployment and inflation only score risk above their neutral level.
    /// Interest rate and GDP growth score the distance from their target in
    /// either direction.
    pub fn risk(&self, value: f64) -> f64 {
        let scaled = match self {
            MetricKind::Unemployment => (value - 4.0) / 6.0,
            MetricKind::Inflation => (value - 2.0) / 3.0,
            MetricKind::InterestRate => (value - 2.75).abs() / 2.25,
            MetricKind::GdpGrowth => (value - 2.5).abs() / 2.5,
        };
        scaled.clamp(0.0, 1.0) * 100.0
    }

    fn subject(&self) -> &'static str {
        match self {
            MetricKind::Unemployment => "unemployment rate",
            MetricKind::Inflation => "inflation rate",
            MetricKind::InterestRate => "interest rate",
            MetricKind::GdpGrowth => "GDP growth",
        }
    }

    pub fn fetch_failure_message(&self) -> String {
        format!("Failed to fetch {} data", self.subject())
    }

    pub fn insufficient_data_message(&self) -> String {
        format!("Insufficient data to compute {}", self.subject())
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

// --- Report ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    pub label: String,
    pub value: f64,
    pub risk: f64,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

/// Values too large to scale by 100 carry no fractional digits and are
/// returned as is.
pub fn round_to_two_decimals(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}
