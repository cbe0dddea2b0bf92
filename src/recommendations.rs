use crate::metrics::{AnalysisError, MetricKind};
use std::sync::Arc;

pub const FALLBACK_RECOMMENDATION: &str = "No specific recommendation available. Further analysis and data collection may be necessary to provide a comprehensive assessment.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskBucket {
    Low,
    Moderate,
    Medium,
    Balanced,
    Elevated,
    High,
    VeryHigh,
    Extreme,
}

impl RiskBucket {
    /// Buckets in ascending order, paired with their exclusive upper bound.
    /// `Extreme` has no upper bound and absorbs everything from 70 up.
    const BOUNDS: [(RiskBucket, f64); 7] = [
        (RiskBucket::Low, 10.0),
        (RiskBucket::Moderate, 20.0),
        (RiskBucket::Medium, 30.0),
        (RiskBucket::Balanced, 40.0),
        (RiskBucket::Elevated, 50.0),
        (RiskBucket::High, 60.0),
        (RiskBucket::VeryHigh, 70.0),
    ];

    pub fn classify(risk: f64) -> Result<RiskBucket, AnalysisError> {
        if risk.is_nan() {
            return Err(AnalysisError::UnmappedRisk(risk));
        }
        Ok(Self::BOUNDS
            .iter()
            .find(|(_, upper)| risk < *upper)
            .map(|(bucket, _)| *bucket)
            .unwrap_or(RiskBucket::Extreme))
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// One recommendation per bucket, indexed by `RiskBucket::index`.
type BucketTexts = [&'static str; 8];

/// Static recommendation texts for every metric kind.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug)]
pub struct RecommendationTable {
    unemployment: BucketTexts,
    inflation: BucketTexts,
    interest_rate: BucketTexts,
    gdp_growth: BucketTexts,
}

pub type SharedRecommendations = Arc<RecommendationTable>;

impl RecommendationTable {
    pub fn new() -> Self {
        Self {
            unemployment: [
                "Unemployment is significantly below the natural rate, potentially leading to upward wage pressures and inflationary concerns due to a tight labor market.",
                "The unemployment rate is below the natural rate, indicating a strong labor market with minimal slack. Wage growth may accelerate, contributing to inflationary pressures.",
                "Unemployment is slightly below equilibrium, suggesting a healthy labor market. However, watch for early signs of labor shortages in key sectors.",
                "Unemployment is near equilibrium, reflecting a balanced labor market. Any significant policy shifts could tip the balance, requiring careful monitoring.",
                "Elevated unemployment levels indicate significant labor market slack, which could necessitate expansionary fiscal or monetary policy interventions.",
                "Critically high unemployment risk, indicative of severe labor market weakness. Immediate stimulus measures may be required to prevent deflationary spirals.",
                "Unemployment is critically high, indicating a severe economic downturn. Immediate intervention is necessary to avoid a prolonged recession.",
                "Extremely high unemployment, signifying a major economic crisis. Comprehensive and aggressive policy measures are urgently required.",
            ],
            inflation: [
                "Inflation is well within the target range, indicating stable prices. This environment supports sustained economic growth and long-term planning.",
                "Inflation remains under control, though slight upward pressures may be emerging. Policy vigilance is recommended to maintain price stability.",
                "Moderate inflationary pressures are beginning to surface, likely due to supply chain constraints or external shocks. A preemptive policy response may be warranted.",
                "Inflation is rising but remains manageable. Continued monitoring and potential fine-tuning of monetary policy could be required to avert further escalation.",
                "High inflation risk, reflecting overheating in the economy. Aggressive monetary tightening may be needed to rein in price growth and anchor expectations.",
                "Severe inflationary pressures are eroding purchasing power and could destabilize the economy. Coordinated fiscal and monetary actions are urgently required.",
                "Hyperinflation risk is imminent, threatening economic stability. Extreme measures, including potential currency reforms, may be necessary to restore confidence.",
                "Hyperinflation is underway, causing rapid erosion of the currency's value. Immediate and drastic measures are required to stabilize the economy.",
            ],
            interest_rate: [
                "Interest rates are at historically low levels, fostering an environment conducive to borrowing and investment. This supports expansionary economic activity.",
                "Interest rates are low, encouraging credit growth and investment. However, potential asset bubbles should be monitored as low rates persist.",
                "Interest rates are slightly above the floor, signaling a potential shift towards neutrality. Stakeholders should prepare for possible rate hikes in the near future.",
                "Interest rates are approaching neutrality, suggesting a balanced approach to managing inflation and growth. Market participants should anticipate gradual adjustments.",
                "Elevated interest rates reflect restrictive monetary policy aimed at curbing inflation. The high cost of capital may suppress economic expansion and increase default risks.",
                "Interest rates are significantly high, suggesting aggressive monetary tightening. The economy could face contractionary pressures as borrowing becomes prohibitively expensive.",
                "Exceptionally high interest rates, likely in response to hyperinflationary threats, could trigger severe economic contraction and destabilize financial markets.",
                "Extremely high interest rates, likely in response to a financial crisis, could lead to a severe economic downturn. Immediate policy intervention is needed.",
            ],
            gdp_growth: [
                "GDP growth is steady and in line with potential output, reflecting a well-balanced economy. Continued prudent policy management is recommended.",
                "GDP growth is moderate, aligning closely with potential output. This suggests stability, though the economy remains vulnerable to external shocks.",
                "GDP growth is healthy, slightly above potential output. The economy is performing well, but policymakers should be wary of signs of imbalances.",
                "Strong GDP growth, supported by both domestic and international demand. This growth phase is likely sustainable, though inflationary pressures should be monitored.",
                "GDP growth is exceeding long-term potential, driven by robust demand and favorable external conditions. However, there is a risk of overheating if growth continues unchecked.",
                "GDP growth is slowing, raising concerns about underlying economic strength. Stimulative measures may be needed to prevent further deceleration.",
                "GDP growth is weak, indicating a decelerating economy. The risk of recession is increasing, requiring proactive counter-cyclical policies.",
                "Critically low GDP growth, signaling a high probability of recession or stagnation. Immediate and significant fiscal and monetary intervention is required to avert a prolonged downturn.",
            ],
        }
    }

    fn texts(&self, kind: MetricKind) -> &BucketTexts {
        match kind {
            MetricKind::Unemployment => &self.unemployment,
            MetricKind::Inflation => &self.inflation,
            MetricKind::InterestRate => &self.interest_rate,
            MetricKind::GdpGrowth => &self.gdp_growth,
        }
    }

    pub fn recommend(&self, kind: MetricKind, risk: f64) -> Result<&'static str, AnalysisError> {
        let bucket = RiskBucket::classify(risk)?;
        Ok(self.texts(kind)[bucket.index()])
    }

    /// String-keyed lookup. Names that are not a known metric get the generic
    /// fallback text.
    pub fn recommend_by_name(&self, metric: &str, risk: f64) -> Result<&'static str, AnalysisError> {
        match metric.parse::<MetricKind>() {
            Ok(kind) => self.recommend(kind, risk),
            Err(_) => Ok(FALLBACK_RECOMMENDATION),
        }
    }
}

impl Default for RecommendationTable {
    fn default() -> Self {
        Self::new()
    }
}
