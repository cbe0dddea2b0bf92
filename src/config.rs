use crate::fred::DEFAULT_FRED_URL;
use crate::metrics::MetricKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FRED_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Per-IP admission control in front of the upstream API key's quota
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    pub replenish_secs: u64, // one request slot is refilled every N seconds
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            replenish_secs: 1,
            burst: 30,
        }
    }
}

// YAML-serializable configuration structure
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ConfigYaml {
    pub node_name: Option<String>,
    pub fred_api_key: Option<String>,
    pub fred_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub rate_limit: Option<RateLimitConfig>,
    pub series: Option<HashMap<MetricKind, String>>,
    pub environment: Option<String>,
    pub port: Option<u16>,
}

// Holds application-wide settings
#[derive(Clone)]
pub struct AppConfig {
    pub node_name: String,
    pub fred_api_key: String,
    pub fred_base_url: String,
    pub request_timeout: Duration,
    pub cors_allowed_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
    pub series: HashMap<MetricKind, String>,
    pub environment: String,
    pub port: u16,
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    // Load configuration from YAML file. The API key may be left out of the
    // file and supplied through FRED_API_KEY instead.
    pub fn from_yaml(file_path: &str) -> Result<Self, ConfigError> {
        let yaml_content = fs::read_to_string(file_path).map_err(|source| ConfigError::Read {
            path: file_path.to_string(),
            source,
        })?;

        Self::from_yaml_str(&yaml_content, |name| env::var(name).ok())
    }

    pub fn from_yaml_str<F>(yaml_content: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let yaml_config: ConfigYaml = serde_yaml::from_str(yaml_content)?;

        let fred_api_key = yaml_config
            .fred_api_key
            .or_else(|| lookup("FRED_API_KEY"))
            .and_then(non_empty)
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            node_name: yaml_config.node_name.unwrap_or_else(|| "atlas-proxy".to_string()),
            fred_api_key,
            fred_base_url: yaml_config
                .fred_base_url
                .unwrap_or_else(|| DEFAULT_FRED_URL.to_string()),
            request_timeout: Duration::from_secs(
                yaml_config.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            cors_allowed_origins: yaml_config.cors_allowed_origins.unwrap_or_default(),
            rate_limit: yaml_config.rate_limit.unwrap_or_default(),
            series: yaml_config.series.unwrap_or_default(),
            environment: yaml_config
                .environment
                .unwrap_or_else(|| "development".to_string()),
            port: yaml_config.port.unwrap_or(DEFAULT_PORT),
        })
    }

    // Load all configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fred_api_key = lookup("FRED_API_KEY")
            .and_then(non_empty)
            .ok_or(ConfigError::MissingApiKey)?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect::<Vec<String>>();

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            replenish_secs: parse_or(&lookup, "RATE_LIMIT_REPLENISH_SECS", defaults.replenish_secs),
            burst: parse_or(&lookup, "RATE_LIMIT_BURST", defaults.burst),
        };

        Ok(Self {
            node_name: lookup("NODE_NAME").unwrap_or_else(|| "atlas-proxy".to_string()),
            fred_api_key,
            fred_base_url: lookup("FRED_BASE_URL").unwrap_or_else(|| DEFAULT_FRED_URL.to_string()),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "FRED_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
            cors_allowed_origins,
            rate_limit,
            series: HashMap::new(),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        assert!(matches!(AppConfig::from_lookup(vars(&[])), Err(ConfigError::MissingApiKey)));
        assert!(matches!(
            AppConfig::from_lookup(vars(&[("FRED_API_KEY", "   ")])),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_env_defaults() {
        let config = AppConfig::from_lookup(vars(&[("FRED_API_KEY", "abc123")])).unwrap();
        assert_eq!(config.fred_api_key, "abc123");
        assert_eq!(config.port, 8080);
        assert_eq!(config.fred_base_url, DEFAULT_FRED_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.environment, "development");
        assert!(config.cors_allowed_origins.is_empty());
        assert_eq!(config.rate_limit, RateLimitConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(vars(&[
            ("FRED_API_KEY", "abc123"),
            ("PORT", "9090"),
            ("FRED_TIMEOUT_SECS", "5"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:3000, https://atlas.example.com,"),
            ("RATE_LIMIT_BURST", "5"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://localhost:3000".to_string(), "https://atlas.example.com".to_string()]
        );
        assert_eq!(config.rate_limit.burst, 5);
        assert_eq!(config.rate_limit.replenish_secs, 1);
        assert_eq!(config.environment, "production");
    }

    #[test]
    fn test_unparseable_port_falls_back_to_default() {
        let config =
            AppConfig::from_lookup(vars(&[("FRED_API_KEY", "abc123"), ("PORT", "eighty")])).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_yaml_with_series_overrides() {
        let yaml = r#"
node_name: atlas-eu
port: 8181
cors_allowed_origins:
  - http://localhost:3000
rate_limit:
  replenish_secs: 2
  burst: 10
series:
  unemployment: LNS14000006
  gdp_growth: GDP
"#;
        let config = AppConfig::from_yaml_str(yaml, vars(&[("FRED_API_KEY", "from-env")])).unwrap();
        assert_eq!(config.node_name, "atlas-eu");
        assert_eq!(config.port, 8181);
        assert_eq!(config.fred_api_key, "from-env");
        assert_eq!(config.rate_limit, RateLimitConfig { replenish_secs: 2, burst: 10 });
        assert_eq!(config.series.get(&MetricKind::Unemployment).map(String::as_str), Some("LNS14000006"));
        assert_eq!(config.series.get(&MetricKind::GdpGrowth).map(String::as_str), Some("GDP"));
        assert!(!config.series.contains_key(&MetricKind::Inflation));
    }

    #[test]
    fn test_yaml_key_takes_precedence_over_env() {
        let yaml = "fred_api_key: from-file\n";
        let config = AppConfig::from_yaml_str(yaml, vars(&[("FRED_API_KEY", "from-env")])).unwrap();
        assert_eq!(config.fred_api_key, "from-file");
    }

    #[test]
    fn test_yaml_rejects_unknown_metric() {
        let yaml = "fred_api_key: k\nseries:\n  housing: HOUST\n";
        assert!(matches!(AppConfig::from_yaml_str(yaml, vars(&[])), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fred_api_key: file-key\nenvironment: staging").unwrap();

        let config = AppConfig::from_yaml(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.fred_api_key, "file-key");
        assert_eq!(config.environment, "staging");
    }

    #[test]
    fn test_missing_yaml_file() {
        assert!(matches!(
            AppConfig::from_yaml("/nonexistent/atlas.yaml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
