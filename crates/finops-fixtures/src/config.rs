use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FixtureError, FixtureResult};

pub const DEFAULT_RESOURCE_COUNT: usize = 50;
pub const DEFAULT_COST_HISTORY_DAYS: u32 = 90;
pub const DEFAULT_UTILIZATION_DAYS: u32 = 30;
pub const DEFAULT_ANOMALY_COUNT: usize = 5;

/// Knobs for one dataset generation. Every field has a default so a partial
/// YAML file (or none at all) is valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixtureConfig {
    /// Falls back to wall-clock millis when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_resource_count")]
    pub resource_count: usize,
    #[serde(default = "default_cost_history_days")]
    pub cost_history_days: u32,
    #[serde(default = "default_utilization_days")]
    pub utilization_days: u32,
    #[serde(default = "default_anomaly_count")]
    pub anomaly_count: usize,
    /// Artificial delay applied by the async mock API before each read.
    #[serde(default)]
    pub latency_ms: u64,
}

const fn default_resource_count() -> usize {
    DEFAULT_RESOURCE_COUNT
}

const fn default_cost_history_days() -> u32 {
    DEFAULT_COST_HISTORY_DAYS
}

const fn default_utilization_days() -> u32 {
    DEFAULT_UTILIZATION_DAYS
}

const fn default_anomaly_count() -> usize {
    DEFAULT_ANOMALY_COUNT
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            seed: None,
            resource_count: DEFAULT_RESOURCE_COUNT,
            cost_history_days: DEFAULT_COST_HISTORY_DAYS,
            utilization_days: DEFAULT_UTILIZATION_DAYS,
            anomaly_count: DEFAULT_ANOMALY_COUNT,
            latency_ms: 0,
        }
    }
}

impl FixtureConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn resolved_seed(&self, now: DateTime<Utc>) -> u64 {
        self.seed
            .unwrap_or_else(|| u64::try_from(now.timestamp_millis()).unwrap_or_default())
    }

    pub fn validate(&self) -> FixtureResult<()> {
        if self.cost_history_days == 0 {
            return Err(FixtureError::InvalidArgument(
                "cost_history_days must be at least 1".to_string(),
            ));
        }
        if self.utilization_days == 0 {
            return Err(FixtureError::InvalidArgument(
                "utilization_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn apply_env(mut self, overrides: &ConfigEnvOverrides) -> FixtureResult<Self> {
        if let Some(raw) = overrides.seed.as_deref() {
            self.seed = Some(parse_override("FINOPS_FIXTURES_SEED", raw)?);
        }
        if let Some(raw) = overrides.resource_count.as_deref() {
            self.resource_count = parse_override("FINOPS_FIXTURES_RESOURCES", raw)?;
        }
        if let Some(raw) = overrides.cost_history_days.as_deref() {
            self.cost_history_days = parse_override("FINOPS_FIXTURES_COST_DAYS", raw)?;
        }
        if let Some(raw) = overrides.utilization_days.as_deref() {
            self.utilization_days = parse_override("FINOPS_FIXTURES_UTILIZATION_DAYS", raw)?;
        }
        if let Some(raw) = overrides.anomaly_count.as_deref() {
            self.anomaly_count = parse_override("FINOPS_FIXTURES_ANOMALIES", raw)?;
        }
        if let Some(raw) = overrides.latency_ms.as_deref() {
            self.latency_ms = parse_override("FINOPS_FIXTURES_LATENCY_MS", raw)?;
        }
        Ok(self)
    }
}

fn parse_override<T: std::str::FromStr>(name: &str, raw: &str) -> FixtureResult<T> {
    raw.trim().parse::<T>().map_err(|_| {
        FixtureError::InvalidArgument(format!("{name}='{raw}' is not a valid number"))
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigEnvOverrides {
    pub seed: Option<String>,
    pub resource_count: Option<String>,
    pub cost_history_days: Option<String>,
    pub utilization_days: Option<String>,
    pub anomaly_count: Option<String>,
    pub latency_ms: Option<String>,
}

impl ConfigEnvOverrides {
    pub fn from_env() -> Self {
        Self {
            seed: std::env::var("FINOPS_FIXTURES_SEED").ok(),
            resource_count: std::env::var("FINOPS_FIXTURES_RESOURCES").ok(),
            cost_history_days: std::env::var("FINOPS_FIXTURES_COST_DAYS").ok(),
            utilization_days: std::env::var("FINOPS_FIXTURES_UTILIZATION_DAYS").ok(),
            anomaly_count: std::env::var("FINOPS_FIXTURES_ANOMALIES").ok(),
            latency_ms: std::env::var("FINOPS_FIXTURES_LATENCY_MS").ok(),
        }
    }
}

pub fn load_config(path: impl AsRef<Path>) -> FixtureResult<FixtureConfig> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let config = serde_yaml::from_slice::<FixtureConfig>(&bytes).map_err(|error| {
        FixtureError::InvalidArgument(format!("invalid config '{}': {error}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}
