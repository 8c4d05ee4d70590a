use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::catalog::Provider;
use super::round2;
use crate::config::FixtureConfig;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Running,
    Stopped,
    Terminated,
    Pending,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloudResource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub provider: Provider,
    pub region: String,
    pub status: ResourceStatus,
    pub size: String,
    pub tags: BTreeMap<String, String>,
    pub monthly_cost: f64,
    pub creation_date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub date: NaiveDate,
    pub daily_cost: f64,
    pub service: String,
    pub cloud_provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

impl CostEntry {
    pub fn new(
        date: NaiveDate,
        daily_cost: f64,
        service: impl Into<String>,
        cloud_provider: Provider,
    ) -> Self {
        Self {
            date,
            daily_cost,
            service: service.into(),
            cloud_provider,
            region: None,
            account: None,
            tags: None,
        }
    }
}

/// A dated cost observation; the forecast projector accepts any of these.
pub trait CostPoint {
    fn date(&self) -> NaiveDate;
    fn cost(&self) -> f64;
}

impl CostPoint for CostEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn cost(&self) -> f64 {
        self.daily_cost
    }
}

/// Cost summed over every entry on one date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyCost {
    pub date: NaiveDate,
    pub cost: f64,
}

/// Sums entries per date, oldest first.
pub fn sum_daily<'a>(entries: impl Iterator<Item = &'a CostEntry>) -> Vec<DailyCost> {
    entries
        .into_grouping_map_by(|e| e.date)
        .fold(0.0, |acc, _, e| acc + e.daily_cost)
        .into_iter()
        .sorted_by_key(|(date, _)| *date)
        .map(|(date, cost)| DailyCost {
            date,
            cost: round2(cost),
        })
        .collect()
}

impl CostPoint for DailyCost {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn cost(&self) -> f64 {
        self.cost
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSample {
    pub resource_id: String,
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub network_mbps: f64,
    pub disk_iops: f64,
    pub instance_type: String,
    pub provider: Provider,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn from_increase(percent: f64) -> Self {
        if percent > 100.0 {
            Self::High
        } else if percent > 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: String,
    pub date: NaiveDate,
    pub daily_cost: f64,
    pub service: String,
    pub cloud_provider: Provider,
    pub expected_cost: f64,
    pub percentage_increase: f64,
    pub severity: Severity,
    pub explanation: String,
    /// Synthetic score in [0.8, 1.0); not derived from any model.
    pub anomaly_score: f64,
    #[serde(default)]
    pub possible_causes: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Monthly,
    Quarterly,
    Annual,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetDimension {
    Service,
    Region,
    Tag,
    Account,
}

impl BudgetDimension {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Region => "region",
            Self::Tag => "tag",
            Self::Account => "account",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetHistoryPoint {
    pub date: NaiveDate,
    pub spend: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub resource: String,
    pub resource_type: BudgetDimension,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    /// Percent of `amount` at which alerts fire.
    pub threshold: f64,
    pub current_spend: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub history: Vec<BudgetHistoryPoint>,
    pub forecast: f64,
    pub tags: Vec<String>,
    pub favorite: bool,
    pub alert_channels: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub forecast_dates: Vec<NaiveDate>,
    pub forecast_values: Vec<f64>,
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
    pub confidence_level: f64,
    /// Display label only.
    pub model_type: String,
}

impl ForecastResult {
    /// Drops every projected day after `end`.
    pub fn through(mut self, end: NaiveDate) -> Self {
        let keep = self
            .forecast_dates
            .iter()
            .take_while(|date| **date <= end)
            .count();
        self.forecast_dates.truncate(keep);
        self.forecast_values.truncate(keep);
        self.lower_bound.truncate(keep);
        self.upper_bound.truncate(keep);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixtureManifest {
    pub schema_version: u32,
    pub seed: u64,
    pub as_of: NaiveDate,
    pub config: FixtureConfig,
    pub resources: usize,
    pub cost_entries: usize,
    pub utilization_samples: usize,
    pub anomalies: usize,
    pub budgets: usize,
    pub cost_fingerprint: String,
}
