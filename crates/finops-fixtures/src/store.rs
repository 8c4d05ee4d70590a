//! Read surface over a generated dataset, plus the budget edits a dashboard
//! performs.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::FixtureConfig;
use crate::data::catalog::{Provider, ServiceCategory};
use crate::data::datasets::{
    sum_daily, Anomaly, Budget, BudgetDimension, BudgetPeriod, CloudResource, CostEntry,
    DailyCost, UtilizationSample,
};
use crate::data::round2;
use crate::dataset::CostDataset;
use crate::error::{FixtureError, FixtureResult};
use crate::stats::{compute_stats, MetricStats};

pub const TOTAL_SERIES_NAME: &str = "Total Cost";
pub const DEFAULT_INVENTORY_LIMIT: usize = 50;
pub const MAX_INVENTORY_LIMIT: usize = 100;
const COMPARISON_WINDOW_DAYS: i64 = 30;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeSeriesGroup {
    Provider,
    Service,
    Daily,
}

impl TimeSeriesGroup {
    pub fn parse(value: &str) -> FixtureResult<Self> {
        match value {
            "provider" => Ok(Self::Provider),
            "service" => Ok(Self::Service),
            "daily" => Ok(Self::Daily),
            other => Err(FixtureError::InvalidArgument(format!(
                "unknown group_by '{other}' (expected one of: provider, service, daily)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub data: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostTimeSeries {
    pub timestamps: Vec<String>,
    pub series: Vec<NamedSeries>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BreakdownGroup {
    Service,
    Region,
    Account,
}

impl BreakdownGroup {
    pub fn parse(value: &str) -> FixtureResult<Self> {
        match value {
            "service" => Ok(Self::Service),
            "region" => Ok(Self::Region),
            "account" => Ok(Self::Account),
            other => Err(FixtureError::InvalidArgument(format!(
                "unknown breakdown '{other}' (expected one of: service, region, account)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BreakdownItem {
    pub name: String,
    pub cost: f64,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub total: f64,
    pub groups: Vec<BreakdownItem>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationMetric {
    Cpu,
    Memory,
    Disk,
    Network,
}

impl UtilizationMetric {
    pub fn parse(value: &str) -> FixtureResult<Self> {
        match value {
            "cpu" => Ok(Self::Cpu),
            "memory" => Ok(Self::Memory),
            "disk" => Ok(Self::Disk),
            "network" => Ok(Self::Network),
            other => Err(FixtureError::InvalidArgument(format!(
                "unknown metric '{other}' (expected one of: cpu, memory, disk, network)"
            ))),
        }
    }

    fn read(self, sample: &UtilizationSample) -> f64 {
        match self {
            Self::Cpu => sample.cpu_percent,
            Self::Memory => sample.memory_percent,
            Self::Disk => sample.disk_iops,
            Self::Network => sample.network_mbps,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceUtilization {
    pub resource_id: String,
    pub resource_name: String,
    pub metric: UtilizationMetric,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
    /// Absent when the resource is not running.
    #[serde(flatten)]
    pub stats: Option<MetricStats>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceSummary {
    pub total_resources: usize,
    pub resources_by_provider: BTreeMap<Provider, usize>,
    pub resources_by_type: BTreeMap<ServiceCategory, usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InventoryFilter {
    pub provider: Option<Provider>,
    pub resource_type: Option<String>,
    pub region: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for InventoryFilter {
    fn default() -> Self {
        Self {
            provider: None,
            resource_type: None,
            region: None,
            limit: DEFAULT_INVENTORY_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceInventory {
    pub total_count: usize,
    pub returned_count: usize,
    pub resources: Vec<CloudResource>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub as_of: NaiveDate,
    pub total_cost: f64,
    pub cost_by_provider: BTreeMap<Provider, f64>,
    pub cost_by_service_type: BTreeMap<ServiceCategory, f64>,
    pub month_over_month_change: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NewBudget {
    pub name: String,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub resource: String,
    pub resource_type: BudgetDimension,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub threshold: Option<f64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BudgetUpdate {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub threshold: Option<f64>,
    pub favorite: Option<bool>,
}

/// Owns one dataset and answers every dashboard query from memory.
#[derive(Clone, Debug)]
pub struct FixtureStore {
    dataset: CostDataset,
}

impl FixtureStore {
    pub fn new(dataset: CostDataset) -> Self {
        Self { dataset }
    }

    pub fn generate(config: &FixtureConfig, now: DateTime<Utc>) -> FixtureResult<Self> {
        Ok(Self::new(CostDataset::generate(config, now)?))
    }

    pub fn dataset(&self) -> &CostDataset {
        &self.dataset
    }

    pub fn seed(&self) -> u64 {
        self.dataset.seed
    }

    pub fn today(&self) -> NaiveDate {
        self.dataset.today()
    }

    pub fn resources(&self) -> &[CloudResource] {
        &self.dataset.resources
    }

    pub fn cost_data(&self) -> &[CostEntry] {
        &self.dataset.cost_data
    }

    pub fn utilization_data(&self) -> &[UtilizationSample] {
        &self.dataset.utilization
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.dataset.anomalies
    }

    pub fn budgets(&self) -> &[Budget] {
        &self.dataset.budgets
    }

    pub fn cost_by_provider(&self) -> BTreeMap<Provider, f64> {
        sum_by(self.cost_data().iter(), |e| e.cloud_provider)
    }

    pub fn cost_by_service(&self) -> BTreeMap<String, f64> {
        sum_by(self.cost_data().iter(), |e| e.service.clone())
    }

    /// `days + 1` timestamps, from `days` before today through today.
    pub fn cost_time_series(&self, days: u32, group_by: TimeSeriesGroup) -> CostTimeSeries {
        let today = self.today();
        let dates: Vec<NaiveDate> = (0..=i64::from(days))
            .rev()
            .map(|back| today - Duration::days(back))
            .collect();
        let position: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(idx, d)| (*d, idx)).collect();

        let mut grouped: Vec<(String, Vec<f64>)> = Vec::new();
        let mut slot_of: HashMap<String, usize> = HashMap::new();
        let ordered = self.series_order(group_by);
        for name in ordered {
            slot_of.insert(name.clone(), grouped.len());
            grouped.push((name, vec![0.0; dates.len()]));
        }

        for entry in self.cost_data() {
            let Some(&idx) = position.get(&entry.date) else {
                continue;
            };
            let key = match group_by {
                TimeSeriesGroup::Provider => entry.cloud_provider.as_str().to_string(),
                TimeSeriesGroup::Service => entry.service.clone(),
                TimeSeriesGroup::Daily => TOTAL_SERIES_NAME.to_string(),
            };
            if let Some(&slot) = slot_of.get(&key) {
                grouped[slot].1[idx] += entry.daily_cost;
            }
        }

        CostTimeSeries {
            timestamps: dates.iter().map(|d| d.to_string()).collect(),
            series: grouped
                .into_iter()
                .map(|(name, data)| NamedSeries {
                    name,
                    data: data.into_iter().map(round2).collect(),
                })
                .collect(),
        }
    }

    fn series_order(&self, group_by: TimeSeriesGroup) -> Vec<String> {
        match group_by {
            TimeSeriesGroup::Daily => vec![TOTAL_SERIES_NAME.to_string()],
            TimeSeriesGroup::Provider => Provider::ALL
                .iter()
                .filter(|p| self.cost_data().iter().any(|e| e.cloud_provider == **p))
                .map(|p| p.as_str().to_string())
                .collect(),
            TimeSeriesGroup::Service => self
                .cost_by_service()
                .into_iter()
                .sorted_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
                .map(|(name, _)| name)
                .collect(),
        }
    }

    /// Daily totals for the selection, oldest first; feeds the forecast projector.
    pub fn daily_totals(
        &self,
        provider: Option<Provider>,
        service: Option<&str>,
    ) -> Vec<DailyCost> {
        daily_totals(self.cost_data(), provider, service)
    }

    pub fn resource_summary(&self) -> ResourceSummary {
        let mut by_provider = BTreeMap::new();
        let mut by_type = BTreeMap::new();
        for resource in self.resources() {
            *by_provider.entry(resource.provider).or_insert(0) += 1;
            *by_type
                .entry(ServiceCategory::of(&resource.resource_type))
                .or_insert(0) += 1;
        }
        ResourceSummary {
            total_resources: self.resources().len(),
            resources_by_provider: by_provider,
            resources_by_type: by_type,
        }
    }

    pub fn resource_inventory(&self, filter: &InventoryFilter) -> FixtureResult<ResourceInventory> {
        if !(1..=MAX_INVENTORY_LIMIT).contains(&filter.limit) {
            return Err(FixtureError::InvalidArgument(format!(
                "limit must be between 1 and {MAX_INVENTORY_LIMIT}, got {}",
                filter.limit
            )));
        }

        let matching: Vec<&CloudResource> = self
            .resources()
            .iter()
            .filter(|r| filter.provider.is_none_or(|p| r.provider == p))
            .filter(|r| {
                filter
                    .resource_type
                    .as_deref()
                    .is_none_or(|t| r.resource_type.eq_ignore_ascii_case(t))
            })
            .filter(|r| filter.region.as_deref().is_none_or(|region| r.region == region))
            .collect();

        let resources: Vec<CloudResource> = matching
            .iter()
            .skip(filter.offset)
            .take(filter.limit)
            .map(|r| (*r).clone())
            .collect();

        Ok(ResourceInventory {
            total_count: matching.len(),
            returned_count: resources.len(),
            resources,
        })
    }

    pub fn resource_utilization(
        &self,
        resource_id: &str,
        metric: UtilizationMetric,
    ) -> FixtureResult<ResourceUtilization> {
        let resource = self
            .resources()
            .iter()
            .find(|r| r.id == resource_id)
            .ok_or_else(|| FixtureError::NotFound {
                kind: "resource",
                id: resource_id.to_string(),
            })?;

        let (timestamps, values): (Vec<_>, Vec<_>) = self
            .utilization_data()
            .iter()
            .filter(|s| s.resource_id == resource_id)
            .map(|s| (s.timestamp, metric.read(s)))
            .unzip();

        Ok(ResourceUtilization {
            resource_id: resource.id.clone(),
            resource_name: resource.name.clone(),
            metric,
            stats: compute_stats(&values),
            timestamps,
            values,
        })
    }

    pub fn cost_breakdown(
        &self,
        provider: Option<Provider>,
        group_by: BreakdownGroup,
    ) -> CostBreakdown {
        let totals = sum_by(
            self.cost_data()
                .iter()
                .filter(|e| provider.is_none_or(|p| e.cloud_provider == p)),
            |e| match group_by {
                BreakdownGroup::Service => e.service.clone(),
                BreakdownGroup::Region => e.region.clone().unwrap_or_else(|| "unassigned".into()),
                BreakdownGroup::Account => {
                    e.account.clone().unwrap_or_else(|| "unassigned".into())
                }
            },
        );
        let total: f64 = totals.values().sum();

        let groups = totals
            .into_iter()
            .sorted_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .map(|(name, cost)| BreakdownItem {
                name,
                cost,
                percentage: if total > 0.0 {
                    round2(cost / total * 100.0)
                } else {
                    0.0
                },
            })
            .collect();

        CostBreakdown {
            total: round2(total),
            groups,
        }
    }

    pub fn dashboard_summary(&self) -> DashboardSummary {
        let today = self.today();
        let recent_start = today - Duration::days(COMPARISON_WINDOW_DAYS - 1);
        let previous_start = recent_start - Duration::days(COMPARISON_WINDOW_DAYS);

        let mut recent = 0.0;
        let mut previous = 0.0;
        for entry in self.cost_data() {
            if entry.date >= recent_start && entry.date <= today {
                recent += entry.daily_cost;
            } else if entry.date >= previous_start && entry.date < recent_start {
                previous += entry.daily_cost;
            }
        }
        let month_over_month_change = if previous > 0.0 {
            round2((recent / previous - 1.0) * 100.0)
        } else {
            0.0
        };

        DashboardSummary {
            as_of: today,
            total_cost: round2(self.cost_data().iter().map(|e| e.daily_cost).sum()),
            cost_by_provider: self.cost_by_provider(),
            cost_by_service_type: sum_by(self.cost_data().iter(), |e| {
                ServiceCategory::of(&e.service)
            }),
            month_over_month_change,
        }
    }

    pub fn budget(&self, id: &str) -> FixtureResult<&Budget> {
        self.budgets()
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| budget_not_found(id))
    }

    pub fn create_budget(&mut self, request: NewBudget) -> FixtureResult<Budget> {
        validate_amount(request.amount)?;
        let threshold = request
            .threshold
            .unwrap_or(crate::analysis::budgets::DEFAULT_THRESHOLD_PERCENT);
        validate_threshold(threshold)?;
        if request.end_date < request.start_date {
            return Err(FixtureError::InvalidArgument(
                "end_date must not be before start_date".to_string(),
            ));
        }

        let next = self
            .budgets()
            .iter()
            .filter_map(|b| b.id.strip_prefix("budget-")?.parse::<usize>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let budget = Budget {
            id: format!("budget-{next}"),
            name: request.name,
            amount: request.amount,
            period: request.period,
            resource: request.resource,
            resource_type: request.resource_type,
            provider: request.provider,
            threshold,
            current_spend: 0.0,
            start_date: request.start_date,
            end_date: request.end_date,
            history: Vec::new(),
            forecast: 0.0,
            tags: request.tags,
            favorite: false,
            alert_channels: vec!["email".to_string()],
        };
        self.dataset.budgets.push(budget.clone());
        tracing::info!(id = %budget.id, "created budget");
        Ok(budget)
    }

    pub fn update_budget(&mut self, id: &str, update: BudgetUpdate) -> FixtureResult<Budget> {
        if let Some(amount) = update.amount {
            validate_amount(amount)?;
        }
        if let Some(threshold) = update.threshold {
            validate_threshold(threshold)?;
        }

        let budget = self
            .dataset
            .budgets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| budget_not_found(id))?;
        if let Some(name) = update.name {
            budget.name = name;
        }
        if let Some(amount) = update.amount {
            budget.amount = amount;
        }
        if let Some(threshold) = update.threshold {
            budget.threshold = threshold;
        }
        if let Some(favorite) = update.favorite {
            budget.favorite = favorite;
        }
        Ok(budget.clone())
    }

    pub fn delete_budget(&mut self, id: &str) -> FixtureResult<Budget> {
        let idx = self
            .dataset
            .budgets
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| budget_not_found(id))?;
        let removed = self.dataset.budgets.remove(idx);
        tracing::info!(id, "deleted budget");
        Ok(removed)
    }
}

/// Sums `entries` per date after filtering by provider and service.
pub fn daily_totals(
    entries: &[CostEntry],
    provider: Option<Provider>,
    service: Option<&str>,
) -> Vec<DailyCost> {
    sum_daily(
        entries
            .iter()
            .filter(|e| provider.is_none_or(|p| e.cloud_provider == p))
            .filter(|e| service.is_none_or(|s| e.service == s)),
    )
}

fn sum_by<'a, K, I, F>(entries: I, key: F) -> BTreeMap<K, f64>
where
    K: Ord,
    I: Iterator<Item = &'a CostEntry>,
    F: Fn(&CostEntry) -> K,
{
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(key(entry)).or_insert(0.0) += entry.daily_cost;
    }
    totals.into_iter().map(|(k, v)| (k, round2(v))).collect()
}

fn budget_not_found(id: &str) -> FixtureError {
    FixtureError::NotFound {
        kind: "budget",
        id: id.to_string(),
    }
}

fn validate_amount(amount: f64) -> FixtureResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(FixtureError::InvalidArgument(format!(
            "budget amount must be a non-negative number, got {amount}"
        )));
    }
    Ok(())
}

fn validate_threshold(threshold: f64) -> FixtureResult<()> {
    if !(0.0..=100.0).contains(&threshold) {
        return Err(FixtureError::InvalidArgument(format!(
            "threshold must be a percentage between 0 and 100, got {threshold}"
        )));
    }
    Ok(())
}
