//! Async facade a dashboard talks to in place of a live billing backend.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::analysis::budgets::{forecast_budgets, BudgetOutlook};
use crate::analysis::forecast::project_forecast;
use crate::config::FixtureConfig;
use crate::data::catalog::Provider;
use crate::data::datasets::{
    Anomaly, Budget, CloudResource, CostEntry, ForecastResult, UtilizationSample,
};
use crate::data::seeded_rng;
use crate::error::FixtureResult;
use crate::recommendations::{RightsizingReport, TagSummary, UnusedReport};
use crate::store::{
    BudgetUpdate, CostTimeSeries, DashboardSummary, FixtureStore, NewBudget, ResourceSummary,
    TimeSeriesGroup,
};

#[derive(Clone, Debug)]
pub struct MockCostApi {
    store: Arc<RwLock<FixtureStore>>,
    latency: Duration,
}

impl MockCostApi {
    pub fn new(store: FixtureStore, latency_ms: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            latency: Duration::from_millis(latency_ms),
        }
    }

    /// Uses the latency configured in `config.latency_ms`.
    pub fn from_config(store: FixtureStore, config: &FixtureConfig) -> Self {
        Self::new(store, config.latency_ms)
    }

    pub async fn seed(&self) -> u64 {
        self.store.read().await.seed()
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub async fn get_resources(&self) -> Vec<CloudResource> {
        self.delay().await;
        self.store.read().await.resources().to_vec()
    }

    pub async fn get_cost_data(&self) -> Vec<CostEntry> {
        self.delay().await;
        self.store.read().await.cost_data().to_vec()
    }

    pub async fn get_utilization_data(&self) -> Vec<UtilizationSample> {
        self.delay().await;
        self.store.read().await.utilization_data().to_vec()
    }

    pub async fn get_anomalies(&self) -> Vec<Anomaly> {
        self.delay().await;
        self.store.read().await.anomalies().to_vec()
    }

    pub async fn get_budgets(&self) -> Vec<Budget> {
        self.delay().await;
        self.store.read().await.budgets().to_vec()
    }

    pub async fn get_cost_by_provider(&self) -> BTreeMap<Provider, f64> {
        self.delay().await;
        self.store.read().await.cost_by_provider()
    }

    pub async fn get_cost_by_service(&self) -> BTreeMap<String, f64> {
        self.delay().await;
        self.store.read().await.cost_by_service()
    }

    pub async fn get_cost_time_series(
        &self,
        days: u32,
        group_by: TimeSeriesGroup,
    ) -> CostTimeSeries {
        self.delay().await;
        self.store.read().await.cost_time_series(days, group_by)
    }

    /// Projects total daily cost. The stream is derived from the dataset seed
    /// and the horizon, so repeated calls agree.
    pub async fn forecast_total_cost(&self, days: u32) -> FixtureResult<ForecastResult> {
        self.delay().await;
        let store = self.store.read().await;
        let totals = store.daily_totals(None, None);
        let mut rng = seeded_rng(store.seed().wrapping_add(u64::from(days)));
        project_forecast(&mut rng, &totals, days)
    }

    /// Per-budget projections over each budget's own scope.
    pub async fn forecast_budgets(&self, days: u32) -> FixtureResult<Vec<BudgetOutlook>> {
        self.delay().await;
        let store = self.store.read().await;
        let mut rng = seeded_rng(store.seed().wrapping_add(u64::from(days)));
        forecast_budgets(&mut rng, store.budgets(), store.cost_data(), days)
    }

    pub async fn get_dashboard_summary(&self) -> DashboardSummary {
        self.delay().await;
        self.store.read().await.dashboard_summary()
    }

    pub async fn get_resource_summary(&self) -> ResourceSummary {
        self.delay().await;
        self.store.read().await.resource_summary()
    }

    pub async fn get_rightsizing(
        &self,
        provider: Option<Provider>,
        min_saving_percentage: f64,
    ) -> RightsizingReport {
        self.delay().await;
        self.store
            .read()
            .await
            .rightsizing_recommendations(provider, min_saving_percentage)
    }

    pub async fn get_unused_resources(
        &self,
        provider: Option<Provider>,
        min_days_inactive: i64,
    ) -> UnusedReport {
        self.delay().await;
        self.store
            .read()
            .await
            .unused_resources(provider, min_days_inactive)
    }

    pub async fn get_tag_summary(&self, provider: Option<Provider>) -> TagSummary {
        self.delay().await;
        self.store.read().await.tag_summary(provider)
    }

    pub async fn create_budget(&self, request: NewBudget) -> FixtureResult<Budget> {
        self.delay().await;
        self.store.write().await.create_budget(request)
    }

    pub async fn update_budget(&self, id: &str, update: BudgetUpdate) -> FixtureResult<Budget> {
        self.delay().await;
        self.store.write().await.update_budget(id, update)
    }

    pub async fn delete_budget(&self, id: &str) -> FixtureResult<Budget> {
        self.delay().await;
        self.store.write().await.delete_budget(id)
    }

    pub async fn toggle_favorite(&self, id: &str) -> FixtureResult<Budget> {
        self.delay().await;
        let mut store = self.store.write().await;
        let favorite = !store.budget(id)?.favorite;
        store.update_budget(
            id,
            BudgetUpdate {
                favorite: Some(favorite),
                ..BudgetUpdate::default()
            },
        )
    }
}
