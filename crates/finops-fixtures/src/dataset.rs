use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{generate_anomalies, generate_budgets};
use crate::config::FixtureConfig;
use crate::data::datasets::{Anomaly, Budget, CloudResource, CostEntry, UtilizationSample};
use crate::data::generator::{generate_cost_data, generate_resources, generate_utilization_data};
use crate::data::seeded_rng;
use crate::error::FixtureResult;

/// Everything one generation run produces. Built once, then read through
/// [`crate::store::FixtureStore`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostDataset {
    pub seed: u64,
    pub generated_at: DateTime<Utc>,
    pub config: FixtureConfig,
    pub resources: Vec<CloudResource>,
    pub cost_data: Vec<CostEntry>,
    pub utilization: Vec<UtilizationSample>,
    pub anomalies: Vec<Anomaly>,
    pub budgets: Vec<Budget>,
}

impl CostDataset {
    /// Runs the five stages in order over a single stream seeded from
    /// `config`, so the same seed and `now` reproduce the same dataset.
    pub fn generate(config: &FixtureConfig, now: DateTime<Utc>) -> FixtureResult<Self> {
        config.validate()?;
        let seed = config.resolved_seed(now);
        let today = now.date_naive();
        let mut rng = seeded_rng(seed);

        let resources = generate_resources(&mut rng, config.resource_count, now);
        let cost_data = generate_cost_data(&mut rng, config.cost_history_days, today);
        let utilization =
            generate_utilization_data(&mut rng, &resources, config.utilization_days, today);
        let anomalies = generate_anomalies(&mut rng, &cost_data, config.anomaly_count);
        let budgets = generate_budgets(&mut rng, &cost_data, today);

        tracing::info!(
            seed,
            %today,
            resources = resources.len(),
            cost_entries = cost_data.len(),
            utilization_samples = utilization.len(),
            anomalies = anomalies.len(),
            budgets = budgets.len(),
            "generated cost dataset"
        );

        Ok(Self {
            seed,
            generated_at: now,
            config: FixtureConfig {
                seed: Some(seed),
                ..config.clone()
            },
            resources,
            cost_data,
            utilization,
            anomalies,
            budgets,
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.generated_at.date_naive()
    }
}
