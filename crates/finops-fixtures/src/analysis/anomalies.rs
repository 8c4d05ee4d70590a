//! Day-over-day spike extraction over a cost history.
//!
//! Candidates are taken from the most expensive days first and only then
//! filtered by relative increase, so a large service's ordinary peak can
//! crowd out a small service's genuine spike. Callers depend on this
//! ordering; keep it.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use rand::Rng;

use crate::data::catalog::{Provider, ServiceCategory};
use crate::data::datasets::{Anomaly, CostEntry, Severity};
use crate::data::round2;

/// Increases at or below this percentage are ordinary variation.
pub const SPIKE_THRESHOLD_PERCENT: f64 = 25.0;

pub fn generate_anomalies<R: Rng + ?Sized>(
    rng: &mut R,
    cost_data: &[CostEntry],
    count: usize,
) -> Vec<Anomaly> {
    let by_day: HashMap<(Provider, &str, NaiveDate), f64> = cost_data
        .iter()
        .map(|e| ((e.cloud_provider, e.service.as_str(), e.date), e.daily_cost))
        .collect();

    let mut ranked: Vec<&CostEntry> = cost_data.iter().collect();
    ranked.sort_by(|a, b| b.daily_cost.total_cmp(&a.daily_cost));

    let mut out = Vec::with_capacity(count);
    for entry in ranked.into_iter().take(count.saturating_mul(2)) {
        let prior_date = entry.date - Duration::days(1);
        let key = (entry.cloud_provider, entry.service.as_str(), prior_date);
        let Some(&expected) = by_day.get(&key) else {
            tracing::trace!(
                provider = %entry.cloud_provider,
                service = %entry.service,
                date = %entry.date,
                "no prior-day cost; skipping candidate"
            );
            continue;
        };
        if expected <= 0.0 {
            continue;
        }

        let increase = (entry.daily_cost / expected - 1.0) * 100.0;
        if increase <= SPIKE_THRESHOLD_PERCENT {
            continue;
        }

        let percentage_increase = round2(increase);
        let severity = Severity::from_increase(percentage_increase);
        let category = ServiceCategory::of(&entry.service);
        out.push(Anomaly {
            id: format!(
                "anomaly-{}-{}-{}",
                entry.cloud_provider.slug(),
                entry.service.to_ascii_lowercase().replace(' ', "-"),
                entry.date
            ),
            date: entry.date,
            daily_cost: entry.daily_cost,
            service: entry.service.clone(),
            cloud_provider: entry.cloud_provider,
            expected_cost: expected,
            percentage_increase,
            severity,
            explanation: format!(
                "{} spend on {} rose {percentage_increase:.2}% over the previous day \
                 ({expected:.2} to {:.2})",
                entry.service, entry.cloud_provider, entry.daily_cost
            ),
            anomaly_score: 0.8 + rng.gen::<f64>() * 0.2,
            possible_causes: category
                .possible_causes()
                .iter()
                .map(|cause| cause.to_string())
                .collect(),
        });
    }

    out.truncate(count);
    tracing::debug!(anomalies = out.len(), requested = count, "extracted anomalies");
    out
}
