//! Savings recommendations derived from the inventory and its utilization.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use serde::Serialize;

use crate::data::catalog::{sizes_for, Provider, ServiceCategory};
use crate::data::datasets::{CloudResource, ResourceStatus, UtilizationSample};
use crate::data::round2;
use crate::stats::{compute_stats, MetricStats};
use crate::store::FixtureStore;

pub const DEFAULT_MIN_SAVING_PERCENT: f64 = 10.0;
pub const DEFAULT_MIN_DAYS_INACTIVE: i64 = 30;
/// Peak utilization a downsized resource should stay under.
pub const RIGHTSIZING_TARGET_PERCENT: f64 = 70.0;
pub const IDLE_CPU_PERCENT: f64 = 5.0;
/// Keys every resource should carry to count as compliant.
pub const REQUIRED_TAG_KEYS: [&str; 2] = ["environment", "cost-center"];
const SAMPLES_PER_DAY: usize = 4;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RightsizingRecommendation {
    pub resource_id: String,
    pub resource_name: String,
    pub resource_type: String,
    pub provider: Provider,
    pub current_size: String,
    pub recommended_size: String,
    pub current_cost: f64,
    pub projected_cost: f64,
    pub monthly_savings: f64,
    pub savings_percentage: f64,
    pub confidence_score: f64,
    pub cpu: MetricStats,
    pub memory: MetricStats,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RightsizingReport {
    pub total_potential_savings: f64,
    pub recommendations: Vec<RightsizingRecommendation>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnusedReason {
    Stopped,
    Idle,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnusedResource {
    pub resource_id: String,
    pub resource_name: String,
    pub resource_type: String,
    pub provider: Provider,
    pub region: String,
    pub reason: UnusedReason,
    pub days_inactive: i64,
    pub monthly_cost: f64,
    pub recommendation: String,
    pub confidence_score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnusedReport {
    pub total_potential_savings: f64,
    pub unused_resources: Vec<UnusedResource>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagCount {
    pub key: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagSummary {
    pub total_resources: usize,
    pub tagged_resources: usize,
    pub untagged_resources: usize,
    /// Percentage of resources carrying every required key.
    pub tagging_compliance: f64,
    pub top_tags: Vec<TagCount>,
    pub tag_values_distribution: BTreeMap<String, BTreeMap<String, usize>>,
}

impl FixtureStore {
    /// Running compute and database resources whose p95 CPU and memory would
    /// fit a smaller size from the same family list.
    ///
    /// Each step down the size list is assumed to halve both capacity and
    /// price.
    pub fn rightsizing_recommendations(
        &self,
        provider: Option<Provider>,
        min_saving_percentage: f64,
    ) -> RightsizingReport {
        let samples = self.samples_by_resource();
        let expected_samples = self.dataset().config.utilization_days as usize * SAMPLES_PER_DAY;

        let recommendations: Vec<RightsizingRecommendation> = self
            .resources()
            .iter()
            .filter(|r| r.status == ResourceStatus::Running)
            .filter(|r| provider.is_none_or(|p| r.provider == p))
            .filter(|r| {
                matches!(
                    ServiceCategory::of(&r.resource_type),
                    ServiceCategory::Compute | ServiceCategory::Database
                )
            })
            .filter_map(|r| {
                let rows = samples.get(r.id.as_str())?;
                rightsize(r, rows, expected_samples)
            })
            .filter(|rec| rec.savings_percentage >= min_saving_percentage)
            .sorted_by(|a, b| {
                b.monthly_savings
                    .total_cmp(&a.monthly_savings)
                    .then_with(|| a.resource_id.cmp(&b.resource_id))
            })
            .collect();

        RightsizingReport {
            total_potential_savings: round2(recommendations.iter().map(|r| r.monthly_savings).sum()),
            recommendations,
        }
    }

    /// Stopped resources idle for at least `min_days_inactive`, plus running
    /// resources whose p95 CPU stays under [`IDLE_CPU_PERCENT`].
    pub fn unused_resources(
        &self,
        provider: Option<Provider>,
        min_days_inactive: i64,
    ) -> UnusedReport {
        let today = self.today();
        let samples = self.samples_by_resource();
        let window = i64::from(self.dataset().config.utilization_days);

        let unused: Vec<UnusedResource> = self
            .resources()
            .iter()
            .filter(|r| provider.is_none_or(|p| r.provider == p))
            .filter_map(|r| {
                let (reason, days_inactive, recommendation, confidence) = match r.status {
                    ResourceStatus::Stopped => {
                        let days = (today - r.last_modified.date_naive()).num_days().max(0);
                        (
                            UnusedReason::Stopped,
                            days,
                            "Terminate the stopped resource or snapshot and delete it",
                            0.95,
                        )
                    }
                    ResourceStatus::Running => {
                        let rows = samples.get(r.id.as_str())?;
                        let cpu: Vec<f64> = rows.iter().map(|s| s.cpu_percent).collect();
                        let stats = compute_stats(&cpu)?;
                        if stats.p95 >= IDLE_CPU_PERCENT {
                            return None;
                        }
                        (
                            UnusedReason::Idle,
                            window,
                            "Stop or decommission the idle resource",
                            0.85,
                        )
                    }
                    ResourceStatus::Terminated | ResourceStatus::Pending => return None,
                };
                (days_inactive >= min_days_inactive).then(|| UnusedResource {
                    resource_id: r.id.clone(),
                    resource_name: r.name.clone(),
                    resource_type: r.resource_type.clone(),
                    provider: r.provider,
                    region: r.region.clone(),
                    reason,
                    days_inactive,
                    monthly_cost: r.monthly_cost,
                    recommendation: recommendation.to_string(),
                    confidence_score: confidence,
                })
            })
            .sorted_by(|a, b| {
                b.monthly_cost
                    .total_cmp(&a.monthly_cost)
                    .then_with(|| a.resource_id.cmp(&b.resource_id))
            })
            .collect();

        UnusedReport {
            total_potential_savings: round2(unused.iter().map(|r| r.monthly_cost).sum()),
            unused_resources: unused,
        }
    }

    pub fn tag_summary(&self, provider: Option<Provider>) -> TagSummary {
        let resources: Vec<&CloudResource> = self
            .resources()
            .iter()
            .filter(|r| provider.is_none_or(|p| r.provider == p))
            .collect();

        let total = resources.len();
        let tagged = resources.iter().filter(|r| !r.tags.is_empty()).count();
        let compliant = resources
            .iter()
            .filter(|r| REQUIRED_TAG_KEYS.iter().all(|k| r.tags.contains_key(*k)))
            .count();

        let mut distribution: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for (key, value) in resources.iter().flat_map(|r| r.tags.iter()) {
            *distribution
                .entry(key.clone())
                .or_default()
                .entry(value.clone())
                .or_insert(0) += 1;
        }
        let top_tags = distribution
            .iter()
            .map(|(key, values)| TagCount {
                key: key.clone(),
                count: values.values().sum(),
            })
            .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)))
            .collect();

        TagSummary {
            total_resources: total,
            tagged_resources: tagged,
            untagged_resources: total - tagged,
            tagging_compliance: if total > 0 {
                round2(compliant as f64 / total as f64 * 100.0)
            } else {
                0.0
            },
            top_tags,
            tag_values_distribution: distribution,
        }
    }

    fn samples_by_resource(&self) -> HashMap<&str, Vec<&UtilizationSample>> {
        self.utilization_data()
            .iter()
            .into_group_map_by(|s| s.resource_id.as_str())
    }
}

fn rightsize(
    resource: &CloudResource,
    samples: &[&UtilizationSample],
    expected_samples: usize,
) -> Option<RightsizingRecommendation> {
    let cpu_values: Vec<f64> = samples.iter().map(|s| s.cpu_percent).collect();
    let memory_values: Vec<f64> = samples.iter().map(|s| s.memory_percent).collect();
    let cpu = compute_stats(&cpu_values)?;
    let memory = compute_stats(&memory_values)?;

    let sizes = sizes_for(resource.provider, &resource.resource_type);
    let current = sizes.iter().position(|s| *s == resource.size)?;
    let peak = cpu.p95.max(memory.p95);
    let mut steps = 0;
    while steps < current && peak * 2f64.powi(steps as i32 + 1) <= RIGHTSIZING_TARGET_PERCENT {
        steps += 1;
    }
    if steps == 0 {
        return None;
    }

    let projected_cost = round2(resource.monthly_cost / 2f64.powi(steps as i32));
    let monthly_savings = round2(resource.monthly_cost - projected_cost);
    let savings_percentage = if resource.monthly_cost > 0.0 {
        round2(monthly_savings / resource.monthly_cost * 100.0)
    } else {
        0.0
    };
    // Full sample coverage and steady CPU both raise confidence.
    let coverage = if expected_samples > 0 {
        (samples.len() as f64 / expected_samples as f64).min(1.0)
    } else {
        1.0
    };
    let steadiness = if cpu.max > 0.0 {
        1.0 - ((cpu.max - cpu.min) / cpu.max).min(1.0)
    } else {
        1.0
    };

    Some(RightsizingRecommendation {
        resource_id: resource.id.clone(),
        resource_name: resource.name.clone(),
        resource_type: resource.resource_type.clone(),
        provider: resource.provider,
        current_size: resource.size.clone(),
        recommended_size: sizes[current - steps].to_string(),
        current_cost: resource.monthly_cost,
        projected_cost,
        monthly_savings,
        savings_percentage,
        confidence_score: round2((0.6 + 0.3 * coverage + 0.09 * steadiness).min(0.99)),
        cpu,
        memory,
    })
}
