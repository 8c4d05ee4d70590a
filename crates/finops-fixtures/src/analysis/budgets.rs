use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use rand::Rng;
use serde::Serialize;

use super::forecast::project_forecast;
use crate::data::catalog::{Provider, ACCOUNT_ENVIRONMENTS};
use crate::data::datasets::{
    sum_daily, Budget, BudgetDimension, BudgetHistoryPoint, BudgetPeriod, CostEntry,
    ForecastResult,
};
use crate::data::{month_end, month_start, quarter_bounds, round2};
use crate::error::{FixtureError, FixtureResult};

pub const DEFAULT_THRESHOLD_PERCENT: f64 = 80.0;
const HISTORY_POINTS: u32 = 5;
const SERVICE_BUDGETS_PER_PROVIDER: usize = 2;
const CROSS_CUTTING_BUDGETS: usize = 2;
/// The default history window spans roughly three months.
const WINDOW_MONTHS: f64 = 3.0;
const QUARTER_MONTHS: f64 = 3.0;

pub fn generate_budgets<R: Rng + ?Sized>(
    rng: &mut R,
    cost_data: &[CostEntry],
    today: NaiveDate,
) -> Vec<Budget> {
    let mut budgets = Vec::new();

    for provider in Provider::ALL {
        let top_services = cost_data
            .iter()
            .filter(|e| e.cloud_provider == provider)
            .into_grouping_map_by(|e| e.service.as_str())
            .fold(0.0, |acc, _, e| acc + e.daily_cost)
            .into_iter()
            .sorted_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)))
            .take(SERVICE_BUDGETS_PER_PROVIDER);

        for (service, total) in top_services {
            let baseline = total / WINDOW_MONTHS;
            let start = month_start(today);
            let end = month_end(today);
            let id = format!("budget-{}", budgets.len() + 1);
            budgets.push(build_budget(
                rng,
                BudgetDraft {
                    id,
                    name: format!("{provider} {service} Monthly Budget"),
                    resource: service.to_string(),
                    dimension: BudgetDimension::Service,
                    provider: Some(provider),
                    period: BudgetPeriod::Monthly,
                    baseline,
                    start,
                    end,
                },
                today,
            ));
        }
    }

    let total: f64 = cost_data.iter().map(|e| e.daily_cost).sum();
    if total > 0.0 {
        let (start, end) = quarter_bounds(today);
        let mut regions = cost_data
            .iter()
            .filter_map(|e| e.region.as_deref().map(|r| (e.cloud_provider, r)))
            .unique()
            .collect::<Vec<_>>();
        let mut accounts = cost_data
            .iter()
            .filter_map(|e| e.account.as_deref())
            .unique()
            .sorted()
            .collect::<Vec<_>>();
        let synthetic_accounts = accounts.is_empty();
        if synthetic_accounts {
            accounts = ACCOUNT_ENVIRONMENTS.to_vec();
        }

        // Picks are removed from their pool so no scope is budgeted twice.
        for _ in 0..CROSS_CUTTING_BUDGETS {
            let id = format!("budget-{}", budgets.len() + 1);
            let want_region = rng.gen_bool(0.5);
            let draft = if !regions.is_empty() && (want_region || accounts.is_empty()) {
                let (provider, region) = regions.swap_remove(rng.gen_range(0..regions.len()));
                let region_total: f64 = cost_data
                    .iter()
                    .filter(|e| {
                        e.cloud_provider == provider && e.region.as_deref() == Some(region)
                    })
                    .map(|e| e.daily_cost)
                    .sum();
                BudgetDraft {
                    id,
                    name: format!("{region} Regional Budget"),
                    resource: region.to_string(),
                    dimension: BudgetDimension::Region,
                    provider: Some(provider),
                    period: BudgetPeriod::Quarterly,
                    baseline: region_total / WINDOW_MONTHS * QUARTER_MONTHS,
                    start,
                    end,
                }
            } else if !accounts.is_empty() {
                let environment = accounts.swap_remove(rng.gen_range(0..accounts.len()));
                let account_total = if synthetic_accounts {
                    total * rng.gen_range(0.2..0.5)
                } else {
                    cost_data
                        .iter()
                        .filter(|e| e.account.as_deref() == Some(environment))
                        .map(|e| e.daily_cost)
                        .sum()
                };
                BudgetDraft {
                    id,
                    name: format!("{} Account Budget", capitalize(environment)),
                    resource: environment.to_string(),
                    dimension: BudgetDimension::Account,
                    provider: None,
                    period: BudgetPeriod::Quarterly,
                    baseline: account_total / WINDOW_MONTHS * QUARTER_MONTHS,
                    start,
                    end,
                }
            } else {
                break;
            };
            budgets.push(build_budget(rng, draft, today));
        }
    }

    tracing::debug!(budgets = budgets.len(), "synthesized budgets");
    budgets
}

struct BudgetDraft {
    id: String,
    name: String,
    resource: String,
    dimension: BudgetDimension,
    provider: Option<Provider>,
    period: BudgetPeriod,
    /// Expected spend over the whole period.
    baseline: f64,
    start: NaiveDate,
    end: NaiveDate,
}

fn build_budget<R: Rng + ?Sized>(rng: &mut R, draft: BudgetDraft, today: NaiveDate) -> Budget {
    let rounded_up = (draft.baseline / 1_000.0).ceil() * 1_000.0;
    let amount = (rounded_up * (1.0 + rng.gen_range(0.0..=0.2))).round();

    let period_days = (draft.end - draft.start).num_days() + 1;
    let elapsed_days = (today - draft.start).num_days() + 1;
    let progress = elapsed_days as f64 / period_days as f64;

    let mut history = Vec::with_capacity(HISTORY_POINTS as usize);
    let mut running = 0.0_f64;
    for point in 1..=HISTORY_POINTS {
        let offset = (elapsed_days as f64 * f64::from(point) / f64::from(HISTORY_POINTS)).round()
            as i64;
        let offset = offset.clamp(1, elapsed_days.max(1));
        let fraction = offset as f64 / period_days as f64;
        let spend = draft.baseline * fraction * rng.gen_range(0.9..=1.1);
        running = running.max(spend);
        history.push(BudgetHistoryPoint {
            date: draft.start + Duration::days(offset - 1),
            spend: round2(running),
        });
    }

    let current_spend = history.last().map(|p| p.spend).unwrap_or_default();
    let forecast = if progress > 0.0 {
        round2(current_spend / progress)
    } else {
        current_spend
    };

    let scope = draft
        .provider
        .map(|p| p.slug().to_string())
        .unwrap_or_else(|| "multi-cloud".to_string());

    Budget {
        id: draft.id,
        name: draft.name,
        amount,
        period: draft.period,
        resource: draft.resource,
        resource_type: draft.dimension,
        provider: draft.provider,
        threshold: DEFAULT_THRESHOLD_PERCENT,
        current_spend,
        start_date: draft.start,
        end_date: draft.end,
        history,
        forecast,
        tags: vec![
            "budget".to_string(),
            scope,
            draft.dimension.as_str().to_string(),
        ],
        favorite: false,
        alert_channels: vec!["email".to_string()],
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetExceedance {
    pub will_exceed: bool,
    pub projected_total: f64,
    /// Budget left before the forecast window starts; negative when already over.
    pub remaining: f64,
    pub exceed_date: Option<NaiveDate>,
}

/// Compares a budget's spend plus projected spend against its amount.
pub fn check_budget_exceed(budget: &Budget, forecast: &ForecastResult) -> BudgetExceedance {
    let remaining = budget.amount - budget.current_spend;
    let projected: f64 = forecast.forecast_values.iter().sum();
    let projected_total = budget.current_spend + projected;

    let mut cumulative = 0.0;
    let mut exceed_date = None;
    for (date, value) in forecast.forecast_dates.iter().zip(&forecast.forecast_values) {
        cumulative += value;
        if cumulative > remaining {
            exceed_date = Some(*date);
            break;
        }
    }

    BudgetExceedance {
        will_exceed: projected_total > budget.amount,
        projected_total: round2(projected_total),
        remaining: round2(remaining),
        exceed_date,
    }
}

/// Whether `entry` counts towards `budget`.
pub fn in_budget_scope(budget: &Budget, entry: &CostEntry) -> bool {
    if budget.provider.is_some_and(|p| p != entry.cloud_provider) {
        return false;
    }
    let resource = budget.resource.as_str();
    match budget.resource_type {
        BudgetDimension::Service => entry.service == resource,
        BudgetDimension::Region => entry.region.as_deref() == Some(resource),
        BudgetDimension::Account => entry.account.as_deref() == Some(resource),
        BudgetDimension::Tag => entry
            .tags
            .as_ref()
            .is_some_and(|tags| tags.values().any(|value| value == resource)),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetOutlook {
    pub budget_id: String,
    pub name: String,
    /// Projection of the budget's own scope, cut off at its end date.
    pub forecast: ForecastResult,
    pub check: BudgetExceedance,
}

/// Projects the spend inside `budget`'s scope for up to `days` and checks it
/// against the amount. Days past `end_date` are not counted.
pub fn forecast_budget<R: Rng + ?Sized>(
    rng: &mut R,
    budget: &Budget,
    cost_data: &[CostEntry],
    days: u32,
) -> FixtureResult<BudgetOutlook> {
    let series = sum_daily(cost_data.iter().filter(|e| in_budget_scope(budget, e)));
    let forecast = project_forecast(rng, &series, days)?.through(budget.end_date);
    let check = check_budget_exceed(budget, &forecast);
    Ok(BudgetOutlook {
        budget_id: budget.id.clone(),
        name: budget.name.clone(),
        forecast,
        check,
    })
}

/// Runs [`forecast_budget`] for each budget in order, skipping budgets whose
/// scope has no cost history.
pub fn forecast_budgets<R: Rng + ?Sized>(
    rng: &mut R,
    budgets: &[Budget],
    cost_data: &[CostEntry],
    days: u32,
) -> FixtureResult<Vec<BudgetOutlook>> {
    let mut outlooks = Vec::with_capacity(budgets.len());
    for budget in budgets {
        match forecast_budget(rng, budget, cost_data, days) {
            Ok(outlook) => outlooks.push(outlook),
            Err(FixtureError::InsufficientData { .. }) => {
                tracing::debug!(id = %budget.id, "no cost history in budget scope");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(outlooks)
}
