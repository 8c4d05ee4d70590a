//! Naive geometric-trend projection of a daily cost series.
//!
//! No smoothing and no seasonality: the newest cost is compounded forward at
//! the rate observed over roughly the last thirty entries, with a little
//! multiplicative noise.

use chrono::Duration;
use rand::Rng;

use crate::data::datasets::{CostPoint, ForecastResult};
use crate::error::{FixtureError, FixtureResult};

pub const DEFAULT_FORECAST_DAYS: u32 = 30;
pub const CONFIDENCE_LEVEL: f64 = 0.9;
/// Below this many points the trend is not estimated and the anchor is held flat.
pub const MIN_TREND_POINTS: usize = 5;
const TREND_LOOKBACK: usize = 30;
const NEAR_BAND: f64 = 0.05;
const FAR_BAND: f64 = 0.20;
pub const MODEL_TYPE: &str = "geometric_trend";

pub fn project_forecast<R: Rng + ?Sized, P: CostPoint>(
    rng: &mut R,
    cost_series: &[P],
    days: u32,
) -> FixtureResult<ForecastResult> {
    if cost_series.is_empty() {
        return Err(FixtureError::InsufficientData {
            needed: 1,
            found: 0,
        });
    }

    let mut sorted: Vec<&P> = cost_series.iter().collect();
    sorted.sort_by_key(|point| std::cmp::Reverse(point.date()));
    let anchor = sorted[0];
    let anchor_date = anchor.date();
    let last_cost = anchor.cost();

    let daily_trend = if sorted.len() < MIN_TREND_POINTS {
        1.0
    } else {
        let reference = sorted[(TREND_LOOKBACK - 1).min(sorted.len() - 1)];
        let days_between = (anchor_date - reference.date()).num_days();
        if days_between > 0 && reference.cost() > 0.0 && last_cost > 0.0 {
            (last_cost / reference.cost()).powf(1.0 / days_between as f64)
        } else {
            1.0
        }
    };

    let horizon = days as usize;
    let mut result = ForecastResult {
        forecast_dates: Vec::with_capacity(horizon),
        forecast_values: Vec::with_capacity(horizon),
        lower_bound: Vec::with_capacity(horizon),
        upper_bound: Vec::with_capacity(horizon),
        confidence_level: CONFIDENCE_LEVEL,
        model_type: MODEL_TYPE.to_string(),
    };

    for step in 1..=days {
        let trend_value = last_cost * daily_trend.powi(step as i32);
        let value = trend_value * rng.gen_range(0.95..=1.05);
        // Centred on the noise-free trend value.
        let spread = trend_value * band_fraction(step, days);
        result
            .forecast_dates
            .push(anchor_date + Duration::days(i64::from(step)));
        result.forecast_values.push(value);
        result.lower_bound.push((trend_value - spread).max(0.0));
        result.upper_bound.push(trend_value + spread);
    }

    tracing::debug!(
        points = cost_series.len(),
        days,
        daily_trend,
        "projected forecast"
    );
    Ok(result)
}

/// Linear from 5% at the first step to 20% at the last.
fn band_fraction(step: u32, days: u32) -> f64 {
    if days <= 1 {
        return NEAR_BAND;
    }
    let t = f64::from(step - 1) / f64::from(days - 1);
    NEAR_BAND + (FAR_BAND - NEAR_BAND) * t
}
