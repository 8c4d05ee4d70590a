use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricStats {
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub p95: f64,
}

pub fn compute_stats(values: &[f64]) -> Option<MetricStats> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let len = sorted.len();
    let sum: f64 = sorted.iter().sum();

    Some(MetricStats {
        average: sum / (len as f64),
        max: *sorted.last().unwrap_or(&0.0),
        min: *sorted.first().unwrap_or(&0.0),
        p95: percentile(&sorted, 0.95),
    })
}

/// Linear interpolation between closest ranks; `sorted` must be ascending.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    let weight = rank - low as f64;
    sorted[low] + (sorted[high] - sorted[low]) * weight
}
