use std::collections::HashMap;

use chrono::{Datelike, TimeZone, Timelike, Utc};

use finops_fixtures::data::datasets::ResourceStatus;
use finops_fixtures::data::generator::{generate_resources, generate_utilization_data};
use finops_fixtures::data::seeded_rng;

#[test]
fn only_running_resources_are_sampled() {
    let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
    let mut rng = seeded_rng(42);
    let resources = generate_resources(&mut rng, 60, now);
    let samples = generate_utilization_data(&mut rng, &resources, 7, now.date_naive());

    let mut per_resource: HashMap<&str, usize> = HashMap::new();
    for sample in &samples {
        *per_resource.entry(sample.resource_id.as_str()).or_default() += 1;
    }
    for resource in &resources {
        let count = per_resource.get(resource.id.as_str()).copied().unwrap_or(0);
        if resource.status == ResourceStatus::Running {
            assert_eq!(count, 7 * 4, "{}", resource.id);
        } else {
            assert_eq!(count, 0, "{}", resource.id);
        }
    }
}

#[test]
fn percentages_stay_within_clamps() {
    let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
    let mut rng = seeded_rng(11);
    let resources = generate_resources(&mut rng, 40, now);
    let samples = generate_utilization_data(&mut rng, &resources, 10, now.date_naive());
    assert!(!samples.is_empty());

    for sample in samples {
        assert!((1.0..=99.0).contains(&sample.cpu_percent), "{sample:?}");
        assert!((5.0..=99.0).contains(&sample.memory_percent), "{sample:?}");
        assert!(sample.network_mbps >= 0.0);
        assert!(sample.disk_iops >= 0.0);
        assert!([0, 6, 12, 18].contains(&sample.timestamp.hour()));
        assert!(sample.timestamp.date_naive() <= now.date_naive());
    }
}

#[test]
fn samples_carry_resource_size_and_provider() {
    let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
    let mut rng = seeded_rng(8);
    let resources = generate_resources(&mut rng, 30, now);
    let samples = generate_utilization_data(&mut rng, &resources, 2, now.date_naive());
    for sample in samples {
        let resource = resources
            .iter()
            .find(|r| r.id == sample.resource_id)
            .expect("sample resource exists");
        assert_eq!(sample.instance_type, resource.size);
        assert_eq!(sample.provider, resource.provider);
    }
}

#[test]
fn memory_follows_the_same_load_curve_as_cpu() {
    let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
    let mut rng = seeded_rng(5);
    let resources = generate_resources(&mut rng, 80, now);
    let samples = generate_utilization_data(&mut rng, &resources, 14, now.date_naive());

    let mean = |rows: Vec<f64>| rows.iter().sum::<f64>() / rows.len() as f64;
    let weekday_business = mean(
        samples
            .iter()
            .filter(|s| s.timestamp.weekday().number_from_monday() <= 5)
            .filter(|s| s.timestamp.hour() == 12)
            .map(|s| s.memory_percent)
            .collect(),
    );
    let weekend_night = mean(
        samples
            .iter()
            .filter(|s| s.timestamp.weekday().number_from_monday() > 5)
            .filter(|s| s.timestamp.hour() == 0)
            .map(|s| s.memory_percent)
            .collect(),
    );
    // Load is 1.2 at weekday noon and 0.48 at weekend midnight.
    assert!(
        weekend_night < weekday_business * 0.6,
        "weekend {weekend_night} vs weekday {weekday_business}"
    );
}
