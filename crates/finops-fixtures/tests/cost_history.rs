use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use finops_fixtures::data::catalog::Provider;
use finops_fixtures::data::generator::generate_cost_data;
use finops_fixtures::data::seeded_rng;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

#[test]
fn one_entry_per_provider_service_and_day() {
    let mut rng = seeded_rng(42);
    let entries = generate_cost_data(&mut rng, 90, today());
    assert_eq!(entries.len(), 3 * 6 * 90);

    let mut series: BTreeMap<(Provider, String), Vec<NaiveDate>> = BTreeMap::new();
    for entry in &entries {
        series
            .entry((entry.cloud_provider, entry.service.clone()))
            .or_default()
            .push(entry.date);
    }
    assert_eq!(series.len(), 18);
    for ((provider, service), dates) in series {
        assert!(provider.services().contains(&service.as_str()));
        assert_eq!(dates.len(), 90);
        assert_eq!(dates.last().copied(), Some(today()));
        for pair in dates.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1), "{provider} {service}");
        }
    }
}

#[test]
fn costs_are_floored_and_rounded() {
    let mut rng = seeded_rng(9);
    for entry in generate_cost_data(&mut rng, 60, today()) {
        assert!(entry.daily_cost >= 10.0, "{entry:?}");
        let cents = entry.daily_cost * 100.0;
        assert!((cents - cents.round()).abs() < 1e-6, "{entry:?}");
    }
}

#[test]
fn every_series_keeps_one_region_and_account() {
    let mut rng = seeded_rng(3);
    let entries = generate_cost_data(&mut rng, 14, today());
    for chunk in entries.chunks(14) {
        let region = chunk[0].region.clone().expect("region");
        let account = chunk[0].account.clone().expect("account");
        assert!(chunk[0].cloud_provider.regions().contains(&region.as_str()));
        assert!(chunk.iter().all(|e| e.region.as_ref() == Some(&region)));
        assert!(chunk.iter().all(|e| e.account.as_ref() == Some(&account)));
    }
}

#[test]
fn single_day_history_ends_today() {
    let mut rng = seeded_rng(5);
    let entries = generate_cost_data(&mut rng, 1, today());
    assert_eq!(entries.len(), 18);
    assert!(entries.iter().all(|e| e.date == today()));
}
