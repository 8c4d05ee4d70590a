use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDate, TimeZone, Utc};

use finops_fixtures::analysis::{
    check_budget_exceed, forecast_budget, forecast_budgets, generate_budgets, in_budget_scope,
};
use finops_fixtures::config::FixtureConfig;
use finops_fixtures::data::catalog::Provider;
use finops_fixtures::data::datasets::{
    Budget, BudgetDimension, BudgetPeriod, CostEntry, ForecastResult,
};
use finops_fixtures::data::generator::generate_cost_data;
use finops_fixtures::data::seeded_rng;
use finops_fixtures::dataset::CostDataset;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

fn budget(amount: f64, current_spend: f64) -> Budget {
    Budget {
        id: "budget-1".to_string(),
        name: "AWS EC2 Monthly Budget".to_string(),
        amount,
        period: BudgetPeriod::Monthly,
        resource: "EC2".to_string(),
        resource_type: BudgetDimension::Service,
        provider: None,
        threshold: 80.0,
        current_spend,
        start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        history: Vec::new(),
        forecast: current_spend,
        tags: Vec::new(),
        favorite: false,
        alert_channels: Vec::new(),
    }
}

fn forecast(values: &[f64]) -> ForecastResult {
    ForecastResult {
        forecast_dates: (1..=values.len() as i64)
            .map(|i| today() + Duration::days(i))
            .collect(),
        forecast_values: values.to_vec(),
        lower_bound: values.to_vec(),
        upper_bound: values.to_vec(),
        confidence_level: 0.9,
        model_type: "test".to_string(),
    }
}

#[test]
fn two_service_budgets_per_provider_plus_two_cross_cutting() {
    let mut rng = seeded_rng(42);
    let entries = generate_cost_data(&mut rng, 90, today());
    let budgets = generate_budgets(&mut rng, &entries, today());

    assert_eq!(budgets.len(), 8);
    let monthly: Vec<_> = budgets
        .iter()
        .filter(|b| b.period == BudgetPeriod::Monthly)
        .collect();
    assert_eq!(monthly.len(), 6);
    assert!(monthly
        .iter()
        .all(|b| b.resource_type == BudgetDimension::Service && b.provider.is_some()));
    let quarterly: Vec<_> = budgets
        .iter()
        .filter(|b| b.period == BudgetPeriod::Quarterly)
        .collect();
    assert_eq!(quarterly.len(), 2);
    for b in quarterly {
        assert!(matches!(
            b.resource_type,
            BudgetDimension::Region | BudgetDimension::Account
        ));
        assert_eq!(b.start_date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(b.end_date, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
    }

    for (idx, b) in budgets.iter().enumerate() {
        assert_eq!(b.id, format!("budget-{}", idx + 1));
    }
}

#[test]
fn history_is_monotonic_and_ends_at_current_spend() {
    let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
    let dataset = CostDataset::generate(&FixtureConfig::with_seed(42), now).expect("generate");
    for b in &dataset.budgets {
        assert_eq!(b.history.len(), 5, "{}", b.id);
        for pair in b.history.windows(2) {
            assert!(pair[0].spend <= pair[1].spend, "{}", b.id);
            assert!(pair[0].date <= pair[1].date, "{}", b.id);
        }
        assert!(b.history.iter().all(|p| p.date >= b.start_date && p.date <= today()));
        assert_eq!(b.history.last().map(|p| p.spend), Some(b.current_spend));
        assert_eq!(b.threshold, 80.0);
        assert!(b.amount > 0.0);
        assert_eq!(b.amount, b.amount.round());
        assert!(b.forecast >= b.current_spend);
        assert!(!b.favorite);
        assert!(b.tags.contains(&"budget".to_string()));
    }
}

#[test]
fn no_cost_data_yields_no_budgets() {
    let mut rng = seeded_rng(1);
    assert!(generate_budgets(&mut rng, &[], today()).is_empty());
}

#[test]
fn exceed_date_is_first_day_cumulative_passes_remaining() {
    let result = check_budget_exceed(&budget(1000.0, 800.0), &forecast(&[100.0, 100.0, 100.0]));
    assert!(result.will_exceed);
    assert_eq!(result.remaining, 200.0);
    assert_eq!(result.projected_total, 1100.0);
    assert_eq!(result.exceed_date, Some(today() + Duration::days(3)));
}

#[test]
fn within_budget_has_no_exceed_date() {
    let result = check_budget_exceed(&budget(1000.0, 500.0), &forecast(&[100.0, 100.0]));
    assert!(!result.will_exceed);
    assert_eq!(result.projected_total, 700.0);
    assert_eq!(result.exceed_date, None);
}

#[test]
fn already_over_budget_exceeds_on_first_day() {
    let result = check_budget_exceed(&budget(1000.0, 1200.0), &forecast(&[10.0, 10.0]));
    assert!(result.will_exceed);
    assert_eq!(result.remaining, -200.0);
    assert_eq!(result.exceed_date, Some(today() + Duration::days(1)));
}

fn entry(days_back: i64, cost: f64, service: &str, provider: Provider, region: &str) -> CostEntry {
    let mut entry = CostEntry::new(today() - Duration::days(days_back), cost, service, provider);
    entry.region = Some(region.to_string());
    entry.account = Some("production".to_string());
    entry
}

/// Ten days of three flat series: AWS EC2 at 100, AWS S3 at 50, Azure VMs at 30.
fn mixed_history() -> Vec<CostEntry> {
    (0..10)
        .flat_map(|back| {
            [
                entry(back, 100.0, "EC2", Provider::Aws, "us-east-1"),
                entry(back, 50.0, "S3", Provider::Aws, "us-west-2"),
                entry(back, 30.0, "Virtual Machines", Provider::Azure, "eastus"),
            ]
        })
        .collect()
}

fn scoped(dimension: BudgetDimension, resource: &str, provider: Option<Provider>) -> Budget {
    Budget {
        resource: resource.to_string(),
        resource_type: dimension,
        provider,
        ..budget(100_000.0, 0.0)
    }
}

#[test]
fn scope_follows_budget_dimension_and_provider() {
    let ec2 = entry(0, 1.0, "EC2", Provider::Aws, "us-east-1");
    let mut vm = entry(0, 1.0, "Virtual Machines", Provider::Azure, "eastus");
    vm.tags = Some(BTreeMap::from([("team".to_string(), "data".to_string())]));

    let aws_ec2 = scoped(BudgetDimension::Service, "EC2", Some(Provider::Aws));
    assert!(in_budget_scope(&aws_ec2, &ec2));
    assert!(!in_budget_scope(&aws_ec2, &vm));

    let azure_ec2 = scoped(BudgetDimension::Service, "EC2", Some(Provider::Azure));
    assert!(!in_budget_scope(&azure_ec2, &ec2));

    let region = scoped(BudgetDimension::Region, "eastus", Some(Provider::Azure));
    assert!(in_budget_scope(&region, &vm));
    assert!(!in_budget_scope(&region, &ec2));

    let account = scoped(BudgetDimension::Account, "production", None);
    assert!(in_budget_scope(&account, &ec2));
    assert!(in_budget_scope(&account, &vm));

    let tag = scoped(BudgetDimension::Tag, "data", None);
    assert!(in_budget_scope(&tag, &vm));
    assert!(!in_budget_scope(&tag, &ec2));
}

#[test]
fn budget_forecast_uses_only_its_own_scope() {
    let history = mixed_history();
    let mut rng = seeded_rng(9);

    let ec2 = scoped(BudgetDimension::Service, "EC2", Some(Provider::Aws));
    let outlook = forecast_budget(&mut rng, &ec2, &history, 5).expect("ec2 outlook");
    assert_eq!(outlook.budget_id, "budget-1");
    assert_eq!(outlook.forecast.forecast_values.len(), 5);
    assert!(outlook
        .forecast
        .forecast_values
        .iter()
        .all(|v| (95.0..=105.0).contains(v)));

    let region = scoped(BudgetDimension::Region, "us-west-2", Some(Provider::Aws));
    let outlook = forecast_budget(&mut rng, &region, &history, 5).expect("region outlook");
    assert!(outlook
        .forecast
        .forecast_values
        .iter()
        .all(|v| (47.5..=52.5).contains(v)));

    let account = scoped(BudgetDimension::Account, "production", None);
    let outlook = forecast_budget(&mut rng, &account, &history, 5).expect("account outlook");
    assert!(outlook
        .forecast
        .forecast_values
        .iter()
        .all(|v| (171.0..=189.0).contains(v)));
}

#[test]
fn budget_forecast_stops_at_end_date() {
    let history = mixed_history();
    let ec2 = Budget {
        current_spend: 1_000.0,
        ..scoped(BudgetDimension::Service, "EC2", Some(Provider::Aws))
    };
    let mut rng = seeded_rng(9);
    let outlook = forecast_budget(&mut rng, &ec2, &history, 30).expect("outlook");

    // 2026-03-16 through 2026-03-31.
    assert_eq!(outlook.forecast.forecast_dates.len(), 16);
    assert_eq!(outlook.forecast.forecast_values.len(), 16);
    assert_eq!(outlook.forecast.lower_bound.len(), 16);
    assert_eq!(outlook.forecast.upper_bound.len(), 16);
    assert_eq!(outlook.forecast.forecast_dates.last(), Some(&ec2.end_date));

    let projected: f64 = outlook.forecast.forecast_values.iter().sum();
    assert!((outlook.check.projected_total - (1_000.0 + projected)).abs() < 0.01);
    assert!(!outlook.check.will_exceed);
}

#[test]
fn through_keeps_days_up_to_and_including_end() {
    let cut = forecast(&[1.0, 2.0, 3.0, 4.0]).through(today() + Duration::days(2));
    assert_eq!(cut.forecast_values, [1.0, 2.0]);
    assert_eq!(cut.lower_bound.len(), 2);
    assert_eq!(cut.upper_bound.len(), 2);
    assert_eq!(cut.forecast_dates.last(), Some(&(today() + Duration::days(2))));

    let past = forecast(&[1.0, 2.0]).through(today());
    assert!(past.forecast_dates.is_empty());
    assert!(past.forecast_values.is_empty());
}

#[test]
fn budgets_without_history_in_scope_are_skipped() {
    let history = mixed_history();
    let budgets = [
        scoped(BudgetDimension::Service, "Lambda", Some(Provider::Aws)),
        Budget {
            id: "budget-2".to_string(),
            ..scoped(BudgetDimension::Service, "S3", Some(Provider::Aws))
        },
    ];
    let mut rng = seeded_rng(3);
    let outlooks = forecast_budgets(&mut rng, &budgets, &history, 7).expect("outlooks");
    assert_eq!(outlooks.len(), 1);
    assert_eq!(outlooks[0].budget_id, "budget-2");
}

#[test]
fn generated_monthly_budgets_are_not_exceeded_on_day_one() {
    let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
    let dataset = CostDataset::generate(&FixtureConfig::with_seed(42), now).expect("generate");
    let mut rng = seeded_rng(42);
    let outlooks =
        forecast_budgets(&mut rng, &dataset.budgets, &dataset.cost_data, 30).expect("outlooks");
    assert_eq!(outlooks.len(), dataset.budgets.len());

    for (budget, outlook) in dataset.budgets.iter().zip(&outlooks) {
        assert_eq!(budget.id, outlook.budget_id);
        assert!(outlook
            .forecast
            .forecast_dates
            .iter()
            .all(|d| *d <= budget.end_date));
        if budget.period == BudgetPeriod::Monthly {
            assert_ne!(
                outlook.check.exceed_date,
                Some(today() + Duration::days(1)),
                "{}",
                budget.id
            );
        }
    }
}

#[test]
fn cross_cutting_budgets_never_repeat_a_scope() {
    for seed in 0..40 {
        let mut rng = seeded_rng(seed);
        let entries = generate_cost_data(&mut rng, 90, today());
        let budgets = generate_budgets(&mut rng, &entries, today());
        let scopes: HashSet<_> = budgets
            .iter()
            .map(|b| (b.resource_type.as_str(), b.resource.as_str(), b.provider))
            .collect();
        assert_eq!(scopes.len(), budgets.len(), "seed {seed}");
    }
}
