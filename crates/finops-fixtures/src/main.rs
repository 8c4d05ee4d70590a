use chrono::Utc;
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use finops_fixtures::analysis::{forecast_budgets, project_forecast};
use finops_fixtures::api::MockCostApi;
use finops_fixtures::cli::{validate_label, Args, Command};
use finops_fixtures::config::{load_config, ConfigEnvOverrides, FixtureConfig};
use finops_fixtures::data::catalog::Provider;
use finops_fixtures::data::datasets::{Budget, BudgetDimension};
use finops_fixtures::data::fixtures::{load_budgets, load_cost_data, load_manifest, write_dataset};
use finops_fixtures::data::seeded_rng;
use finops_fixtures::error::FixtureResult;
use finops_fixtures::recommendations::{DEFAULT_MIN_DAYS_INACTIVE, DEFAULT_MIN_SAVING_PERCENT};
use finops_fixtures::store::{daily_totals, FixtureStore};

#[tokio::main]
async fn main() -> FixtureResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("finops_fixtures=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => FixtureConfig::default(),
    }
    .apply_env(&ConfigEnvOverrides::from_env())?;
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    let now = Utc::now();

    match args.command {
        Command::List => {
            for provider in Provider::ALL {
                println!("{provider}");
                println!("  regions: {}", provider.regions().join(", "));
                println!("  services: {}", provider.services().join(", "));
            }
        }
        Command::Data { label, force } => {
            validate_label(&label)?;
            let store = FixtureStore::generate(&config, now)?;
            let manifest = write_dataset(&args.fixtures_dir, &label, store.dataset(), force)?;
            println!(
                "fixtures ready at {} (label={label}, seed={}, cost_entries={})",
                args.fixtures_dir.join(&label).display(),
                manifest.seed,
                manifest.cost_entries
            );
        }
        Command::Summary => {
            let api = MockCostApi::from_config(FixtureStore::generate(&config, now)?, &config);
            let summary = json!({
                "seed": api.seed().await,
                "dashboard": api.get_dashboard_summary().await,
                "cost_by_provider": api.get_cost_by_provider().await,
                "cost_by_service": api.get_cost_by_service().await,
                "resources": api.get_resource_summary().await,
                "anomalies": api.get_anomalies().await,
                "budgets": api.get_budgets().await,
                "rightsizing": api.get_rightsizing(None, DEFAULT_MIN_SAVING_PERCENT).await,
                "unused_resources": api.get_unused_resources(None, DEFAULT_MIN_DAYS_INACTIVE).await,
                "tags": api.get_tag_summary(None).await,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Timeseries { days, group_by } => {
            let api = MockCostApi::from_config(FixtureStore::generate(&config, now)?, &config);
            let series = api.get_cost_time_series(days, group_by.into()).await;
            println!("{}", serde_json::to_string_pretty(&series)?);
        }
        Command::Forecast {
            days,
            provider,
            service,
            from,
        } => {
            let (seed, cost_data, budgets) = match from {
                Some(label) => {
                    let manifest = load_manifest(&args.fixtures_dir, &label)?;
                    let cost_data = load_cost_data(&args.fixtures_dir, &label)?;
                    let budgets = load_budgets(&args.fixtures_dir, &label)?;
                    (manifest.seed, cost_data, budgets)
                }
                None => {
                    let api =
                        MockCostApi::from_config(FixtureStore::generate(&config, now)?, &config);
                    let (cost_data, budgets) = tokio::join!(api.get_cost_data(), api.get_budgets());
                    (api.seed().await, cost_data, budgets)
                }
            };

            let series = daily_totals(&cost_data, provider, service.as_deref());
            let mut rng = seeded_rng(seed.wrapping_add(u64::from(days)));
            let forecast = project_forecast(&mut rng, &series, days)?;
            let matching: Vec<Budget> = budgets
                .into_iter()
                .filter(|b| budget_matches(b, provider, service.as_deref()))
                .collect();
            let checks = forecast_budgets(&mut rng, &matching, &cost_data, days)?;

            let output = json!({
                "provider": provider,
                "service": service,
                "history_days": series.len(),
                "forecast": forecast,
                "budget_checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn budget_matches(budget: &Budget, provider: Option<Provider>, service: Option<&str>) -> bool {
    let provider_ok = provider.is_none_or(|p| budget.provider == Some(p));
    let service_ok = service.is_none_or(|s| {
        budget.resource_type == BudgetDimension::Service && budget.resource == s
    });
    provider_ok && service_ok
}
