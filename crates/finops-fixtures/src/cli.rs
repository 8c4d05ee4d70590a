use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::analysis::forecast::DEFAULT_FORECAST_DAYS;
use crate::data::catalog::Provider;
use crate::error::{FixtureError, FixtureResult};
use crate::store::TimeSeriesGroup;

#[derive(Debug, Parser)]
#[command(
    name = "finops-fixtures",
    about = "synthetic multi-cloud cost fixtures for FinOps dashboards"
)]
pub struct Args {
    #[arg(long, env = "FINOPS_FIXTURES_DIR", default_value = "fixtures")]
    pub fixtures_dir: PathBuf,
    /// YAML file with generation settings.
    #[arg(long, env = "FINOPS_FIXTURES_CONFIG")]
    pub config: Option<PathBuf>,
    /// Overrides both the config file and FINOPS_FIXTURES_SEED.
    #[arg(long)]
    pub seed: Option<u64>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupBy {
    Provider,
    Service,
    Daily,
}

impl From<GroupBy> for TimeSeriesGroup {
    fn from(value: GroupBy) -> Self {
        match value {
            GroupBy::Provider => TimeSeriesGroup::Provider,
            GroupBy::Service => TimeSeriesGroup::Service,
            GroupBy::Daily => TimeSeriesGroup::Daily,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    List,
    Data {
        #[arg(long, default_value = "local")]
        label: String,
        #[arg(long)]
        force: bool,
    },
    Summary,
    Timeseries {
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, value_enum, default_value_t = GroupBy::Daily)]
        group_by: GroupBy,
    },
    Forecast {
        #[arg(long, default_value_t = DEFAULT_FORECAST_DAYS)]
        days: u32,
        #[arg(long, value_parser = parse_provider)]
        provider: Option<Provider>,
        #[arg(long)]
        service: Option<String>,
        /// Read cost history from an exported label instead of generating.
        #[arg(long)]
        from: Option<String>,
    },
}

fn parse_provider(value: &str) -> Result<Provider, String> {
    Provider::parse(value).map_err(|err| err.to_string())
}

pub fn validate_label(label: &str) -> FixtureResult<()> {
    if label.is_empty() {
        return Err(FixtureError::InvalidArgument(
            "label must not be empty".to_string(),
        ));
    }
    if matches!(label, "." | "..") {
        return Err(FixtureError::InvalidArgument(format!(
            "label '{label}' is not allowed"
        )));
    }
    if !label
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
    {
        return Err(FixtureError::InvalidArgument(
            "label contains invalid characters; allowed: [A-Za-z0-9._-]".to_string(),
        ));
    }
    Ok(())
}
