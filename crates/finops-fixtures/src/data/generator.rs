use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::Rng;

use super::catalog::{
    sizes_for, Provider, ServiceCategory, SizeTier, StorageTier, ACCOUNT_ENVIRONMENTS,
    TAG_CATALOG,
};
use super::datasets::{CloudResource, CostEntry, ResourceStatus, UtilizationSample};
use super::{days_in_month, is_weekend, months_between, round2, trailing_dates};

const HEX: &[u8; 16] = b"0123456789abcdef";

const WEEKEND_COST_FACTOR: f64 = 0.7;
const MONTH_END_COST_FACTOR: f64 = 1.2;
const MONTH_END_WINDOW_DAYS: u32 = 5;
const MONTHLY_TREND: f64 = 0.05;
const SPIKE_PROBABILITY: f64 = 0.02;
const COST_FLOOR: f64 = 10.0;

const SAMPLE_HOURS: [u32; 4] = [0, 6, 12, 18];
const BUSINESS_HOURS: std::ops::RangeInclusive<u32> = 8..=18;
const WEEKEND_LOAD_FACTOR: f64 = 0.6;

pub fn generate_resources<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<CloudResource> {
    let mut out = Vec::with_capacity(count);

    for idx in 0..count {
        let provider = Provider::ALL[rng.gen_range(0..Provider::ALL.len())];
        let regions = provider.regions();
        let region = regions[rng.gen_range(0..regions.len())];
        let services = provider.services();
        let service = services[rng.gen_range(0..services.len())];
        let sizes = sizes_for(provider, service);
        let size = sizes[rng.gen_range(0..sizes.len())];
        let category = ServiceCategory::of(service);

        let tags = random_tags(rng);
        let environment = tags
            .get("environment")
            .map(String::as_str)
            .unwrap_or("shared");
        let name = format!("{environment}-{}-{:03}", slug(service), idx + 1);
        let id = resource_id(rng, provider, service, category, region, &name);

        let status = match rng.gen_range(0..100) {
            0..=69 => ResourceStatus::Running,
            70..=84 => ResourceStatus::Stopped,
            85..=94 => ResourceStatus::Pending,
            _ => ResourceStatus::Terminated,
        };

        let age_days: i64 = rng.gen_range(1..=365);
        let creation_date = now - Duration::days(age_days);
        let last_modified = creation_date + Duration::seconds(rng.gen_range(0..=age_days * 86_400));
        let monthly_cost = monthly_cost(rng, category, size);

        out.push(CloudResource {
            id,
            name,
            resource_type: service.to_string(),
            provider,
            region: region.to_string(),
            status,
            size: size.to_string(),
            tags,
            monthly_cost,
            creation_date,
            last_modified,
        });
    }

    tracing::debug!(count = out.len(), "generated resources");
    out
}

fn monthly_cost<R: Rng + ?Sized>(rng: &mut R, category: ServiceCategory, size: &str) -> f64 {
    let (low, high) = match category {
        ServiceCategory::Compute => match SizeTier::of(size) {
            SizeTier::Small => (10.0, 60.0),
            SizeTier::Medium => (50.0, 200.0),
            SizeTier::Large => (200.0, 1_000.0),
        },
        ServiceCategory::Storage => match StorageTier::of(size) {
            StorageTier::Archive => (5.0, 40.0),
            StorageTier::Infrequent => (20.0, 100.0),
            StorageTier::Standard => (50.0, 300.0),
        },
        ServiceCategory::Database => (100.0, 600.0),
        ServiceCategory::Other => (20.0, 220.0),
    };
    round2(rng.gen_range(low..high))
}

fn random_tags<R: Rng + ?Sized>(rng: &mut R) -> BTreeMap<String, String> {
    let amount = rng.gen_range(1..=3);
    rand::seq::index::sample(rng, TAG_CATALOG.len(), amount)
        .into_iter()
        .map(|key_idx| {
            let (key, values) = TAG_CATALOG[key_idx];
            let value = values[rng.gen_range(0..values.len())];
            (key.to_string(), value.to_string())
        })
        .collect()
}

fn resource_id<R: Rng + ?Sized>(
    rng: &mut R,
    provider: Provider,
    service: &str,
    category: ServiceCategory,
    region: &str,
    name: &str,
) -> String {
    match provider {
        Provider::Aws => match service {
            "EC2" => format!("i-{}", hex(rng, 17)),
            "S3" => format!("{name}-{}", hex(rng, 8)),
            _ => {
                let account: u64 = rng.gen_range(100_000_000_000..1_000_000_000_000);
                format!(
                    "arn:aws:{}:{region}:{account}:{}",
                    slug(service),
                    name
                )
            }
        },
        Provider::Azure => {
            let subscription = format!(
                "{}-{}-{}-{}-{}",
                hex(rng, 8),
                hex(rng, 4),
                hex(rng, 4),
                hex(rng, 4),
                hex(rng, 12)
            );
            let kind = match category {
                ServiceCategory::Compute => "Microsoft.Compute/virtualMachines",
                ServiceCategory::Storage => "Microsoft.Storage/storageAccounts",
                ServiceCategory::Database => "Microsoft.Sql/servers",
                ServiceCategory::Other => "Microsoft.Web/sites",
            };
            format!(
                "/subscriptions/{subscription}/resourceGroups/rg-{region}/providers/{kind}/{name}"
            )
        }
        Provider::Gcp => {
            let project = format!("finops-{}", hex(rng, 6));
            match category {
                ServiceCategory::Compute => {
                    format!("projects/{project}/zones/{region}-a/instances/{name}")
                }
                _ => format!(
                    "projects/{project}/locations/{region}/{}/{name}",
                    slug(service)
                ),
            }
        }
    }
}

fn hex<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect()
}

fn slug(service: &str) -> String {
    service.to_ascii_lowercase().replace(' ', "-")
}

/// One entry per provider, service and day over the `days` dates ending at
/// `today`, ordered provider, then service, then date.
pub fn generate_cost_data<R: Rng + ?Sized>(
    rng: &mut R,
    days: u32,
    today: NaiveDate,
) -> Vec<CostEntry> {
    let dates = trailing_dates(today, days);
    let Some(&series_start) = dates.first() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for provider in Provider::ALL {
        let (low, high) = provider.monthly_cost_range();
        let regions = provider.regions();
        for &service in provider.services() {
            let base_monthly = rng.gen_range(low..high);
            let region = regions[rng.gen_range(0..regions.len())];
            let account = ACCOUNT_ENVIRONMENTS[rng.gen_range(0..ACCOUNT_ENVIRONMENTS.len())];

            for &date in &dates {
                let mut cost = base_monthly / 30.0;
                if is_weekend(date) {
                    cost *= WEEKEND_COST_FACTOR;
                }
                if date.day() + MONTH_END_WINDOW_DAYS > days_in_month(date) {
                    cost *= MONTH_END_COST_FACTOR;
                }
                cost *= 1.0 + MONTHLY_TREND * f64::from(months_between(series_start, date));
                cost *= rng.gen_range(0.9..=1.1);
                if rng.gen_bool(SPIKE_PROBABILITY) {
                    cost *= rng.gen_range(2.0..=5.0);
                }

                let daily_cost = round2(cost.max(COST_FLOOR));
                let mut entry = CostEntry::new(date, daily_cost, service, provider);
                entry.region = Some(region.to_string());
                entry.account = Some(account.to_string());
                out.push(entry);
            }
        }
    }

    tracing::debug!(entries = out.len(), days, "generated cost history");
    out
}

#[derive(Clone, Copy, Debug)]
struct LoadBaseline {
    cpu: f64,
    memory: f64,
}

fn load_baseline<R: Rng + ?Sized>(rng: &mut R, resource: &CloudResource) -> LoadBaseline {
    let (cpu, memory) = match ServiceCategory::of(&resource.resource_type) {
        ServiceCategory::Compute if SizeTier::of(&resource.size) == SizeTier::Small => {
            ((50.0, 85.0), (50.0, 85.0))
        }
        // Larger instances sit mostly idle.
        ServiceCategory::Compute => ((10.0, 60.0), (10.0, 60.0)),
        ServiceCategory::Database => ((30.0, 60.0), (60.0, 90.0)),
        ServiceCategory::Storage => ((1.0, 10.0), (5.0, 20.0)),
        ServiceCategory::Other => ((20.0, 60.0), (30.0, 70.0)),
    };
    LoadBaseline {
        cpu: rng.gen_range(cpu.0..cpu.1),
        memory: rng.gen_range(memory.0..memory.1),
    }
}

/// Four samples a day for every running resource; other statuses get none.
pub fn generate_utilization_data<R: Rng + ?Sized>(
    rng: &mut R,
    resources: &[CloudResource],
    days: u32,
    today: NaiveDate,
) -> Vec<UtilizationSample> {
    let dates = trailing_dates(today, days);
    let mut out = Vec::new();

    for resource in resources
        .iter()
        .filter(|r| r.status == ResourceStatus::Running)
    {
        let baseline = load_baseline(rng, resource);
        for &date in &dates {
            let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
            for hour in SAMPLE_HOURS {
                let business = if BUSINESS_HOURS.contains(&hour) { 1.2 } else { 0.8 };
                let weekend = if is_weekend(date) { WEEKEND_LOAD_FACTOR } else { 1.0 };
                let load = business * weekend;

                let cpu = (baseline.cpu * load + rng.gen_range(-8.0..8.0)).clamp(1.0, 99.0);
                let memory =
                    (baseline.memory * load + rng.gen_range(-5.0..5.0)).clamp(5.0, 99.0);
                let network_mbps = cpu * 0.8 + memory * 0.2 + rng.gen_range(0.0..10.0);
                let disk_iops = cpu * 12.0 + memory * 4.0 + rng.gen_range(0.0..100.0);

                out.push(UtilizationSample {
                    resource_id: resource.id.clone(),
                    timestamp: midnight + Duration::hours(i64::from(hour)),
                    cpu_percent: round2(cpu),
                    memory_percent: round2(memory),
                    network_mbps: round2(network_mbps),
                    disk_iops: round2(disk_iops),
                    instance_type: resource.size.clone(),
                    provider: resource.provider,
                });
            }
        }
    }

    tracing::debug!(samples = out.len(), days, "generated utilization samples");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::seeded_rng;

    #[test]
    fn compute_prices_follow_size_tier() {
        let mut rng = seeded_rng(7);
        for _ in 0..200 {
            let small = monthly_cost(&mut rng, ServiceCategory::Compute, "t3.micro");
            assert!((10.0..=60.0).contains(&small), "{small}");
            let large = monthly_cost(&mut rng, ServiceCategory::Compute, "r5.4xlarge");
            assert!((200.0..=1_000.0).contains(&large), "{large}");
        }
    }

    #[test]
    fn tags_have_one_to_three_distinct_keys() {
        let mut rng = seeded_rng(11);
        for _ in 0..100 {
            let tags = random_tags(&mut rng);
            assert!((1..=3).contains(&tags.len()));
        }
    }

    #[test]
    fn ids_follow_provider_conventions() {
        let mut rng = seeded_rng(3);
        let ec2 = resource_id(
            &mut rng,
            Provider::Aws,
            "EC2",
            ServiceCategory::Compute,
            "us-east-1",
            "prod-ec2-001",
        );
        assert!(ec2.starts_with("i-") && ec2.len() == 19, "{ec2}");

        let vm = resource_id(
            &mut rng,
            Provider::Azure,
            "Virtual Machines",
            ServiceCategory::Compute,
            "eastus",
            "prod-vm-002",
        );
        assert!(vm.starts_with("/subscriptions/"), "{vm}");
        assert!(vm.contains("/providers/Microsoft.Compute/virtualMachines/"));

        let gce = resource_id(
            &mut rng,
            Provider::Gcp,
            "Compute Engine",
            ServiceCategory::Compute,
            "us-central1",
            "prod-gce-003",
        );
        assert!(gce.starts_with("projects/finops-"), "{gce}");
        assert!(gce.contains("/zones/us-central1-a/instances/"));
    }
}
