//! Fixed provider catalogs the generators draw from.

use serde::{Deserialize, Serialize};

use crate::error::{FixtureError, FixtureResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "Azure")]
    Azure,
    #[serde(rename = "GCP")]
    Gcp,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];

    pub fn parse(value: &str) -> FixtureResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            "azure" => Ok(Self::Azure),
            "gcp" => Ok(Self::Gcp),
            other => Err(FixtureError::InvalidArgument(format!(
                "unknown provider '{other}' (expected one of: aws, azure, gcp)"
            ))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "AWS",
            Self::Azure => "Azure",
            Self::Gcp => "GCP",
        }
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Gcp => "gcp",
        }
    }

    pub const fn regions(self) -> &'static [&'static str] {
        match self {
            Self::Aws => &[
                "us-east-1",
                "us-east-2",
                "us-west-2",
                "eu-west-1",
                "eu-central-1",
                "ap-southeast-1",
                "ap-northeast-1",
            ],
            Self::Azure => &[
                "eastus",
                "eastus2",
                "westus2",
                "westeurope",
                "northeurope",
                "southeastasia",
            ],
            Self::Gcp => &[
                "us-central1",
                "us-east1",
                "us-west1",
                "europe-west1",
                "asia-east1",
            ],
        }
    }

    /// The first entry is the provider's primary compute service; its size list
    /// is the fallback for services without one.
    pub const fn services(self) -> &'static [&'static str] {
        match self {
            Self::Aws => &["EC2", "S3", "RDS", "Lambda", "DynamoDB", "CloudFront"],
            Self::Azure => &[
                "Virtual Machines",
                "Blob Storage",
                "SQL Database",
                "Functions",
                "Cosmos DB",
                "App Service",
            ],
            Self::Gcp => &[
                "Compute Engine",
                "Cloud Storage",
                "Cloud SQL",
                "Cloud Functions",
                "BigQuery",
                "GKE",
            ],
        }
    }

    /// Range for the base monthly spend of one service series.
    pub const fn monthly_cost_range(self) -> (f64, f64) {
        match self {
            Self::Aws => (1_000.0, 10_000.0),
            Self::Azure => (800.0, 8_000.0),
            Self::Gcp => (500.0, 6_000.0),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Compute,
    Storage,
    Database,
    Other,
}

impl ServiceCategory {
    pub fn of(service: &str) -> Self {
        match service {
            "EC2" | "Virtual Machines" | "Compute Engine" => Self::Compute,
            "S3" | "Blob Storage" | "Cloud Storage" => Self::Storage,
            "RDS" | "DynamoDB" | "SQL Database" | "Cosmos DB" | "Cloud SQL" => Self::Database,
            _ => Self::Other,
        }
    }

    pub const fn possible_causes(self) -> &'static [&'static str] {
        match self {
            Self::Compute => &["Instance scaling event", "New instances launched"],
            Self::Storage => &["Large data transfer", "Increased storage usage"],
            Self::Database => &["Provisioned capacity increase", "Backup retention growth"],
            Self::Other => &["Usage burst", "Pricing tier change"],
        }
    }
}

pub fn service_sizes(service: &str) -> &'static [&'static str] {
    match service {
        "EC2" => &[
            "t3.micro",
            "t3.small",
            "t3.medium",
            "m5.large",
            "m5.xlarge",
            "c5.2xlarge",
            "r5.4xlarge",
        ],
        "RDS" => &["db.t3.micro", "db.t3.medium", "db.m5.large", "db.r5.xlarge"],
        "S3" => &["Standard", "Intelligent-Tiering", "Standard-IA", "Glacier"],
        "Virtual Machines" => &[
            "Standard_B1s",
            "Standard_B2s",
            "Standard_D2s_v3",
            "Standard_D4s_v3",
            "Standard_E8s_v3",
        ],
        "SQL Database" => &["Basic", "Standard S1", "Standard S3", "Premium P1"],
        "Blob Storage" => &["Hot", "Cool", "Archive"],
        "Compute Engine" => &[
            "e2-micro",
            "e2-small",
            "e2-medium",
            "n2-standard-2",
            "n2-standard-8",
            "n2-highmem-16",
        ],
        "Cloud SQL" => &["db-f1-micro", "db-g1-small", "db-n1-standard-2", "db-n1-highmem-8"],
        "Cloud Storage" => &["Standard", "Nearline", "Coldline", "Archive"],
        _ => &[],
    }
}

/// Sizes for `service`, falling back to the provider's primary compute list.
pub fn sizes_for(provider: Provider, service: &str) -> &'static [&'static str] {
    let sizes = service_sizes(service);
    if sizes.is_empty() {
        service_sizes(provider.services()[0])
    } else {
        sizes
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

impl SizeTier {
    pub fn of(size: &str) -> Self {
        let size = size.to_ascii_lowercase();
        if size.contains("xlarge") {
            Self::Large
        } else if ["micro", "small", "nano", "b1s", "basic"]
            .iter()
            .any(|needle| size.contains(needle))
        {
            Self::Small
        } else if ["medium", "large", "b2s", "d2s", "standard-2"]
            .iter()
            .any(|needle| size.contains(needle))
        {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageTier {
    Archive,
    Infrequent,
    Standard,
}

impl StorageTier {
    pub fn of(size: &str) -> Self {
        match size {
            "Glacier" | "Archive" | "Coldline" => Self::Archive,
            "Standard-IA" | "Cool" | "Nearline" => Self::Infrequent,
            _ => Self::Standard,
        }
    }
}

pub const TAG_CATALOG: [(&str, &[&str]); 5] = [
    (
        "environment",
        &["production", "staging", "development", "test"],
    ),
    ("team", &["platform", "data", "web", "mobile", "finance"]),
    ("project", &["atlas", "phoenix", "orion", "hermes"]),
    ("cost-center", &["cc-1001", "cc-2002", "cc-3003"]),
    ("owner", &["sre", "devops", "analytics"]),
];

pub const ACCOUNT_ENVIRONMENTS: [&str; 3] = ["production", "staging", "development"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn services_without_sizes_borrow_the_primary_compute_list() {
        assert_eq!(sizes_for(Provider::Aws, "Lambda"), service_sizes("EC2"));
        assert_eq!(
            sizes_for(Provider::Azure, "Functions"),
            service_sizes("Virtual Machines")
        );
        assert_eq!(
            sizes_for(Provider::Gcp, "BigQuery"),
            service_sizes("Compute Engine")
        );
        assert!(service_sizes("Lambda").is_empty());
    }

    #[test]
    fn services_with_sizes_keep_their_own_list() {
        assert_eq!(sizes_for(Provider::Aws, "RDS"), service_sizes("RDS"));
        assert_eq!(sizes_for(Provider::Gcp, "Cloud Storage")[0], "Standard");
    }
}
