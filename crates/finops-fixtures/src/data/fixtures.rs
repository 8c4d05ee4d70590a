use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::datasets::{Budget, CostEntry, FixtureManifest};
use crate::cli::validate_label;
use crate::dataset::CostDataset;
use crate::error::FixtureResult;

pub const SCHEMA_VERSION: u32 = 1;

const RESOURCES_FILE: &str = "resources.json";
const COST_DATA_FILE: &str = "cost_data.jsonl";
const UTILIZATION_FILE: &str = "utilization.jsonl";
const ANOMALIES_FILE: &str = "anomalies.json";
const BUDGETS_FILE: &str = "budgets.json";
const MANIFEST_FILE: &str = "manifest.json";

pub fn fixture_root(fixtures_dir: &Path, label: &str) -> FixtureResult<PathBuf> {
    validate_label(label)?;
    Ok(fixtures_dir.join(label))
}

/// Exports `dataset` under `<fixtures_dir>/<label>/`.
///
/// An existing export whose manifest matches the dataset's seed, as-of date
/// and config is left untouched unless `force` is set.
pub fn write_dataset(
    fixtures_dir: &Path,
    label: &str,
    dataset: &CostDataset,
    force: bool,
) -> FixtureResult<FixtureManifest> {
    let root = fixture_root(fixtures_dir, label)?;

    if root.exists() && !force {
        if let Ok(existing) = load_manifest(fixtures_dir, label) {
            let matches_request = existing.schema_version == SCHEMA_VERSION
                && existing.seed == dataset.seed
                && existing.as_of == dataset.today()
                && existing.config == dataset.config;
            if matches_request {
                tracing::info!(path = %root.display(), "fixtures up to date; skipping export");
                return Ok(existing);
            }
        }
    }
    if root.exists() {
        fs::remove_dir_all(&root)?;
    }
    fs::create_dir_all(&root)?;

    let cost_bytes = jsonl_bytes(&dataset.cost_data)?;
    fs::write(root.join(COST_DATA_FILE), &cost_bytes)?;
    fs::write(root.join(UTILIZATION_FILE), jsonl_bytes(&dataset.utilization)?)?;
    fs::write(
        root.join(RESOURCES_FILE),
        serde_json::to_vec_pretty(&dataset.resources)?,
    )?;
    fs::write(
        root.join(ANOMALIES_FILE),
        serde_json::to_vec_pretty(&dataset.anomalies)?,
    )?;
    fs::write(
        root.join(BUDGETS_FILE),
        serde_json::to_vec_pretty(&dataset.budgets)?,
    )?;

    let manifest = FixtureManifest {
        schema_version: SCHEMA_VERSION,
        seed: dataset.seed,
        as_of: dataset.today(),
        config: dataset.config.clone(),
        resources: dataset.resources.len(),
        cost_entries: dataset.cost_data.len(),
        utilization_samples: dataset.utilization.len(),
        anomalies: dataset.anomalies.len(),
        budgets: dataset.budgets.len(),
        cost_fingerprint: fingerprint(&cost_bytes),
    };
    fs::write(
        root.join(MANIFEST_FILE),
        serde_json::to_vec_pretty(&manifest)?,
    )?;
    tracing::info!(
        path = %root.display(),
        seed = manifest.seed,
        fingerprint = %manifest.cost_fingerprint,
        "wrote fixtures"
    );

    Ok(manifest)
}

fn jsonl_bytes<T: Serialize>(rows: &[T]) -> FixtureResult<Vec<u8>> {
    let mut buf = Vec::new();
    for row in rows {
        serde_json::to_writer(&mut buf, row)?;
        buf.write_all(b"\n")?;
    }
    Ok(buf)
}

pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("sha256:{hex}")
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> FixtureResult<Vec<T>> {
    let data = fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for line in data.lines() {
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(line)?);
    }
    Ok(rows)
}

pub fn load_cost_data(fixtures_dir: &Path, label: &str) -> FixtureResult<Vec<CostEntry>> {
    read_jsonl(&fixture_root(fixtures_dir, label)?.join(COST_DATA_FILE))
}

pub fn load_budgets(fixtures_dir: &Path, label: &str) -> FixtureResult<Vec<Budget>> {
    let path = fixture_root(fixtures_dir, label)?.join(BUDGETS_FILE);
    Ok(serde_json::from_slice(&fs::read(path)?)?)
}

pub fn load_manifest(fixtures_dir: &Path, label: &str) -> FixtureResult<FixtureManifest> {
    let path = fixture_root(fixtures_dir, label)?.join(MANIFEST_FILE);
    let manifest: FixtureManifest = serde_json::from_slice(&fs::read(path)?)?;
    Ok(manifest)
}
