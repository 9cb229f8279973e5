//! Read/write snapshot JSON files.
//!
//! The core never touches storage; these helpers exist for the `mf` binary and
//! for tests that want fixtures on disk. Formats:
//! - taxonomy: array of `{ "id", "parent_id", "name" }`
//! - datasets: array of `{ "id", "stream", "data" }`
//! - overrides: object of `period label -> number | null`

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::app::pipeline::Snapshots;
use crate::domain::{DatasetEntry, ManualOverrides, Period, TaxonomyNode};
use crate::error::AppError;
use crate::series::coerce_number;

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open {what} JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid {what} JSON '{}': {e}", path.display())))
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create {what} JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::new(2, format!("Failed to write {what} JSON: {e}")))
}

pub fn read_taxonomy(path: &Path) -> Result<Vec<TaxonomyNode>, AppError> {
    read_json(path, "taxonomy")
}

pub fn read_datasets(path: &Path) -> Result<Vec<DatasetEntry>, AppError> {
    read_json(path, "dataset")
}

/// Read an override table. Unparsable period labels are skipped; nulls are
/// absent entries, not zeros.
pub fn read_overrides(path: &Path) -> Result<ManualOverrides, AppError> {
    let raw: Map<String, Value> = read_json(path, "override")?;
    Ok(overrides_from_map(&raw))
}

pub fn overrides_from_map(raw: &Map<String, Value>) -> ManualOverrides {
    let mut overrides = ManualOverrides::default();
    for (label, value) in raw {
        let period: Period = match label.parse() {
            Ok(p) => p,
            Err(err) => {
                tracing::debug!(%err, "ignoring override entry");
                continue;
            }
        };
        if let Some(v) = coerce_number(value) {
            overrides.values.entry(period).or_insert(v);
        }
    }
    overrides
}

/// Load all three snapshots. The override file is optional.
pub fn load_snapshots(
    taxonomy: &Path,
    datasets: &Path,
    overrides: Option<&Path>,
) -> Result<Snapshots, AppError> {
    Ok(Snapshots {
        taxonomy: read_taxonomy(taxonomy)?,
        datasets: read_datasets(datasets)?,
        overrides: match overrides {
            Some(p) => read_overrides(p)?,
            None => ManualOverrides::default(),
        },
    })
}

pub fn write_taxonomy(path: &Path, nodes: &[TaxonomyNode]) -> Result<(), AppError> {
    write_json(path, &nodes, "taxonomy")
}

pub fn write_datasets(path: &Path, entries: &[DatasetEntry]) -> Result<(), AppError> {
    write_json(path, &entries, "dataset")
}

pub fn write_overrides(path: &Path, overrides: &ManualOverrides) -> Result<(), AppError> {
    write_json(path, &overrides.values, "override")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overrides_skip_bad_labels_and_nulls() {
        let Value::Object(raw) = json!({
            "2025": 150,
            "2026": null,
            "Jan 2027": "1,200",
            "someday": 5
        }) else {
            unreachable!()
        };
        let o = overrides_from_map(&raw);
        assert_eq!(o.values.len(), 2);
        assert_eq!(o.get(&Period::year(2025)), Some(150.0));
        assert_eq!(o.get(&Period::year(2026)), None);
        assert_eq!(o.get(&Period::month(2027, 1).unwrap()), Some(1200.0));
    }

    #[test]
    fn snapshots_round_trip_through_files() {
        let dir = std::env::temp_dir().join(format!("mf-snapshot-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let nodes = vec![TaxonomyNode::new(1, None, "Root"), TaxonomyNode::new(2, Some(1), "CV")];
        let Value::Object(data) = json!({"Truck": {"2024": "1,000"}}) else { unreachable!() };
        let entries = vec![DatasetEntry { id: 3, stream: "1,2".into(), data }];
        let mut overrides = ManualOverrides::default();
        overrides.values.insert(Period::year(2025), 9.5);

        write_taxonomy(&dir.join("taxonomy.json"), &nodes).unwrap();
        write_datasets(&dir.join("datasets.json"), &entries).unwrap();
        write_overrides(&dir.join("overrides.json"), &overrides).unwrap();

        let loaded = load_snapshots(
            &dir.join("taxonomy.json"),
            &dir.join("datasets.json"),
            Some(&dir.join("overrides.json")),
        )
        .unwrap();
        assert_eq!(loaded.taxonomy, nodes);
        assert_eq!(loaded.datasets, entries);
        assert_eq!(loaded.overrides, overrides);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_exit_code_two() {
        let err = read_taxonomy(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
