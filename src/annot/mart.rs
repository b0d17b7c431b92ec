use crate::utils::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "datasets.json";

#[derive(Debug, Deserialize)]
pub struct DatasetSpec {
    #[serde(default)]
    pub description: String,
    pub attributes: Vec<String>,
    pub table: String,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    datasets: BTreeMap<String, DatasetSpec>,
}

/// A mart is a directory with a `datasets.json` manifest describing the
/// datasets it exposes and one TSV table per dataset whose columns follow
/// the manifest's attribute order.
#[derive(Debug)]
pub struct Mart {
    dir: PathBuf,
    manifest: Manifest,
}

impl Mart {
    pub fn open(dir: &Path) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let file = File::open(&manifest_path)
            .map_err(|e| format!("Failed to open {}: {}", manifest_path.display(), e))?;
        let manifest: Manifest = serde_json::from_reader(file)
            .map_err(|e| format!("Invalid manifest {}: {}", manifest_path.display(), e))?;
        if manifest.datasets.is_empty() {
            return Err(format!("Mart {} exposes no datasets", dir.display()));
        }
        Ok(Mart {
            dir: dir.to_path_buf(),
            manifest,
        })
    }

    pub fn datasets(&self) -> impl Iterator<Item = (&String, &DatasetSpec)> {
        self.manifest.datasets.iter()
    }

    pub fn dataset(&self, name: &str) -> Result<&DatasetSpec> {
        self.manifest.datasets.get(name).ok_or_else(|| {
            format!(
                "Unknown dataset '{}'; available: {}",
                name,
                self.manifest
                    .datasets
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }

    pub fn attributes(&self, name: &str) -> Result<&[String]> {
        Ok(&self.dataset(name)?.attributes)
    }

    /// Verifies that the dataset exposes every requested attribute and the
    /// filter attribute, then streams the table: rows whose filter column
    /// matches any of `filter_values` are projected to `attributes`.
    /// Verification happens before the table file is touched.
    pub fn query(
        &self,
        name: &str,
        attributes: &[String],
        filter_attribute: &str,
        filter_values: &[String],
    ) -> Result<Vec<Vec<String>>> {
        let spec = self.dataset(name)?;
        let filter_attribute = filter_attribute.to_string();
        for attribute in attributes.iter().chain(std::iter::once(&filter_attribute)) {
            if !spec.attributes.contains(attribute) {
                return Err(format!(
                    "Dataset '{}' does not expose attribute '{}'; available: {}",
                    name,
                    attribute,
                    spec.attributes.join(", ")
                ));
            }
        }
        let columns: Vec<usize> = attributes
            .iter()
            .map(|attribute| spec.attributes.iter().position(|a| a == attribute).unwrap())
            .collect();
        let filter_column = spec
            .attributes
            .iter()
            .position(|a| *a == filter_attribute)
            .unwrap();

        let table_path = self.dir.join(&spec.table);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_path(&table_path)
            .map_err(|e| format!("Failed to open {}: {}", table_path.display(), e))?;

        let mut rows = Vec::new();
        for (line_number, result) in reader.records().enumerate() {
            let record = result
                .map_err(|e| format!("{} line {}: {}", table_path.display(), line_number + 1, e))?;
            if record.len() != spec.attributes.len() {
                return Err(format!(
                    "{} line {}: expected {} fields, found {}",
                    table_path.display(),
                    line_number + 1,
                    spec.attributes.len(),
                    record.len()
                ));
            }
            let filter_field = record.get(filter_column).unwrap_or("");
            if !filter_values.iter().any(|value| value == filter_field) {
                continue;
            }
            rows.push(
                columns
                    .iter()
                    .map(|&column| record.get(column).unwrap_or("").to_string())
                    .collect(),
            );
        }
        Ok(rows)
    }
}
