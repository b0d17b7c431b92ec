use crate::utils::Result;
use std::collections::HashMap;
use std::path::Path;

const GENE2DOMAIN_FILE: &str = "gene2domain.tsv";
const DOMAINS_FILE: &str = "domains.tsv";

#[derive(Debug, Clone, PartialEq)]
pub struct DomainAnnotation {
    pub gene_id: String,
    pub domain_id: String,
    pub description: String,
}

#[derive(Debug, Clone)]
struct GeneDomainRow {
    gene_id: String,
    keytype: String,
    domain_id: String,
}

/// Local annotation database: a directory holding `gene2domain.tsv`
/// (gene_id, keytype, domain_id) and `domains.tsv` (domain_id, description).
#[derive(Debug)]
pub struct DomainDb {
    gene2domain: Vec<GeneDomainRow>,
    descriptions: HashMap<String, String>,
}

impl DomainDb {
    pub fn open(dir: &Path) -> Result<Self> {
        let gene2domain = read_table(&dir.join(GENE2DOMAIN_FILE), 3)?
            .into_iter()
            .map(|fields| GeneDomainRow {
                gene_id: fields[0].clone(),
                keytype: fields[1].clone(),
                domain_id: fields[2].clone(),
            })
            .collect();
        let descriptions = read_table(&dir.join(DOMAINS_FILE), 2)?
            .into_iter()
            .map(|fields| (fields[0].clone(), fields[1].clone()))
            .collect();
        Ok(DomainDb {
            gene2domain,
            descriptions,
        })
    }

    pub fn keytypes(&self) -> Vec<String> {
        let mut keytypes: Vec<String> = self
            .gene2domain
            .iter()
            .map(|row| row.keytype.clone())
            .collect();
        keytypes.sort();
        keytypes.dedup();
        keytypes
    }

    /// Domain ids for the requested keys under one key type. Keys absent
    /// from the database contribute no rows; that is not an error.
    pub fn select(&self, keys: &[String], keytype: &str) -> Vec<(String, String)> {
        let mut rows = Vec::new();
        for key in keys {
            let matched: Vec<_> = self
                .gene2domain
                .iter()
                .filter(|row| row.keytype == keytype && &row.gene_id == key)
                .collect();
            if matched.is_empty() {
                log::debug!("No {} annotation for key {}", keytype, key);
            }
            for row in matched {
                rows.push((row.gene_id.clone(), row.domain_id.clone()));
            }
        }
        rows
    }

    /// Inner join of selected rows against the description table. A row is
    /// emitted only when its domain id has a description entry.
    pub fn annotate(&self, keys: &[String], keytype: &str) -> Vec<DomainAnnotation> {
        self.select(keys, keytype)
            .into_iter()
            .filter_map(|(gene_id, domain_id)| match self.descriptions.get(&domain_id) {
                Some(description) => Some(DomainAnnotation {
                    gene_id,
                    domain_id,
                    description: description.clone(),
                }),
                None => {
                    log::warn!("Domain {} has no description entry, dropped", domain_id);
                    None
                }
            })
            .collect()
    }
}

fn read_table(path: &Path, expected_fields: usize) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    let mut rows = Vec::new();
    for (line_number, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| format!("{} line {}: {}", path.display(), line_number + 1, e))?;
        if record.len() != expected_fields {
            return Err(format!(
                "{} line {}: expected {} tab-separated fields, found {}",
                path.display(),
                line_number + 1,
                expected_fields,
                record.len()
            ));
        }
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> (TempDir, DomainDb) {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(GENE2DOMAIN_FILE),
            "ENSG01\tENSEMBL\tPF00001\n\
             ENSG01\tENSEMBL\tPF00002\n\
             ENSG02\tENSEMBL\tPF00003\n\
             P12345\tUNIPROT\tPF00001\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(DOMAINS_FILE),
            "PF00001\t7 transmembrane receptor\n\
             PF00002\t7 transmembrane receptor (Secretin family)\n",
        )
        .unwrap();
        let db = DomainDb::open(dir.path()).unwrap();
        (dir, db)
    }

    #[test]
    fn select_respects_keytype() {
        let (_dir, db) = test_db();
        let rows = db.select(&["ENSG01".to_string(), "P12345".to_string()], "ENSEMBL");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|(gene, _)| gene == "ENSG01"));
    }

    #[test]
    fn unknown_keys_yield_no_rows() {
        let (_dir, db) = test_db();
        assert!(db.select(&["MISSING".to_string()], "ENSEMBL").is_empty());
    }

    #[test]
    fn join_never_invents_descriptions() {
        let (_dir, db) = test_db();
        // PF00003 has no description and must be dropped by the join
        let annotations = db.annotate(
            &["ENSG01".to_string(), "ENSG02".to_string()],
            "ENSEMBL",
        );
        assert_eq!(annotations.len(), 2);
        assert!(annotations.iter().all(|a| a.domain_id != "PF00003"));
        assert_eq!(annotations[0].description, "7 transmembrane receptor");
    }

    #[test]
    fn malformed_table_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(GENE2DOMAIN_FILE), "only_one_field\n").unwrap();
        std::fs::write(dir.path().join(DOMAINS_FILE), "PF1\tdesc\n").unwrap();
        assert!(DomainDb::open(dir.path()).is_err());
    }

    #[test]
    fn keytypes_are_listed() {
        let (_dir, db) = test_db();
        assert_eq!(db.keytypes(), vec!["ENSEMBL".to_string(), "UNIPROT".to_string()]);
    }
}
