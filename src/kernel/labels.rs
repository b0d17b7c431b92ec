use crate::utils::{Result, SeqRecord};
use std::collections::HashMap;
use std::path::Path;

/// Reads a two-column `id<TAB>label` file with labels in {1, -1} and
/// returns one label per input record, in record order. Every record must
/// be labeled and every label must name a record.
pub fn match_labels(records: &[SeqRecord], path: &Path) -> Result<Vec<i8>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;

    let mut labels: HashMap<String, i8> = HashMap::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.map_err(|e| format!("Malformed row in {}: {}", path.display(), e))?;
        if row.len() != 2 {
            return Err(format!(
                "Expected 2 columns on line {} of {}, found {}",
                line + 1,
                path.display(),
                row.len()
            ));
        }
        let label = match row[1].trim() {
            "1" => 1,
            "-1" => -1,
            other => {
                return Err(format!(
                    "Label for '{}' must be 1 or -1, got '{}'",
                    &row[0], other
                ))
            }
        };
        labels.insert(row[0].to_string(), label);
    }

    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let label = labels
            .remove(&record.id)
            .ok_or_else(|| format!("No label for sequence '{}'", record.id))?;
        out.push(label);
    }
    if let Some(orphan) = labels.keys().next() {
        return Err(format!("Label file names unknown sequence '{}'", orphan));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn records() -> Vec<SeqRecord> {
        vec![SeqRecord::new("p1", b"MKV"), SeqRecord::new("p2", b"MAA")]
    }

    fn label_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn labels_follow_record_order() {
        let file = label_file("p2\t-1\np1\t1\n");
        assert_eq!(match_labels(&records(), file.path()).unwrap(), vec![1, -1]);
    }

    #[test]
    fn missing_label_is_an_error() {
        let file = label_file("p1\t1\n");
        let err = match_labels(&records(), file.path()).unwrap_err();
        assert!(err.contains("p2"));
    }

    #[test]
    fn unknown_sequence_and_bad_label_are_errors() {
        let file = label_file("p1\t1\np2\t-1\npX\t1\n");
        assert!(match_labels(&records(), file.path())
            .unwrap_err()
            .contains("pX"));
        let file = label_file("p1\t2\np2\t-1\n");
        assert!(match_labels(&records(), file.path())
            .unwrap_err()
            .contains("must be 1 or -1"));
    }
}
