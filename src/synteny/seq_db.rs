use crate::utils::{open_text_reader, read_fasta, Result, SeqRecord};
use std::io::BufRead;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.tsv";
const SEQS_DIR: &str = "seqs";

#[derive(Debug, Clone)]
struct IndexEntry {
    name: String,
    length: usize,
    file: String,
}

/// On-disk sequence database: one FASTA file per record under `seqs/` plus
/// an `index.tsv` keyed by sequence name. Built once from an input FASTA,
/// reopened from the directory afterwards.
#[derive(Debug)]
pub struct SeqDb {
    dir: PathBuf,
    index: Vec<IndexEntry>,
}

impl SeqDb {
    pub fn build(fasta: &Path, dir: &Path) -> Result<Self> {
        let records = read_fasta(fasta)?;
        let mut seen = std::collections::HashSet::new();
        for record in &records {
            if !seen.insert(record.id.clone()) {
                return Err(format!(
                    "Duplicate sequence name '{}' in {}",
                    record.id,
                    fasta.display()
                ));
            }
        }

        let seqs_dir = dir.join(SEQS_DIR);
        std::fs::create_dir_all(&seqs_dir)
            .map_err(|e| format!("Failed to create {}: {}", seqs_dir.display(), e))?;

        let mut index = Vec::with_capacity(records.len());
        for (ordinal, record) in records.iter().enumerate() {
            let file = format!("{}/{:04}.fa", SEQS_DIR, ordinal);
            crate::utils::write_fasta(&dir.join(&file), std::slice::from_ref(record))?;
            index.push(IndexEntry {
                name: record.id.clone(),
                length: record.len(),
                file,
            });
        }

        let index_path = dir.join(INDEX_FILE);
        let mut content = String::new();
        for entry in &index {
            content.push_str(&format!("{}\t{}\t{}\n", entry.name, entry.length, entry.file));
        }
        std::fs::write(&index_path, content)
            .map_err(|e| format!("Failed to write {}: {}", index_path.display(), e))?;

        log::info!(
            "Materialized {} sequences into {}",
            index.len(),
            dir.display()
        );
        Ok(SeqDb {
            dir: dir.to_path_buf(),
            index,
        })
    }

    pub fn open(dir: &Path) -> Result<Self> {
        let index_path = dir.join(INDEX_FILE);
        let reader = open_text_reader(&index_path)?;
        let mut index = Vec::new();
        for (line_number, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 3 {
                return Err(format!(
                    "{} line {}: expected 3 fields, found {}",
                    index_path.display(),
                    line_number + 1,
                    fields.len()
                ));
            }
            let length = fields[1].parse::<usize>().map_err(|e| {
                format!("{} line {}: bad length: {}", index_path.display(), line_number + 1, e)
            })?;
            index.push(IndexEntry {
                name: fields[0].to_string(),
                length,
                file: fields[2].to_string(),
            });
        }
        if index.is_empty() {
            return Err(format!("Sequence database {} is empty", dir.display()));
        }
        Ok(SeqDb {
            dir: dir.to_path_buf(),
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.index.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn seq_len(&self, name: &str) -> Result<usize> {
        self.entry(name).map(|entry| entry.length)
    }

    pub fn get(&self, name: &str) -> Result<SeqRecord> {
        let entry = self.entry(name)?;
        let records = read_fasta(&self.dir.join(&entry.file))?;
        records
            .into_iter()
            .find(|record| record.id == entry.name)
            .ok_or_else(|| format!("Database file for '{}' lost its record", name))
    }

    fn entry(&self, name: &str) -> Result<&IndexEntry> {
        self.index
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| format!("No sequence named '{}' in {}", name, self.dir.display()))
    }
}
