use crate::utils::{open_text_reader, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct SeqRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
}

impl SeqRecord {
    pub fn new(id: &str, seq: &[u8]) -> Self {
        SeqRecord {
            id: id.to_string(),
            desc: None,
            seq: seq.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Reads all records from a plain or gzipped FASTA file. An input without a
/// single record is an error since every stage needs at least one sequence.
pub fn read_fasta(path: &Path) -> Result<Vec<SeqRecord>> {
    let reader = bio::io::fasta::Reader::new(open_text_reader(path)?);
    let mut records = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| format!("FASTA parse error in {}: {}", path.display(), e))?;
        if record.id().is_empty() {
            return Err(format!("Record without an id in {}", path.display()));
        }
        records.push(SeqRecord {
            id: record.id().to_string(),
            desc: record.desc().map(|d| d.to_string()),
            seq: record.seq().to_ascii_uppercase(),
        });
    }
    if records.is_empty() {
        return Err(format!("No sequences found in {}", path.display()));
    }
    Ok(records)
}

pub fn write_fasta(path: &Path, records: &[SeqRecord]) -> Result<()> {
    let file =
        File::create(path).map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
    let mut writer = bio::io::fasta::Writer::new(BufWriter::new(file));
    for record in records {
        writer
            .write(&record.id, record.desc.as_deref(), &record.seq)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    }
    Ok(())
}

/// Crude alphabet sniffing: sequences dominated by ACGTN are treated as DNA.
pub fn looks_like_dna(records: &[SeqRecord]) -> bool {
    let (mut dna_bases, mut total) = (0usize, 0usize);
    for record in records {
        for &base in &record.seq {
            total += 1;
            if matches!(base, b'A' | b'C' | b'G' | b'T' | b'N') {
                dna_bases += 1;
            }
        }
    }
    total > 0 && dna_bases * 10 >= total * 9
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub fn fasta_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_records_and_uppercases() {
        let file = fasta_file(">s1 first\nacgt\nACGT\n>s2\nTTTT\n");
        let records = read_fasta(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "s1");
        assert_eq!(records[0].desc.as_deref(), Some("first"));
        assert_eq!(records[0].seq, b"ACGTACGT");
        assert_eq!(records[1].seq, b"TTTT");
    }

    #[test]
    fn empty_fasta_is_an_error() {
        let file = fasta_file("");
        assert!(read_fasta(file.path()).is_err());
    }

    #[test]
    fn roundtrip_through_writer() {
        let records = vec![SeqRecord::new("a", b"ACGT"), SeqRecord::new("b", b"GGCC")];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fa");
        write_fasta(&path, &records).unwrap();
        let back = read_fasta(&path).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn alphabet_sniffing() {
        assert!(looks_like_dna(&[SeqRecord::new("d", b"ACGTACGTNN")]));
        assert!(!looks_like_dna(&[SeqRecord::new("p", b"MKVLWAALLV")]));
    }
}
