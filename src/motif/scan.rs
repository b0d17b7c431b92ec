use crate::motif::Pwm;
use crate::utils::SeqRecord;
use bio::alphabets::dna::revcomp;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

#[derive(Debug, Clone, PartialEq)]
pub struct MotifHit {
    pub seq_id: String,
    /// 0-based offset of the site on the forward strand.
    pub pos: usize,
    pub strand: char,
    pub score: f64,
    pub site: String,
}

/// Scans one sequence on both strands, reporting windows that reach
/// `min_score_frac` of the motif's maximum score.
pub fn scan_record(pwm: &Pwm, record: &SeqRecord, min_score_frac: f64) -> Vec<MotifHit> {
    let width = pwm.width();
    let threshold = pwm.max_score() * min_score_frac;
    let mut hits = Vec::new();
    if record.seq.len() < width {
        return hits;
    }

    scan_strand(pwm, &record.seq, threshold, |offset, score, site| {
        hits.push(MotifHit {
            seq_id: record.id.clone(),
            pos: offset,
            strand: '+',
            score,
            site,
        });
    });

    let rc = revcomp(&record.seq);
    let seq_len = record.seq.len();
    scan_strand(pwm, &rc, threshold, |offset, score, site| {
        hits.push(MotifHit {
            seq_id: record.id.clone(),
            pos: seq_len - width - offset,
            strand: '-',
            score,
            site,
        });
    });

    hits.sort_by(|a, b| (a.pos, a.strand).cmp(&(b.pos, b.strand)));
    hits
}

fn scan_strand<F>(pwm: &Pwm, seq: &[u8], threshold: f64, mut on_hit: F)
where
    F: FnMut(usize, f64, String),
{
    let width = pwm.width();
    for (offset, window) in seq.windows(width).enumerate() {
        let score = pwm.score(window);
        if score >= threshold {
            on_hit(offset, score, String::from_utf8_lossy(window).to_string());
        }
    }
}

/// Scans all records in parallel; the result is sorted by (sequence id,
/// position, strand) so repeated runs produce identical output.
pub fn scan_records(pwm: &Pwm, records: &[SeqRecord], min_score_frac: f64) -> Vec<MotifHit> {
    let mut hits: Vec<MotifHit> = records
        .par_iter()
        .flat_map(|record| scan_record(pwm, record, min_score_frac))
        .collect();
    hits.sort_by(|a, b| {
        (&a.seq_id, a.pos, a.strand)
            .cmp(&(&b.seq_id, b.pos, b.strand))
    });
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motif::parse_motifs;
    use std::io::Cursor;

    fn pwm() -> Pwm {
        let text = ">m\n10 0 0 0\n0 0 0 10\n10 0 0 0\n0 0 0 10\n10 0 0 0\n";
        parse_motifs(Cursor::new(text)).unwrap().remove(0)
    }

    #[test]
    fn planted_motif_is_found_at_known_offset() {
        // ATATA planted at offset 6
        let record = SeqRecord::new("s", b"GGCCGGATATAGGCCGG");
        let hits = scan_record(&pwm(), &record, 0.9);
        let forward: Vec<_> = hits.iter().filter(|h| h.strand == '+').collect();
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].pos, 6);
        assert_eq!(forward[0].site, "ATATA");
    }

    #[test]
    fn reverse_strand_hit_maps_to_forward_coordinates() {
        // TATAT at offset 5 reads ATATA on the reverse strand
        let record = SeqRecord::new("s", b"GGCCGTATATGGCCG");
        let hits = scan_record(&pwm(), &record, 0.9);
        assert!(hits.iter().any(|h| h.strand == '-' && h.pos == 5));
    }

    #[test]
    fn short_sequence_yields_no_hits() {
        let record = SeqRecord::new("s", b"ATA");
        assert!(scan_record(&pwm(), &record, 0.5).is_empty());
    }

    #[test]
    fn scan_is_deterministic() {
        let records = vec![
            SeqRecord::new("a", b"GGATATAGGATATAGG"),
            SeqRecord::new("b", b"CCATATACC"),
        ];
        let first = scan_records(&pwm(), &records, 0.8);
        let second = scan_records(&pwm(), &records, 0.8);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
