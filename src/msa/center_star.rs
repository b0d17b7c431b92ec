use crate::msa::distance::{condensed_index, kmer_distances};
use crate::utils::{aligned_rows, global_align, Result, SeqKind, SeqRecord, GAP};

#[derive(Debug, Clone)]
pub struct Msa {
    pub ids: Vec<String>,
    pub rows: Vec<Vec<u8>>,
}

impl Msa {
    pub fn width(&self) -> usize {
        self.rows.first().map(|row| row.len()).unwrap_or(0)
    }

    pub fn degapped_row(&self, index: usize) -> Vec<u8> {
        self.rows[index]
            .iter()
            .copied()
            .filter(|&c| c != GAP)
            .collect()
    }
}

/// Guide k-mer size: small enough to produce informative profiles for both
/// alphabets.
fn guide_k(kind: SeqKind) -> usize {
    match kind {
        SeqKind::Dna => 4,
        SeqKind::Protein => 2,
    }
}

/// Center-star progressive alignment: the center is the sequence with the
/// smallest summed guide distance to all others; every other sequence is
/// aligned to the center pairwise and the pairwise alignments are merged
/// column-wise (a gap once introduced into the center is kept everywhere).
pub fn center_star(records: &[SeqRecord], kind: SeqKind) -> Result<Msa> {
    if records.is_empty() {
        return Err("Cannot align an empty sequence set".to_string());
    }
    if let Some(record) = records.iter().find(|r| r.is_empty()) {
        return Err(format!("Sequence {} is empty", record.id));
    }
    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    if records.len() == 1 {
        return Ok(Msa {
            ids,
            rows: vec![records[0].seq.clone()],
        });
    }

    let center = pick_center(records, kind);
    let center_seq = &records[center].seq;

    // Master center row with all gaps introduced so far, plus the already
    // merged rows (input order, center excluded)
    let mut master: Vec<u8> = center_seq.clone();
    let mut merged: Vec<Vec<u8>> = Vec::new();

    for record in records.iter().enumerate().filter(|(i, _)| *i != center) {
        let (_, record) = record;
        let alignment = global_align(kind, center_seq, &record.seq);
        let (center_row, seq_row) = aligned_rows(center_seq, &record.seq, &alignment);
        let ops = merge_ops(&master, &center_row);
        master = rebuild_master(&master, &center_row, &ops);
        for row in &mut merged {
            *row = rebuild_old_row(row, &ops);
        }
        merged.push(rebuild_new_row(&seq_row, &ops));
    }

    // Restore input order
    let mut rows = Vec::with_capacity(records.len());
    let mut merged_iter = merged.into_iter();
    for index in 0..records.len() {
        if index == center {
            rows.push(master.clone());
        } else {
            rows.push(merged_iter.next().expect("one merged row per sequence"));
        }
    }
    debug_assert!(rows.iter().all(|row| row.len() == rows[0].len()));
    Ok(Msa { ids, rows })
}

fn pick_center(records: &[SeqRecord], kind: SeqKind) -> usize {
    let seqs: Vec<&[u8]> = records.iter().map(|r| r.seq.as_slice()).collect();
    let dists = kmer_distances(&seqs, guide_k(kind));
    let n = records.len();
    let mut dist_sums = vec![0.0f64; n];
    for i in 0..(n - 1) {
        for j in (i + 1)..n {
            let d = dists[condensed_index(n, i, j)];
            dist_sums[i] += d;
            dist_sums[j] += d;
        }
    }
    dist_sums
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .map(|(index, _)| index)
        .unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MergeOp {
    /// Column present in both the master row and the new center row
    Both,
    /// Gap column only the master row has; the new sequence row gets a gap
    FromMaster,
    /// Gap column only the new center row has; all previously merged rows
    /// get a gap
    FromNew,
}

/// Column-wise merge plan of two gapped spellings of the same center
/// sequence.
fn merge_ops(master: &[u8], center_row: &[u8]) -> Vec<MergeOp> {
    let mut ops = Vec::with_capacity(master.len().max(center_row.len()));
    let (mut i, mut j) = (0, 0);
    while i < master.len() || j < center_row.len() {
        let master_gap = i < master.len() && master[i] == GAP;
        let center_gap = j < center_row.len() && center_row[j] == GAP;
        if i < master.len() && j < center_row.len() && !master_gap && !center_gap {
            debug_assert_eq!(master[i], center_row[j]);
            ops.push(MergeOp::Both);
            i += 1;
            j += 1;
        } else if master_gap && center_gap {
            ops.push(MergeOp::Both);
            i += 1;
            j += 1;
        } else if master_gap {
            ops.push(MergeOp::FromMaster);
            i += 1;
        } else if center_gap {
            ops.push(MergeOp::FromNew);
            j += 1;
        } else if i >= master.len() {
            ops.push(MergeOp::FromNew);
            j += 1;
        } else {
            ops.push(MergeOp::FromMaster);
            i += 1;
        }
    }
    ops
}

fn rebuild_master(master: &[u8], center_row: &[u8], ops: &[MergeOp]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ops.len());
    let (mut i, mut j) = (0, 0);
    for op in ops {
        match op {
            MergeOp::Both => {
                out.push(master[i]);
                i += 1;
                j += 1;
            }
            MergeOp::FromMaster => {
                out.push(master[i]);
                i += 1;
            }
            MergeOp::FromNew => {
                out.push(center_row[j]);
                j += 1;
            }
        }
    }
    out
}

fn rebuild_old_row(row: &[u8], ops: &[MergeOp]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ops.len());
    let mut i = 0;
    for op in ops {
        match op {
            MergeOp::Both | MergeOp::FromMaster => {
                out.push(row[i]);
                i += 1;
            }
            MergeOp::FromNew => out.push(GAP),
        }
    }
    out
}

fn rebuild_new_row(row: &[u8], ops: &[MergeOp]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ops.len());
    let mut j = 0;
    for op in ops {
        match op {
            MergeOp::Both | MergeOp::FromNew => {
                out.push(row[j]);
                j += 1;
            }
            MergeOp::FromMaster => out.push(GAP),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(seqs: &[(&str, &[u8])]) -> Vec<SeqRecord> {
        seqs.iter().map(|(id, seq)| SeqRecord::new(id, seq)).collect()
    }

    #[test]
    fn identical_sequences_align_without_gaps() {
        let msa = center_star(
            &records(&[("a", b"ACGTACGT"), ("b", b"ACGTACGT"), ("c", b"ACGTACGT")]),
            SeqKind::Dna,
        )
        .unwrap();
        assert_eq!(msa.width(), 8);
        assert!(msa.rows.iter().all(|row| !row.contains(&GAP)));
    }

    #[test]
    fn rows_have_equal_length_and_degap_to_inputs() {
        let input = records(&[
            ("a", b"ACGTACGTACGT"),
            ("b", b"ACGTACG"),
            ("c", b"ACGTTACGTACGT"),
            ("d", b"CGTACGTACG"),
        ]);
        let msa = center_star(&input, SeqKind::Dna).unwrap();
        let width = msa.width();
        for (index, record) in input.iter().enumerate() {
            assert_eq!(msa.rows[index].len(), width);
            assert_eq!(msa.degapped_row(index), record.seq, "row {}", record.id);
        }
    }

    #[test]
    fn deletion_shows_up_as_gap_column() {
        let msa = center_star(
            &records(&[("long", b"ACGTTT"), ("short", b"ACTTT"), ("long2", b"ACGTTT")]),
            SeqKind::Dna,
        )
        .unwrap();
        let short_index = msa.ids.iter().position(|id| id == "short").unwrap();
        assert_eq!(msa.rows[short_index].iter().filter(|&&c| c == GAP).count(), 1);
    }

    #[test]
    fn two_sequences_align_pairwise() {
        let input = records(&[("a", b"ACGTACGTACGT"), ("b", b"ACGTCGTACGT")]);
        let msa = center_star(&input, SeqKind::Dna).unwrap();
        assert_eq!(msa.rows.len(), 2);
        assert_eq!(msa.rows[0].len(), msa.rows[1].len());
        assert_eq!(msa.degapped_row(0), input[0].seq);
        assert_eq!(msa.degapped_row(1), input[1].seq);
    }

    #[test]
    fn single_sequence_passes_through() {
        let msa = center_star(&records(&[("only", b"MKVLWA")]), SeqKind::Protein).unwrap();
        assert_eq!(msa.rows, vec![b"MKVLWA".to_vec()]);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(center_star(&[], SeqKind::Dna).is_err());
        assert!(center_star(&records(&[("x", b"")]), SeqKind::Dna).is_err());
    }

    #[test]
    fn ids_keep_input_order() {
        let msa = center_star(
            &records(&[("z", b"ACGT"), ("a", b"ACGT"), ("m", b"AGGT")]),
            SeqKind::Dna,
        )
        .unwrap();
        assert_eq!(msa.ids, vec!["z", "a", "m"]);
    }
}
