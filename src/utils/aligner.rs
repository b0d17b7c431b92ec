use bio::alignment::pairwise::Aligner;
use bio::alignment::{Alignment, AlignmentOperation};
use bio::scores::blosum62;

pub const GAP: u8 = b'-';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqKind {
    Dna,
    Protein,
}

/// Global affine-gap alignment of `x` against `y`. DNA uses unit
/// match/mismatch scores, proteins use BLOSUM62.
pub fn global_align(kind: SeqKind, x: &[u8], y: &[u8]) -> Alignment {
    match kind {
        SeqKind::Dna => {
            let mut aligner = Aligner::new(-5, -1, |a: u8, b: u8| if a == b { 1i32 } else { -1i32 });
            aligner.global(x, y)
        }
        SeqKind::Protein => {
            let mut aligner = Aligner::new(-10, -1, &blosum62);
            aligner.global(x, y)
        }
    }
}

/// Expands an alignment into two gapped rows of equal length.
pub fn aligned_rows(x: &[u8], y: &[u8], alignment: &Alignment) -> (Vec<u8>, Vec<u8>) {
    let mut row_x = Vec::with_capacity(alignment.operations.len());
    let mut row_y = Vec::with_capacity(alignment.operations.len());
    let mut xi = alignment.xstart;
    let mut yi = alignment.ystart;
    for op in &alignment.operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                row_x.push(x[xi]);
                row_y.push(y[yi]);
                xi += 1;
                yi += 1;
            }
            AlignmentOperation::Ins => {
                row_x.push(x[xi]);
                row_y.push(GAP);
                xi += 1;
            }
            AlignmentOperation::Del => {
                row_x.push(GAP);
                row_y.push(y[yi]);
                yi += 1;
            }
            AlignmentOperation::Xclip(n) => xi += n,
            AlignmentOperation::Yclip(n) => yi += n,
        }
    }
    (row_x, row_y)
}

/// Fraction of identical residues over columns where both rows are non-gap.
/// Returns 0.0 when the two rows share no such column.
pub fn column_identity(row_a: &[u8], row_b: &[u8]) -> f64 {
    debug_assert_eq!(row_a.len(), row_b.len());
    let mut matches = 0usize;
    let mut columns = 0usize;
    for (&a, &b) in row_a.iter().zip(row_b.iter()) {
        if a == GAP || b == GAP {
            continue;
        }
        columns += 1;
        if a == b {
            matches += 1;
        }
    }
    if columns == 0 {
        0.0
    } else {
        matches as f64 / columns as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_degap_back_to_inputs() {
        let x = b"ACGTACGT";
        let y = b"ACGACGT";
        let alignment = global_align(SeqKind::Dna, x, y);
        let (row_x, row_y) = aligned_rows(x, y, &alignment);
        assert_eq!(row_x.len(), row_y.len());
        let degap = |row: &[u8]| row.iter().copied().filter(|&c| c != GAP).collect::<Vec<_>>();
        assert_eq!(degap(&row_x), x.to_vec());
        assert_eq!(degap(&row_y), y.to_vec());
    }

    #[test]
    fn identical_rows_have_full_identity() {
        assert_eq!(column_identity(b"ACGT", b"ACGT"), 1.0);
    }

    #[test]
    fn gap_columns_are_skipped() {
        // one shared non-gap column, mismatched
        assert_eq!(column_identity(b"A-C", b"AG-"), 1.0);
        assert_eq!(column_identity(b"--", b"AC"), 0.0);
    }

    #[test]
    fn protein_alignment_uses_blosum() {
        let x = b"MKVLWA";
        let y = b"MKVLWA";
        let alignment = global_align(SeqKind::Protein, x, y);
        let (row_x, row_y) = aligned_rows(x, y, &alignment);
        assert_eq!(row_x, x.to_vec());
        assert_eq!(row_y, y.to_vec());
    }
}
