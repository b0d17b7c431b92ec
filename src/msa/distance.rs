use crate::msa::Msa;
use crate::utils::{column_identity, Result};
use std::collections::HashMap;
use std::io::Write;

/// Symmetric distance matrix stored in condensed form: element 0 is
/// dist(seq[0], seq[1]), element 1 is dist(seq[0], seq[2]), etc. This is
/// the same layout kodama's linkage consumes.
#[derive(Debug, Clone)]
pub struct DistMatrix {
    pub ids: Vec<String>,
    dists: Vec<f64>,
}

/// Index of the (i, j) pair, i < j, in a condensed matrix over n items.
pub fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < n);
    n * i - i * (i + 3) / 2 + j - 1
}

impl DistMatrix {
    pub fn new(ids: Vec<String>, dists: Vec<f64>) -> Self {
        debug_assert_eq!(ids.len() * (ids.len() - 1) / 2, dists.len());
        DistMatrix { ids, dists }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            0.0
        } else if i < j {
            self.dists[condensed_index(self.len(), i, j)]
        } else {
            self.dists[condensed_index(self.len(), j, i)]
        }
    }

    pub fn condensed(&self) -> &[f64] {
        &self.dists
    }

    /// Percent-identity distances (1 - identity over shared non-gap
    /// columns) between all rows of an alignment.
    pub fn from_msa(msa: &Msa) -> Self {
        let n = msa.rows.len();
        let mut dists = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                dists.push(1.0 - column_identity(&msa.rows[i], &msa.rows[j]));
            }
        }
        DistMatrix::new(msa.ids.clone(), dists)
    }

    pub fn write_tsv<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut emit = |line: String| {
            writeln!(writer, "{}", line).map_err(|e| format!("Failed to write matrix: {}", e))
        };
        emit(format!("id\t{}", self.ids.join("\t")))?;
        for i in 0..self.len() {
            let row = (0..self.len())
                .map(|j| format!("{:.4}", self.get(i, j)))
                .collect::<Vec<_>>()
                .join("\t");
            emit(format!("{}\t{}", self.ids[i], row))?;
        }
        Ok(())
    }
}

/// Condensed k-mer profile distances (1 - cosine similarity of k-mer count
/// vectors). Cheap guide distances for center selection, computed without
/// any alignment.
pub fn kmer_distances(seqs: &[&[u8]], k: usize) -> Vec<f64> {
    let profiles: Vec<HashMap<&[u8], f64>> = seqs
        .iter()
        .map(|seq| {
            let mut counts: HashMap<&[u8], f64> = HashMap::new();
            if seq.len() >= k {
                for window in seq.windows(k) {
                    *counts.entry(window).or_insert(0.0) += 1.0;
                }
            }
            counts
        })
        .collect();
    let norms: Vec<f64> = profiles
        .iter()
        .map(|p| p.values().map(|v| v * v).sum::<f64>().sqrt())
        .collect();

    let n = seqs.len();
    let mut dists = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let dot: f64 = profiles[i]
                .iter()
                .filter_map(|(kmer, count)| profiles[j].get(kmer).map(|other| count * other))
                .sum();
            let denom = norms[i] * norms[j];
            let similarity = if denom > 0.0 { dot / denom } else { 0.0 };
            dists.push((1.0 - similarity).max(0.0));
        }
    }
    dists
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condensed_indexing_matches_pair_order() {
        // 4 items: pairs (0,1) (0,2) (0,3) (1,2) (1,3) (2,3)
        assert_eq!(condensed_index(4, 0, 1), 0);
        assert_eq!(condensed_index(4, 0, 3), 2);
        assert_eq!(condensed_index(4, 1, 2), 3);
        assert_eq!(condensed_index(4, 2, 3), 5);
    }

    #[test]
    fn matrix_is_symmetric_with_zero_diagonal() {
        let matrix = DistMatrix::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![0.1, 0.2, 0.3],
        );
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        assert_eq!(matrix.get(1, 2), 0.3);
    }

    #[test]
    fn identical_sequences_have_zero_kmer_distance() {
        let seqs: Vec<&[u8]> = vec![b"ACGTACGT", b"ACGTACGT", b"TTTTTTTT"];
        let dists = kmer_distances(&seqs, 3);
        assert!(dists[0] < 1e-12);
        assert!(dists[1] > 0.9);
    }

    #[test]
    fn distance_from_msa_rows() {
        let msa = Msa {
            ids: vec!["a".into(), "b".into()],
            rows: vec![b"ACGT".to_vec(), b"ACGA".to_vec()],
        };
        let matrix = DistMatrix::from_msa(&msa);
        assert!((matrix.get(0, 1) - 0.25).abs() < 1e-12);
    }
}
