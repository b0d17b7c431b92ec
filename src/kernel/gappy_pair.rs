use crate::utils::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Sparse feature vector keyed by gapped-pair feature id.
pub type SparseVec = HashMap<u32, f64>;

const AMINO_ACIDS: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";
const MAX_K: usize = 3;

static AA_INDEX: Lazy<[i8; 256]> = Lazy::new(|| {
    let mut index = [-1i8; 256];
    for (rank, &aa) in AMINO_ACIDS.iter().enumerate() {
        index[aa as usize] = rank as i8;
        index[aa.to_ascii_lowercase() as usize] = rank as i8;
    }
    index
});

/// Gapped k-mer pair feature map: every pair of k-mers separated by
/// 0..=m positions contributes one count. Windows containing a
/// non-standard residue are skipped.
#[derive(Debug, Clone, Copy)]
pub struct GappyPairKernel {
    pub k: usize,
    pub m: usize,
}

impl GappyPairKernel {
    pub fn new(k: usize, m: usize) -> Result<Self> {
        if k == 0 || k > MAX_K {
            return Err(format!("K-mer length must be between 1 and {}", MAX_K));
        }
        Ok(GappyPairKernel { k, m })
    }

    /// Number of distinct k-mers over the standard alphabet.
    fn num_kmers(&self) -> u32 {
        20u32.pow(self.k as u32)
    }

    fn kmer_code(&self, seq: &[u8], start: usize) -> Option<u32> {
        let mut code = 0u32;
        for &base in &seq[start..start + self.k] {
            let rank = AA_INDEX[base as usize];
            if rank < 0 {
                return None;
            }
            code = code * 20 + rank as u32;
        }
        Some(code)
    }

    fn feature_id(&self, left: u32, gap: usize, right: u32) -> u32 {
        (left * (self.m as u32 + 1) + gap as u32) * self.num_kmers() + right
    }

    /// Every gapped-pair occurrence in the sequence, with the residue
    /// positions that produced it.
    pub fn occurrences(&self, seq: &[u8]) -> Vec<(u32, Vec<usize>)> {
        let mut out = Vec::new();
        if seq.len() < 2 * self.k {
            return out;
        }
        for left_start in 0..=(seq.len() - 2 * self.k) {
            let Some(left) = self.kmer_code(seq, left_start) else {
                continue;
            };
            for gap in 0..=self.m {
                let right_start = left_start + self.k + gap;
                if right_start + self.k > seq.len() {
                    break;
                }
                let Some(right) = self.kmer_code(seq, right_start) else {
                    continue;
                };
                let positions = (left_start..left_start + self.k)
                    .chain(right_start..right_start + self.k)
                    .collect();
                out.push((self.feature_id(left, gap, right), positions));
            }
        }
        out
    }

    /// L2-normalized occurrence counts.
    pub fn features(&self, seq: &[u8]) -> SparseVec {
        let mut counts: SparseVec = HashMap::new();
        for (feature, _positions) in self.occurrences(seq) {
            *counts.entry(feature).or_insert(0.0) += 1.0;
        }
        let norm = counts.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in counts.values_mut() {
                *value /= norm;
            }
        }
        counts
    }
}

pub fn dot(a: &SparseVec, b: &SparseVec) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(key, value)| large.get(key).map(|other| value * other))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn feature_vector_is_unit_length() {
        let kernel = GappyPairKernel::new(1, 3).unwrap();
        let features = kernel.features(b"MKVLAAGITGHE");
        let norm: f64 = features.values().map(|v| v * v).sum();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn identical_sequences_have_unit_similarity() {
        let kernel = GappyPairKernel::new(1, 3).unwrap();
        let x = kernel.features(b"ACDEFGHIKL");
        assert_relative_eq!(dot(&x, &x), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn occurrence_count_matches_pair_arithmetic() {
        let kernel = GappyPairKernel::new(1, 0).unwrap();
        // With no gaps allowed, each adjacent residue pair is one occurrence.
        let occurrences = kernel.occurrences(b"ACDEF");
        assert_eq!(occurrences.len(), 4);
        assert_eq!(occurrences[0].1, vec![0, 1]);
    }

    #[test]
    fn nonstandard_residues_are_skipped() {
        let kernel = GappyPairKernel::new(1, 0).unwrap();
        let with_x = kernel.occurrences(b"ACXEF");
        // Pairs touching the X vanish; AC and EF remain.
        assert_eq!(with_x.len(), 2);
    }

    #[test]
    fn short_sequence_yields_no_features() {
        let kernel = GappyPairKernel::new(2, 3).unwrap();
        assert!(kernel.features(b"ACD").is_empty());
    }

    #[test]
    fn kmer_length_is_bounded() {
        assert!(GappyPairKernel::new(0, 3).is_err());
        assert!(GappyPairKernel::new(4, 3).is_err());
    }
}
