use bio::alphabets::dna::revcomp;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// k-mer start in the first sequence.
    pub pos_a: usize,
    /// k-mer start in the second sequence, forward-strand coordinates.
    pub pos_b: usize,
    pub strand: char,
}

/// Exact shared k-mers between two sequences on both strands. Windows
/// containing non-ACGT bases are skipped.
pub fn find_anchors(a: &[u8], b: &[u8], k: usize) -> Vec<Anchor> {
    assert!(k >= 2 && k <= 31, "anchor k must be in 2..=31");
    let index = kmer_index(a, k);
    let mut anchors = Vec::new();

    for (pos_b, kmer) in kmers(b, k) {
        if let Some(positions) = index.get(&kmer) {
            for &pos_a in positions {
                anchors.push(Anchor {
                    pos_a,
                    pos_b,
                    strand: '+',
                });
            }
        }
    }

    let rc = revcomp(b);
    for (rc_pos, kmer) in kmers(&rc, k) {
        if let Some(positions) = index.get(&kmer) {
            let pos_b = b.len() - k - rc_pos;
            for &pos_a in positions {
                anchors.push(Anchor {
                    pos_a,
                    pos_b,
                    strand: '-',
                });
            }
        }
    }

    anchors
}

fn kmer_index(seq: &[u8], k: usize) -> HashMap<u64, Vec<usize>> {
    let mut index: HashMap<u64, Vec<usize>> = HashMap::new();
    for (pos, kmer) in kmers(seq, k) {
        index.entry(kmer).or_default().push(pos);
    }
    index
}

/// 2-bit rolling k-mer encoding; emits (position, code) for every valid
/// window.
fn kmers(seq: &[u8], k: usize) -> Vec<(usize, u64)> {
    let mut out = Vec::new();
    if seq.len() < k {
        return out;
    }
    let mask = (1u64 << (2 * k)) - 1;
    let mut code = 0u64;
    let mut valid = 0usize;
    for (pos, &base) in seq.iter().enumerate() {
        match encode_base(base) {
            Some(bits) => {
                code = ((code << 2) | bits) & mask;
                valid += 1;
            }
            None => {
                code = 0;
                valid = 0;
            }
        }
        if valid >= k {
            out.push((pos + 1 - k, code));
        }
    }
    out
}

fn encode_base(base: u8) -> Option<u64> {
    match base {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_kmer_is_anchored_on_the_forward_strand() {
        let a = b"AAAACGTACGTAAA";
        let b = b"TTTACGTACGTTTT";
        let anchors = find_anchors(a, b, 8);
        assert!(anchors
            .iter()
            .any(|anchor| anchor.strand == '+' && anchor.pos_a == 3 && anchor.pos_b == 3));
    }

    #[test]
    fn reverse_complement_match_maps_to_forward_coordinates() {
        let a = b"GGGGACGTTCCAGGGG";
        // revcomp of ACGTTCCA is TGGAACGT, planted at offset 4
        let b = b"CCCCTGGAACGTCCCC";
        let anchors = find_anchors(a, b, 8);
        assert!(anchors
            .iter()
            .any(|anchor| anchor.strand == '-' && anchor.pos_a == 4 && anchor.pos_b == 4));
    }

    #[test]
    fn ambiguous_bases_break_windows() {
        let anchors = find_anchors(b"ACGTNACGT", b"ACGTNACGT", 5);
        assert!(anchors.is_empty());
    }

    #[test]
    fn rolling_encoding_matches_naive() {
        let seq = b"ACGTACGGT";
        let k = 3;
        let rolled = kmers(seq, k);
        assert_eq!(rolled.len(), seq.len() - k + 1);
        for (pos, code) in rolled {
            let naive = seq[pos..pos + k]
                .iter()
                .fold(0u64, |acc, &b| (acc << 2) | encode_base(b).unwrap());
            assert_eq!(code, naive, "k-mer at {}", pos);
        }
    }
}
