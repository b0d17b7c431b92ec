use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Shuffles a sequence while preserving its exact k-mer multiset
/// (Altschul-Erickson): the k-mers form a walk on the multigraph of
/// (k-1)-mer contexts, and a random Eulerian path through that graph is a
/// permutation with identical k-mer counts. Sequences too short to carry a
/// k-mer walk fall back to a plain shuffle.
pub fn kmer_shuffle(seq: &[u8], k: usize, rng: &mut StdRng) -> Vec<u8> {
    assert!(k >= 2, "k-mer shuffle requires k >= 2");
    let order = k - 1;
    if seq.len() < k + 1 {
        let mut shuffled = seq.to_vec();
        shuffled.shuffle(rng);
        return shuffled;
    }

    // One vertex per distinct (k-1)-mer, one edge per k-mer occurrence
    let mut index: HashMap<&[u8], usize> = HashMap::new();
    let mut contexts: Vec<&[u8]> = Vec::new();
    for start in 0..=seq.len() - order {
        let context = &seq[start..start + order];
        index.entry(context).or_insert_with(|| {
            contexts.push(context);
            contexts.len() - 1
        });
    }
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); contexts.len()];
    for window in seq.windows(k) {
        edges[index[&window[..order]]].push(index[&window[1..]]);
    }
    let start = index[&seq[..order]];
    let end = index[&seq[seq.len() - order..]];

    // Pick each vertex's final outgoing edge so the picks form a tree into
    // the end vertex; resample until they do. Eulerian paths that save the
    // picked edge for last always terminate at the end vertex.
    let mut last_edge: Vec<Option<usize>> = vec![None; contexts.len()];
    if contexts.len() > 1 {
        loop {
            for vertex in 0..contexts.len() {
                last_edge[vertex] = if vertex == end {
                    None
                } else {
                    Some(edges[vertex][rng.random_range(0..edges[vertex].len())])
                };
            }
            if reaches_end(&last_edge, end) {
                break;
            }
        }
    }

    let mut pools: Vec<Vec<usize>> = Vec::with_capacity(contexts.len());
    for vertex in 0..contexts.len() {
        let mut pool = edges[vertex].clone();
        if let Some(target) = last_edge[vertex] {
            let position = pool.iter().position(|&to| to == target).unwrap();
            pool.swap_remove(position);
        }
        pool.shuffle(rng);
        if let Some(target) = last_edge[vertex] {
            pool.push(target);
        }
        pools.push(pool);
    }

    let mut out = seq[..order].to_vec();
    let mut cursor = vec![0usize; contexts.len()];
    let mut vertex = start;
    while out.len() < seq.len() {
        let to = pools[vertex][cursor[vertex]];
        cursor[vertex] += 1;
        out.push(contexts[to][order - 1]);
        vertex = to;
    }
    out
}

/// True when following the picked last edges from every vertex reaches
/// `end` without entering a cycle.
fn reaches_end(last_edge: &[Option<usize>], end: usize) -> bool {
    let mut reaches = vec![false; last_edge.len()];
    reaches[end] = true;
    for vertex in 0..last_edge.len() {
        let mut path = Vec::new();
        let mut current = vertex;
        while !reaches[current] {
            if path.contains(&current) {
                return false;
            }
            path.push(current);
            match last_edge[current] {
                Some(next) => current = next,
                None => return false,
            }
        }
        for visited in path {
            reaches[visited] = true;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn kmer_counts(seq: &[u8], k: usize) -> HashMap<&[u8], usize> {
        let mut counts = HashMap::new();
        for window in seq.windows(k) {
            *counts.entry(window).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn preserves_length() {
        let mut rng = StdRng::seed_from_u64(7);
        let seq = b"ACGTACGTACGTACGTTTTTGGGG";
        assert_eq!(kmer_shuffle(seq, 3, &mut rng).len(), seq.len());
    }

    #[test]
    fn preserves_the_exact_kmer_multiset() {
        let seq = b"GGCCATATAGGCCGGCCATATAGGCC";
        for seed in 0..20 {
            let shuffled = kmer_shuffle(seq, 3, &mut StdRng::seed_from_u64(seed));
            assert_eq!(kmer_counts(&shuffled, 3), kmer_counts(seq, 3));
        }
    }

    #[test]
    fn disturbs_site_placement() {
        // shuffling must not reproduce the input every round
        let seq = b"GGCCATATAGGCCGGCCATATAGGCCTTTAAACCCGGG";
        let changed = (0..20)
            .map(|seed| kmer_shuffle(seq, 3, &mut StdRng::seed_from_u64(seed)))
            .filter(|shuffled| shuffled.as_slice() != seq.as_slice())
            .count();
        assert!(changed > 0);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let seq = b"ACGTACGTAAACCCGGGTTTACGT";
        let first = kmer_shuffle(seq, 3, &mut StdRng::seed_from_u64(11));
        let second = kmer_shuffle(seq, 3, &mut StdRng::seed_from_u64(11));
        assert_eq!(first, second);
    }

    #[test]
    fn keeps_the_seed_context() {
        let seq = b"ACGTACGTACGT";
        let shuffled = kmer_shuffle(seq, 3, &mut StdRng::seed_from_u64(3));
        assert_eq!(&shuffled[..2], &seq[..2]);
    }

    #[test]
    fn single_letter_sequence_stays_single_letter() {
        let seq = b"AAAAAAAAAA";
        let shuffled = kmer_shuffle(seq, 3, &mut StdRng::seed_from_u64(5));
        assert_eq!(shuffled, seq.to_vec());
    }

    #[test]
    fn short_sequence_falls_back_to_plain_shuffle() {
        let mut rng = StdRng::seed_from_u64(9);
        let shuffled = kmer_shuffle(b"ACG", 3, &mut rng);
        let mut sorted = shuffled.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, b"ACG".to_vec());
    }
}
