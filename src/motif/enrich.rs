use crate::motif::{kmer_shuffle, scan_record, Pwm};
use crate::utils::{Result, SeqRecord};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use statrs::distribution::{ContinuousCDF, Normal};

#[derive(Debug, Clone)]
pub struct Enrichment {
    pub observed: usize,
    pub bg_mean: f64,
    pub bg_sd: f64,
    pub z_score: f64,
    pub p_value: f64,
    pub fold: f64,
}

/// Compares the observed hit count against `num_shuffles` k-mer-preserving
/// shuffled backgrounds (both strands counted, like the observed scan). Each shuffle
/// round derives its own RNG from `seed`, so rounds are independent and the
/// whole computation is reproducible.
pub fn motif_enrichment(
    pwm: &Pwm,
    records: &[SeqRecord],
    min_score_frac: f64,
    num_shuffles: usize,
    shuffle_k: usize,
    seed: u64,
) -> Result<Enrichment> {
    if num_shuffles < 2 {
        return Err("Enrichment needs at least 2 shuffles".to_string());
    }
    let observed: usize = records
        .iter()
        .map(|record| scan_record(pwm, record, min_score_frac).len())
        .sum();

    let background: Vec<usize> = (0..num_shuffles)
        .into_par_iter()
        .map(|round| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(round as u64));
            records
                .iter()
                .map(|record| {
                    let shuffled = SeqRecord {
                        id: record.id.clone(),
                        desc: None,
                        seq: kmer_shuffle(&record.seq, shuffle_k, &mut rng),
                    };
                    scan_record(pwm, &shuffled, min_score_frac).len()
                })
                .sum()
        })
        .collect();

    let n = background.len() as f64;
    let bg_mean = background.iter().sum::<usize>() as f64 / n;
    let variance = background
        .iter()
        .map(|&count| (count as f64 - bg_mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    let bg_sd = variance.sqrt();

    let z_score = if bg_sd > 0.0 {
        (observed as f64 - bg_mean) / bg_sd
    } else if observed as f64 > bg_mean {
        f64::INFINITY
    } else {
        0.0
    };
    let normal = Normal::new(0.0, 1.0).map_err(|e| e.to_string())?;
    let p_value = if z_score.is_infinite() {
        0.0
    } else {
        1.0 - normal.cdf(z_score)
    };
    let fold = if bg_mean > 0.0 {
        observed as f64 / bg_mean
    } else {
        f64::INFINITY
    };

    Ok(Enrichment {
        observed,
        bg_mean,
        bg_sd,
        z_score,
        p_value,
        fold,
    })
}
