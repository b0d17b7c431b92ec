use crate::utils::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Random disjoint train/test partition of 0..n. The training set holds
/// exactly floor(train_frac * n) indices; both sets must be non-empty.
pub fn split_indices(n: usize, train_frac: f64, seed: u64) -> Result<SplitIndices> {
    if !(0.0..1.0).contains(&train_frac) || train_frac == 0.0 {
        return Err(format!(
            "Training fraction must be in (0, 1), got {}",
            train_frac
        ));
    }
    let num_train = (train_frac * n as f64).floor() as usize;
    if num_train == 0 || num_train == n {
        return Err(format!(
            "Cannot split {} samples with training fraction {}",
            n, train_frac
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    let test = order.split_off(num_train);
    Ok(SplitIndices { train: order, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_exact_and_disjoint() {
        let split = split_indices(17, 0.75, 7).unwrap();
        assert_eq!(split.train.len(), 12); // floor(0.75 * 17)
        assert_eq!(split.test.len(), 5);
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..17).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_reproduces_the_split() {
        let first = split_indices(40, 0.75, 11).unwrap();
        let second = split_indices(40, 0.75, 11).unwrap();
        assert_eq!(first.train, second.train);
        assert_eq!(first.test, second.test);
    }

    #[test]
    fn degenerate_fractions_are_rejected() {
        assert!(split_indices(10, 0.0, 1).is_err());
        assert!(split_indices(10, 1.0, 1).is_err());
        assert!(split_indices(2, 0.1, 1).is_err());
    }
}
