use crate::kernel::gappy_pair::{dot, SparseVec};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;

/// Linear SVM over sparse feature vectors, trained by Pegasos-style
/// stochastic subgradient descent. The bias term is left unregularized.
#[derive(Debug, Clone)]
pub struct LinearSvm {
    pub weights: SparseVec,
    pub bias: f64,
    pub lambda: f64,
}

impl LinearSvm {
    pub fn train(
        samples: &[SparseVec],
        labels: &[i8],
        lambda: f64,
        epochs: usize,
        seed: u64,
    ) -> Self {
        assert_eq!(samples.len(), labels.len());
        let mut weights: SparseVec = HashMap::new();
        let mut bias = 0.0;
        // True weights are scale * weights; the shrink step then touches
        // one scalar instead of every stored key.
        let mut scale = 1.0f64;
        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut step = 0usize;

        for _epoch in 0..epochs {
            order.shuffle(&mut rng);
            for &index in &order {
                step += 1;
                // Offsetting the schedule keeps 1 - eta * lambda strictly
                // positive; at t = 1 the plain 1/(lambda t) rate zeroes the
                // scale and the margin update divides by it.
                let eta = 1.0 / (lambda * (step + 1) as f64);
                let label = labels[index] as f64;
                let margin = label * (scale * dot(&weights, &samples[index]) + bias);
                scale *= 1.0 - eta * lambda;
                if margin < 1.0 {
                    for (&feature, &value) in &samples[index] {
                        *weights.entry(feature).or_insert(0.0) += eta * label * value / scale;
                    }
                    bias += eta * label;
                }
                if scale < 1e-9 {
                    for value in weights.values_mut() {
                        *value *= scale;
                    }
                    scale = 1.0;
                }
            }
        }

        for value in weights.values_mut() {
            *value *= scale;
        }
        LinearSvm {
            weights,
            bias,
            lambda,
        }
    }

    pub fn decision_value(&self, features: &SparseVec) -> f64 {
        dot(&self.weights, features) + self.bias
    }

    pub fn predict(&self, features: &SparseVec) -> i8 {
        if self.decision_value(features) >= 0.0 {
            1
        } else {
            -1
        }
    }
}

/// Held-out performance: accuracy plus the 2x2 confusion table indexed
/// [truth][prediction] with 0 = positive, 1 = negative.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub accuracy: f64,
    pub confusion: [[usize; 2]; 2],
}

pub fn evaluate(svm: &LinearSvm, samples: &[SparseVec], labels: &[i8]) -> Evaluation {
    let mut confusion = [[0usize; 2]; 2];
    for (features, &label) in samples.iter().zip(labels) {
        let truth = if label == 1 { 0 } else { 1 };
        let called = if svm.predict(features) == 1 { 0 } else { 1 };
        confusion[truth][called] += 1;
    }
    let correct = confusion[0][0] + confusion[1][1];
    Evaluation {
        accuracy: correct as f64 / samples.len().max(1) as f64,
        confusion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::gappy_pair::GappyPairKernel;

    fn toy_problem() -> (Vec<SparseVec>, Vec<i8>) {
        // Positives are lysine-rich, negatives aspartate-rich.
        let kernel = GappyPairKernel::new(1, 3).unwrap();
        let positives = ["KKKAKKAKKK", "KAKKKKAKKA", "KKKKAAKKKK", "AKKKAKKKKA"];
        let negatives = ["DDDADDADDD", "DADDDDADDA", "DDDDAADDDD", "ADDDADDDDA"];
        let mut samples = Vec::new();
        let mut labels = Vec::new();
        for seq in positives {
            samples.push(kernel.features(seq.as_bytes()));
            labels.push(1);
        }
        for seq in negatives {
            samples.push(kernel.features(seq.as_bytes()));
            labels.push(-1);
        }
        (samples, labels)
    }

    #[test]
    fn separable_data_is_classified_perfectly() {
        let (samples, labels) = toy_problem();
        let svm = LinearSvm::train(&samples, &labels, 0.01, 50, 3);
        let eval = evaluate(&svm, &samples, &labels);
        assert_eq!(eval.accuracy, 1.0);
        assert_eq!(eval.confusion[0][1] + eval.confusion[1][0], 0);
    }

    #[test]
    fn first_epoch_weights_stay_finite() {
        let (samples, labels) = toy_problem();
        let svm = LinearSvm::train(&samples, &labels, 0.01, 1, 42);
        assert!(svm.bias.is_finite());
        for (&feature, &value) in &svm.weights {
            assert!(value.is_finite(), "weight of feature {} is not finite", feature);
        }
        assert!(svm.decision_value(&samples[0]).is_finite());
    }

    #[test]
    fn training_is_deterministic_for_a_fixed_seed() {
        let (samples, labels) = toy_problem();
        let first = LinearSvm::train(&samples, &labels, 0.01, 20, 9);
        let second = LinearSvm::train(&samples, &labels, 0.01, 20, 9);
        assert_eq!(first.bias, second.bias);
        assert_eq!(
            first.decision_value(&samples[0]),
            second.decision_value(&samples[0])
        );
    }

    #[test]
    fn confusion_counts_cover_every_sample() {
        let (samples, labels) = toy_problem();
        let svm = LinearSvm::train(&samples, &labels, 0.1, 5, 1);
        let eval = evaluate(&svm, &samples, &labels);
        let total: usize = eval.confusion.iter().flatten().sum();
        assert_eq!(total, samples.len());
    }
}
