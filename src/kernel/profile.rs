use crate::kernel::gappy_pair::GappyPairKernel;
use crate::kernel::svm::LinearSvm;
use crate::utils::Result;
use figplot::{Curve, FigPlot, Legend, Line};
use std::collections::HashMap;
use std::io::Write;

/// Per-residue share of the decision value. The shares sum to
/// `decision_value(features(seq))` up to float error.
#[derive(Debug, Clone)]
pub struct ResidueContribution {
    pub pos: usize,
    pub residue: char,
    pub contribution: f64,
}

/// Splits each feature's weight * value evenly across the residue
/// positions that produced the feature, and spreads the bias uniformly.
pub fn prediction_profile(
    kernel: &GappyPairKernel,
    svm: &LinearSvm,
    seq: &[u8],
) -> Vec<ResidueContribution> {
    let occurrences = kernel.occurrences(seq);
    let mut counts: HashMap<u32, f64> = HashMap::new();
    for (feature, _positions) in &occurrences {
        *counts.entry(*feature).or_insert(0.0) += 1.0;
    }
    let norm = counts.values().map(|v| v * v).sum::<f64>().sqrt();

    let mut shares = vec![0.0f64; seq.len()];
    if norm > 0.0 {
        for (feature, positions) in &occurrences {
            let Some(&weight) = svm.weights.get(feature) else {
                continue;
            };
            // Each occurrence adds 1/norm to the normalized feature value.
            let share = weight / norm / positions.len() as f64;
            for &pos in positions {
                shares[pos] += share;
            }
        }
    }
    if !seq.is_empty() {
        let bias_share = svm.bias / seq.len() as f64;
        for share in &mut shares {
            *share += bias_share;
        }
    }

    seq.iter()
        .zip(shares)
        .enumerate()
        .map(|(pos, (&residue, contribution))| ResidueContribution {
            pos,
            residue: residue as char,
            contribution,
        })
        .collect()
}

pub fn write_profile(writer: &mut impl Write, profile: &[ResidueContribution]) -> Result<()> {
    writeln!(writer, "pos\tresidue\tcontribution")
        .map_err(|e| format!("Failed to write profile: {}", e))?;
    for point in profile {
        writeln!(
            writer,
            "{}\t{}\t{:.6}",
            point.pos + 1,
            point.residue,
            point.contribution
        )
        .map_err(|e| format!("Failed to write profile: {}", e))?;
    }
    Ok(())
}

const PROFILE_Y_UNITS: f64 = 30.0;
const PROFILE_X_STEP: f64 = 4.0;

/// Contribution curve around a zero baseline, scaled to a fixed vertical
/// extent.
pub fn profile_figplot(seq_id: &str, profile: &[ResidueContribution]) -> FigPlot {
    let mut plot = FigPlot::new();
    let peak = profile
        .iter()
        .map(|point| point.contribution.abs())
        .fold(0.0, f64::max)
        .max(f64::MIN_POSITIVE);
    let mid = PROFILE_Y_UNITS / 2.0;
    let points = profile
        .iter()
        .map(|point| {
            let x = point.pos as f64 * PROFILE_X_STEP;
            let y = mid - point.contribution / peak * (mid - 1.0);
            (x, y)
        })
        .collect();
    let width = (profile.len().saturating_sub(1)) as f64 * PROFILE_X_STEP;
    plot.lines.push(Line {
        start: (0.0, mid),
        end: (width, mid),
        color: "#C0C0C0".to_string(),
        width: 0.5,
    });
    plot.curves.push(Curve {
        points,
        color: "#1F78B4".to_string(),
        width: 1.0,
    });
    plot.legend = Legend {
        xpos: 0,
        ypos: PROFILE_Y_UNITS as u32 + 2,
        height: 4,
        labels: vec![(
            format!("{} per-residue contribution", seq_id),
            "#1F78B4".to_string(),
        )],
    };
    plot
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn trained_svm(kernel: &GappyPairKernel) -> LinearSvm {
        let seqs: [&[u8]; 4] = [b"KKKAKKAKKK", b"KAKKKKAKKA", b"DDDADDADDD", b"DADDDDADDA"];
        let samples: Vec<_> = seqs.iter().map(|s| kernel.features(s)).collect();
        LinearSvm::train(&samples, &[1, 1, -1, -1], 0.01, 30, 5)
    }

    #[test]
    fn profile_sums_to_the_decision_value() {
        let kernel = GappyPairKernel::new(1, 3).unwrap();
        let svm = trained_svm(&kernel);
        let seq = b"KKKADKAKKD";
        let profile = prediction_profile(&kernel, &svm, seq);
        let total: f64 = profile.iter().map(|point| point.contribution).sum();
        let decision = svm.decision_value(&kernel.features(seq));
        assert_relative_eq!(total, decision, epsilon = 1e-9);
    }

    #[test]
    fn profile_covers_every_residue() {
        let kernel = GappyPairKernel::new(1, 3).unwrap();
        let svm = trained_svm(&kernel);
        let profile = prediction_profile(&kernel, &svm, b"KKKADKAKKD");
        assert_eq!(profile.len(), 10);
        assert_eq!(profile[0].pos, 0);
        assert_eq!(profile[9].residue, 'D');
    }

    #[test]
    fn profile_tsv_has_a_header_and_one_row_per_residue() {
        let kernel = GappyPairKernel::new(1, 3).unwrap();
        let svm = trained_svm(&kernel);
        let profile = prediction_profile(&kernel, &svm, b"KKKAD");
        let mut buffer = Vec::new();
        write_profile(&mut buffer, &profile).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 6);
        assert!(text.starts_with("pos\tresidue\tcontribution"));
    }

    #[test]
    fn profile_plot_has_a_curve_and_baseline() {
        let kernel = GappyPairKernel::new(1, 3).unwrap();
        let svm = trained_svm(&kernel);
        let profile = prediction_profile(&kernel, &svm, b"KKKADKAKKD");
        let plot = profile_figplot("p1", &profile);
        assert_eq!(plot.curves.len(), 1);
        assert_eq!(plot.curves[0].points.len(), 10);
        assert_eq!(plot.lines.len(), 1);
    }
}
