use crate::structure::pdb::Structure;
use crate::utils::{global_align, Result, SeqKind};
use bio::alignment::AlignmentOperation;
use nalgebra::{Matrix3, Vector3};

const MIN_MATCHED: usize = 3;

/// Rigid-body fit of the moving structure onto the fixed one.
#[derive(Debug, Clone)]
pub struct Superposition {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
    pub rmsd: f64,
    pub matched: usize,
}

impl Superposition {
    pub fn transform(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * point + self.translation
    }

    /// Applies the fit to every residue of a structure.
    pub fn apply(&self, structure: &Structure) -> Structure {
        let mut moved = structure.clone();
        for residue in &mut moved.residues {
            residue.coord = self.transform(&residue.coord);
        }
        moved
    }
}

/// Pairs residues by globally aligning the one-letter sequences, then fits
/// the moving CA set onto the fixed one by the Kabsch procedure.
pub fn superpose(fixed: &Structure, moving: &Structure) -> Result<Superposition> {
    let pairs = paired_residues(fixed, moving);
    if pairs.len() < MIN_MATCHED {
        return Err(format!(
            "Superposition needs at least {} aligned residues, found {}",
            MIN_MATCHED,
            pairs.len()
        ));
    }

    let fixed_points: Vec<Vector3<f64>> = pairs
        .iter()
        .map(|&(fi, _)| fixed.residues[fi].coord)
        .collect();
    let moving_points: Vec<Vector3<f64>> = pairs
        .iter()
        .map(|&(_, mi)| moving.residues[mi].coord)
        .collect();

    let centroid_fixed = centroid(&fixed_points);
    let centroid_moving = centroid(&moving_points);

    let mut covariance = Matrix3::zeros();
    for (fixed_point, moving_point) in fixed_points.iter().zip(&moving_points) {
        covariance += (moving_point - centroid_moving) * (fixed_point - centroid_fixed).transpose();
    }

    let svd = covariance.svd(true, true);
    let u = svd.u.ok_or("Singular value decomposition failed")?;
    let v_t = svd.v_t.ok_or("Singular value decomposition failed")?;
    let det = (v_t.transpose() * u.transpose()).determinant();
    let correction = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, det.signum()));
    let rotation = v_t.transpose() * correction * u.transpose();
    let translation = centroid_fixed - rotation * centroid_moving;

    let squared_sum: f64 = fixed_points
        .iter()
        .zip(&moving_points)
        .map(|(fixed_point, moving_point)| {
            (rotation * moving_point + translation - fixed_point).norm_squared()
        })
        .sum();
    Ok(Superposition {
        rotation,
        translation,
        rmsd: (squared_sum / pairs.len() as f64).sqrt(),
        matched: pairs.len(),
    })
}

fn centroid(points: &[Vector3<f64>]) -> Vector3<f64> {
    points.iter().sum::<Vector3<f64>>() / points.len() as f64
}

/// Residue index pairs from the aligned columns of the two CA sequences.
fn paired_residues(fixed: &Structure, moving: &Structure) -> Vec<(usize, usize)> {
    let alignment = global_align(SeqKind::Protein, &fixed.sequence(), &moving.sequence());
    let mut pairs = Vec::new();
    let mut fixed_index = alignment.xstart;
    let mut moving_index = alignment.ystart;
    for op in &alignment.operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                pairs.push((fixed_index, moving_index));
                fixed_index += 1;
                moving_index += 1;
            }
            AlignmentOperation::Ins => fixed_index += 1,
            AlignmentOperation::Del => moving_index += 1,
            AlignmentOperation::Xclip(n) => fixed_index += n,
            AlignmentOperation::Yclip(n) => moving_index += n,
        }
    }
    pairs
}
