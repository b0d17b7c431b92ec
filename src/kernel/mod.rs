mod gappy_pair;
mod labels;
mod profile;
mod split;
mod svm;

pub use gappy_pair::{GappyPairKernel, SparseVec};
pub use labels::match_labels;
pub use profile::{prediction_profile, profile_figplot, write_profile, ResidueContribution};
pub use split::{split_indices, SplitIndices};
pub use svm::{evaluate, Evaluation, LinearSvm};
