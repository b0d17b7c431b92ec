mod center_star;
mod distance;
mod tree;

pub use center_star::{center_star, Msa};
pub use distance::{condensed_index, kmer_distances, DistMatrix};
pub use tree::{neighbor_joining, tree_figplot, upgma, Tree};
