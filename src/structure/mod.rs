mod pdb;
mod superpose;

pub use pdb::{write_ca_pdb, CaResidue, Structure};
pub use superpose::{superpose, Superposition};
