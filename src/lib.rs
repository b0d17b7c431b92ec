pub mod annot;
pub mod cli;
pub mod commands;
pub mod kernel;
pub mod motif;
pub mod msa;
pub mod structure;
pub mod synteny;
pub mod utils;
