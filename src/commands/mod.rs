pub mod align;
pub mod classify;
pub mod domains;
pub mod mart;
pub mod scan;
pub mod superpose;
pub mod synteny;
