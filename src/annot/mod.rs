mod domain_db;
mod mart;

pub use domain_db::{DomainAnnotation, DomainDb};
pub use mart::{DatasetSpec, Mart};
