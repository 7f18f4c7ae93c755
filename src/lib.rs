//! vep-sieve library main entry point.

pub mod check;
pub mod common;
pub mod consequence;
pub mod criteria;
pub mod error;
pub mod filter;
pub mod hgvs;
pub mod region;
pub mod variant;
pub mod vep;
