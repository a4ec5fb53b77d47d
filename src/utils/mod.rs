//! Shared helpers for chromosome names and alleles.

pub mod validation;
