//! Lookup-based identity resolution.
//!
//! - [`CoordinateResolver`]: rsID -> chromosome/position
//! - [`StrandResolver`]: positional identifier -> rsID, probing four allele
//!   orientations ([`Orientation`]) because providers report alleles in
//!   inconsistent order and strand relative to the reference.
//!
//! Both are best-effort: a record without a unique match keeps what it had.

pub mod coordinates;
pub mod strand;

pub use coordinates::CoordinateResolver;
pub use strand::{Orientation, StrandResolver};
