//! Moving variant coordinates between genome builds.
//!
//! Records are exchanged with the mapper as BED intervals:
//!
//! ```text
//! chr8    60008   60009   8_60009_G_T,8,60009,G,T,0.012,...
//! ```
//!
//! The fourth field carries every column of the record joined by `,`, so a
//! lifted interval can be turned back into a full record. The mapper itself is
//! behind [`CoordinateMapper`]; [`LiftOverTool`] runs a `liftOver`-compatible
//! executable with a timeout.

pub mod bed;
pub mod lifter;
pub mod tool;

pub use bed::BedInterval;
pub use lifter::BuildLifter;
pub use tool::{CoordinateMapper, LiftOutput, LiftOverConfig, LiftOverTool};
