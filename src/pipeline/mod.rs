//! End-to-end harmonization of one summary-statistics table.
//!
//! ```text
//!                 normalize
//!                     |
//!       +-------------+--------------+
//!       |             |              |
//!  rsID with     rsID without    positional
//!  coordinates   coordinates         |
//!       |             |          [lift] (build change)
//!  [reposition]  coordinate          |
//!  (build change)  lookup      strand/switch lookup
//!       |             |              |
//!       +------ concatenate ---------+
//!              (rsID rows also produced by the positional path are dropped)
//! ```
//!
//! [`Harmonizer::run`] returns the harmonized table together with a
//! [`HarmonizeReport`] describing what every stage did.

pub mod engine;
pub mod report;

pub use engine::{HarmonizeConfig, Harmonizer};
pub use report::HarmonizeReport;
