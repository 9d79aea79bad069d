//! Output side of the engine.
//!
//! # Submodules
//!
//! - [`entry`]: renders an article record as a summary entry block
//! - [`merge`]: splices entry blocks into a category page or the site index
//! - [`report`]: writes the per-run JSON report

pub mod entry;
pub mod merge;
pub mod report;
