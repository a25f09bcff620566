//! Analysis modules.
//!
//! Grouping, binning, RFM and descriptive statistics over a [`crate::table::Table`].

pub mod aggregator;
pub mod binning;
pub mod regions;
pub mod rfm;
pub mod stats;

pub use aggregator::*;
pub use binning::*;
pub use rfm::*;
pub use stats::*;
