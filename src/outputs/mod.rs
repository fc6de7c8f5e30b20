//! Output of normalized records.
//!
//! - [`json`]: dated JSON files for the persistence layer, or JSON on stdout

pub mod json;
