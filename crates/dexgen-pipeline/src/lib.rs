//! Generation pipelines for the offline Pokédex data files.
//!
//! - `basics`: species list with localized names, types and artwork
//! - `details`: stats, abilities and evolution per species
//! - `merge`: refreshes only the evolution field of an existing details file

use dexgen_core::EntityId;
use std::fmt;

pub mod basics;
pub mod details;
pub mod localization;
pub mod merge;
pub mod pool;
pub mod stats;
pub mod store;

pub use basics::*;
pub use details::*;
pub use localization::*;
pub use merge::*;
pub use pool::*;
pub use stats::*;
pub use store::*;

/// Per-id progress line: `#id (position/total)`, position 1-based.
pub fn progress_label(id: EntityId, index: usize, total: usize) -> String {
    format!("#{} ({}/{})", id, index + 1, total)
}

/// Outcome of one pipeline run. Failed ids were logged and skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub written: usize,
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} written, {} failed",
            self.written,
            self.total,
            self.failed.len()
        )
    }
}
