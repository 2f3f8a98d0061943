//! Analysis modules.
//!
//! Per-file summarization and table-level aggregation.

pub mod aggregator;
pub mod summarizer;

pub use aggregator::*;
pub use summarizer::summarize_file;
