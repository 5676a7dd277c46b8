//! Activity log for analyses, report loads and exports.
//!
//! [`logger`] appends one JSONL line per attempt; [`reporter`] aggregates
//! those lines for `docinsight history` and the viewer.

pub mod logger;
pub mod reporter;
