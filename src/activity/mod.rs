//! Activity log: one JSONL line per workflow operation.
//!
//! Log file: `~/.mvtgen/activity.jsonl` (disable with `[activity] enabled =
//! false` or `MVTGEN_ACTIVITY_LOG=0`).

pub mod logger;
pub mod report;

pub use logger::{ActivityEntry, ActivityLog, Operation};
