//! Aggregation over the activity log for `mvtgen history`.

use std::collections::HashMap;

use super::logger::{ActivityEntry, Operation};

/// Per-operation counts.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationStat {
    pub operation: Operation,
    pub count: usize,
    pub failures: usize,
    /// Mean latency over entries that carry one.
    pub avg_latency_ms: Option<f64>,
}

impl OperationStat {
    pub fn success_pct(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            ((self.count - self.failures) as f64 / self.count as f64) * 100.0
        }
    }
}

/// Summary for `mvtgen history`.
#[derive(Debug)]
pub struct History {
    pub total: usize,
    pub operations: Vec<OperationStat>,
    /// Most recent entries, newest first.
    pub recent: Vec<ActivityEntry>,
}

/// Summarize `entries` (oldest first, as read from the log).
pub fn summarize(entries: &[ActivityEntry], recent_limit: usize) -> History {
    let mut by_op: HashMap<Operation, (usize, usize, u64, usize)> = HashMap::new();

    for entry in entries {
        let slot = by_op.entry(entry.operation).or_default();
        slot.0 += 1;
        if !entry.success {
            slot.1 += 1;
        }
        if let Some(ms) = entry.latency_ms {
            slot.2 += ms;
            slot.3 += 1;
        }
    }

    let mut operations: Vec<OperationStat> = by_op
        .into_iter()
        .map(|(operation, (count, failures, latency_sum, latency_n))| OperationStat {
            operation,
            count,
            failures,
            avg_latency_ms: (latency_n > 0).then(|| latency_sum as f64 / latency_n as f64),
        })
        .collect();
    operations.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.operation.to_string().cmp(&b.operation.to_string()))
    });

    let recent = entries.iter().rev().take(recent_limit).cloned().collect();

    History {
        total: entries.len(),
        operations,
        recent,
    }
}
