//! Aggregation of findings into the final report.

use crate::mismatch::Mismatch;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// The outcome of one comparison run. Created fresh per invocation and
/// consumed immediately by the caller; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub passed: bool,
    pub mismatches: Vec<Mismatch>,
}

impl ComparisonReport {
    /// Drop every mismatch whose scope starts with `prefix`, recomputing
    /// `passed`. Callers use this to discard expected artifacts of a given
    /// test's race conditions (e.g. everything under `clone_test_db`).
    pub fn filter_scope_prefix(mut self, prefix: &str) -> Self {
        self.mismatches.retain(|m| !m.scope.starts_with(prefix));
        self.passed = self.mismatches.is_empty();
        self
    }
}

/// Order-insensitive collector for mismatches produced by concurrent
/// per-namespace tasks.
///
/// Deduplicates exact `(scope, reason)` pairs and enforces the presence
/// invariant: a scope reported missing on either side never also carries
/// finer-grained findings. Output order is deterministic regardless of task
/// completion order because [`finish`](Self::finish) sorts by category rank,
/// then scope, then reason.
#[derive(Debug, Default)]
pub struct MismatchCollector {
    entries: Vec<Mismatch>,
    seen: HashSet<Mismatch>,
    suppressed: BTreeSet<String>,
}

impl MismatchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mismatch: Mismatch) {
        if mismatch.reason.is_presence() {
            self.suppressed.insert(mismatch.scope.clone());
        }
        if self.seen.insert(mismatch.clone()) {
            self.entries.push(mismatch);
        }
    }

    pub fn extend(&mut self, mismatches: impl IntoIterator<Item = Mismatch>) {
        for m in mismatches {
            self.push(m);
        }
    }

    /// Seal the collector into a report. Suppression is applied here rather
    /// than in `push` so tasks may complete in any order.
    pub fn finish(mut self) -> ComparisonReport {
        self.entries.retain(|m| {
            m.reason.is_presence() || !self.suppressed.contains(&m.scope)
        });
        self.entries.sort_by(|a, b| {
            a.reason
                .rank()
                .cmp(&b.reason.rank())
                .then_with(|| a.scope.cmp(&b.scope))
                .then_with(|| a.reason.as_str().cmp(b.reason.as_str()))
        });
        ComparisonReport {
            passed: self.entries.is_empty(),
            mismatches: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mismatch::MismatchReason;
    use crate::namespace::Namespace;

    #[test]
    fn test_empty_collector_passes() {
        let report = MismatchCollector::new().finish();
        assert!(report.passed);
        assert!(report.mismatches.is_empty());
    }

    #[test]
    fn test_deduplicates_exact_pairs() {
        let ns = Namespace::new("db", "coll");
        let mut collector = MismatchCollector::new();
        collector.push(Mismatch::collection(&ns, MismatchReason::Options));
        collector.push(Mismatch::collection(&ns, MismatchReason::Options));
        let report = collector.finish();
        assert_eq!(report.mismatches.len(), 1);
    }

    #[test]
    fn test_presence_suppresses_finer_findings_regardless_of_order() {
        let ns = Namespace::new("db", "gone");
        let mut collector = MismatchCollector::new();
        // Index finding lands before the presence finding, as can happen when
        // the metadata task finishes first.
        collector.push(Mismatch::index(&ns, "idx_a"));
        collector.push(Mismatch::collection(&ns, MismatchReason::MissingInDst));
        collector.push(Mismatch::collection(&ns, MismatchReason::RecordCount));
        let report = collector.finish();
        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0], ("db.gone", "missing in dst DB"));
    }

    #[test]
    fn test_suppression_does_not_cross_scopes() {
        let gone = Namespace::new("db", "gone");
        let kept = Namespace::new("db", "kept");
        let mut collector = MismatchCollector::new();
        collector.push(Mismatch::collection(&gone, MismatchReason::MissingInDst));
        collector.push(Mismatch::collection(&kept, MismatchReason::Options));
        // Database-scope hash finding shares a prefix but not a scope.
        collector.push(Mismatch::database("db", MismatchReason::Hash));
        let report = collector.finish();
        assert_eq!(report.mismatches.len(), 3);
    }

    #[test]
    fn test_output_order_is_category_then_scope() {
        let mut collector = MismatchCollector::new();
        collector.push(Mismatch::database("z_db", MismatchReason::Hash));
        collector.push(Mismatch::collection(
            &Namespace::new("a_db", "c2"),
            MismatchReason::Options,
        ));
        collector.push(Mismatch::index(&Namespace::new("a_db", "c1"), "idx"));
        collector.push(Mismatch::collection(
            &Namespace::new("m_db", "c9"),
            MismatchReason::MissingInSrc,
        ));
        let report = collector.finish();
        let rendered: Vec<(String, String)> = report
            .mismatches
            .iter()
            .map(|m| (m.scope.clone(), m.reason.as_str().to_string()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("m_db.c9".to_string(), "missing in src DB".to_string()),
                ("a_db.c2".to_string(), "options mismatch".to_string()),
                ("a_db.c1".to_string(), "idx".to_string()),
                ("z_db".to_string(), "hash mismatch".to_string()),
            ]
        );
    }

    #[test]
    fn test_filter_scope_prefix_recomputes_passed() {
        let mut collector = MismatchCollector::new();
        collector.push(Mismatch::collection(
            &Namespace::new("clone_test_db", "c1"),
            MismatchReason::RecordCount,
        ));
        let report = collector.finish().filter_scope_prefix("clone_test_db");
        assert!(report.passed);
    }
}
