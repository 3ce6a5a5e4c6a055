//! Bulk ingest reporting.

use docrepo_core::ItemOutcome;
use std::collections::BTreeMap;
use std::time::Duration;

/// Summary of one bulk ingest run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Items submitted.
    pub total: usize,
    /// Items created.
    pub succeeded: usize,
    /// Items that failed.
    pub failed: usize,
    /// Wall-clock time of the run.
    pub duration: Duration,
    /// Items per second.
    pub items_per_second: f64,
    /// Failure messages and how often each occurred.
    pub failures: BTreeMap<String, usize>,
}

impl IngestReport {
    /// Builds a report from bulk outcomes.
    pub fn from_outcomes(outcomes: &[ItemOutcome], duration: Duration) -> Self {
        let mut failures = BTreeMap::new();
        for outcome in outcomes.iter().filter(|o| !o.success()) {
            *failures.entry(outcome.error()).or_insert(0) += 1;
        }

        let total = outcomes.len();
        let failed = failures.values().sum();
        let items_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total,
            succeeded: total - failed,
            failed,
            duration,
            items_per_second,
            failures,
        }
    }

    /// Returns true if every item was created.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total items: {}", self.total);
        println!("Succeeded: {}", self.succeeded);
        println!("Failed: {}", self.failed);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.0} items/sec", self.items_per_second);
        for (message, count) in &self.failures {
            println!("  {} x {}", count, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrepo_core::BulkItemError;

    #[test]
    fn counts_and_groups_failures() {
        let failure = || BulkItemError::Other {
            message: "boom".to_string(),
        };
        let outcomes = vec![
            ItemOutcome { id: "a".into(), result: Ok(()) },
            ItemOutcome { id: "b".into(), result: Err(failure()) },
            ItemOutcome { id: "c".into(), result: Err(failure()) },
        ];

        let report = IngestReport::from_outcomes(&outcomes, Duration::from_secs(1));
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.failures.get("boom"), Some(&2));
        assert!((report.items_per_second - 3.0).abs() < f64::EPSILON);
        assert!(!report.all_succeeded());
    }

    #[test]
    fn zero_duration_has_zero_throughput() {
        let report = IngestReport::from_outcomes(&[], Duration::ZERO);
        assert_eq!(report.items_per_second, 0.0);
        assert!(report.all_succeeded());
    }
}
