//! Thread-safe progress counters for one stage.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// A point-in-time view of a [`ProgressTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.completed + self.failed)
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Completed: {}/{}, Failed: {}, Remaining: {}",
            self.completed,
            self.total,
            self.failed,
            self.remaining()
        )
    }
}

#[derive(Debug, Default)]
struct Counts {
    completed: usize,
    failed: usize,
}

/// Completion and failure counters shared by the tasks of a stage.
///
/// Both counters sit behind one lock so snapshots are never torn.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    counts: Mutex<Counts>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            counts: Mutex::new(Counts::default()),
        }
    }

    /// Count one finished task and return the updated snapshot.
    pub fn mark_completed(&self) -> ProgressSnapshot {
        self.update(|c| c.completed += 1)
    }

    /// Count one failed task and return the updated snapshot.
    pub fn mark_failed(&self) -> ProgressSnapshot {
        self.update(|c| c.failed += 1)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.update(|_| {})
    }

    pub fn is_complete(&self) -> bool {
        let s = self.snapshot();
        s.completed + s.failed == s.total
    }

    pub fn has_failures(&self) -> bool {
        self.snapshot().failed > 0
    }

    pub fn progress_string(&self) -> String {
        self.snapshot().to_string()
    }

    fn update(&self, f: impl FnOnce(&mut Counts)) -> ProgressSnapshot {
        // A poisoned lock still holds consistent counts.
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut counts);
        ProgressSnapshot {
            completed: counts.completed,
            failed: counts.failed,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn counts_and_progress_string() {
        let tracker = ProgressTracker::new(3);
        assert_eq!(
            tracker.progress_string(),
            "Completed: 0/3, Failed: 0, Remaining: 3"
        );

        tracker.mark_completed();
        let snapshot = tracker.mark_failed();
        assert_eq!(snapshot.remaining(), 1);
        assert!(tracker.has_failures());
        assert!(!tracker.is_complete());

        tracker.mark_completed();
        assert!(tracker.is_complete());
        assert_eq!(
            tracker.progress_string(),
            "Completed: 2/3, Failed: 1, Remaining: 0"
        );
    }

    #[tokio::test]
    async fn concurrent_marks_are_not_lost() {
        let tracker = Arc::new(ProgressTracker::new(200));
        let mut handles = Vec::new();
        for i in 0..200 {
            let tracker = Arc::clone(&tracker);
            handles.push(tokio::spawn(async move {
                if i % 4 == 0 {
                    tracker.mark_failed();
                } else {
                    tracker.mark_completed();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.completed, 150);
        assert_eq!(snapshot.failed, 50);
        assert!(tracker.is_complete());
    }
}
