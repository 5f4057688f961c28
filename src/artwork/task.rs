use serde::Serialize;
use std::path::PathBuf;

use crate::error::ArtworkError;
use crate::shortcuts::record::ShortcutRecord;

/// Where a task ended up. Everything but `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    /// Grid downloaded (or already on disk)
    Found,
    /// Grid downloaded through the relaxed query
    FoundAlternate,
    /// Grid composed from a cover
    Synthesized,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

/// One shortcut's trip through the artwork pipeline
#[derive(Debug, Clone)]
pub struct GridImageTask {
    pub record: ShortcutRecord,
    pub target_path: PathBuf,
    status: TaskStatus,
    /// Target existed before the run, nothing was fetched
    pub already_present: bool,
    /// Last error seen, for the final report
    pub failure: Option<String>,
}

impl GridImageTask {
    pub fn new(record: ShortcutRecord, target_path: PathBuf) -> Self {
        Self {
            record,
            target_path,
            status: TaskStatus::Pending,
            already_present: false,
            failure: None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Move to a terminal state; allowed exactly once
    pub fn settle(&mut self, status: TaskStatus) -> Result<(), ArtworkError> {
        if self.status.is_terminal() || !status.is_terminal() {
            return Err(ArtworkError::InvalidTransition {
                app_id: self.record.app_id,
            });
        }
        self.status = status;
        Ok(())
    }
}

/// Run-level counts, the only state shared across records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTally {
    pub found: usize,
    pub alternate: usize,
    pub synthesized: usize,
    pub failed: usize,
    /// Found because the file was already there
    pub skipped_existing: usize,
}

impl RunTally {
    pub fn record(&mut self, task: &GridImageTask) {
        match task.status() {
            TaskStatus::Found if task.already_present => self.skipped_existing += 1,
            TaskStatus::Found => self.found += 1,
            TaskStatus::FoundAlternate => self.alternate += 1,
            TaskStatus::Synthesized => self.synthesized += 1,
            TaskStatus::Failed => self.failed += 1,
            TaskStatus::Pending => {}
        }
    }

    /// True when at least one image was written this run
    pub fn updated(&self) -> bool {
        self.found + self.alternate + self.synthesized > 0
    }

    pub fn total(&self) -> usize {
        self.found + self.alternate + self.synthesized + self.failed + self.skipped_existing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> GridImageTask {
        let record = ShortcutRecord::new("Celeste", "\"/usr/bin/celeste\"", "1");
        GridImageTask::new(record, PathBuf::from("grid/1.png"))
    }

    #[test]
    fn settles_exactly_once() {
        let mut task = task();
        assert_eq!(task.status(), TaskStatus::Pending);

        task.settle(TaskStatus::Synthesized).unwrap();
        assert_eq!(task.status(), TaskStatus::Synthesized);

        assert!(matches!(
            task.settle(TaskStatus::Found),
            Err(ArtworkError::InvalidTransition { .. })
        ));
        assert_eq!(task.status(), TaskStatus::Synthesized);
    }

    #[test]
    fn cannot_settle_back_to_pending() {
        let mut task = task();
        assert!(task.settle(TaskStatus::Pending).is_err());
    }

    #[test]
    fn tally_counts_each_outcome() {
        let mut tally = RunTally::default();
        for status in [
            TaskStatus::Found,
            TaskStatus::FoundAlternate,
            TaskStatus::Synthesized,
            TaskStatus::Failed,
            TaskStatus::Failed,
        ] {
            let mut t = task();
            t.settle(status).unwrap();
            tally.record(&t);
        }

        let mut existing = task();
        existing.already_present = true;
        existing.settle(TaskStatus::Found).unwrap();
        tally.record(&existing);

        assert_eq!(tally.found, 1);
        assert_eq!(tally.alternate, 1);
        assert_eq!(tally.synthesized, 1);
        assert_eq!(tally.failed, 2);
        assert_eq!(tally.skipped_existing, 1);
        assert_eq!(tally.total(), 6);
        assert!(tally.updated());
    }

    #[test]
    fn tally_without_writes_is_not_updated() {
        let mut tally = RunTally::default();
        let mut t = task();
        t.settle(TaskStatus::Failed).unwrap();
        tally.record(&t);
        assert!(!tally.updated());
    }
}
