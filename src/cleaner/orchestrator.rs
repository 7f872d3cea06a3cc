//! Orchestrator for deletion batches.
//!
//! Roots are removed one after another on a single worker thread so several
//! large trees never compete for the same disk.

use serde::Serialize;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use crate::error::{ReaperError, Result};

use super::executor::{
    DeletionOutcome, DeletionProgress, DeletionRequest, RootRemover, DEFAULT_PROGRESS_INTERVAL,
};

/// Options for the delete engine.
#[derive(Debug, Clone)]
pub struct DeleteOptions {
    /// Files removed between two progress events.
    pub progress_interval: u64,
    /// Capacity of the bounded event channel.
    pub channel_capacity: usize,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            channel_capacity: 1024,
        }
    }
}

/// Event emitted by a deletion batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DeleteEvent {
    /// Removal of a root is about to start.
    RootStarted(DeletionRequest),
    /// Coalesced per-file progress.
    Progress(DeletionProgress),
    /// Last event for a root.
    Outcome(DeletionOutcome),
    /// Last event of the batch; one outcome per request, in request order.
    BatchFinished { outcomes: Vec<DeletionOutcome> },
}

/// Summary of a batch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Roots removed without any error.
    pub success_count: usize,
    /// Roots refused or only partially removed.
    pub failed_count: usize,
    /// Entries removed across all roots.
    pub removed_entries: u64,
    /// Entries left behind across all roots.
    pub failed_entries: u64,
}

/// Delete engine: removes confirmed roots sequentially.
pub struct DeleteEngine {
    options: DeleteOptions,
}

impl DeleteEngine {
    /// Create a new engine.
    pub fn new(options: DeleteOptions) -> Self {
        Self { options }
    }

    /// Start deleting `requests` in the order given.
    ///
    /// The caller must have obtained confirmation already; nothing is asked here.
    pub fn delete(&self, requests: Vec<DeletionRequest>) -> Result<DeleteBatch> {
        let (tx, rx) = mpsc::sync_channel(self.options.channel_capacity.max(1));
        let remover = RootRemover::new(self.options.progress_interval);

        let handle = thread::Builder::new()
            .name("reaper-delete".to_string())
            .spawn(move || run_batch(remover, requests, tx))
            .map_err(ReaperError::Spawn)?;

        Ok(DeleteBatch {
            events: rx,
            handle: Some(handle),
        })
    }

    /// Get summary statistics from outcomes.
    pub fn summarize(outcomes: &[DeletionOutcome]) -> DeleteSummary {
        let mut summary = DeleteSummary::default();

        for outcome in outcomes {
            if outcome.succeeded {
                summary.success_count += 1;
            } else {
                summary.failed_count += 1;
            }
            summary.removed_entries += outcome.removed_entry_count;
            summary.failed_entries += outcome.failed_entry_count;
        }

        summary
    }
}

impl Default for DeleteEngine {
    fn default() -> Self {
        Self::new(DeleteOptions::default())
    }
}

fn run_batch(
    remover: RootRemover,
    requests: Vec<DeletionRequest>,
    tx: SyncSender<DeleteEvent>,
) -> Result<()> {
    tracing::info!(roots = requests.len(), "Deletion batch started");

    let mut outcomes = Vec::with_capacity(requests.len());
    let mut fatal: Option<ReaperError> = None;

    for request in requests {
        if fatal.is_some() {
            tracing::warn!(root = %request.root_path.display(), "Skipped after storage failure");
            let outcome = DeletionOutcome::untouched(&request.root_path);
            let _ = tx.send(DeleteEvent::Outcome(outcome.clone()));
            outcomes.push(outcome);
            continue;
        }

        let _ = tx.send(DeleteEvent::RootStarted(request.clone()));

        let report = remover.remove(&request.root_path, |progress| {
            let _ = tx.send(DeleteEvent::Progress(progress));
        });

        tracing::info!(
            root = %request.root_path.display(),
            succeeded = report.outcome.succeeded,
            removed = report.outcome.removed_entry_count,
            failed = report.outcome.failed_entry_count,
            "Root finished"
        );

        fatal = report.fatal;
        let _ = tx.send(DeleteEvent::Outcome(report.outcome.clone()));
        outcomes.push(report.outcome);
    }

    let summary = DeleteEngine::summarize(&outcomes);
    tracing::info!(
        succeeded = summary.success_count,
        failed = summary.failed_count,
        removed = summary.removed_entries,
        "Deletion batch finished"
    );

    let _ = tx.send(DeleteEvent::BatchFinished { outcomes });

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Handle on a running deletion batch.
///
/// Deletion cannot be cancelled; dropping the handle waits for the batch to end.
pub struct DeleteBatch {
    events: Receiver<DeleteEvent>,
    handle: Option<JoinHandle<Result<()>>>,
}

impl DeleteBatch {
    /// Drain every event and return the outcomes in request order.
    ///
    /// Fails when a storage failure aborted the batch; every root still got an
    /// outcome event in that case.
    pub fn wait(mut self) -> Result<Vec<DeletionOutcome>> {
        let mut outcomes = Vec::new();
        for event in self.by_ref() {
            if let DeleteEvent::BatchFinished { outcomes: all } = event {
                outcomes = all;
            }
        }

        self.join()?;
        Ok(outcomes)
    }

    fn join(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(payload) => std::panic::resume_unwind(payload),
            },
            None => Ok(()),
        }
    }
}

impl Iterator for DeleteBatch {
    type Item = DeleteEvent;

    fn next(&mut self) -> Option<DeleteEvent> {
        self.events.recv().ok()
    }
}

impl Drop for DeleteBatch {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            while self.events.recv().is_ok() {}
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_roots(count: usize) -> (TempDir, Vec<DeletionRequest>) {
        let tmp = TempDir::new().unwrap();
        let mut requests = Vec::new();

        for i in 0..count {
            let root = tmp.path().join(format!("root-{}", i));
            fs::create_dir_all(root.join("nested")).unwrap();
            fs::write(root.join("a.bin"), "x".repeat(100)).unwrap();
            fs::write(root.join("nested/b.bin"), "x".repeat(100)).unwrap();
            requests.push(DeletionRequest::new(root, 2));
        }

        (tmp, requests)
    }

    #[test]
    fn test_delete_all_sequentially() {
        let (_tmp, requests) = create_roots(4);
        let paths: Vec<PathBuf> = requests.iter().map(|r| r.root_path.clone()).collect();

        let outcomes = DeleteEngine::default().delete(requests).unwrap().wait().unwrap();

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| o.succeeded));
        // Request order is preserved
        let order: Vec<PathBuf> = outcomes.iter().map(|o| o.root_path.clone()).collect();
        assert_eq!(order, paths);
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[test]
    fn test_event_order_per_root() {
        let (_tmp, requests) = create_roots(2);
        let events: Vec<DeleteEvent> = DeleteEngine::default().delete(requests).unwrap().collect();

        assert!(matches!(events.first(), Some(DeleteEvent::RootStarted(_))));
        assert!(matches!(
            events.last(),
            Some(DeleteEvent::BatchFinished { outcomes }) if outcomes.len() == 2
        ));

        let outcome_count = events
            .iter()
            .filter(|e| matches!(e, DeleteEvent::Outcome(_)))
            .count();
        assert_eq!(outcome_count, 2);

        // Sequential processing: the first root ends before the second starts
        let first_outcome = events
            .iter()
            .position(|e| matches!(e, DeleteEvent::Outcome(_)))
            .unwrap();
        let second_start = events
            .iter()
            .rposition(|e| matches!(e, DeleteEvent::RootStarted(_)))
            .unwrap();
        assert!(first_outcome < second_start);
    }

    #[test]
    fn test_empty_batch_finishes() {
        let events: Vec<DeleteEvent> = DeleteEngine::default().delete(vec![]).unwrap().collect();
        assert_eq!(events, vec![DeleteEvent::BatchFinished { outcomes: vec![] }]);
    }

    #[test]
    fn test_missing_root_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let request = DeletionRequest::new(tmp.path().join("already-gone"), 10);

        let outcomes = DeleteEngine::default()
            .delete(vec![request])
            .unwrap()
            .wait()
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].succeeded);
        assert_eq!(outcomes[0].removed_entry_count, 0);
    }

    #[test]
    fn test_summarize() {
        let outcomes = vec![
            DeletionOutcome {
                root_path: PathBuf::from("/a"),
                succeeded: true,
                removed_entry_count: 10,
                failed_entry_count: 0,
            },
            DeletionOutcome {
                root_path: PathBuf::from("/b"),
                succeeded: false,
                removed_entry_count: 4,
                failed_entry_count: 2,
            },
            DeletionOutcome::untouched("/c"),
        ];

        let summary = DeleteEngine::summarize(&outcomes);

        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failed_count, 2);
        assert_eq!(summary.removed_entries, 14);
        assert_eq!(summary.failed_entries, 2);
    }

    #[test]
    fn test_drop_waits_for_batch() {
        let (_tmp, requests) = create_roots(3);
        let paths: Vec<PathBuf> = requests.iter().map(|r| r.root_path.clone()).collect();

        drop(DeleteEngine::default().delete(requests).unwrap());

        assert!(paths.iter().all(|p| !p.exists()));
    }
}
