//! Concurrent scan engine.
//!
//! One unit of work per root runs on a dedicated rayon pool. Every unit owns its
//! own tally and reports into a single bounded channel that the caller drains
//! through [`ScanBatch`].

use rayon::ThreadPool;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::SystemTime;

use crate::error::{ReaperError, Result};

use super::options::ScanOptions;
use super::size::{gigabytes, humanize};
use super::target::ScanTarget;
use super::walker::{normalize_root, walk, Entry, EntryKind, Order};

/// Running or final totals for one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub root_path: PathBuf,
    /// Sum of regular file sizes seen so far
    pub total_bytes: u64,
    /// Number of regular files seen so far
    pub file_count: u64,
    /// True only on the last update for this root
    pub complete: bool,
}

impl ScanResult {
    /// Display label and GB value for `total_bytes`.
    pub fn humanize(&self) -> (String, f64) {
        humanize(self.total_bytes)
    }

    pub fn gigabytes(&self) -> f64 {
        gigabytes(self.total_bytes)
    }
}

/// Event emitted by a scan batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScanEvent {
    /// A root entered the batch; its size is not known yet.
    RootAdded {
        label: String,
        root_path: PathBuf,
        last_modified: Option<SystemTime>,
    },
    /// Intermediate (`complete == false`) or final totals.
    Result(ScanResult),
    /// The batch was cancelled before this root's unit started.
    Cancelled { root_path: PathBuf },
    /// The unit stopped on an engine-fatal storage error.
    Aborted { root_path: PathBuf, reason: String },
}

impl ScanEvent {
    /// Root this event belongs to.
    pub fn root_path(&self) -> &Path {
        match self {
            ScanEvent::RootAdded { root_path, .. }
            | ScanEvent::Cancelled { root_path }
            | ScanEvent::Aborted { root_path, .. } => root_path,
            ScanEvent::Result(result) => &result.root_path,
        }
    }

    /// Whether no further events will follow for this root.
    pub fn is_terminal(&self) -> bool {
        match self {
            ScanEvent::RootAdded { .. } => false,
            ScanEvent::Result(result) => result.complete,
            ScanEvent::Cancelled { .. } | ScanEvent::Aborted { .. } => true,
        }
    }
}

/// Shared flag used to stop a batch at the next unit boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-unit accumulator. Decides when an intermediate update is due.
#[derive(Debug)]
struct Tally {
    root_path: PathBuf,
    total_bytes: u64,
    file_count: u64,
    last_reported: u64,
    threshold: u64,
}

impl Tally {
    fn new(root_path: PathBuf, threshold: u64) -> Self {
        Self {
            root_path,
            total_bytes: 0,
            file_count: 0,
            last_reported: 0,
            threshold,
        }
    }

    /// Count one file; returns an intermediate update when the threshold is crossed.
    fn add_file(&mut self, size: u64) -> Option<ScanResult> {
        self.total_bytes = self.total_bytes.saturating_add(size);
        self.file_count += 1;

        if self.total_bytes - self.last_reported > self.threshold {
            self.last_reported = self.total_bytes;
            Some(self.snapshot(false))
        } else {
            None
        }
    }

    fn snapshot(&self, complete: bool) -> ScanResult {
        ScanResult {
            root_path: self.root_path.clone(),
            total_bytes: self.total_bytes,
            file_count: self.file_count,
            complete,
        }
    }
}

/// Scan engine: measures many roots concurrently.
pub struct ScanEngine {
    options: ScanOptions,
}

impl ScanEngine {
    /// Create a new engine with the given options.
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Start measuring `targets`.
    ///
    /// Every target gets a `RootAdded` event before any unit starts, then one
    /// terminal event (final `Result`, `Cancelled` or `Aborted`). The returned
    /// batch yields events until every unit is done.
    pub fn scan(&self, targets: Vec<ScanTarget>) -> Result<ScanBatch> {
        let (tx, rx) = mpsc::sync_channel(self.options.channel_capacity.max(1));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.worker_count(targets.len()))
            .thread_name(|i| format!("reaper-scan-{i}"))
            .build()?;

        let cancel = CancelHandle::default();
        let flag = cancel.clone();
        let threshold = self.options.progress_threshold;

        let handle = thread::Builder::new()
            .name("reaper-scan".to_string())
            .spawn(move || run_batch(pool, targets, threshold, flag, tx))
            .map_err(ReaperError::Spawn)?;

        Ok(ScanBatch {
            events: rx,
            cancel,
            handle: Some(handle),
        })
    }
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new(ScanOptions::default())
    }
}

fn run_batch(
    pool: ThreadPool,
    targets: Vec<ScanTarget>,
    threshold: u64,
    cancel: CancelHandle,
    tx: SyncSender<ScanEvent>,
) -> Result<()> {
    tracing::info!(roots = targets.len(), "Scan batch started");

    for target in &targets {
        let added = ScanEvent::RootAdded {
            label: target.label.clone(),
            root_path: target.root_path.clone(),
            last_modified: target.last_modified,
        };
        if tx.send(added).is_err() {
            return Ok(());
        }
    }

    let fatal: Mutex<Option<ReaperError>> = Mutex::new(None);
    {
        let (targets, cancel, slot) = (&targets, &cancel, &fatal);

        // The sender moves into the scope so the channel closes once every unit is done
        pool.scope(move |scope| {
            for target in targets {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    if let Err(err) = scan_unit(target, threshold, cancel, &tx) {
                        // Units that have not started are skipped; running ones finish
                        cancel.cancel();
                        if let Ok(mut slot) = slot.lock() {
                            slot.get_or_insert(err);
                        }
                    }
                });
            }
        });
    }

    tracing::info!(roots = targets.len(), "Scan batch finished");

    match fatal.into_inner() {
        Ok(Some(err)) => Err(err),
        _ => Ok(()),
    }
}

/// Walk one root and report its totals.
///
/// Only a storage failure is returned as an error; everything else is logged
/// and the offending subpath is left out of the total.
fn scan_unit(
    target: &ScanTarget,
    threshold: u64,
    cancel: &CancelHandle,
    tx: &SyncSender<ScanEvent>,
) -> Result<()> {
    let root = &target.root_path;

    if cancel.is_cancelled() {
        tracing::debug!(root = %root.display(), "Scan cancelled before start");
        let _ = tx.send(ScanEvent::Cancelled {
            root_path: root.clone(),
        });
        return Ok(());
    }

    tracing::debug!(root = %root.display(), "Scanning root");
    let mut tally = Tally::new(root.clone(), threshold);
    let walk_root = normalize_root(root);

    for entry in walk(&walk_root, Order::Any) {
        match entry {
            Ok(Entry {
                kind: EntryKind::File { size },
                ..
            }) => {
                if let Some(update) = tally.add_file(size) {
                    if tx.send(ScanEvent::Result(update)).is_err() {
                        // Consumer is gone
                        return Ok(());
                    }
                }
            }
            Ok(_) => {}
            Err(err) if err.is_fatal() => {
                tracing::error!(root = %root.display(), error = %err, "Storage failure, aborting scan");
                let _ = tx.send(ScanEvent::Aborted {
                    root_path: root.clone(),
                    reason: err.to_string(),
                });
                return Err(err);
            }
            Err(ReaperError::PathNotFound(path)) if path == walk_root => {
                tracing::info!(root = %root.display(), "Root does not exist, reporting zero size");
            }
            Err(err) => {
                tracing::warn!(root = %root.display(), error = %err, "Skipping entry");
            }
        }
    }

    let result = tally.snapshot(true);
    tracing::debug!(
        root = %root.display(),
        bytes = result.total_bytes,
        files = result.file_count,
        "Root scanned"
    );
    let _ = tx.send(ScanEvent::Result(result));
    Ok(())
}

/// Handle on a running scan batch.
///
/// Iterating yields events until every unit has reported. Dropping the batch
/// cancels units that have not started and waits for running ones to finish.
pub struct ScanBatch {
    events: Receiver<ScanEvent>,
    cancel: CancelHandle,
    handle: Option<JoinHandle<Result<()>>>,
}

impl ScanBatch {
    /// Stop at the next unit boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that can cancel this batch from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Drain every event and return the final result of each root that completed.
    pub fn wait(mut self) -> Result<Vec<ScanResult>> {
        let finals = self
            .by_ref()
            .filter_map(|event| match event {
                ScanEvent::Result(result) if result.complete => Some(result),
                _ => None,
            })
            .collect();

        self.join()?;
        Ok(finals)
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

impl Iterator for ScanBatch {
    type Item = ScanEvent;

    fn next(&mut self) -> Option<ScanEvent> {
        self.events.recv().ok()
    }
}

impl Drop for ScanBatch {
    fn drop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        self.cancel.cancel();
        // Workers block on a full channel, so keep draining until they are done
        while self.events.recv().is_ok() {}
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
