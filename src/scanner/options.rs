/// Bytes a scan unit accumulates between two intermediate updates.
pub const DEFAULT_PROGRESS_THRESHOLD: u64 = 1_000_000;

/// Events buffered between workers and the consumer before workers block.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Upper bound on the worker pool when sized automatically.
pub const MAX_AUTO_WORKERS: usize = 64;

/// Configuration options for a scan batch.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Number of parallel workers (0 = one per target, up to MAX_AUTO_WORKERS)
    pub threads: usize,

    /// Emit an intermediate result once the running total grew by more than this
    pub progress_threshold: u64,

    /// Capacity of the bounded event channel
    pub channel_capacity: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            threads: 0,
            progress_threshold: DEFAULT_PROGRESS_THRESHOLD,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ScanOptions {
    /// Create a new ScanOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of parallel workers
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the byte delta between intermediate updates
    pub fn with_progress_threshold(mut self, bytes: u64) -> Self {
        self.progress_threshold = bytes;
        self
    }

    /// Set the event channel capacity
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Pool size for a batch of `targets` roots.
    pub fn worker_count(&self, targets: usize) -> usize {
        match self.threads {
            0 => targets.clamp(1, MAX_AUTO_WORKERS),
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = ScanOptions::default();
        assert_eq!(opts.threads, 0);
        assert_eq!(opts.progress_threshold, 1_000_000);
        assert_eq!(opts.channel_capacity, 1024);
    }

    #[test]
    fn test_scan_options_chaining() {
        let opts = ScanOptions::new()
            .with_threads(8)
            .with_progress_threshold(4096)
            .with_channel_capacity(16);

        assert_eq!(opts.threads, 8);
        assert_eq!(opts.progress_threshold, 4096);
        assert_eq!(opts.channel_capacity, 16);
    }

    #[test]
    fn test_worker_count() {
        let auto = ScanOptions::default();
        assert_eq!(auto.worker_count(0), 1);
        assert_eq!(auto.worker_count(5), 5);
        assert_eq!(auto.worker_count(1000), MAX_AUTO_WORKERS);

        let fixed = ScanOptions::new().with_threads(2);
        assert_eq!(fixed.worker_count(5), 2);
    }
}
