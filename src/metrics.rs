use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Counters for one command invocation, shared with the progress display.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    start_time: Instant,
    files_read: AtomicU64,
    rows_read: AtomicU64,
    rows_written: AtomicU64,
    mutations_parsed: AtomicU64,
    isolates: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                start_time: Instant::now(),
                files_read: AtomicU64::new(0),
                rows_read: AtomicU64::new(0),
                rows_written: AtomicU64::new(0),
                mutations_parsed: AtomicU64::new(0),
                isolates: AtomicU64::new(0),
            }),
        }
    }

    pub fn inc_files(&self) {
        self.add_files(1);
    }

    pub fn add_files(&self, count: u64) {
        self.inner.files_read.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_rows_read(&self, count: u64) {
        self.inner.rows_read.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_rows_written(&self, count: u64) {
        self.inner.rows_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_mutations(&self, count: u64) {
        self.inner
            .mutations_parsed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_isolates(&self, count: u64) {
        self.inner.isolates.fetch_add(count, Ordering::Relaxed);
    }

    pub fn files_read(&self) -> u64 {
        self.inner.files_read.load(Ordering::Relaxed)
    }

    pub fn rows_read(&self) -> u64 {
        self.inner.rows_read.load(Ordering::Relaxed)
    }

    pub fn rows_written(&self) -> u64 {
        self.inner.rows_written.load(Ordering::Relaxed)
    }

    pub fn mutations(&self) -> u64 {
        self.inner.mutations_parsed.load(Ordering::Relaxed)
    }

    pub fn isolates(&self) -> u64 {
        self.inner.isolates.load(Ordering::Relaxed)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.inner.start_time.elapsed().as_secs_f64()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
