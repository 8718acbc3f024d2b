//! Throttled progress logging for long load passes

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Log every this many processed objects
pub const PRINT_MESSAGE_EACH_N_OBJECTS: usize = 256;
/// Log at least this often while a pass makes progress
pub const PRINT_MESSAGE_EACH_N_SECONDS: Duration = Duration::from_secs(5);

/// Counters for one pass (table attach, startup or dictionary attach)
#[derive(Debug)]
pub struct ProgressCounters {
    pass: &'static str,
    processed: AtomicUsize,
    total: usize,
    last_log: Mutex<Instant>,
}

impl ProgressCounters {
    pub fn new(pass: &'static str, total: usize) -> Self {
        Self::with_start(pass, total, Instant::now())
    }

    /// Counters whose elapsed-time trigger starts at `start`
    pub fn with_start(pass: &'static str, total: usize, start: Instant) -> Self {
        Self {
            pass,
            processed: AtomicUsize::new(0),
            total,
            last_log: Mutex::new(start),
        }
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Count one processed object and log if due
    pub fn report(&self) -> bool {
        self.report_at(Instant::now())
    }

    /// [`report`](Self::report) with an explicit clock reading. Returns
    /// whether a message was logged.
    pub fn report_at(&self, now: Instant) -> bool {
        let processed = self.processed.fetch_add(1, Ordering::SeqCst) + 1;

        let mut last_log = self.last_log.lock();
        let due = processed % PRINT_MESSAGE_EACH_N_OBJECTS == 0
            || now.saturating_duration_since(*last_log) >= PRINT_MESSAGE_EACH_N_SECONDS;
        if !due {
            return false;
        }

        let percent = if self.total == 0 {
            100.0
        } else {
            processed as f64 * 100.0 / self.total as f64
        };
        info!(pass = self.pass, processed, total = self.total, "{:.2}%", percent);
        *last_log = now;
        true
    }
}
