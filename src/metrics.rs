// Usage counters
//
// Lightweight counters for one run of the tool, logged on exit

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Run counters.
///
/// Atomic so a shared `Arc<Metrics>` can be bumped from anywhere without locks.
#[derive(Debug)]
pub struct Metrics {
    /// Exports parsed into a collection
    pub collections_loaded: AtomicU64,

    /// Exports rejected with a format error
    pub parse_failures: AtomicU64,

    pub scores_computed: AtomicU64,

    /// Saves that replaced the stored personal best
    pub personal_bests: AtomicU64,

    /// Successful leaderboard submissions and collection syncs
    pub submissions: AtomicU64,

    /// Failed remote calls
    pub remote_errors: AtomicU64,

    /// Total time spent parsing and scoring, in microseconds
    pub pipeline_time_us: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            collections_loaded: AtomicU64::new(0),
            parse_failures: AtomicU64::new(0),
            scores_computed: AtomicU64::new(0),
            personal_bests: AtomicU64::new(0),
            submissions: AtomicU64::new(0),
            remote_errors: AtomicU64::new(0),
            pipeline_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_collection_loaded(&self, elapsed: Duration) {
        self.collections_loaded.fetch_add(1, Ordering::Relaxed);
        self.pipeline_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_score(&self) {
        self.scores_computed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_personal_best(&self) {
        self.personal_bests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submission(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_error(&self) {
        self.remote_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average parse-and-score time per loaded collection in milliseconds
    pub fn avg_load_time_ms(&self) -> f64 {
        let total = self.pipeline_time_us.load(Ordering::Relaxed);
        let count = self.collections_loaded.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64 / 1000.0
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Run Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Collections: {} loaded, {} rejected (avg {:.2}ms)",
            self.collections_loaded.load(Ordering::Relaxed),
            self.parse_failures.load(Ordering::Relaxed),
            self.avg_load_time_ms()
        );
        tracing::info!(
            "Scores: {} computed, {} new personal bests",
            self.scores_computed.load(Ordering::Relaxed),
            self.personal_bests.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Remote: {} submissions, {} errors",
            self.submissions.load(Ordering::Relaxed),
            self.remote_errors.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
