//! Adaptive pacing from the vendor's `x-app-usage` response header.

use crate::api::types::AppUsage;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// The vendor computes the percentages over a rolling one-hour window,
/// so a report older than that no longer describes current pressure.
const REPORT_LIFETIME: Duration = Duration::from_secs(3600);

/// Tracks the most recent vendor usage report and maps it to a
/// recommended delay before the next request.
///
/// The header carries three percentages over a rolling one-hour window;
/// throttling keys off the highest of the three. At 100% the vendor
/// starts rejecting calls, so delays ramp up well before that.
pub struct UsageTracker {
    min_delay: Duration,
    snapshot: Mutex<Snapshot>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Snapshot {
    usage: AppUsage,
    observed_at: Option<Instant>,
}

impl UsageTracker {
    /// `min_delay` is the floor applied in the low-pressure tier.
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            snapshot: Mutex::new(Snapshot::default()),
        }
    }

    /// Record the raw `x-app-usage` header value, replacing the previous
    /// snapshot. A header that fails to parse leaves the snapshot as is.
    pub fn record(&self, header_value: &str) {
        match serde_json::from_str::<AppUsage>(header_value) {
            Ok(usage) => {
                let mut snap = self.lock_snapshot();
                snap.usage = usage;
                snap.observed_at = Some(Instant::now());
                tracing::debug!(
                    call_count = usage.call_count,
                    total_cputime = usage.total_cputime,
                    total_time = usage.total_time,
                    "Recorded app usage"
                );
            }
            Err(e) => {
                tracing::debug!("Ignoring unparseable x-app-usage header: {}", e);
            }
        }
    }

    /// Highest of the three usage percentages, 0 before any report.
    pub fn max_usage_percent(&self) -> u32 {
        let snap = self.lock_snapshot();
        snap.usage
            .call_count
            .max(snap.usage.total_cputime)
            .max(snap.usage.total_time)
    }

    /// Tiered delay recommendation for the next request. Reports past
    /// their lifetime are treated as no report at all.
    pub fn recommended_delay(&self) -> Duration {
        match self.lock_snapshot().observed_at {
            Some(at) if at.elapsed() < REPORT_LIFETIME => {}
            _ => return Duration::ZERO,
        }

        match self.max_usage_percent() {
            0..=19 => Duration::ZERO,
            20..=49 => self.min_delay,
            50..=79 => Duration::from_secs(2),
            80..=94 => Duration::from_secs(5),
            _ => Duration::from_secs(15),
        }
    }

    fn lock_snapshot(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        // Snapshot state is plain bookkeeping; recover from poisoning.
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
