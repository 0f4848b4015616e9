//! Polling of a backend recalculation until it settles.
//!
//! [`RecalcTracker`] is the schedule; it never sleeps by itself. The TUI asks
//! [`RecalcTracker::is_due`] on every tick, while [`drive_recalculation`]
//! sleeps on the tokio timer between polls.
use std::time::Duration;

use api_types::recalculation::{RecalculationProgress, RecalculationStatus};
use tokio::time::Instant;

use crate::{BackendError, TripBackend};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 150;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Polls before giving up with [`RecalculationStatus::TimedOut`].
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    pub fn max_duration(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Poll schedule for the recalculation of one trip.
#[derive(Clone, Debug)]
pub struct RecalcTracker {
    trip_id: String,
    progress: RecalculationProgress,
    policy: PollPolicy,
    attempts: u32,
    next_poll_at: Option<Instant>,
    last_error: Option<String>,
}

impl RecalcTracker {
    /// Starts tracking `progress`. Nothing is scheduled unless it is active.
    pub fn new(
        trip_id: impl Into<String>,
        progress: RecalculationProgress,
        policy: PollPolicy,
        now: Instant,
    ) -> Self {
        let next_poll_at = progress.status.is_active().then(|| now + policy.interval);
        Self {
            trip_id: trip_id.into(),
            progress,
            policy,
            attempts: 0,
            next_poll_at,
            last_error: None,
        }
    }

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    pub fn tracks(&self, trip_id: &str) -> bool {
        self.trip_id == trip_id
    }

    pub fn progress(&self) -> &RecalculationProgress {
        &self.progress
    }

    pub fn status(&self) -> RecalculationStatus {
        self.progress.status
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Error of the last poll, cleared by the next successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_polling(&self) -> bool {
        self.next_poll_at.is_some()
    }

    pub fn next_poll_at(&self) -> Option<Instant> {
        self.next_poll_at
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_poll_at.is_some_and(|at| now >= at)
    }

    /// Replaces the held progress wholesale with a poll response.
    pub fn record(&mut self, progress: RecalculationProgress, now: Instant) {
        self.attempts += 1;
        self.progress = progress;
        self.last_error = None;
        self.reschedule(now);
    }

    /// A failed poll still counts against the attempt budget.
    pub fn record_error(&mut self, err: &BackendError, now: Instant) {
        self.attempts += 1;
        self.last_error = Some(err.to_string());
        self.reschedule(now);
    }

    /// Marks the run cancelled locally and stops polling, whatever the
    /// backend says next.
    pub fn cancel(&mut self) {
        self.progress.status = RecalculationStatus::Cancelled;
        self.next_poll_at = None;
    }

    /// Issues one status request and records its outcome.
    pub async fn poll<B: TripBackend>(&mut self, backend: &B, now: Instant) -> RecalculationStatus {
        match backend.recalculation_status(&self.trip_id).await {
            Ok(progress) => {
                tracing::debug!(
                    trip_id = %self.trip_id,
                    status = progress.status.label(),
                    progress = progress.progress,
                    "recalculation status"
                );
                self.record(progress, now);
            }
            Err(err) => {
                tracing::warn!(trip_id = %self.trip_id, "recalculation status failed: {err}");
                self.record_error(&err, now);
            }
        }
        self.progress.status
    }

    fn reschedule(&mut self, now: Instant) {
        if !self.progress.status.is_active() {
            self.next_poll_at = None;
            return;
        }
        if self.attempts >= self.policy.max_attempts {
            tracing::warn!(
                trip_id = %self.trip_id,
                attempts = self.attempts,
                "recalculation did not settle, giving up"
            );
            self.progress.status = RecalculationStatus::TimedOut;
            self.progress.error = Some(format!(
                "Recalculation did not finish within {} seconds",
                self.policy.max_duration().as_secs()
            ));
            self.next_poll_at = None;
            return;
        }
        self.next_poll_at = Some(now + self.policy.interval);
    }
}

/// Polls until the tracker stops, calling `on_update` after every poll.
pub async fn drive_recalculation<B, F>(
    backend: &B,
    tracker: &mut RecalcTracker,
    mut on_update: F,
) -> RecalculationStatus
where
    B: TripBackend,
    F: FnMut(&RecalcTracker),
{
    while let Some(at) = tracker.next_poll_at() {
        tokio::time::sleep_until(at).await;
        tracker.poll(backend, Instant::now()).await;
        on_update(tracker);
    }
    tracker.status()
}
