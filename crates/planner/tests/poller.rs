mod common;

use std::time::Duration;

use api_types::recalculation::RecalculationStatus;
use common::{FakeBackend, kyoto_trip, progress};
use planner::{BackendError, PollPolicy, RecalcTracker, drive_recalculation};
use tokio::time::Instant;

fn policy(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_secs(2),
        max_attempts,
    }
}

#[tokio::test(start_paused = true)]
async fn polling_stops_at_the_first_terminal_status() {
    let backend = FakeBackend::new(kyoto_trip());
    backend.push_status(RecalculationStatus::Processing);
    backend.push_status(RecalculationStatus::Failed);
    backend.push_status(RecalculationStatus::Processing);

    let started = Instant::now();
    let mut tracker = RecalcTracker::new(
        "trip-1",
        progress(RecalculationStatus::Queued),
        policy(150),
        started,
    );
    let mut seen = Vec::new();
    let status = drive_recalculation(&backend, &mut tracker, |t| seen.push(t.status())).await;

    assert_eq!(status, RecalculationStatus::Failed);
    assert_eq!(
        seen,
        vec![RecalculationStatus::Processing, RecalculationStatus::Failed]
    );
    assert_eq!(backend.calls("recalculation_status"), 2);
    assert_eq!(started.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn endless_processing_times_out() {
    let backend = FakeBackend::new(kyoto_trip());

    let mut tracker = RecalcTracker::new(
        "trip-1",
        progress(RecalculationStatus::Processing),
        policy(3),
        Instant::now(),
    );
    let status = drive_recalculation(&backend, &mut tracker, |_| {}).await;

    assert_eq!(status, RecalculationStatus::TimedOut);
    assert_ne!(status, RecalculationStatus::Failed);
    assert_eq!(backend.calls("recalculation_status"), 3);
    assert!(tracker.progress().error.is_some());
}

#[tokio::test(start_paused = true)]
async fn poll_errors_keep_polling() {
    let backend = FakeBackend::new(kyoto_trip());
    {
        let mut state = backend.state.lock().unwrap();
        state
            .statuses
            .push_back(Err(BackendError::Network("timeout".to_string())));
        state
            .statuses
            .push_back(Ok(progress(RecalculationStatus::Completed)));
    }

    let mut tracker = RecalcTracker::new(
        "trip-1",
        progress(RecalculationStatus::Queued),
        policy(10),
        Instant::now(),
    );
    let mut errors = Vec::new();
    let status = drive_recalculation(&backend, &mut tracker, |t| {
        errors.push(t.last_error().map(str::to_string))
    })
    .await;

    assert_eq!(status, RecalculationStatus::Completed);
    assert_eq!(
        errors,
        vec![Some("network error: timeout".to_string()), None]
    );
}

#[tokio::test(start_paused = true)]
async fn settled_progress_is_never_polled() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut tracker = RecalcTracker::new(
        "trip-1",
        progress(RecalculationStatus::Completed),
        policy(10),
        Instant::now(),
    );

    let status = drive_recalculation(&backend, &mut tracker, |_| {}).await;

    assert_eq!(status, RecalculationStatus::Completed);
    assert_eq!(backend.calls("recalculation_status"), 0);
    assert!(tracker.tracks("trip-1"));
}
