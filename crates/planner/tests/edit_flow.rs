mod common;

use std::time::Duration;

use api_types::{
    recalculation::{RecalculationStatus, ReportSection},
    trip::{TripUpdate, TripUpdateResponse},
};
use chrono::NaiveDate;
use common::{FakeBackend, kyoto_trip, progress};
use planner::{ApplyOutcome, BackendError, EditFlow, EditPhase, PlannerError, PollPolicy};
use tokio::time::Instant;

fn flow() -> EditFlow {
    EditFlow::new(kyoto_trip(), PollPolicy::default())
}

fn city(name: &str) -> TripUpdate {
    TripUpdate {
        destination_city: Some(name.to_string()),
        ..Default::default()
    }
}

async fn confirm_edit(flow: &mut EditFlow, backend: &FakeBackend, update: TripUpdate) -> ApplyOutcome {
    assert!(flow.preview_edits(update).unwrap());
    flow.open_confirmation().unwrap();
    flow.confirm(backend).await.unwrap()
}

async fn tick_after_interval(flow: &mut EditFlow, backend: &FakeBackend) -> Option<RecalculationStatus> {
    tokio::time::advance(Duration::from_secs(2)).await;
    flow.tick(backend, Instant::now()).await.unwrap()
}

#[tokio::test]
async fn notes_edit_saves_without_recalculation() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();

    let update = TripUpdate {
        notes: Some("aisle seat".to_string()),
        ..Default::default()
    };
    assert!(flow.preview_edits(update).unwrap());
    let preview = flow.preview().unwrap();
    assert_eq!(preview.changes.len(), 1);
    assert!(preview.impact.affected_sections.is_empty());
    assert!(!preview.impact.requires_recalculation);
    assert_eq!(preview.impact.unknown_impact_fields, vec!["notes"]);

    flow.open_confirmation().unwrap();
    let outcome = flow.confirm(&backend).await.unwrap();

    assert_eq!(outcome, ApplyOutcome::Saved);
    assert_eq!(flow.phase(), EditPhase::Idle);
    assert_eq!(flow.trip().notes.as_deref(), Some("aisle seat"));
    assert_eq!(flow.version(), Some(2));
    assert_eq!(backend.calls("start_recalculation"), 0);

    let state = backend.state.lock().unwrap();
    assert_eq!(state.update_requests[0]["recalculate"], false);
    assert_eq!(state.update_requests[0]["expectedVersion"], 1);
}

#[tokio::test]
async fn empty_edit_opens_no_dialog() {
    let mut flow = flow();
    assert!(!flow.preview_edits(city("Kyoto")).unwrap());
    assert_eq!(flow.phase(), EditPhase::Editing);
    assert!(matches!(
        flow.open_confirmation(),
        Err(PlannerError::NothingToConfirm)
    ));
}

#[tokio::test]
async fn invalid_edit_never_reaches_the_backend() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();

    let update = TripUpdate {
        travelers: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        flow.preview_edits(update),
        Err(PlannerError::Invalid(_))
    ));
    assert!(matches!(
        flow.confirm(&backend).await,
        Err(PlannerError::NothingToConfirm)
    ));
    assert!(backend.state.lock().unwrap().calls.is_empty());
}

#[tokio::test]
async fn only_changed_fields_are_sent() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();

    let update = TripUpdate {
        destination_city: Some("Kyoto".to_string()),
        budget: Some(4200.0),
        ..Default::default()
    };
    flow.set_recalculate(false);
    confirm_edit(&mut flow, &backend, update).await;

    let state = backend.state.lock().unwrap();
    let sent = state.update_requests[0]["updates"].as_object().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent["budget"], 4200.0);
}

#[tokio::test(start_paused = true)]
async fn destination_city_edit_recalculates_and_refetches() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();

    assert!(flow.preview_edits(city("Osaka")).unwrap());
    let impact = &flow.preview().unwrap().impact;
    assert!(impact.requires_recalculation);
    assert_eq!(
        impact.message(),
        "Major changes - full recalculation recommended"
    );
    flow.open_confirmation().unwrap();

    let outcome = flow.confirm(&backend).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Recalculating);
    assert_eq!(flow.phase(), EditPhase::Recalculating);
    {
        let state = backend.state.lock().unwrap();
        let sections = state.start_calls[0].as_ref().unwrap();
        assert!(sections.contains(&ReportSection::Weather));
        assert!(!sections.contains(&ReportSection::Visa));
    }

    backend.push_status(RecalculationStatus::Processing);
    backend.push_status(RecalculationStatus::Completed);

    // Not due yet.
    assert_eq!(flow.tick(&backend, Instant::now()).await.unwrap(), None);
    assert_eq!(backend.calls("recalculation_status"), 0);

    assert_eq!(tick_after_interval(&mut flow, &backend).await, None);
    assert_eq!(
        tick_after_interval(&mut flow, &backend).await,
        Some(RecalculationStatus::Completed)
    );
    assert_eq!(flow.phase(), EditPhase::Idle);
    assert_eq!(backend.calls("get_trip"), 1);

    assert_eq!(tick_after_interval(&mut flow, &backend).await, None);
    assert_eq!(backend.calls("recalculation_status"), 2);
}

#[tokio::test(start_paused = true)]
async fn recalculation_started_by_the_backend_is_adopted() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut updated = kyoto_trip();
    updated.destination_city = Some("Osaka".to_string());
    updated.current_version = Some(2);
    backend
        .state
        .lock()
        .unwrap()
        .update_results
        .push_back(Ok(TripUpdateResponse {
            trip: updated,
            version: 2,
            recalculation: Some(progress(RecalculationStatus::Processing)),
        }));

    let mut flow = flow();
    let outcome = confirm_edit(&mut flow, &backend, city("Osaka")).await;

    assert_eq!(outcome, ApplyOutcome::Recalculating);
    assert_eq!(backend.calls("start_recalculation"), 0);
    assert_eq!(
        flow.progress().map(|p| p.status),
        Some(RecalculationStatus::Processing)
    );
}

#[tokio::test]
async fn completed_recalculation_in_the_response_refetches_once() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut updated = kyoto_trip();
    updated.destination_city = Some("Osaka".to_string());
    updated.current_version = Some(2);
    {
        let mut state = backend.state.lock().unwrap();
        state.update_results.push_back(Ok(TripUpdateResponse {
            trip: updated,
            version: 2,
            recalculation: Some(progress(RecalculationStatus::Completed)),
        }));
    }

    let mut flow = flow();
    let outcome = confirm_edit(&mut flow, &backend, city("Osaka")).await;

    assert_eq!(outcome, ApplyOutcome::Recalculated);
    assert_eq!(flow.phase(), EditPhase::Idle);
    assert_eq!(backend.calls("start_recalculation"), 0);
    assert_eq!(backend.calls("get_trip"), 1);
    assert_eq!(
        flow.progress().map(|p| p.status),
        Some(RecalculationStatus::Completed)
    );
    assert!(flow.error().is_none());
}

#[tokio::test]
async fn recalculation_that_starts_completed_refetches_once() {
    let backend = FakeBackend::new(kyoto_trip());
    backend
        .state
        .lock()
        .unwrap()
        .start_results
        .push_back(Ok(progress(RecalculationStatus::Completed)));
    let mut flow = flow();

    let outcome = confirm_edit(&mut flow, &backend, city("Osaka")).await;

    assert_eq!(outcome, ApplyOutcome::Recalculated);
    assert_eq!(flow.phase(), EditPhase::Idle);
    assert_eq!(backend.calls("start_recalculation"), 1);
    assert_eq!(backend.calls("get_trip"), 1);
}

#[tokio::test]
async fn failed_refresh_after_a_finished_run_keeps_the_save() {
    let backend = FakeBackend::new(kyoto_trip());
    {
        let mut state = backend.state.lock().unwrap();
        state
            .start_results
            .push_back(Ok(progress(RecalculationStatus::Completed)));
        state.trip_error = Some(BackendError::Network("reset".to_string()));
    }
    let mut flow = flow();

    let outcome = confirm_edit(&mut flow, &backend, city("Osaka")).await;

    assert_eq!(outcome, ApplyOutcome::Recalculated);
    assert_eq!(flow.trip().destination_city.as_deref(), Some("Osaka"));
    assert!(flow.error().unwrap().contains("could not be refreshed"));
}

#[tokio::test]
async fn opting_out_skips_recalculation() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();
    flow.set_recalculate(false);

    let outcome = confirm_edit(&mut flow, &backend, city("Osaka")).await;

    assert_eq!(outcome, ApplyOutcome::Saved);
    assert_eq!(backend.calls("start_recalculation"), 0);
    assert!(flow.tracker().is_none());
}

#[tokio::test]
async fn failed_update_keeps_the_baseline_and_the_dialog() {
    let backend = FakeBackend::new(kyoto_trip());
    backend
        .state
        .lock()
        .unwrap()
        .update_results
        .push_back(Err(BackendError::Http {
            status: 500,
            message: "HTTP 500".to_string(),
        }));
    let mut flow = flow();

    assert!(flow.preview_edits(city("Osaka")).unwrap());
    flow.open_confirmation().unwrap();
    let result = flow.confirm(&backend).await;

    assert!(matches!(result, Err(PlannerError::Backend(BackendError::Http { status: 500, .. }))));
    assert_eq!(flow.phase(), EditPhase::Confirming);
    assert_eq!(flow.error(), Some("HTTP 500"));
    assert_eq!(flow.trip(), &kyoto_trip());
    assert!(flow.preview().is_some());

    // The user confirms again once the backend recovers.
    assert_eq!(flow.confirm(&backend).await.unwrap(), ApplyOutcome::Recalculating);
    assert_eq!(flow.trip().destination_city.as_deref(), Some("Osaka"));
}

#[tokio::test]
async fn stale_update_refetches_and_prompts_again() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();
    assert!(flow.preview_edits(city("Osaka")).unwrap());
    flow.open_confirmation().unwrap();

    {
        let mut state = backend.state.lock().unwrap();
        state.trip.budget = Some(5000.0);
        state.trip.current_version = Some(4);
        state
            .update_results
            .push_back(Err(BackendError::Conflict("version mismatch".to_string())));
    }

    let outcome = flow.confirm(&backend).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Conflict);
    assert_eq!(flow.phase(), EditPhase::Confirming);
    assert_eq!(flow.version(), Some(4));
    assert_eq!(flow.trip().budget, Some(5000.0));
    assert!(flow.error().is_some());
    assert_eq!(flow.preview().unwrap().changes[0].field, "destinationCity");

    flow.set_recalculate(false);
    flow.confirm(&backend).await.unwrap();
    let state = backend.state.lock().unwrap();
    assert_eq!(state.update_requests[1]["expectedVersion"], 4);
}

#[tokio::test]
async fn stale_update_no_longer_valid_returns_to_the_form() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();
    let update = TripUpdate {
        end_date: NaiveDate::from_ymd_opt(2026, 4, 15),
        ..Default::default()
    };
    assert!(flow.preview_edits(update).unwrap());
    flow.open_confirmation().unwrap();
    {
        let mut state = backend.state.lock().unwrap();
        state.trip.start_date = NaiveDate::from_ymd_opt(2026, 4, 20);
        state.trip.current_version = Some(4);
        state
            .update_results
            .push_back(Err(BackendError::Conflict("version mismatch".to_string())));
    }

    let result = flow.confirm(&backend).await;

    let Err(PlannerError::Invalid(issues)) = result else {
        panic!("expected a validation error, got {result:?}");
    };
    assert_eq!(issues[0].field, "endDate");
    assert_eq!(flow.phase(), EditPhase::Editing);
    assert!(flow.preview().is_none());
    assert!(flow.error().unwrap().contains("endDate"));
    assert_eq!(flow.version(), Some(4));
    assert!(matches!(
        flow.confirm(&backend).await,
        Err(PlannerError::NothingToConfirm)
    ));
    assert_eq!(backend.calls("update_trip"), 1);
}

#[tokio::test]
async fn stale_update_already_holding_the_values_needs_no_prompt() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();
    assert!(flow.preview_edits(city("Osaka")).unwrap());
    flow.open_confirmation().unwrap();
    {
        let mut state = backend.state.lock().unwrap();
        state.trip.destination_city = Some("Osaka".to_string());
        state
            .update_results
            .push_back(Err(BackendError::Conflict("version mismatch".to_string())));
    }

    let outcome = flow.confirm(&backend).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::AlreadyApplied);
    assert_eq!(flow.phase(), EditPhase::Idle);
    assert!(flow.preview().is_none());
}

#[tokio::test(start_paused = true)]
async fn cancel_while_processing_is_immediate() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();
    confirm_edit(&mut flow, &backend, city("Osaka")).await;
    backend.push_status(RecalculationStatus::Processing);

    flow.cancel_recalculation(&backend).await.unwrap();

    assert_eq!(
        flow.progress().map(|p| p.status),
        Some(RecalculationStatus::Cancelled)
    );
    assert_eq!(flow.phase(), EditPhase::Idle);
    assert_eq!(backend.calls("cancel_recalculation"), 1);

    assert_eq!(tick_after_interval(&mut flow, &backend).await, None);
    assert_eq!(backend.calls("recalculation_status"), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_cancel_request_is_not_rolled_back() {
    let backend = FakeBackend::new(kyoto_trip());
    backend.state.lock().unwrap().cancel_error = Some(BackendError::Network("reset".to_string()));
    let mut flow = flow();
    confirm_edit(&mut flow, &backend, city("Osaka")).await;

    let result = flow.cancel_recalculation(&backend).await;

    assert!(result.is_err());
    assert_eq!(
        flow.progress().map(|p| p.status),
        Some(RecalculationStatus::Cancelled)
    );
    assert!(flow.error().unwrap().contains("Cancel request failed"));
}

#[tokio::test(start_paused = true)]
async fn retry_runs_a_full_recalculation() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();
    confirm_edit(&mut flow, &backend, city("Osaka")).await;
    backend
        .state
        .lock()
        .unwrap()
        .statuses
        .push_back(Ok(progress(RecalculationStatus::Failed)));
    assert_eq!(
        tick_after_interval(&mut flow, &backend).await,
        Some(RecalculationStatus::Failed)
    );

    let status = flow.retry_recalculation(&backend).await.unwrap();

    assert_eq!(status, RecalculationStatus::Queued);
    assert_eq!(flow.phase(), EditPhase::Recalculating);
    assert_eq!(
        flow.progress().map(|p| p.status),
        Some(RecalculationStatus::Queued)
    );
    let state = backend.state.lock().unwrap();
    assert_eq!(state.start_calls.last(), Some(&None));
}

#[tokio::test]
async fn edits_are_refused_while_polling() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();
    confirm_edit(&mut flow, &backend, city("Osaka")).await;

    assert!(matches!(
        flow.preview_edits(city("Nara")),
        Err(PlannerError::Busy)
    ));
}

#[tokio::test(start_paused = true)]
async fn retry_answered_as_completed_refetches_without_polling() {
    let backend = FakeBackend::new(kyoto_trip());
    let mut flow = flow();
    flow.set_recalculate(false);
    confirm_edit(&mut flow, &backend, city("Osaka")).await;
    backend
        .state
        .lock()
        .unwrap()
        .start_results
        .push_back(Ok(progress(RecalculationStatus::Completed)));

    let status = flow.retry_recalculation(&backend).await.unwrap();

    assert_eq!(status, RecalculationStatus::Completed);
    assert_eq!(flow.phase(), EditPhase::Idle);
    assert_eq!(backend.calls("get_trip"), 1);
    assert_eq!(tick_after_interval(&mut flow, &backend).await, None);
    assert_eq!(backend.calls("recalculation_status"), 0);
}
