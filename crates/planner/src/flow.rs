//! The edit → preview → confirm → apply → recalculate cycle of one trip.
use api_types::{
    recalculation::{RecalculationProgress, RecalculationStatus},
    trip::{Trip, TripUpdate, TripUpdateRequest},
};
use tokio::time::Instant;

use crate::{
    BackendError, PlannerError, TripBackend,
    impact::ChangePreview,
    poller::{PollPolicy, RecalcTracker},
    validation::validate_update,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditPhase {
    Editing,
    Previewing,
    Confirming,
    Applying,
    Recalculating,
    Idle,
}

/// What a confirmed update led to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Saved,
    Recalculating,
    /// The trip changed elsewhere; the preview was rebuilt and awaits a new
    /// confirmation.
    Conflict,
    /// The trip changed elsewhere and already holds the proposed values.
    AlreadyApplied,
    /// Saved, and the backend reported the recalculation as already
    /// complete; the trip was refetched.
    Recalculated,
}

#[derive(Debug)]
pub struct EditFlow {
    trip: Trip,
    version: Option<u32>,
    phase: EditPhase,
    preview: Option<ChangePreview>,
    pending: Option<TripUpdate>,
    recalculate: bool,
    error: Option<String>,
    tracker: Option<RecalcTracker>,
    policy: PollPolicy,
}

impl EditFlow {
    pub fn new(trip: Trip, policy: PollPolicy) -> Self {
        Self {
            version: trip.current_version,
            trip,
            phase: EditPhase::Editing,
            preview: None,
            pending: None,
            recalculate: true,
            error: None,
            tracker: None,
            policy,
        }
    }

    /// Last trip state confirmed by the backend.
    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    pub fn preview(&self) -> Option<&ChangePreview> {
        self.preview.as_ref()
    }

    /// Inline error of the confirmation dialog or of the last action.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn recalculate(&self) -> bool {
        self.recalculate
    }

    pub fn set_recalculate(&mut self, recalculate: bool) {
        self.recalculate = recalculate;
    }

    pub fn tracker(&self) -> Option<&RecalcTracker> {
        self.tracker.as_ref()
    }

    pub fn progress(&self) -> Option<&RecalculationProgress> {
        self.tracker.as_ref().map(RecalcTracker::progress)
    }

    /// Takes a fresh baseline (after a reload or a restore).
    pub fn reset(&mut self, trip: Trip) {
        self.version = trip.current_version;
        self.trip = trip;
        self.phase = EditPhase::Editing;
        self.preview = None;
        self.pending = None;
        self.error = None;
    }

    /// Computes the preview of `update`.
    ///
    /// Returns `false` and stays in editing when nothing would change.
    pub fn preview_edits(&mut self, update: TripUpdate) -> Result<bool, PlannerError> {
        match self.phase {
            EditPhase::Applying => return Err(PlannerError::Busy),
            EditPhase::Recalculating if self.tracker.as_ref().is_some_and(RecalcTracker::is_polling) => {
                return Err(PlannerError::Busy);
            }
            _ => {}
        }

        validate_update(&self.trip, &update).map_err(PlannerError::Invalid)?;
        self.error = None;

        match ChangePreview::build(&self.trip, &update)? {
            Some(preview) => {
                tracing::debug!(
                    trip_id = %self.trip.id,
                    changes = preview.changes.len(),
                    "edits previewed"
                );
                self.preview = Some(preview);
                self.pending = Some(update);
                self.phase = EditPhase::Previewing;
                Ok(true)
            }
            None => {
                self.preview = None;
                self.pending = None;
                self.phase = EditPhase::Editing;
                Ok(false)
            }
        }
    }

    /// Opens the confirmation dialog for the current preview.
    pub fn open_confirmation(&mut self) -> Result<(), PlannerError> {
        if self.phase != EditPhase::Previewing || self.preview.is_none() {
            return Err(PlannerError::NothingToConfirm);
        }
        self.phase = EditPhase::Confirming;
        Ok(())
    }

    /// Closes the dialog and drops the pending edits.
    pub fn cancel_edit(&mut self) {
        if matches!(self.phase, EditPhase::Previewing | EditPhase::Confirming) {
            self.phase = EditPhase::Editing;
        }
        self.preview = None;
        self.pending = None;
        self.error = None;
    }

    /// Sends the previewed changes.
    ///
    /// The baseline is replaced only by what the backend returns. On failure
    /// the dialog stays open with the error.
    pub async fn confirm<B: TripBackend>(
        &mut self,
        backend: &B,
    ) -> Result<ApplyOutcome, PlannerError> {
        if self.phase != EditPhase::Confirming {
            return Err(PlannerError::NothingToConfirm);
        }
        let Some(preview) = self.preview.clone() else {
            return Err(PlannerError::NothingToConfirm);
        };

        let wants_recalc = self.recalculate && preview.impact.requires_recalculation;
        let request = TripUpdateRequest {
            updates: preview.update()?,
            expected_version: self.version,
            recalculate: wants_recalc,
            sections: wants_recalc.then(|| preview.impact.affected_sections.clone()),
        };

        self.phase = EditPhase::Applying;
        self.error = None;
        let trip_id = self.trip.id.clone();

        let response = match backend.update_trip(&trip_id, &request).await {
            Ok(response) => response,
            Err(BackendError::Conflict(message)) => {
                return self.handle_conflict(backend, message).await;
            }
            Err(err) => {
                tracing::warn!(%trip_id, "trip update failed: {err}");
                self.phase = EditPhase::Confirming;
                self.error = Some(err.to_string());
                return Err(err.into());
            }
        };

        tracing::info!(%trip_id, version = response.version, "trip updated");
        self.trip = response.trip;
        self.version = Some(response.version);
        self.preview = None;
        self.pending = None;

        let handle = match response.recalculation {
            Some(progress) => Some(progress),
            None if wants_recalc => match backend
                .start_recalculation(&trip_id, Some(preview.impact.affected_sections.clone()))
                .await
            {
                Ok(progress) => Some(progress),
                Err(err) => {
                    tracing::warn!(%trip_id, "could not start recalculation: {err}");
                    self.error = Some(format!("Saved, but recalculation did not start: {err}"));
                    None
                }
            },
            None => None,
        };
        let Some(progress) = handle else {
            self.phase = EditPhase::Idle;
            return Ok(ApplyOutcome::Saved);
        };

        match self.adopt(backend, progress).await {
            Ok(status) if status.is_active() => Ok(ApplyOutcome::Recalculating),
            Ok(RecalculationStatus::Completed) => Ok(ApplyOutcome::Recalculated),
            Ok(_) => Ok(ApplyOutcome::Saved),
            Err(err) => {
                // The save itself went through; only the follow-up read failed.
                tracing::warn!(%trip_id, "refresh after recalculation failed: {err}");
                self.error = Some(format!("Saved, but the trip could not be refreshed: {err}"));
                Ok(ApplyOutcome::Recalculated)
            }
        }
    }

    /// Drives the poller; call it on every UI tick.
    ///
    /// Returns the status once the recalculation settles. A completed run
    /// triggers one refetch of the trip.
    pub async fn tick<B: TripBackend>(
        &mut self,
        backend: &B,
        now: Instant,
    ) -> Result<Option<RecalculationStatus>, PlannerError> {
        if self.phase != EditPhase::Recalculating {
            return Ok(None);
        }
        let Some(tracker) = self.tracker.as_mut() else {
            return Ok(None);
        };
        if !tracker.is_due(now) {
            return Ok(None);
        }

        let status = tracker.poll(backend, now).await;
        if tracker.is_polling() {
            return Ok(None);
        }

        self.phase = EditPhase::Idle;
        tracing::info!(trip_id = %self.trip.id, status = status.label(), "recalculation settled");
        if status == RecalculationStatus::Completed {
            self.refresh(backend).await?;
        }
        Ok(Some(status))
    }

    /// Cancels locally right away, then tells the backend.
    ///
    /// A failed cancel request is reported but the local state stays
    /// cancelled.
    pub async fn cancel_recalculation<B: TripBackend>(
        &mut self,
        backend: &B,
    ) -> Result<(), PlannerError> {
        let Some(tracker) = self.tracker.as_mut() else {
            return Ok(());
        };
        if !tracker.status().is_active() {
            return Ok(());
        }
        tracker.cancel();
        self.phase = EditPhase::Idle;

        if let Err(err) = backend.cancel_recalculation(&self.trip.id).await {
            tracing::warn!(trip_id = %self.trip.id, "cancel request failed: {err}");
            self.error = Some(format!("Cancel request failed: {err}"));
            return Err(err.into());
        }
        Ok(())
    }

    /// Starts a full recalculation, replacing the tracked progress.
    pub async fn retry_recalculation<B: TripBackend>(
        &mut self,
        backend: &B,
    ) -> Result<RecalculationStatus, PlannerError> {
        if self.phase == EditPhase::Applying {
            return Err(PlannerError::Busy);
        }
        let progress = backend.start_recalculation(&self.trip.id, None).await?;
        self.error = None;
        self.adopt(backend, progress).await
    }

    /// Takes over a recalculation handle returned by the backend.
    ///
    /// A run that is already completed refetches the trip once, like a poll
    /// that sees it complete.
    async fn adopt<B: TripBackend>(
        &mut self,
        backend: &B,
        progress: RecalculationProgress,
    ) -> Result<RecalculationStatus, PlannerError> {
        let status = progress.status;
        tracing::info!(trip_id = %self.trip.id, status = status.label(), "tracking recalculation");
        self.tracker = Some(RecalcTracker::new(
            self.trip.id.clone(),
            progress,
            self.policy,
            Instant::now(),
        ));
        if status.is_active() {
            self.phase = EditPhase::Recalculating;
            return Ok(status);
        }

        self.phase = EditPhase::Idle;
        if status == RecalculationStatus::Completed {
            self.refresh(backend).await?;
        }
        Ok(status)
    }

    async fn refresh<B: TripBackend>(&mut self, backend: &B) -> Result<(), PlannerError> {
        let trip = backend.get_trip(&self.trip.id).await?;
        self.version = trip.current_version.or(self.version);
        self.trip = trip;
        Ok(())
    }

    async fn handle_conflict<B: TripBackend>(
        &mut self,
        backend: &B,
        message: String,
    ) -> Result<ApplyOutcome, PlannerError> {
        tracing::warn!(trip_id = %self.trip.id, "update rejected as stale: {message}");
        let fresh = match backend.get_trip(&self.trip.id).await {
            Ok(trip) => trip,
            Err(err) => {
                self.phase = EditPhase::Confirming;
                self.error = Some(err.to_string());
                return Err(err.into());
            }
        };
        self.version = fresh.current_version;
        self.trip = fresh;

        let Some(update) = self.pending.clone() else {
            self.phase = EditPhase::Editing;
            return Ok(ApplyOutcome::Conflict);
        };
        if let Err(issues) = validate_update(&self.trip, &update) {
            tracing::warn!(trip_id = %self.trip.id, "pending edits no longer valid after refetch");
            self.back_to_editing();
            let err = PlannerError::Invalid(issues);
            self.error = Some(err.to_string());
            return Err(err);
        }
        let rebuilt = match ChangePreview::build(&self.trip, &update) {
            Ok(rebuilt) => rebuilt,
            Err(err) => {
                self.back_to_editing();
                self.error = Some(err.to_string());
                return Err(err);
            }
        };
        match rebuilt {
            Some(preview) => {
                self.preview = Some(preview);
                self.phase = EditPhase::Confirming;
                self.error = Some(
                    "This trip was changed elsewhere. Review the updated changes.".to_string(),
                );
                Ok(ApplyOutcome::Conflict)
            }
            None => {
                self.preview = None;
                self.pending = None;
                self.phase = EditPhase::Idle;
                Ok(ApplyOutcome::AlreadyApplied)
            }
        }
    }

    fn back_to_editing(&mut self) {
        self.phase = EditPhase::Editing;
        self.preview = None;
        self.pending = None;
    }
}
