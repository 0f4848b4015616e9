#![allow(dead_code)]

use std::{collections::VecDeque, sync::Mutex};

use api_types::{
    recalculation::{RecalculationProgress, RecalculationStatus, ReportSection},
    trip::{Trip, TripUpdateRequest, TripUpdateResponse},
    version::{RestoreResponse, TripVersion, VersionHistory},
};
use chrono::{NaiveDate, TimeZone, Utc};
use planner::{BackendError, TripBackend, apply_update};

#[derive(Default)]
pub struct FakeState {
    pub trip: Trip,
    pub trip_error: Option<BackendError>,
    pub history: VersionHistory,
    pub history_error: Option<BackendError>,
    pub update_results: VecDeque<Result<TripUpdateResponse, BackendError>>,
    pub statuses: VecDeque<Result<RecalculationProgress, BackendError>>,
    pub start_results: VecDeque<Result<RecalculationProgress, BackendError>>,
    pub cancel_error: Option<BackendError>,
    pub calls: Vec<&'static str>,
    pub update_requests: Vec<serde_json::Value>,
    pub start_calls: Vec<Option<Vec<ReportSection>>>,
}

/// In-memory backend: applies updates, keeps versions, replays scripted
/// recalculation statuses.
pub struct FakeBackend {
    pub state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new(trip: Trip) -> Self {
        let history = history_for(&trip);
        Self {
            state: Mutex::new(FakeState {
                trip,
                history,
                ..Default::default()
            }),
        }
    }

    pub fn calls(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| **call == name)
            .count()
    }

    pub fn push_status(&self, status: RecalculationStatus) {
        self.state
            .lock()
            .unwrap()
            .statuses
            .push_back(Ok(progress(status)));
    }
}

impl TripBackend for FakeBackend {
    async fn get_trip(&self, _trip_id: &str) -> Result<Trip, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("get_trip");
        match &state.trip_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.trip.clone()),
        }
    }

    async fn list_versions(
        &self,
        _trip_id: &str,
        limit: u32,
    ) -> Result<VersionHistory, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("list_versions");
        if let Some(err) = &state.history_error {
            return Err(err.clone());
        }
        let mut page = state.history.clone();
        page.versions.truncate(limit as usize);
        Ok(page)
    }

    async fn update_trip(
        &self,
        _trip_id: &str,
        request: &TripUpdateRequest,
    ) -> Result<TripUpdateResponse, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("update_trip");
        state
            .update_requests
            .push(serde_json::to_value(request).unwrap());
        if let Some(result) = state.update_results.pop_front() {
            if let Ok(response) = &result {
                state.trip = response.trip.clone();
            }
            return result;
        }

        let version = state.history.current_version + 1;
        let mut trip = apply_update(&state.trip, &request.updates).unwrap();
        trip.current_version = Some(version);
        state.trip = trip.clone();
        record_version(&mut state.history, &trip);
        Ok(TripUpdateResponse {
            trip,
            version,
            recalculation: None,
        })
    }

    async fn restore_version(
        &self,
        trip_id: &str,
        version: u32,
    ) -> Result<RestoreResponse, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("restore_version");
        let Some(old) = state.history.versions.iter().find(|v| v.version == version) else {
            return Err(BackendError::NotFound(format!("version {version}")));
        };

        let new_version = state.history.current_version + 1;
        let mut trip = old.snapshot.clone();
        trip.id = trip_id.to_string();
        trip.current_version = Some(new_version);
        state.trip = trip.clone();
        record_version(&mut state.history, &trip);
        Ok(RestoreResponse {
            trip,
            version: new_version,
            restored_from: version,
        })
    }

    async fn recalculation_status(
        &self,
        _trip_id: &str,
    ) -> Result<RecalculationProgress, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("recalculation_status");
        state
            .statuses
            .pop_front()
            .unwrap_or_else(|| Ok(progress(RecalculationStatus::Processing)))
    }

    async fn start_recalculation(
        &self,
        _trip_id: &str,
        sections: Option<Vec<ReportSection>>,
    ) -> Result<RecalculationProgress, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("start_recalculation");
        state.start_calls.push(sections);
        state
            .start_results
            .pop_front()
            .unwrap_or_else(|| Ok(progress(RecalculationStatus::Queued)))
    }

    async fn cancel_recalculation(&self, _trip_id: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("cancel_recalculation");
        match &state.cancel_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

pub fn progress(status: RecalculationStatus) -> RecalculationProgress {
    RecalculationProgress {
        status,
        ..Default::default()
    }
}

pub fn kyoto_trip() -> Trip {
    Trip {
        id: "trip-1".to_string(),
        title: Some("Spring in Kyoto".to_string()),
        destination_country: Some("Japan".to_string()),
        destination_city: Some("Kyoto".to_string()),
        origin_country: Some("Italy".to_string()),
        start_date: NaiveDate::from_ymd_opt(2026, 4, 1),
        end_date: NaiveDate::from_ymd_opt(2026, 4, 10),
        budget: Some(3000.0),
        currency: Some("EUR".to_string()),
        travelers: Some(2),
        notes: Some("window seat".to_string()),
        current_version: Some(1),
        ..Default::default()
    }
}

/// A trip whose history holds versions 1..=`versions`, each with a
/// different budget.
pub fn trip_with_versions(versions: u32) -> FakeBackend {
    let backend = FakeBackend::new(kyoto_trip());
    {
        let mut state = backend.state.lock().unwrap();
        for n in 2..=versions {
            let mut trip = state.trip.clone();
            trip.budget = Some(3000.0 + f64::from(n) * 100.0);
            trip.current_version = Some(n);
            state.trip = trip.clone();
            record_version(&mut state.history, &trip);
        }
    }
    backend
}

fn history_for(trip: &Trip) -> VersionHistory {
    let version = trip.current_version.unwrap_or(1);
    VersionHistory {
        trip_id: trip.id.clone(),
        current_version: version,
        versions: vec![snapshot(trip, version)],
        total: 1,
    }
}

fn record_version(history: &mut VersionHistory, trip: &Trip) {
    let version = history.current_version + 1;
    history.current_version = version;
    history.versions.insert(0, snapshot(trip, version));
    history.total += 1;
}

fn snapshot(trip: &Trip, version: u32) -> TripVersion {
    TripVersion {
        version,
        snapshot: trip.clone(),
        created_at: Utc
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default(),
        change_summary: None,
        changed_fields: Vec::new(),
        created_by: None,
    }
}
