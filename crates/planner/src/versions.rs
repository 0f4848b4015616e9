use api_types::{
    trip::Trip,
    version::{TripVersion, VersionHistory},
};

use crate::{BackendError, PlannerError, TripBackend, diff::FieldChange, diff::diff_snapshots};

/// Everything a trip screen renders on load.
#[derive(Clone, Debug)]
pub struct TripPage {
    pub trip: Trip,
    pub history: VersionHistory,
    /// Set when the history could not be fetched and is shown empty.
    pub history_error: Option<String>,
}

impl TripPage {
    /// Version the backend considers current.
    pub fn current_version(&self) -> Option<u32> {
        if self.history.current_version > 0 {
            Some(self.history.current_version)
        } else {
            self.trip.current_version
        }
    }
}

/// Fetches the trip and its version history concurrently.
///
/// The trip is required. A failed history degrades to an empty one.
pub async fn load_trip_page<B: TripBackend>(
    backend: &B,
    trip_id: &str,
    versions_limit: u32,
) -> Result<TripPage, BackendError> {
    let (trip, history) = tokio::join!(
        backend.get_trip(trip_id),
        backend.list_versions(trip_id, versions_limit)
    );
    let trip = trip?;

    let (history, history_error) = match history {
        Ok(history) => (history, None),
        Err(err) => {
            tracing::warn!(%trip_id, "version history unavailable: {err}");
            let empty = VersionHistory {
                trip_id: trip_id.to_string(),
                current_version: trip.current_version.unwrap_or_default(),
                ..Default::default()
            };
            (empty, Some(err.to_string()))
        }
    };

    Ok(TripPage {
        trip,
        history,
        history_error,
    })
}

/// Restores `version` and reloads the whole page.
///
/// The backend records the restore as a new version, so the current version
/// moves forward.
pub async fn restore_version<B: TripBackend>(
    backend: &B,
    trip_id: &str,
    version: u32,
    versions_limit: u32,
) -> Result<TripPage, BackendError> {
    let restored = backend.restore_version(trip_id, version).await?;
    tracing::info!(
        %trip_id,
        restored_from = restored.restored_from,
        version = restored.version,
        "version restored"
    );
    load_trip_page(backend, trip_id, versions_limit).await
}

#[derive(Clone, Debug)]
pub struct VersionComparison<'a> {
    pub from: &'a TripVersion,
    pub to: &'a TripVersion,
    pub changes: Vec<FieldChange>,
}

pub fn find_version(history: &VersionHistory, version: u32) -> Option<&TripVersion> {
    history.versions.iter().find(|v| v.version == version)
}

/// Compares two versions of the loaded page.
///
/// `Ok(None)` when either version is not part of the page; nothing is
/// fetched on demand.
pub fn compare_versions(
    history: &VersionHistory,
    from: u32,
    to: u32,
) -> Result<Option<VersionComparison<'_>>, PlannerError> {
    let (Some(from), Some(to)) = (find_version(history, from), find_version(history, to)) else {
        return Ok(None);
    };
    let changes = diff_snapshots(&from.snapshot, &to.snapshot)?;
    Ok(Some(VersionComparison { from, to, changes }))
}
