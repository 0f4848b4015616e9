use api_types::{
    recalculation::{RecalculationProgress, ReportSection},
    trip::{Trip, TripUpdateRequest, TripUpdateResponse},
    version::{RestoreResponse, VersionHistory},
};
use planner::{BackendError, TripBackend};

use crate::ApiClient;

impl TripBackend for ApiClient {
    async fn get_trip(&self, trip_id: &str) -> Result<Trip, BackendError> {
        Ok(self.trip_get(trip_id).await?)
    }

    async fn list_versions(&self, trip_id: &str, limit: u32) -> Result<VersionHistory, BackendError> {
        Ok(self.versions_list(trip_id, limit).await?)
    }

    async fn update_trip(
        &self,
        trip_id: &str,
        request: &TripUpdateRequest,
    ) -> Result<TripUpdateResponse, BackendError> {
        Ok(self.trip_update(trip_id, request).await?)
    }

    async fn restore_version(
        &self,
        trip_id: &str,
        version: u32,
    ) -> Result<RestoreResponse, BackendError> {
        Ok(self.version_restore(trip_id, version).await?)
    }

    async fn recalculation_status(
        &self,
        trip_id: &str,
    ) -> Result<RecalculationProgress, BackendError> {
        Ok(self.recalculation_get(trip_id).await?)
    }

    async fn start_recalculation(
        &self,
        trip_id: &str,
        sections: Option<Vec<ReportSection>>,
    ) -> Result<RecalculationProgress, BackendError> {
        Ok(self.recalculation_start(trip_id, sections).await?)
    }

    async fn cancel_recalculation(&self, trip_id: &str) -> Result<(), BackendError> {
        Ok(self.recalculation_cancel(trip_id).await?)
    }
}
