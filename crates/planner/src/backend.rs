use std::future::Future;

use api_types::{
    recalculation::{RecalculationProgress, ReportSection},
    trip::{Trip, TripUpdateRequest, TripUpdateResponse},
    version::{RestoreResponse, VersionHistory},
};

use crate::BackendError;

/// The backend calls the orchestration needs.
///
/// `client::ApiClient` implements it over HTTP; tests use in-memory fakes.
pub trait TripBackend {
    fn get_trip(&self, trip_id: &str) -> impl Future<Output = Result<Trip, BackendError>> + Send;

    /// First page of the version history, newest first.
    fn list_versions(
        &self,
        trip_id: &str,
        limit: u32,
    ) -> impl Future<Output = Result<VersionHistory, BackendError>> + Send;

    fn update_trip(
        &self,
        trip_id: &str,
        request: &TripUpdateRequest,
    ) -> impl Future<Output = Result<TripUpdateResponse, BackendError>> + Send;

    fn restore_version(
        &self,
        trip_id: &str,
        version: u32,
    ) -> impl Future<Output = Result<RestoreResponse, BackendError>> + Send;

    fn recalculation_status(
        &self,
        trip_id: &str,
    ) -> impl Future<Output = Result<RecalculationProgress, BackendError>> + Send;

    /// `None` asks for a full recalculation.
    fn start_recalculation(
        &self,
        trip_id: &str,
        sections: Option<Vec<ReportSection>>,
    ) -> impl Future<Output = Result<RecalculationProgress, BackendError>> + Send;

    fn cancel_recalculation(
        &self,
        trip_id: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}
