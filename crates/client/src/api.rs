use std::sync::Arc;

use api_types::{
    analytics::AnalyticsSummary,
    recalculation::{RecalculationProgress, ReportSection, StartRecalculation},
    report::{DestinationReport, ItineraryReport, ReportKind, VisaReport},
    settings::UserSettings,
    template::TripTemplate,
    trip::{Trip, TripCreate, TripList, TripUpdateRequest, TripUpdateResponse},
    version::{RestoreResponse, VersionHistory},
};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    ClientError, Session,
    auth::{join, parse_base_url},
    error::REPORT_NOT_FOUND,
};

/// Client of the trip backend API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http: reqwest::Client::new(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub async fn trips_list(&self) -> Result<TripList, ClientError> {
        self.get_json("api/trips").await
    }

    pub async fn trip_create(&self, payload: &TripCreate) -> Result<Trip, ClientError> {
        self.send_json(Method::POST, "api/trips", payload).await
    }

    pub async fn trip_get(&self, trip_id: &str) -> Result<Trip, ClientError> {
        self.get_json(&format!("api/trips/{trip_id}")).await
    }

    pub async fn trip_update(
        &self,
        trip_id: &str,
        request: &TripUpdateRequest,
    ) -> Result<TripUpdateResponse, ClientError> {
        self.send_json(Method::PUT, &format!("api/trips/{trip_id}"), request)
            .await
    }

    pub async fn trip_delete(&self, trip_id: &str) -> Result<(), ClientError> {
        let endpoint = self.endpoint(&format!("api/trips/{trip_id}"))?;
        self.execute(self.http.request(Method::DELETE, endpoint))
            .await?;
        Ok(())
    }

    pub async fn versions_list(
        &self,
        trip_id: &str,
        limit: u32,
    ) -> Result<VersionHistory, ClientError> {
        self.get_json(&format!("api/trips/{trip_id}/versions?limit={limit}"))
            .await
    }

    pub async fn version_restore(
        &self,
        trip_id: &str,
        version: u32,
    ) -> Result<RestoreResponse, ClientError> {
        self.send_json(
            Method::POST,
            &format!("api/trips/{trip_id}/versions/{version}/restore"),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn recalculation_get(
        &self,
        trip_id: &str,
    ) -> Result<RecalculationProgress, ClientError> {
        self.get_json(&format!("api/trips/{trip_id}/recalculation"))
            .await
    }

    pub async fn recalculation_start(
        &self,
        trip_id: &str,
        sections: Option<Vec<ReportSection>>,
    ) -> Result<RecalculationProgress, ClientError> {
        self.send_json(
            Method::POST,
            &format!("api/trips/{trip_id}/recalculation"),
            &StartRecalculation { sections },
        )
        .await
    }

    pub async fn recalculation_cancel(&self, trip_id: &str) -> Result<(), ClientError> {
        let endpoint = self.endpoint(&format!("api/trips/{trip_id}/recalculation/cancel"))?;
        self.execute(self.http.post(endpoint)).await?;
        Ok(())
    }

    pub async fn report_visa(&self, trip_id: &str) -> Result<VisaReport, ClientError> {
        self.report(trip_id, ReportKind::Visa).await
    }

    pub async fn report_destination(
        &self,
        trip_id: &str,
    ) -> Result<DestinationReport, ClientError> {
        self.report(trip_id, ReportKind::Destination).await
    }

    pub async fn report_itinerary(&self, trip_id: &str) -> Result<ItineraryReport, ClientError> {
        self.report(trip_id, ReportKind::Itinerary).await
    }

    pub async fn templates_list(&self) -> Result<Vec<TripTemplate>, ClientError> {
        self.get_json("api/templates").await
    }

    pub async fn settings_get(&self) -> Result<UserSettings, ClientError> {
        self.get_json("api/settings").await
    }

    pub async fn settings_update(
        &self,
        settings: &UserSettings,
    ) -> Result<UserSettings, ClientError> {
        self.send_json(Method::PUT, "api/settings", settings).await
    }

    pub async fn analytics_summary(&self) -> Result<AnalyticsSummary, ClientError> {
        self.get_json("api/analytics/summary").await
    }

    /// A 404 means the report was never generated.
    async fn report<T: DeserializeOwned>(
        &self,
        trip_id: &str,
        kind: ReportKind,
    ) -> Result<T, ClientError> {
        let path = format!("api/trips/{trip_id}/reports/{}", kind.as_path());
        match self.get_json(&path).await {
            Err(ClientError::NotFound(_)) => Err(ClientError::NotFound(REPORT_NOT_FOUND.to_string())),
            other => other,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        join(&self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let endpoint = self.endpoint(path)?;
        let res = self.execute(self.http.get(endpoint)).await?;
        Ok(res.json::<T>().await?)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let endpoint = self.endpoint(path)?;
        let res = self
            .execute(self.http.request(method, endpoint).json(body))
            .await?;
        Ok(res.json::<T>().await?)
    }

    /// Authorizes and sends a request, turning non-success statuses into
    /// errors.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let token = self.session.access_token().await?;
        let res = request.bearer_auth(token).send().await?;
        let status = res.status();
        tracing::debug!(url = %res.url(), %status, "backend call");

        if status.is_success() {
            return Ok(res);
        }
        Err(ClientError::from_response(res).await)
    }
}
