use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use api_types::{
    recalculation::RecalculationStatus,
    settings::UserSettings,
    trip::{TripUpdate, TripUpdateRequest},
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Duration, Utc};
use client::{ApiClient, AuthClient, AuthTokens, ClientError, Session, StorageClient};
use planner::{BackendError, TripBackend};
use serde_json::{Value, json};

const API_KEY: &str = "anon-key";
const TOKEN: &str = "token-1";
const REFRESHED: &str = "token-2";

#[derive(Debug, Clone)]
struct Call {
    path: String,
    bearer: Option<String>,
    body: Value,
}

#[derive(Default)]
struct Recorded {
    calls: Vec<Call>,
}

type Shared = Arc<Mutex<Recorded>>;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn record(shared: &Shared, path: impl Into<String>, headers: &HeaderMap, body: Value) {
    shared.lock().unwrap().calls.push(Call {
        path: path.into(),
        bearer: bearer(headers),
        body,
    });
}

fn authorized(headers: &HeaderMap) -> bool {
    matches!(bearer(headers).as_deref(), Some(TOKEN) | Some(REFRESHED))
}

fn detail(status: StatusCode, detail: Value) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn trip_json(id: &str, version: u32) -> Value {
    json!({
        "id": id,
        "title": "Spring in Kyoto",
        "destinationCountry": "Japan",
        "destinationCity": "Kyoto",
        "startDate": "2026-04-01",
        "endDate": "2026-04-10",
        "budget": 3000.0,
        "travelers": 2,
        "notes": "window seat",
        "currentVersion": version,
        "mealPlan": "half board"
    })
}

async fn token(
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "No API key found in request" })),
        )
            .into_response();
    }
    match query.get("grant_type").map(String::as_str) {
        Some("password") if body["email"] == "ada@example.com" && body["password"] == "secret" => {
            Json(json!({
                "access_token": TOKEN,
                "refresh_token": "refresh-1",
                "expires_in": 3600,
                "user": { "id": "user-1", "email": "ada@example.com" }
            }))
            .into_response()
        }
        Some("refresh_token") if body["refresh_token"] == "refresh-1" => Json(json!({
            "access_token": REFRESHED,
            "refresh_token": "refresh-2",
            "expires_in": 3600
        }))
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })),
        )
            .into_response(),
    }
}

async fn logout(State(shared): State<Shared>, headers: HeaderMap) -> StatusCode {
    record(&shared, "/auth/v1/logout", &headers, Value::Null);
    StatusCode::NO_CONTENT
}

async fn get_trip(
    State(shared): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record(&shared, format!("GET /api/trips/{id}"), &headers, Value::Null);
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, json!("Invalid token"));
    }
    if id == "missing" {
        return detail(StatusCode::NOT_FOUND, json!("Trip not found"));
    }
    Json(trip_json(&id, 3)).into_response()
}

async fn put_trip(
    State(shared): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&shared, format!("PUT /api/trips/{id}"), &headers, body.clone());
    if body["expectedVersion"] != 3 {
        return detail(
            StatusCode::CONFLICT,
            json!("Trip was modified by another session"),
        );
    }
    Json(json!({
        "trip": trip_json(&id, 4),
        "version": 4,
        "recalculation": { "status": "queued", "progress": 0.0 }
    }))
    .into_response()
}

async fn delete_trip(
    State(shared): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    record(&shared, format!("DELETE /api/trips/{id}"), &headers, Value::Null);
    StatusCode::NO_CONTENT
}

async fn versions(
    State(shared): State<Shared>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    record(
        &shared,
        format!("GET /api/trips/{id}/versions"),
        &headers,
        json!(query),
    );
    Json(json!({
        "tripId": id,
        "currentVersion": 3,
        "versions": [
            { "version": 3, "snapshot": trip_json(&id, 3), "createdAt": "2026-03-01T10:00:00Z" },
            { "version": 2, "snapshot": trip_json(&id, 2), "createdAt": "2026-02-01T10:00:00Z" }
        ],
        "total": 3
    }))
}

async fn start_recalculation(
    State(shared): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(
        &shared,
        format!("POST /api/trips/{id}/recalculation"),
        &headers,
        body,
    );
    Json(json!({ "status": "queued" }))
}

async fn cancel_recalculation(
    State(shared): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    record(
        &shared,
        format!("POST /api/trips/{id}/recalculation/cancel"),
        &headers,
        Value::Null,
    );
    StatusCode::NO_CONTENT
}

async fn report(Path((_id, kind)): Path<(String, String)>) -> Response {
    match kind.as_str() {
        "destination" => Json(json!({
            "country": "Japan",
            "city": "Kyoto",
            "overview": "Temples and gardens.",
            "languages": ["Japanese"]
        }))
        .into_response(),
        _ => detail(StatusCode::NOT_FOUND, json!("Not Found")),
    }
}

async fn get_settings() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn put_settings() -> Response {
    detail(
        StatusCode::UNPROCESSABLE_ENTITY,
        json!([{ "loc": ["body", "timezone"], "msg": "unknown timezone" }]),
    )
}

async fn upload(
    State(shared): State<Shared>,
    Path(object): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    record(
        &shared,
        format!("POST /storage/v1/object/covers/{object}"),
        &headers,
        json!({ "contentType": content_type, "size": body.len() }),
    );
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "msg": "missing apikey" }))).into_response();
    }
    Json(json!({ "Key": format!("covers/{object}") })).into_response()
}

async fn spawn_backend() -> (String, Shared) {
    let shared = Shared::default();
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/logout", post(logout))
        .route(
            "/api/trips/{id}",
            get(get_trip).put(put_trip).delete(delete_trip),
        )
        .route("/api/trips/{id}/versions", get(versions))
        .route("/api/trips/{id}/recalculation", post(start_recalculation))
        .route(
            "/api/trips/{id}/recalculation/cancel",
            post(cancel_recalculation),
        )
        .route("/api/trips/{id}/reports/{kind}", get(report))
        .route("/api/settings", get(get_settings).put(put_settings))
        .route("/storage/v1/object/covers/{*object}", post(upload))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), shared)
}

fn calls(shared: &Shared) -> Vec<Call> {
    shared.lock().unwrap().calls.clone()
}

async fn signed_in_client(url: &str) -> ApiClient {
    let session = Arc::new(Session::with_token(TOKEN));
    ApiClient::new(url, session).unwrap()
}

#[tokio::test]
async fn sign_in_then_fetch_with_bearer_token() {
    let (url, shared) = spawn_backend().await;
    let session = Arc::new(Session::new(AuthClient::new(&url, API_KEY).unwrap()));

    let user = session.sign_in("ada@example.com", "secret").await.unwrap();
    assert_eq!(user.id, "user-1");

    let api = ApiClient::new(&url, session.clone()).unwrap();
    let trip = api.trip_get("trip-1").await.unwrap();
    assert_eq!(trip.destination_city.as_deref(), Some("Kyoto"));
    assert_eq!(trip.extra.get("mealPlan"), Some(&json!("half board")));
    assert_eq!(calls(&shared)[0].bearer.as_deref(), Some(TOKEN));
}

#[tokio::test]
async fn wrong_password_reports_the_provider_message() {
    let (url, _shared) = spawn_backend().await;
    let session = Session::new(AuthClient::new(&url, API_KEY).unwrap());

    let err = session.sign_in("ada@example.com", "nope").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid login credentials");
    assert!(!session.is_signed_in().await);
}

#[tokio::test]
async fn calls_without_a_session_never_reach_the_network() {
    let (url, shared) = spawn_backend().await;
    let session = Arc::new(Session::new(AuthClient::new(&url, API_KEY).unwrap()));
    let api = ApiClient::new(&url, session).unwrap();

    let err = api.trip_get("trip-1").await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
    assert_eq!(err.to_string(), "Not authenticated");
    assert!(calls(&shared).is_empty());
}

#[tokio::test]
async fn expiring_token_is_refreshed_before_the_call() {
    let (url, shared) = spawn_backend().await;
    let session = Arc::new(Session::new(AuthClient::new(&url, API_KEY).unwrap()));
    session
        .restore(AuthTokens {
            access_token: "stale".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Some(Utc::now() - Duration::minutes(1)),
            user: None,
        })
        .await;

    let api = ApiClient::new(&url, session.clone()).unwrap();
    api.trip_get("trip-1").await.unwrap();

    assert_eq!(calls(&shared)[0].bearer.as_deref(), Some(REFRESHED));
    assert_eq!(session.access_token().await.unwrap(), REFRESHED);
}

#[tokio::test]
async fn failed_refresh_signs_out() {
    let (url, shared) = spawn_backend().await;
    let session = Arc::new(Session::new(AuthClient::new(&url, API_KEY).unwrap()));
    session
        .restore(AuthTokens {
            access_token: "stale".to_string(),
            refresh_token: Some("revoked".to_string()),
            expires_at: Some(Utc::now()),
            user: None,
        })
        .await;

    let api = ApiClient::new(&url, session.clone()).unwrap();
    let err = api.trip_get("trip-1").await.unwrap_err();

    assert!(matches!(err, ClientError::NotAuthenticated));
    assert!(!session.is_signed_in().await);
    assert!(calls(&shared).is_empty());
}

#[tokio::test]
async fn rejected_token_maps_to_unauthorized() {
    let (url, _shared) = spawn_backend().await;
    let api = ApiClient::new(&url, Arc::new(Session::with_token("forged"))).unwrap();

    let err = api.trip_get("trip-1").await.unwrap_err();
    assert_eq!(err.to_string(), "UNAUTHORIZED");
}

#[tokio::test]
async fn missing_trip_carries_the_backend_detail() {
    let (url, _shared) = spawn_backend().await;
    let api = signed_in_client(&url).await;

    let err = TripBackend::get_trip(&api, "missing").await.unwrap_err();
    assert_eq!(err, BackendError::NotFound("Trip not found".to_string()));
}

#[tokio::test]
async fn update_sends_only_the_changed_keys_and_the_version() {
    let (url, shared) = spawn_backend().await;
    let api = signed_in_client(&url).await;
    let request = TripUpdateRequest {
        updates: TripUpdate {
            notes: Some("aisle seat".to_string()),
            ..Default::default()
        },
        expected_version: Some(3),
        recalculate: false,
        sections: None,
    };

    let response = api.trip_update("trip-1", &request).await.unwrap();

    assert_eq!(response.version, 4);
    assert_eq!(
        response.recalculation.map(|p| p.status),
        Some(RecalculationStatus::Queued)
    );
    let body = &calls(&shared)[0].body;
    assert_eq!(body["updates"], json!({ "notes": "aisle seat" }));
    assert_eq!(body["expectedVersion"], 3);
}

#[tokio::test]
async fn stale_update_is_a_conflict() {
    let (url, _shared) = spawn_backend().await;
    let api = signed_in_client(&url).await;
    let request = TripUpdateRequest {
        updates: TripUpdate {
            budget: Some(4000.0),
            ..Default::default()
        },
        expected_version: Some(2),
        recalculate: true,
        sections: None,
    };

    let err = TripBackend::update_trip(&api, "trip-1", &request)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BackendError::Conflict("Trip was modified by another session".to_string())
    );
}

#[tokio::test]
async fn versions_page_is_limited() {
    let (url, shared) = spawn_backend().await;
    let api = signed_in_client(&url).await;

    let history = api.versions_list("trip-1", 20).await.unwrap();

    assert_eq!(history.current_version, 3);
    assert_eq!(history.versions[0].version, 3);
    assert_eq!(calls(&shared)[0].body, json!({ "limit": "20" }));
}

#[tokio::test]
async fn recalculation_start_and_cancel() {
    let (url, shared) = spawn_backend().await;
    let api = signed_in_client(&url).await;

    let progress = api.recalculation_start("trip-1", None).await.unwrap();
    assert_eq!(progress.status, RecalculationStatus::Queued);
    api.recalculation_cancel("trip-1").await.unwrap();
    api.trip_delete("trip-1").await.unwrap();

    let calls = calls(&shared);
    assert_eq!(calls[0].body, json!({ "sections": null }));
    assert_eq!(calls[1].path, "POST /api/trips/trip-1/recalculation/cancel");
    assert_eq!(calls[2].path, "DELETE /api/trips/trip-1");
}

#[tokio::test]
async fn missing_report_reads_report_not_found() {
    let (url, _shared) = spawn_backend().await;
    let api = signed_in_client(&url).await;

    let err = api.report_visa("trip-1").await.unwrap_err();
    assert_eq!(err.to_string(), "REPORT_NOT_FOUND");

    let destination = api.report_destination("trip-1").await.unwrap();
    assert_eq!(destination.city.as_deref(), Some("Kyoto"));
    assert_eq!(destination.languages, vec!["Japanese".to_string()]);
}

#[tokio::test]
async fn error_without_detail_reads_http_status() {
    let (url, _shared) = spawn_backend().await;
    let api = signed_in_client(&url).await;

    let err = api.settings_get().await.unwrap_err();
    assert!(matches!(err, ClientError::Server { status: 500, .. }));
    assert_eq!(err.to_string(), "HTTP 500");

    let err = api
        .settings_update(&UserSettings::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "timezone: unknown timezone");
}

#[tokio::test]
async fn cover_upload_returns_the_public_url() {
    let (url, shared) = spawn_backend().await;
    let storage =
        StorageClient::new(&url, API_KEY, "covers", Arc::new(Session::with_token(TOKEN))).unwrap();

    let public = storage
        .upload_cover_image("trip-1", "kyoto.png", vec![1, 2, 3])
        .await
        .unwrap();

    assert_eq!(
        public,
        format!("{url}/storage/v1/object/public/covers/trip-1/kyoto.png")
    );
    let call = &calls(&shared)[0];
    assert_eq!(call.path, "POST /storage/v1/object/covers/trip-1/kyoto.png");
    assert_eq!(call.body, json!({ "contentType": "image/png", "size": 3 }));
    assert_eq!(call.bearer.as_deref(), Some(TOKEN));
}

#[tokio::test]
async fn sign_out_forgets_the_tokens() {
    let (url, shared) = spawn_backend().await;
    let session = Session::new(AuthClient::new(&url, API_KEY).unwrap());
    session.sign_in("ada@example.com", "secret").await.unwrap();

    session.sign_out().await.unwrap();

    assert!(!session.is_signed_in().await);
    assert_eq!(calls(&shared)[0].path, "/auth/v1/logout");
    assert!(matches!(
        session.access_token().await,
        Err(ClientError::NotAuthenticated)
    ));
}
