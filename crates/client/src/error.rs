use planner::BackendError;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Message of a 404 on a report endpoint: the report was never generated.
pub const REPORT_NOT_FOUND: &str = "REPORT_NOT_FOUND";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("UNAUTHORIZED")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Maps a non-success status and its optional `detail` to an error.
    pub fn from_status(status: StatusCode, detail: Option<String>) -> Self {
        let code = status.as_u16();
        let message = detail.unwrap_or_else(|| format!("HTTP {code}"));
        match code {
            401 => Self::Unauthorized,
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            400 | 422 => Self::Validation(message),
            _ => Self::Server {
                status: code,
                message,
            },
        }
    }

    pub(crate) async fn from_response(res: Response) -> Self {
        let status = res.status();
        let detail = res
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(ErrorBody::message);
        Self::from_status(status, detail)
    }
}

/// Error body of the backend and of the auth provider. The backend sends
/// `detail`, the auth provider one of the others.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        if let Some(detail) = self.detail {
            return Some(detail_text(detail));
        }
        self.error_description.or(self.msg).or(self.message)
    }
}

/// Field errors arrive as `[{"loc": [..., "budget"], "msg": "..."}]`.
fn detail_text(detail: Value) -> String {
    match detail {
        Value::String(text) => text,
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| {
                    let msg = item.get("msg").and_then(Value::as_str);
                    let field = item
                        .get("loc")
                        .and_then(Value::as_array)
                        .and_then(|loc| loc.last())
                        .and_then(Value::as_str);
                    match (field, msg) {
                        (Some(field), Some(msg)) => format!("{field}: {msg}"),
                        (None, Some(msg)) => msg.to_string(),
                        _ => item.to_string(),
                    }
                })
                .collect();
            parts.join("; ")
        }
        other => other.to_string(),
    }
}

impl From<ClientError> for BackendError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotAuthenticated => Self::NotAuthenticated,
            ClientError::Unauthorized => Self::Unauthorized,
            ClientError::NotFound(message) => Self::NotFound(message),
            ClientError::Conflict(message) => Self::Conflict(message),
            ClientError::Validation(message) => Self::Validation(message),
            ClientError::Forbidden(message) => Self::Http {
                status: 403,
                message,
            },
            ClientError::Server { status, message } => Self::Http { status, message },
            ClientError::Transport(err) => Self::Network(err.to_string()),
            ClientError::InvalidUrl(message) => Self::Network(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: Value) -> Option<String> {
        serde_json::from_value::<ErrorBody>(value)
            .unwrap()
            .message()
    }

    #[test]
    fn statuses_map_to_the_taxonomy() {
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, Some("expired".into())),
            ClientError::Unauthorized
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::CONFLICT, Some("stale".into())),
            ClientError::Conflict(msg) if msg == "stale"
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::UNPROCESSABLE_ENTITY, None),
            ClientError::Validation(msg) if msg == "HTTP 422"
        ));
    }

    #[test]
    fn unknown_status_without_detail_reads_http_status() {
        let err = ClientError::from_status(StatusCode::BAD_GATEWAY, None);
        assert_eq!(err.to_string(), "HTTP 502");
        assert!(matches!(err, ClientError::Server { status: 502, .. }));
    }

    #[test]
    fn detail_becomes_the_message() {
        let err = ClientError::from_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            body(json!({"detail": "Agent pool exhausted"})),
        );
        assert_eq!(err.to_string(), "Agent pool exhausted");
    }

    #[test]
    fn non_string_detail_is_rendered_as_text() {
        assert_eq!(
            body(json!({"detail": {"code": 7}})).as_deref(),
            Some(r#"{"code":7}"#)
        );
        assert_eq!(
            body(json!({"detail": [
                {"loc": ["body", "budget"], "msg": "must be positive"},
                {"msg": "bad dates"}
            ]}))
            .as_deref(),
            Some("budget: must be positive; bad dates")
        );
    }

    #[test]
    fn auth_provider_bodies_are_understood() {
        assert_eq!(
            body(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"}))
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(body(json!({"msg": "Bucket not found"})).as_deref(), Some("Bucket not found"));
        assert_eq!(body(json!({})), None);
    }

    #[test]
    fn backend_errors_keep_their_display() {
        let cases = [
            (ClientError::NotAuthenticated, "Not authenticated"),
            (ClientError::Unauthorized, "UNAUTHORIZED"),
            (ClientError::NotFound(REPORT_NOT_FOUND.into()), "REPORT_NOT_FOUND"),
            (
                ClientError::Server {
                    status: 500,
                    message: "HTTP 500".into(),
                },
                "HTTP 500",
            ),
        ];
        for (err, expected) in cases {
            let backend = BackendError::from(err);
            assert_eq!(backend.to_string(), expected);
        }
    }
}
