//! Errors the planner can surface.
//!
//! - [`BackendError`] is the taxonomy of a failed backend call, independent of
//!   the transport that produced it.
//! - [`PlannerError`] covers everything the orchestration itself can reject.
use thiserror::Error;

use crate::validation::ValidationIssue;

/// Failure of a single backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("UNAUTHORIZED")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    /// The backend rejected an update based on a stale version.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
}

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid update: {}", describe(.0))]
    Invalid(Vec<ValidationIssue>),
    #[error("nothing to confirm")]
    NothingToConfirm,
    #[error("a recalculation is in progress")]
    Busy,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

fn describe(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}
