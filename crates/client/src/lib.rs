//! HTTP access to the trip backend and to the hosted auth/storage provider.
//!
//! Every request goes through an injected [`Session`], which owns the tokens
//! and refreshes them. [`ApiClient`] implements [`planner::TripBackend`], so
//! the orchestration runs unchanged against it.
mod api;
mod auth;
mod backend;
mod error;
mod session;
mod storage;

pub use api::ApiClient;
pub use auth::{AuthClient, AuthTokens, AuthUser};
pub use error::ClientError;
pub use session::Session;
pub use storage::StorageClient;
