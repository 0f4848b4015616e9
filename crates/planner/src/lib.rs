//! Client-side orchestration of trip edits.
//!
//! The planner computes what an edit changes and which report sections it
//! invalidates, walks the confirm/apply cycle, and follows the recalculation
//! the backend runs afterwards. All durable state lives in the backend; it is
//! reached through [`TripBackend`].
pub use backend::TripBackend;
pub use diff::{FieldChange, Impact, apply_update, diff, diff_snapshots, field_label};
pub use error::{BackendError, PlannerError};
pub use flow::{ApplyOutcome, EditFlow, EditPhase};
pub use impact::{ChangePreview, FIELD_IMPACT_MAP, FieldImpact, ImpactLevel, ImpactSummary};
pub use poller::{PollPolicy, RecalcTracker, drive_recalculation};
pub use report::{ReportOutcome, sample_destination_report};
pub use speculative::Speculative;
pub use validation::{ValidationIssue, validate_update};
pub use versions::{
    TripPage, VersionComparison, compare_versions, find_version, load_trip_page, restore_version,
};

mod backend;
pub mod diff;
mod error;
mod flow;
pub mod impact;
pub mod poller;
mod report;
mod speculative;
mod validation;
mod versions;
