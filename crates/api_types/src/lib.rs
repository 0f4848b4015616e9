use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod trip {
    use super::*;

    /// A trip as held by the backend.
    ///
    /// Fields the client does not know about are kept in `extra`, so they
    /// survive diffing and are sent back untouched.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Trip {
        #[serde(default)]
        pub id: String,
        pub title: Option<String>,
        pub destination_country: Option<String>,
        pub destination_city: Option<String>,
        pub origin_country: Option<String>,
        pub nationality: Option<String>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub budget: Option<f64>,
        pub currency: Option<String>,
        pub travelers: Option<u32>,
        pub trip_purpose: Option<String>,
        pub travel_style: Option<String>,
        #[serde(default)]
        pub interests: Vec<String>,
        pub accommodation_type: Option<String>,
        pub notes: Option<String>,
        pub status: Option<String>,
        pub cover_image_url: Option<String>,
        pub current_version: Option<u32>,
        pub created_at: Option<DateTime<Utc>>,
        pub updated_at: Option<DateTime<Utc>>,
        #[serde(flatten)]
        pub extra: Map<String, Value>,
    }

    impl Trip {
        /// "City, Country" or whichever half is known.
        pub fn destination_label(&self) -> String {
            match (
                self.destination_city.as_deref(),
                self.destination_country.as_deref(),
            ) {
                (Some(city), Some(country)) => format!("{city}, {country}"),
                (Some(city), None) => city.to_string(),
                (None, Some(country)) => country.to_string(),
                (None, None) => "-".to_string(),
            }
        }
    }

    /// Partial update of a trip. `None` means the key is not part of the update.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TripUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub destination_country: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub destination_city: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub origin_country: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub nationality: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub start_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub end_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub budget: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub currency: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub travelers: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub trip_purpose: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub travel_style: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub interests: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub accommodation_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub notes: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub cover_image_url: Option<String>,
        #[serde(flatten)]
        pub extra: Map<String, Value>,
    }

    /// Body of `PUT /api/trips/{id}`.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TripUpdateRequest {
        pub updates: TripUpdate,
        /// Version the edit was based on. The backend answers 409 when stale.
        pub expected_version: Option<u32>,
        /// Ask the backend to start a recalculation of the affected sections.
        #[serde(default)]
        pub recalculate: bool,
        pub sections: Option<Vec<super::recalculation::ReportSection>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TripUpdateResponse {
        pub trip: Trip,
        pub version: u32,
        /// Present when the backend already started a recalculation.
        pub recalculation: Option<super::recalculation::RecalculationProgress>,
    }

    /// Body of `POST /api/trips`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TripCreate {
        pub title: String,
        pub destination_country: String,
        pub destination_city: Option<String>,
        pub origin_country: Option<String>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub budget: Option<f64>,
        pub currency: Option<String>,
        pub travelers: Option<u32>,
        pub travel_style: Option<String>,
        pub template_id: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TripSummary {
        pub id: String,
        pub title: Option<String>,
        pub destination_country: Option<String>,
        pub destination_city: Option<String>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub status: Option<String>,
        pub current_version: Option<u32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TripList {
        pub trips: Vec<TripSummary>,
        #[serde(default)]
        pub total: u32,
    }
}

pub mod version {
    use super::*;
    use crate::trip::Trip;

    /// Immutable snapshot created by the backend for every confirmed update.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TripVersion {
        pub version: u32,
        pub snapshot: Trip,
        pub created_at: DateTime<Utc>,
        pub change_summary: Option<String>,
        #[serde(default)]
        pub changed_fields: Vec<String>,
        pub created_by: Option<String>,
    }

    /// One page of a trip's version history, newest first.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VersionHistory {
        #[serde(default)]
        pub trip_id: String,
        #[serde(default)]
        pub current_version: u32,
        #[serde(default)]
        pub versions: Vec<TripVersion>,
        #[serde(default)]
        pub total: u32,
    }

    /// Answer to a restore. Restoring creates a new version, it never rewinds.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RestoreResponse {
        pub trip: Trip,
        pub version: u32,
        pub restored_from: u32,
    }
}

pub mod recalculation {
    use super::*;

    /// Report sections the backend regenerates with one agent each.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ReportSection {
        Visa,
        Country,
        Weather,
        Currency,
        Culture,
        Food,
        Attractions,
        Itinerary,
        Flight,
        Budget,
    }

    impl ReportSection {
        pub fn label(self) -> &'static str {
            match self {
                Self::Visa => "Visa",
                Self::Country => "Country",
                Self::Weather => "Weather",
                Self::Currency => "Currency",
                Self::Culture => "Culture",
                Self::Food => "Food",
                Self::Attractions => "Attractions",
                Self::Itinerary => "Itinerary",
                Self::Flight => "Flights",
                Self::Budget => "Budget",
            }
        }
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RecalculationStatus {
        #[default]
        Idle,
        Queued,
        Processing,
        Completed,
        Failed,
        Cancelled,
        /// Client side only: the poll budget ran out before the backend finished.
        TimedOut,
    }

    impl RecalculationStatus {
        /// Statuses that keep the poller running.
        pub fn is_active(self) -> bool {
            matches!(self, Self::Queued | Self::Processing)
        }

        pub fn is_terminal(self) -> bool {
            matches!(
                self,
                Self::Completed | Self::Failed | Self::Cancelled | Self::TimedOut
            )
        }

        pub fn label(self) -> &'static str {
            match self {
                Self::Idle => "idle",
                Self::Queued => "queued",
                Self::Processing => "processing",
                Self::Completed => "completed",
                Self::Failed => "failed",
                Self::Cancelled => "cancelled",
                Self::TimedOut => "timed out",
            }
        }
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RecalculationProgress {
        #[serde(default)]
        pub status: RecalculationStatus,
        pub current_agent: Option<String>,
        #[serde(default)]
        pub completed_agents: Vec<String>,
        #[serde(default)]
        pub failed_agents: Vec<String>,
        /// Percentage, 0 to 100.
        #[serde(default)]
        pub progress: f32,
        pub started_at: Option<DateTime<Utc>>,
        pub completed_at: Option<DateTime<Utc>>,
        pub error: Option<String>,
    }

    /// Body of `POST /api/trips/{id}/recalculation`. No sections means a full run.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StartRecalculation {
        pub sections: Option<Vec<ReportSection>>,
    }
}

pub mod settings {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserSettings {
        pub display_name: Option<String>,
        pub home_country: Option<String>,
        pub nationality: Option<String>,
        pub preferred_currency: Option<String>,
        pub timezone: Option<String>,
        pub date_format: Option<String>,
        #[serde(default)]
        pub email_notifications: bool,
        #[serde(default)]
        pub recalculation_alerts: bool,
    }
}

pub mod template {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TripTemplate {
        pub id: String,
        pub name: String,
        pub description: Option<String>,
        pub destination_country: Option<String>,
        pub destination_city: Option<String>,
        pub duration_days: Option<u32>,
        pub travel_style: Option<String>,
        pub default_budget: Option<f64>,
    }
}

pub mod analytics {
    use super::*;

    /// Figures computed by the backend; the client only renders them.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AnalyticsSummary {
        pub total_trips: u32,
        pub upcoming_trips: u32,
        pub completed_trips: u32,
        pub countries_visited: u32,
        pub total_budget: f64,
        pub average_trip_days: Option<f64>,
        #[serde(default)]
        pub top_destinations: Vec<DestinationCount>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DestinationCount {
        pub country: String,
        pub trips: u32,
    }
}

pub mod report {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum ReportKind {
        Visa,
        Destination,
        Itinerary,
    }

    impl ReportKind {
        /// Path segment under `/api/trips/{id}/reports/`.
        pub fn as_path(self) -> &'static str {
            match self {
                Self::Visa => "visa",
                Self::Destination => "destination",
                Self::Itinerary => "itinerary",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VisaReport {
        pub destination_country: String,
        pub nationality: Option<String>,
        pub visa_required: bool,
        pub visa_type: Option<String>,
        pub max_stay_days: Option<u32>,
        pub processing_time: Option<String>,
        #[serde(default)]
        pub required_documents: Vec<String>,
        #[serde(default)]
        pub notes: Vec<String>,
        pub generated_at: Option<DateTime<Utc>>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DestinationReport {
        pub country: String,
        pub city: Option<String>,
        pub overview: String,
        pub best_time_to_visit: Option<String>,
        pub currency: Option<String>,
        #[serde(default)]
        pub languages: Vec<String>,
        pub safety_level: Option<String>,
        #[serde(default)]
        pub highlights: Vec<String>,
        pub weather_summary: Option<String>,
        pub generated_at: Option<DateTime<Utc>>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ItineraryReport {
        #[serde(default)]
        pub days: Vec<ItineraryDay>,
        pub total_estimated_cost: Option<f64>,
        pub currency: Option<String>,
        pub generated_at: Option<DateTime<Utc>>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ItineraryDay {
        pub day: u32,
        pub date: Option<NaiveDate>,
        pub title: String,
        #[serde(default)]
        pub activities: Vec<Activity>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Activity {
        pub time: Option<String>,
        pub title: String,
        pub location: Option<String>,
        pub notes: Option<String>,
        pub estimated_cost: Option<f64>,
    }
}
