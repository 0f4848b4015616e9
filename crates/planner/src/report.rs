use api_types::report::DestinationReport;

use crate::BackendError;

/// Result of fetching a generated report.
///
/// Keeps "not generated yet", "could not fetch" and "showing placeholder
/// data" apart so the screen can say which one it is.
#[derive(Clone, Debug, PartialEq)]
pub enum ReportOutcome<T> {
    Ready(T),
    NotFound,
    Unauthorized,
    TransientError(String),
    /// Bundled sample data shown because the real report could not be fetched.
    Sample { data: T, reason: String },
}

impl<T> ReportOutcome<T> {
    pub fn from_result(result: Result<T, BackendError>) -> Self {
        match result {
            Ok(data) => Self::Ready(data),
            Err(BackendError::NotFound(_)) => Self::NotFound,
            Err(BackendError::Unauthorized | BackendError::NotAuthenticated) => Self::Unauthorized,
            Err(err) => Self::TransientError(err.to_string()),
        }
    }

    /// Replaces a transient failure with sample data, tagged as such.
    pub fn or_sample(self, sample: impl FnOnce() -> T) -> Self {
        match self {
            Self::TransientError(reason) => {
                tracing::warn!("report unavailable, showing sample data: {reason}");
                Self::Sample {
                    data: sample(),
                    reason,
                }
            }
            other => other,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) | Self::Sample { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn is_sample(&self) -> bool {
        matches!(self, Self::Sample { .. })
    }
}

/// Placeholder destination report bundled with the client.
pub fn sample_destination_report(country: &str, city: Option<&str>) -> DestinationReport {
    DestinationReport {
        country: country.to_string(),
        city: city.map(str::to_string),
        overview: format!(
            "{country} offers a mix of city life, regional food and day trips. \
             This is sample content; the generated report will replace it."
        ),
        best_time_to_visit: Some("Spring and autumn".to_string()),
        currency: None,
        languages: Vec::new(),
        safety_level: Some("Check official travel advisories".to_string()),
        highlights: vec![
            "Historic centre walking tour".to_string(),
            "Local market and food tasting".to_string(),
            "Day trip to the countryside".to_string(),
        ],
        weather_summary: Some("Mild, with cooler evenings".to_string()),
        generated_at: None,
    }
}
