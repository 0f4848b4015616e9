use api_types::trip::{Trip, TripUpdate};

/// A form-level problem. These never reach the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Checks `update` as it would land on `current`.
pub fn validate_update(current: &Trip, update: &TripUpdate) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if let Some(title) = &update.title {
        if title.trim().is_empty() {
            issues.push(ValidationIssue::new("title", "Title cannot be empty"));
        }
    }
    if let Some(country) = &update.destination_country {
        if country.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "destinationCountry",
                "Destination country is required",
            ));
        }
    }
    // A city may be absent, but an edit cannot blank it out.
    if let Some(city) = &update.destination_city {
        if city.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "destinationCity",
                "Destination city cannot be empty",
            ));
        }
    }

    let start = update.start_date.or(current.start_date);
    let end = update.end_date.or(current.end_date);
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            issues.push(ValidationIssue::new(
                "endDate",
                "End date must be on or after the start date",
            ));
        }
    }

    if let Some(budget) = update.budget {
        if !budget.is_finite() || budget < 0.0 {
            issues.push(ValidationIssue::new("budget", "Budget must be zero or more"));
        }
    }
    if update.travelers == Some(0) {
        issues.push(ValidationIssue::new("travelers", "At least one traveler"));
    }

    if issues.is_empty() { Ok(()) } else { Err(issues) }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn trip() -> Trip {
        Trip {
            id: "t".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 5, 10),
            end_date: NaiveDate::from_ymd_opt(2026, 5, 20),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_a_plain_update() {
        let update = TripUpdate {
            budget: Some(0.0),
            travelers: Some(1),
            ..Default::default()
        };
        assert!(validate_update(&trip(), &update).is_ok());
    }

    #[test]
    fn end_date_is_checked_against_the_stored_start() {
        let update = TripUpdate {
            end_date: NaiveDate::from_ymd_opt(2026, 5, 1),
            ..Default::default()
        };
        let issues = validate_update(&trip(), &update).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "endDate");
    }

    #[test]
    fn collects_every_issue() {
        let update = TripUpdate {
            title: Some("   ".to_string()),
            budget: Some(-5.0),
            travelers: Some(0),
            ..Default::default()
        };
        let fields: Vec<_> = validate_update(&trip(), &update)
            .unwrap_err()
            .into_iter()
            .map(|issue| issue.field)
            .collect();
        assert_eq!(fields, vec!["title", "budget", "travelers"]);
    }

    #[test]
    fn blank_destination_is_rejected() {
        let update = TripUpdate {
            destination_country: Some(String::new()),
            destination_city: Some("  ".to_string()),
            ..Default::default()
        };
        let fields: Vec<_> = validate_update(&trip(), &update)
            .unwrap_err()
            .into_iter()
            .map(|issue| issue.field)
            .collect();
        assert_eq!(fields, vec!["destinationCountry", "destinationCity"]);
    }
}
