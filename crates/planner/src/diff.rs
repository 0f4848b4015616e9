//! Field-by-field comparison of a trip against proposed edits.
//!
//! Values are compared through their JSON serialization, so two values are
//! equal exactly when the backend would receive the same JSON for them.
use api_types::trip::{Trip, TripUpdate};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    PlannerError,
    impact::{ImpactLevel, impact_for},
};

/// Editable trip fields in display order, with their labels.
pub const TRIP_FIELDS: &[(&str, &str)] = &[
    ("title", "Trip Title"),
    ("destinationCountry", "Destination Country"),
    ("destinationCity", "Destination City"),
    ("originCountry", "Origin Country"),
    ("nationality", "Nationality"),
    ("startDate", "Start Date"),
    ("endDate", "End Date"),
    ("budget", "Budget"),
    ("currency", "Currency"),
    ("travelers", "Travelers"),
    ("tripPurpose", "Trip Purpose"),
    ("travelStyle", "Travel Style"),
    ("interests", "Interests"),
    ("accommodationType", "Accommodation"),
    ("notes", "Notes"),
    ("coverImageUrl", "Cover Image"),
];

/// Keys owned by the backend. They change with every version and are never
/// part of a comparison.
const METADATA_FIELDS: &[&str] = &["id", "createdAt", "updatedAt", "currentVersion"];

/// Impact of a single changed field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "level")]
pub enum Impact {
    Known(ImpactLevel),
    /// The field has no entry in the impact table.
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub label: String,
    pub old_value: Value,
    pub new_value: Value,
    pub impact: Impact,
}

impl FieldChange {
    pub fn impact_level(&self) -> Option<ImpactLevel> {
        match self.impact {
            Impact::Known(level) => Some(level),
            Impact::Unknown => None,
        }
    }
}

/// Every key of `update` whose value differs from the one in `current`.
pub fn diff(current: &Trip, update: &TripUpdate) -> Result<Vec<FieldChange>, PlannerError> {
    let current = to_object(current)?;
    let proposed = to_object(update)?;

    let changes = changes_between(&current, &proposed, ordered_keys(proposed.keys()));
    for change in &changes {
        if change.impact == Impact::Unknown {
            tracing::warn!(field = %change.field, "changed field has no impact mapping");
        }
    }
    Ok(changes)
}

/// Differences between two full trip snapshots, metadata excluded.
pub fn diff_snapshots(old: &Trip, new: &Trip) -> Result<Vec<FieldChange>, PlannerError> {
    let old = to_object(old)?;
    let new = to_object(new)?;

    let keys = old
        .keys()
        .chain(new.keys())
        .filter(|key| !METADATA_FIELDS.contains(&key.as_str()));
    Ok(changes_between(&old, &new, ordered_keys(keys)))
}

/// Merges `update` into `trip`, the way the backend applies it.
pub fn apply_update(trip: &Trip, update: &TripUpdate) -> Result<Trip, PlannerError> {
    let mut merged = to_object(trip)?;
    for (key, value) in to_object(update)? {
        merged.insert(key, value);
    }
    Ok(serde_json::from_value(Value::Object(merged))?)
}

/// An update carrying only the new values of `changes`.
pub fn update_from_changes(changes: &[FieldChange]) -> Result<TripUpdate, PlannerError> {
    let map: Map<String, Value> = changes
        .iter()
        .map(|change| (change.field.clone(), change.new_value.clone()))
        .collect();
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Human label for a field key: the catalog label, else the key split on
/// its camelCase humps.
pub fn field_label(field: &str) -> String {
    if let Some((_, label)) = TRIP_FIELDS.iter().find(|(key, _)| *key == field) {
        return (*label).to_string();
    }

    let mut label = String::with_capacity(field.len() + 4);
    for (idx, ch) in field.chars().enumerate() {
        if idx == 0 {
            label.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            label.push(' ');
            label.push(ch);
        } else if ch == '_' {
            label.push(' ');
        } else {
            label.push(ch);
        }
    }
    label
}

fn changes_between(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    keys: Vec<String>,
) -> Vec<FieldChange> {
    keys.into_iter()
        .filter_map(|field| {
            let old_value = old.get(&field).cloned().unwrap_or(Value::Null);
            let new_value = new.get(&field).cloned().unwrap_or(Value::Null);
            if old_value == new_value {
                return None;
            }
            let impact = match impact_for(&field) {
                Some(entry) => Impact::Known(entry.level),
                None => Impact::Unknown,
            };
            Some(FieldChange {
                label: field_label(&field),
                field,
                old_value,
                new_value,
                impact,
            })
        })
        .collect()
}

/// Catalog fields first, in catalog order, then the rest alphabetically.
fn ordered_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut known = Vec::new();
    let mut rest = Vec::new();
    for key in keys {
        match TRIP_FIELDS.iter().position(|(field, _)| field == key) {
            Some(pos) => known.push((pos, key.clone())),
            None => rest.push(key.clone()),
        }
    }
    known.sort_by_key(|(pos, _)| *pos);
    known.dedup();
    rest.sort();
    rest.dedup();
    known.into_iter().map(|(_, key)| key).chain(rest).collect()
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, PlannerError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    fn trip() -> Trip {
        Trip {
            id: "trip-1".to_string(),
            title: Some("Spring in Kyoto".to_string()),
            destination_country: Some("Japan".to_string()),
            destination_city: Some("Kyoto".to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 4, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 4, 10),
            budget: Some(3000.0),
            travelers: Some(2),
            notes: Some("window seat".to_string()),
            current_version: Some(5),
            ..Default::default()
        }
    }

    #[test]
    fn empty_update_has_no_changes() {
        let changes = diff(&trip(), &TripUpdate::default()).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn unchanged_values_are_not_reported() {
        let update = TripUpdate {
            destination_city: Some("Kyoto".to_string()),
            budget: Some(3000.0),
            ..Default::default()
        };
        assert!(diff(&trip(), &update).unwrap().is_empty());
    }

    #[test]
    fn only_differing_keys_are_reported() {
        let update = TripUpdate {
            destination_city: Some("Osaka".to_string()),
            budget: Some(3000.0),
            travelers: Some(3),
            ..Default::default()
        };
        let changes = diff(&trip(), &update).unwrap();

        let fields: Vec<_> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["destinationCity", "travelers"]);
        assert_eq!(changes[0].label, "Destination City");
        assert_eq!(changes[0].old_value, json!("Kyoto"));
        assert_eq!(changes[0].new_value, json!("Osaka"));
        assert_eq!(changes[0].impact, Impact::Known(ImpactLevel::High));
    }

    #[test]
    fn missing_current_value_compares_as_null() {
        let update = TripUpdate {
            origin_country: Some("Italy".to_string()),
            ..Default::default()
        };
        let changes = diff(&trip(), &update).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, Value::Null);
    }

    #[test]
    fn notes_change_has_unknown_impact() {
        let update = TripUpdate {
            notes: Some("aisle seat".to_string()),
            ..Default::default()
        };
        let changes = diff(&trip(), &update).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].impact, Impact::Unknown);
        assert_eq!(changes[0].impact_level(), None);
    }

    #[test]
    fn unknown_keys_follow_catalog_fields() {
        let mut update = TripUpdate {
            budget: Some(10.0),
            ..Default::default()
        };
        update.extra.insert("zzPace".to_string(), json!("slow"));
        update.extra.insert("mealPlan".to_string(), json!("half board"));

        let changes = diff(&trip(), &update).unwrap();
        let fields: Vec<_> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["budget", "mealPlan", "zzPace"]);
        assert_eq!(changes[1].label, "Meal Plan");
    }

    #[test]
    fn applied_update_diffs_to_nothing() {
        let mut update = TripUpdate {
            destination_country: Some("Portugal".to_string()),
            destination_city: Some("Porto".to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1),
            interests: Some(vec!["wine".to_string(), "azulejos".to_string()]),
            ..Default::default()
        };
        update.extra.insert("mealPlan".to_string(), json!("breakfast"));

        let applied = apply_update(&trip(), &update).unwrap();
        assert_eq!(applied.destination_city.as_deref(), Some("Porto"));
        assert_eq!(applied.extra.get("mealPlan"), Some(&json!("breakfast")));
        assert!(diff(&applied, &update).unwrap().is_empty());
    }

    #[test]
    fn update_from_changes_keeps_only_changed_keys() {
        let update = TripUpdate {
            destination_city: Some("Osaka".to_string()),
            budget: Some(3000.0),
            ..Default::default()
        };
        let changes = diff(&trip(), &update).unwrap();
        let rebuilt = update_from_changes(&changes).unwrap();

        assert_eq!(rebuilt.destination_city.as_deref(), Some("Osaka"));
        assert_eq!(rebuilt.budget, None);
    }

    #[test]
    fn snapshots_ignore_backend_metadata() {
        let old = trip();
        let mut new = trip();
        new.current_version = Some(6);
        new.updated_at = Some(chrono::Utc::now());
        new.budget = Some(3500.0);

        let changes = diff_snapshots(&old, &new).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "budget");
    }

    #[test]
    fn labels_fall_back_to_split_keys() {
        assert_eq!(field_label("startDate"), "Start Date");
        assert_eq!(field_label("dietaryNeeds"), "Dietary Needs");
        assert_eq!(field_label("pet_friendly"), "Pet friendly");
    }
}
