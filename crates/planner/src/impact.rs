use api_types::{
    recalculation::ReportSection::{self, *},
    trip::{Trip, TripUpdate},
};
use serde::{Deserialize, Serialize};

use crate::{
    PlannerError,
    diff::{FieldChange, diff, update_from_changes},
};

/// Display estimate only; it has no relation to real backend timings.
pub const SECONDS_PER_SECTION: u32 = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

impl ImpactLevel {
    /// Ordinal used when picking the highest impact: low=1, medium=2, high=3.
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FieldImpact {
    pub affected_sections: &'static [ReportSection],
    pub level: ImpactLevel,
}

/// Which report sections each trip field feeds.
///
/// A field missing here is reported as unknown impact and triggers nothing.
pub static FIELD_IMPACT_MAP: &[(&str, FieldImpact)] = &[
    (
        "destinationCountry",
        FieldImpact {
            affected_sections: &[
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
            ],
            level: ImpactLevel::High,
        },
    ),
    (
        "destinationCity",
        FieldImpact {
            affected_sections: &[Weather, Attractions, Food, Itinerary, Flight, Budget],
            level: ImpactLevel::High,
        },
    ),
    (
        "originCountry",
        FieldImpact {
            affected_sections: &[Visa, Flight, Budget],
            level: ImpactLevel::High,
        },
    ),
    (
        "nationality",
        FieldImpact {
            affected_sections: &[Visa],
            level: ImpactLevel::High,
        },
    ),
    (
        "startDate",
        FieldImpact {
            affected_sections: &[Weather, Itinerary, Flight, Budget],
            level: ImpactLevel::Medium,
        },
    ),
    (
        "endDate",
        FieldImpact {
            affected_sections: &[Weather, Itinerary, Budget],
            level: ImpactLevel::Medium,
        },
    ),
    (
        "travelers",
        FieldImpact {
            affected_sections: &[Flight, Budget, Itinerary],
            level: ImpactLevel::Medium,
        },
    ),
    (
        "tripPurpose",
        FieldImpact {
            affected_sections: &[Visa, Itinerary],
            level: ImpactLevel::Medium,
        },
    ),
    (
        "budget",
        FieldImpact {
            affected_sections: &[Budget, Itinerary],
            level: ImpactLevel::Medium,
        },
    ),
    (
        "currency",
        FieldImpact {
            affected_sections: &[Currency, Budget],
            level: ImpactLevel::Low,
        },
    ),
    (
        "travelStyle",
        FieldImpact {
            affected_sections: &[Itinerary, Food, Budget],
            level: ImpactLevel::Low,
        },
    ),
    (
        "interests",
        FieldImpact {
            affected_sections: &[Attractions, Itinerary],
            level: ImpactLevel::Low,
        },
    ),
    (
        "accommodationType",
        FieldImpact {
            affected_sections: &[Budget, Itinerary],
            level: ImpactLevel::Low,
        },
    ),
];

pub fn impact_for(field: &str) -> Option<&'static FieldImpact> {
    FIELD_IMPACT_MAP
        .iter()
        .find(|(key, _)| *key == field)
        .map(|(_, impact)| impact)
}

/// Aggregated impact of a set of changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    /// Union of affected sections, in first-seen order.
    pub affected_sections: Vec<ReportSection>,
    /// `None` when no change has a known impact.
    pub highest_impact: Option<ImpactLevel>,
    pub requires_recalculation: bool,
    pub estimated_recalc_seconds: u32,
    /// Changed fields missing from [`FIELD_IMPACT_MAP`].
    pub unknown_impact_fields: Vec<String>,
}

impl ImpactSummary {
    pub fn from_changes(changes: &[FieldChange]) -> Self {
        let mut summary = Self::default();

        for change in changes {
            let Some(entry) = impact_for(&change.field) else {
                summary.unknown_impact_fields.push(change.field.clone());
                continue;
            };
            for section in entry.affected_sections {
                if !summary.affected_sections.contains(section) {
                    summary.affected_sections.push(*section);
                }
            }
            summary.highest_impact = match summary.highest_impact {
                Some(current) if current.rank() >= entry.level.rank() => Some(current),
                _ => Some(entry.level),
            };
        }

        summary.requires_recalculation = !summary.affected_sections.is_empty();
        summary.estimated_recalc_seconds =
            SECONDS_PER_SECTION * summary.affected_sections.len() as u32;
        summary
    }

    pub fn message(&self) -> &'static str {
        match self.highest_impact {
            Some(ImpactLevel::High) => "Major changes - full recalculation recommended",
            Some(ImpactLevel::Medium) => "Moderate changes - some sections will be updated",
            Some(ImpactLevel::Low) => "Minor changes - limited impact",
            None => "No report sections affected",
        }
    }
}

/// Changes plus their impact, shown in the confirmation dialog.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChangePreview {
    pub changes: Vec<FieldChange>,
    pub impact: ImpactSummary,
}

impl ChangePreview {
    /// `None` when the edits change nothing.
    pub fn build(current: &Trip, update: &TripUpdate) -> Result<Option<Self>, PlannerError> {
        let changes = diff(current, update)?;
        if changes.is_empty() {
            return Ok(None);
        }
        let impact = ImpactSummary::from_changes(&changes);
        Ok(Some(Self { changes, impact }))
    }

    /// The update to send: only the changed keys.
    pub fn update(&self) -> Result<TripUpdate, PlannerError> {
        update_from_changes(&self.changes)
    }
}
