//! Text forms of the trip editor, the new-trip wizard and the settings
//! screen, and their parsing into backend payloads.
use api_types::{
    settings::UserSettings,
    template::TripTemplate,
    trip::{Trip, TripCreate, TripUpdate},
};
use chrono::{Days, NaiveDate};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Values of a fixed list of text inputs and the focused one.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    values: Vec<String>,
    focus: usize,
}

impl Fields {
    fn new(values: Vec<String>) -> Self {
        Self { values, focus: 0 }
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn get(&self, idx: usize) -> &str {
        self.values.get(idx).map(String::as_str).unwrap_or_default()
    }

    fn set(&mut self, idx: usize, value: impl Into<String>) {
        if let Some(slot) = self.values.get_mut(idx) {
            *slot = value.into();
        }
    }

    fn focus_on(&mut self, idx: usize) {
        self.focus = idx.min(self.values.len().saturating_sub(1));
    }

    pub fn next(&mut self) {
        if !self.values.is_empty() {
            self.focus = (self.focus + 1) % self.values.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.values.is_empty() {
            self.focus = (self.focus + self.values.len() - 1) % self.values.len();
        }
    }

    pub fn push(&mut self, ch: char) {
        if let Some(value) = self.values.get_mut(self.focus) {
            value.push(ch);
        }
    }

    pub fn pop(&mut self) {
        if let Some(value) = self.values.get_mut(self.focus) {
            value.pop();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripField {
    Title,
    DestinationCountry,
    DestinationCity,
    OriginCountry,
    Nationality,
    StartDate,
    EndDate,
    Budget,
    Currency,
    Travelers,
    TripPurpose,
    TravelStyle,
    Interests,
    Accommodation,
    Notes,
}

impl TripField {
    pub const ALL: [Self; 15] = [
        Self::Title,
        Self::DestinationCountry,
        Self::DestinationCity,
        Self::OriginCountry,
        Self::Nationality,
        Self::StartDate,
        Self::EndDate,
        Self::Budget,
        Self::Currency,
        Self::Travelers,
        Self::TripPurpose,
        Self::TravelStyle,
        Self::Interests,
        Self::Accommodation,
        Self::Notes,
    ];

    /// Wire key of the field.
    pub fn key(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::DestinationCountry => "destinationCountry",
            Self::DestinationCity => "destinationCity",
            Self::OriginCountry => "originCountry",
            Self::Nationality => "nationality",
            Self::StartDate => "startDate",
            Self::EndDate => "endDate",
            Self::Budget => "budget",
            Self::Currency => "currency",
            Self::Travelers => "travelers",
            Self::TripPurpose => "tripPurpose",
            Self::TravelStyle => "travelStyle",
            Self::Interests => "interests",
            Self::Accommodation => "accommodationType",
            Self::Notes => "notes",
        }
    }

    pub fn label(self) -> String {
        planner::field_label(self.key())
    }
}

/// The trip editor, seeded from the last confirmed trip.
#[derive(Debug, Clone, Default)]
pub struct TripForm {
    pub fields: Fields,
}

impl TripForm {
    pub fn from_trip(trip: &Trip) -> Self {
        let values = TripField::ALL
            .iter()
            .map(|field| trip_value(trip, *field))
            .collect();
        Self {
            fields: Fields::new(values),
        }
    }

    pub fn value(&self, field: TripField) -> &str {
        self.fields.get(field as usize)
    }

    pub fn focused(&self) -> TripField {
        TripField::ALL
            .get(self.fields.focus())
            .copied()
            .unwrap_or(TripField::Title)
    }

    /// Every field as an update; the diff keeps only what changed.
    ///
    /// An emptied text field clears the value when the trip had one. An
    /// emptied date or number leaves the value as it is.
    pub fn to_update(&self, baseline: &Trip) -> Result<TripUpdate, String> {
        let text = |field: TripField, current: &Option<String>| {
            let value = self.value(field).trim();
            match (value.is_empty(), current) {
                (false, _) => Some(value.to_string()),
                (true, Some(_)) => Some(String::new()),
                (true, None) => None,
            }
        };

        let interests = {
            let parsed = parse_list(self.value(TripField::Interests));
            (!parsed.is_empty() || !baseline.interests.is_empty()).then_some(parsed)
        };

        Ok(TripUpdate {
            title: text(TripField::Title, &baseline.title),
            destination_country: text(TripField::DestinationCountry, &baseline.destination_country),
            destination_city: text(TripField::DestinationCity, &baseline.destination_city),
            origin_country: text(TripField::OriginCountry, &baseline.origin_country),
            nationality: text(TripField::Nationality, &baseline.nationality),
            start_date: parse_date(TripField::StartDate, self.value(TripField::StartDate))?,
            end_date: parse_date(TripField::EndDate, self.value(TripField::EndDate))?,
            budget: parse_budget(self.value(TripField::Budget))?,
            currency: text(TripField::Currency, &baseline.currency)
                .map(|code| code.to_uppercase()),
            travelers: parse_travelers(self.value(TripField::Travelers))?,
            trip_purpose: text(TripField::TripPurpose, &baseline.trip_purpose),
            travel_style: text(TripField::TravelStyle, &baseline.travel_style),
            interests,
            accommodation_type: text(TripField::Accommodation, &baseline.accommodation_type),
            notes: text(TripField::Notes, &baseline.notes),
            ..Default::default()
        })
    }
}

fn trip_value(trip: &Trip, field: TripField) -> String {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    match field {
        TripField::Title => text(&trip.title),
        TripField::DestinationCountry => text(&trip.destination_country),
        TripField::DestinationCity => text(&trip.destination_city),
        TripField::OriginCountry => text(&trip.origin_country),
        TripField::Nationality => text(&trip.nationality),
        TripField::StartDate => format_date(trip.start_date),
        TripField::EndDate => format_date(trip.end_date),
        TripField::Budget => trip.budget.map(|b| b.to_string()).unwrap_or_default(),
        TripField::Currency => text(&trip.currency),
        TripField::Travelers => trip.travelers.map(|t| t.to_string()).unwrap_or_default(),
        TripField::TripPurpose => text(&trip.trip_purpose),
        TripField::TravelStyle => text(&trip.travel_style),
        TripField::Interests => trip.interests.join(", "),
        TripField::Accommodation => text(&trip.accommodation_type),
        TripField::Notes => text(&trip.notes),
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn parse_date(field: TripField, raw: &str) -> Result<Option<NaiveDate>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|_| format!("{}: expected YYYY-MM-DD", field.label()))
}

fn parse_budget(raw: &str) -> Result<Option<f64>, String> {
    let raw = raw.trim().replace(',', "");
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| "Budget: not a number".to_string())
}

fn parse_travelers(raw: &str) -> Result<Option<u32>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| "Travelers: not a whole number".to_string())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Template,
    Destination,
    Dates,
    Budget,
    Confirm,
}

impl WizardStep {
    pub fn label(self) -> &'static str {
        match self {
            Self::Template => "Template",
            Self::Destination => "Destination",
            Self::Dates => "Dates",
            Self::Budget => "Budget",
            Self::Confirm => "Confirm",
        }
    }

    /// Inputs shown on the step, as indexes into the wizard fields.
    pub fn fields(self) -> &'static [WizardField] {
        match self {
            Self::Template | Self::Confirm => &[],
            Self::Destination => &[WizardField::Title, WizardField::Country, WizardField::City],
            Self::Dates => &[WizardField::StartDate, WizardField::EndDate],
            Self::Budget => &[
                WizardField::Budget,
                WizardField::Currency,
                WizardField::Travelers,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardField {
    Title,
    Country,
    City,
    StartDate,
    EndDate,
    Budget,
    Currency,
    Travelers,
}

impl WizardField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Country => "Country",
            Self::City => "City",
            Self::StartDate => "Start (YYYY-MM-DD)",
            Self::EndDate => "End (YYYY-MM-DD)",
            Self::Budget => "Budget",
            Self::Currency => "Currency",
            Self::Travelers => "Travelers",
        }
    }
}

/// The new-trip wizard.
#[derive(Debug, Clone)]
pub struct WizardState {
    pub step: WizardStep,
    pub templates: Vec<TripTemplate>,
    /// Row of the template list; 0 is "blank trip".
    pub cursor: usize,
    pub template: Option<usize>,
    pub fields: Fields,
    pub error: Option<String>,
}

impl WizardState {
    pub fn new(templates: Vec<TripTemplate>) -> Self {
        let mut fields = Fields::new(vec![String::new(); 8]);
        fields.set(WizardField::Currency as usize, "EUR");
        fields.set(WizardField::Travelers as usize, "1");
        Self {
            step: WizardStep::Template,
            templates,
            cursor: 0,
            template: None,
            fields,
            error: None,
        }
    }

    pub fn value(&self, field: WizardField) -> &str {
        self.fields.get(field as usize)
    }

    pub fn focused(&self) -> Option<WizardField> {
        self.step
            .fields()
            .iter()
            .copied()
            .find(|field| *field as usize == self.fields.focus())
    }

    pub fn next_field(&mut self) {
        let fields = self.step.fields();
        if fields.is_empty() {
            return;
        }
        let pos = fields
            .iter()
            .position(|field| *field as usize == self.fields.focus())
            .map(|pos| (pos + 1) % fields.len())
            .unwrap_or(0);
        self.fields.focus_on(fields[pos] as usize);
    }

    pub fn push(&mut self, ch: char) {
        if self.focused().is_some() {
            self.fields.push(ch);
        }
    }

    pub fn pop(&mut self) {
        if self.focused().is_some() {
            self.fields.pop();
        }
    }

    pub fn select_next(&mut self) {
        self.cursor = (self.cursor + 1).min(self.templates.len());
    }

    pub fn select_prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Validates the current step and moves to the next one.
    pub fn advance(&mut self) -> Result<(), String> {
        let next = match self.step {
            WizardStep::Template => {
                self.pick_template();
                WizardStep::Destination
            }
            WizardStep::Destination => {
                if self.value(WizardField::Country).trim().is_empty() {
                    return Err("Country is required".to_string());
                }
                WizardStep::Dates
            }
            WizardStep::Dates => {
                let (start, end) = self.dates()?;
                if let (Some(start), Some(end)) = (start, end)
                    && end < start
                {
                    return Err("End date is before the start date".to_string());
                }
                if let (Some(start), None, Some(days)) = (start, end, self.template_days()) {
                    let end = start
                        .checked_add_days(Days::new(u64::from(days.saturating_sub(1))))
                        .ok_or_else(|| "Start date is too far in the future".to_string())?;
                    self.fields
                        .set(WizardField::EndDate as usize, end.format(DATE_FORMAT).to_string());
                }
                WizardStep::Budget
            }
            WizardStep::Budget => {
                self.budget()?;
                WizardStep::Confirm
            }
            WizardStep::Confirm => WizardStep::Confirm,
        };
        self.error = None;
        self.enter(next);
        Ok(())
    }

    pub fn back(&mut self) -> bool {
        let prev = match self.step {
            WizardStep::Template => return false,
            WizardStep::Destination => WizardStep::Template,
            WizardStep::Dates => WizardStep::Destination,
            WizardStep::Budget => WizardStep::Dates,
            WizardStep::Confirm => WizardStep::Budget,
        };
        self.error = None;
        self.enter(prev);
        true
    }

    pub fn to_create(&self) -> Result<TripCreate, String> {
        let country = self.value(WizardField::Country).trim();
        if country.is_empty() {
            return Err("Country is required".to_string());
        }
        let city = non_empty(self.value(WizardField::City));
        let title = match non_empty(self.value(WizardField::Title)) {
            Some(title) => title,
            None => format!("Trip to {}", city.as_deref().unwrap_or(country)),
        };
        let (start_date, end_date) = self.dates()?;
        let (budget, travelers) = self.budget()?;

        Ok(TripCreate {
            title,
            destination_country: country.to_string(),
            destination_city: city,
            origin_country: None,
            start_date,
            end_date,
            budget,
            currency: non_empty(self.value(WizardField::Currency)).map(|c| c.to_uppercase()),
            travelers,
            travel_style: self
                .selected_template()
                .and_then(|template| template.travel_style.clone()),
            template_id: self.selected_template().map(|template| template.id.clone()),
        })
    }

    pub fn selected_template(&self) -> Option<&TripTemplate> {
        self.template.and_then(|idx| self.templates.get(idx))
    }

    fn enter(&mut self, step: WizardStep) {
        self.step = step;
        if let Some(first) = step.fields().first() {
            self.fields.focus_on(*first as usize);
        }
    }

    fn pick_template(&mut self) {
        self.template = self.cursor.checked_sub(1);
        let Some(template) = self.selected_template().cloned() else {
            return;
        };
        if let Some(country) = template.destination_country {
            self.fields.set(WizardField::Country as usize, country);
        }
        if let Some(city) = template.destination_city {
            self.fields.set(WizardField::City as usize, city);
        }
        if let Some(budget) = template.default_budget {
            self.fields.set(WizardField::Budget as usize, budget.to_string());
        }
        if self.value(WizardField::Title).is_empty() {
            self.fields.set(WizardField::Title as usize, template.name);
        }
    }

    fn template_days(&self) -> Option<u32> {
        self.selected_template()
            .and_then(|template| template.duration_days)
    }

    fn dates(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), String> {
        Ok((
            parse_date(TripField::StartDate, self.value(WizardField::StartDate))?,
            parse_date(TripField::EndDate, self.value(WizardField::EndDate))?,
        ))
    }

    fn budget(&self) -> Result<(Option<f64>, Option<u32>), String> {
        let budget = parse_budget(self.value(WizardField::Budget))?;
        if budget.is_some_and(|b| b < 0.0) {
            return Err("Budget cannot be negative".to_string());
        }
        let travelers = parse_travelers(self.value(WizardField::Travelers))?;
        if travelers == Some(0) {
            return Err("At least one traveler".to_string());
        }
        Ok((budget, travelers))
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    DisplayName,
    HomeCountry,
    Nationality,
    PreferredCurrency,
    Timezone,
    DateFormat,
    EmailNotifications,
    RecalculationAlerts,
}

impl SettingsField {
    pub const ALL: [Self; 8] = [
        Self::DisplayName,
        Self::HomeCountry,
        Self::Nationality,
        Self::PreferredCurrency,
        Self::Timezone,
        Self::DateFormat,
        Self::EmailNotifications,
        Self::RecalculationAlerts,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::DisplayName => "Display name",
            Self::HomeCountry => "Home country",
            Self::Nationality => "Nationality",
            Self::PreferredCurrency => "Currency",
            Self::Timezone => "Timezone",
            Self::DateFormat => "Date format",
            Self::EmailNotifications => "Email notifications",
            Self::RecalculationAlerts => "Recalculation alerts",
        }
    }

    pub fn is_toggle(self) -> bool {
        matches!(self, Self::EmailNotifications | Self::RecalculationAlerts)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SettingsForm {
    pub fields: Fields,
}

impl SettingsForm {
    pub fn from_settings(settings: &UserSettings) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let flag = |value: bool| if value { "on" } else { "off" }.to_string();
        Self {
            fields: Fields::new(vec![
                text(&settings.display_name),
                text(&settings.home_country),
                text(&settings.nationality),
                text(&settings.preferred_currency),
                text(&settings.timezone),
                text(&settings.date_format),
                flag(settings.email_notifications),
                flag(settings.recalculation_alerts),
            ]),
        }
    }

    pub fn value(&self, field: SettingsField) -> &str {
        self.fields.get(field as usize)
    }

    pub fn focused(&self) -> SettingsField {
        SettingsField::ALL
            .get(self.fields.focus())
            .copied()
            .unwrap_or(SettingsField::DisplayName)
    }

    /// Types into text fields; any key flips a toggle.
    pub fn input(&mut self, ch: char) {
        let field = self.focused();
        if field.is_toggle() {
            let flipped = if self.value(field) == "on" { "off" } else { "on" };
            self.fields.set(field as usize, flipped);
        } else {
            self.fields.push(ch);
        }
    }

    pub fn to_settings(&self) -> Result<UserSettings, String> {
        let text = |field: SettingsField| non_empty(self.value(field));
        let timezone = text(SettingsField::Timezone);
        if let Some(tz) = &timezone
            && tz.parse::<chrono_tz::Tz>().is_err()
        {
            return Err(format!("Unknown timezone {tz}"));
        }
        Ok(UserSettings {
            display_name: text(SettingsField::DisplayName),
            home_country: text(SettingsField::HomeCountry),
            nationality: text(SettingsField::Nationality),
            preferred_currency: text(SettingsField::PreferredCurrency).map(|c| c.to_uppercase()),
            timezone,
            date_format: text(SettingsField::DateFormat),
            email_notifications: self.value(SettingsField::EmailNotifications) == "on",
            recalculation_alerts: self.value(SettingsField::RecalculationAlerts) == "on",
        })
    }
}
