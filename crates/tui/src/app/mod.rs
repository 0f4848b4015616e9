use std::{path::Path, sync::Arc, time::Duration};

use api_types::{
    analytics::AnalyticsSummary,
    recalculation::RecalculationStatus,
    report::{DestinationReport, ItineraryReport, VisaReport},
    settings::UserSettings,
    trip::{TripSummary, TripUpdate},
};
use chrono_tz::Tz;
use client::{ApiClient, AuthClient, ClientError, Session, StorageClient};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use planner::{
    ApplyOutcome, BackendError, EditFlow, EditPhase, PlannerError, RecalcTracker, ReportOutcome,
    Speculative, TripBackend, TripPage, sample_destination_report,
};
use tokio::time::Instant;

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    forms::{SettingsForm, TripForm, WizardState, WizardStep},
    local_state::LocalState,
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Trips,
    Trip,
    Versions,
    Reports,
    Analytics,
    Settings,
}

impl Section {
    pub const ALL: [Self; 6] = [
        Self::Trips,
        Self::Trip,
        Self::Versions,
        Self::Reports,
        Self::Analytics,
        Self::Settings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Trips => "Trips",
            Self::Trip => "Trip",
            Self::Versions => "Versions",
            Self::Reports => "Reports",
            Self::Analytics => "Analytics",
            Self::Settings => "Settings",
        }
    }

    pub fn shortcut(self) -> char {
        match self {
            Self::Trips => '1',
            Self::Trip => '2',
            Self::Versions => '3',
            Self::Reports => '4',
            Self::Analytics => '5',
            Self::Settings => '6',
        }
    }

    fn from_shortcut(ch: char) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.shortcut() == ch)
    }

    pub fn needs_trip(self) -> bool {
        matches!(self, Self::Trip | Self::Versions | Self::Reports)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug)]
pub struct LoginState {
    pub email: String,
    pub password: String,
    pub focus: LoginField,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripsMode {
    List,
    ConfirmDelete,
    Wizard,
}

#[derive(Debug)]
pub struct TripsState {
    pub items: Vec<TripSummary>,
    pub selected: usize,
    pub mode: TripsMode,
    pub wizard: Option<WizardState>,
    pub loaded: bool,
    pub error: Option<String>,
}

impl Default for TripsState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            mode: TripsMode::List,
            wizard: None,
            loaded: false,
            error: None,
        }
    }
}

impl TripsState {
    fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.items.len() - 1);
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_trip(&self) -> Option<&TripSummary> {
        self.items.get(self.selected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripMode {
    Overview,
    Edit,
    Cover,
}

#[derive(Debug)]
pub struct TripState {
    pub page: Option<TripPage>,
    pub flow: Option<EditFlow>,
    pub mode: TripMode,
    pub form: TripForm,
    pub cover_path: String,
    /// Inline error of the edit form.
    pub error: Option<String>,
}

impl Default for TripState {
    fn default() -> Self {
        Self {
            page: None,
            flow: None,
            mode: TripMode::Overview,
            form: TripForm::default(),
            cover_path: String::new(),
            error: None,
        }
    }
}

impl TripState {
    /// The confirmation dialog is up.
    pub fn dialog_open(&self) -> bool {
        self.flow.as_ref().is_some_and(|flow| {
            matches!(
                flow.phase(),
                EditPhase::Previewing | EditPhase::Confirming | EditPhase::Applying
            )
        })
    }

    pub fn recalculating(&self) -> bool {
        self.flow
            .as_ref()
            .and_then(EditFlow::tracker)
            .is_some_and(RecalcTracker::is_polling)
    }
}

#[derive(Debug, Default)]
pub struct VersionsState {
    pub selected: usize,
    /// Up to two versions picked for comparison, oldest pick first.
    pub marked: Vec<u32>,
    pub confirm_restore: Option<u32>,
}

impl VersionsState {
    fn toggle_mark(&mut self, version: u32) {
        if let Some(pos) = self.marked.iter().position(|v| *v == version) {
            self.marked.remove(pos);
            return;
        }
        if self.marked.len() == 2 {
            self.marked.remove(0);
        }
        self.marked.push(version);
    }

    /// The marked pair as (older, newer).
    pub fn comparison(&self) -> Option<(u32, u32)> {
        match self.marked.as_slice() {
            [a, b] => Some(((*a).min(*b), (*a).max(*b))),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportTab {
    #[default]
    Visa,
    Destination,
    Itinerary,
}

impl ReportTab {
    pub const ALL: [Self; 3] = [Self::Visa, Self::Destination, Self::Itinerary];

    pub fn label(self) -> &'static str {
        match self {
            Self::Visa => "Visa",
            Self::Destination => "Destination",
            Self::Itinerary => "Itinerary",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Visa => Self::Destination,
            Self::Destination => Self::Itinerary,
            Self::Itinerary => Self::Visa,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Visa => Self::Itinerary,
            Self::Destination => Self::Visa,
            Self::Itinerary => Self::Destination,
        }
    }
}

#[derive(Debug, Default)]
pub struct ReportsState {
    pub tab: ReportTab,
    pub visa: Option<ReportOutcome<VisaReport>>,
    pub destination: Option<ReportOutcome<DestinationReport>>,
    pub itinerary: Option<ReportOutcome<ItineraryReport>>,
}

impl ReportsState {
    fn clear(&mut self) {
        self.visa = None;
        self.destination = None;
        self.itinerary = None;
    }

    /// Drops the cached reports once a tick says a run completed. An error
    /// from the tick is the failed refetch after a completed run, so it
    /// counts too. Returns whether anything was invalidated.
    fn invalidate_after(
        &mut self,
        tick: &std::result::Result<Option<RecalculationStatus>, PlannerError>,
    ) -> bool {
        match tick {
            Ok(Some(RecalculationStatus::Completed)) | Err(_) => {
                self.clear();
                true
            }
            Ok(_) => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct AnalyticsState {
    pub summary: Option<AnalyticsSummary>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct SettingsState {
    pub value: Option<Speculative<UserSettings>>,
    pub form: SettingsForm,
    pub editing: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub section: Section,
    pub login: LoginState,
    pub user_email: Option<String>,
    pub timezone: Tz,
    pub trips: TripsState,
    pub trip: TripState,
    pub versions: VersionsState,
    pub reports: ReportsState,
    pub analytics: AnalyticsState,
    pub settings: SettingsState,
    pub toast: Option<ToastState>,
}

impl AppState {
    /// Keys go to a text input rather than to shortcuts.
    pub fn is_typing(&self) -> bool {
        match self.screen {
            Screen::Login => true,
            Screen::Main => match self.section {
                Section::Trips => {
                    self.trips.mode == TripsMode::Wizard
                        && self
                            .trips
                            .wizard
                            .as_ref()
                            .is_some_and(|wizard| !wizard.step.fields().is_empty())
                }
                Section::Trip => {
                    matches!(self.trip.mode, TripMode::Edit | TripMode::Cover)
                        && !self.trip.dialog_open()
                }
                Section::Settings => self.settings.editing,
                _ => false,
            },
        }
    }
}

pub struct App {
    config: AppConfig,
    session: Arc<Session>,
    api: ApiClient,
    storage: StorageClient,
    local: LocalState,
    pub state: AppState,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let auth = AuthClient::new(&config.auth_url, &config.auth_api_key)?;
        let session = Arc::new(Session::new(auth));
        let api = ApiClient::new(&config.api_url, session.clone())?;
        let storage = StorageClient::new(
            &config.auth_url,
            &config.auth_api_key,
            &config.storage_bucket,
            session.clone(),
        )?;

        let local = LocalState::load(&config.state_file).unwrap_or_else(|err| {
            tracing::warn!("ignoring unreadable local state: {err}");
            LocalState::default()
        });
        let email = if config.email.is_empty() {
            local.last_email.clone().unwrap_or_default()
        } else {
            config.email.clone()
        };

        let state = AppState {
            screen: Screen::Login,
            section: Section::Trips,
            login: LoginState {
                focus: if email.is_empty() {
                    LoginField::Email
                } else {
                    LoginField::Password
                },
                email,
                password: String::new(),
                message: None,
            },
            user_email: None,
            timezone: config.tz(),
            trips: TripsState::default(),
            trip: TripState::default(),
            versions: VersionsState::default(),
            reports: ReportsState::default(),
            analytics: AnalyticsState::default(),
            settings: SettingsState::default(),
            toast: None,
        };

        Ok(Self {
            config,
            session,
            api,
            storage,
            local,
            state,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);

        while !self.should_quit {
            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key).await;
                    }
                    _ => {}
                }
            }
            self.on_tick().await;
        }

        Ok(())
    }

    async fn on_tick(&mut self) {
        let now = Instant::now();
        if self
            .state
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.state.toast = None;
        }

        let Some(flow) = self.state.trip.flow.as_mut() else {
            return;
        };
        let result = flow.tick(&self.api, now).await;
        let error = flow
            .tracker()
            .and_then(|tracker| tracker.progress().error.clone());

        let invalidated = self.state.reports.invalidate_after(&result);
        match result {
            Ok(None) => {}
            Ok(Some(status)) => {
                match status {
                    RecalculationStatus::Completed => {
                        self.toast(ToastLevel::Success, "Reports updated");
                    }
                    RecalculationStatus::Cancelled => {
                        self.toast(ToastLevel::Info, "Recalculation cancelled");
                    }
                    RecalculationStatus::TimedOut => self.toast(
                        ToastLevel::Error,
                        "Recalculation is taking too long; press r to retry",
                    ),
                    _ => self.toast(
                        ToastLevel::Error,
                        format!(
                            "Recalculation failed: {}",
                            error.as_deref().unwrap_or("unknown error")
                        ),
                    ),
                }
                self.reload_history().await;
            }
            Err(err) => {
                self.fail_planner("Refresh after recalculation failed", err);
                self.reload_history().await;
            }
        }
        if invalidated && self.state.section == Section::Reports {
            self.load_report(false).await;
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        let action = map_key(key, self.state.is_typing());
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }

        match self.state.screen {
            Screen::Login => self.handle_login_key(action).await,
            Screen::Main => self.handle_main_key(action).await,
        }
    }

    async fn handle_login_key(&mut self, action: AppAction) {
        match action {
            AppAction::NextField | AppAction::PrevField | AppAction::Up | AppAction::Down => {
                let login = &mut self.state.login;
                login.focus = match login.focus {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
            }
            AppAction::Backspace => {
                self.login_field_mut().pop();
            }
            AppAction::Input(ch) => self.login_field_mut().push(ch),
            AppAction::Submit => self.attempt_login().await,
            AppAction::Cancel => self.should_quit = true,
            _ => {}
        }
    }

    fn login_field_mut(&mut self) -> &mut String {
        match self.state.login.focus {
            LoginField::Email => &mut self.state.login.email,
            LoginField::Password => &mut self.state.login.password,
        }
    }

    async fn attempt_login(&mut self) {
        let email = self.state.login.email.trim().to_string();
        let password = self.state.login.password.clone();
        if email.is_empty() || password.is_empty() {
            self.state.login.message = Some("Enter email and password.".to_string());
            return;
        }

        match self.session.sign_in(&email, &password).await {
            Ok(_) => {
                self.state.login.password.clear();
                self.state.login.message = None;
                self.state.screen = Screen::Main;
                self.state.section = Section::Trips;
                self.state.user_email = Some(email.clone());
                self.local.last_email = Some(email.clone());
                self.save_local_state();

                self.load_trips().await;
                if let Some(last) = self.local.last_trip_for(&email)
                    && let Some(pos) = self.state.trips.items.iter().position(|t| t.id == last)
                {
                    self.state.trips.selected = pos;
                }
            }
            Err(err) => {
                tracing::info!("sign-in rejected: {err}");
                self.state.login.message = Some(login_message_for_error(&err));
            }
        }
    }

    async fn sign_out(&mut self) {
        if let Err(err) = self.session.sign_out().await {
            tracing::warn!("sign-out request failed: {err}");
        }
        self.state.screen = Screen::Login;
        self.state.login.focus = LoginField::Password;
        self.state.login.message = Some("Signed out.".to_string());
        self.state.user_email = None;
        self.state.trips = TripsState::default();
        self.state.trip = TripState::default();
        self.state.versions = VersionsState::default();
        self.state.reports = ReportsState::default();
        self.state.analytics = AnalyticsState::default();
        self.state.settings = SettingsState::default();
    }

    async fn handle_main_key(&mut self, action: AppAction) {
        if self.state.section == Section::Trip && self.state.trip.dialog_open() {
            self.handle_dialog_key(action).await;
            return;
        }
        if !self.state.is_typing()
            && let AppAction::Input(ch) = action
        {
            if let Some(section) = Section::from_shortcut(ch) {
                self.switch_section(section).await;
                return;
            }
            if ch == 'x' {
                self.sign_out().await;
                return;
            }
        }

        match self.state.section {
            Section::Trips => self.handle_trips_key(action).await,
            Section::Trip => self.handle_trip_key(action).await,
            Section::Versions => self.handle_versions_key(action).await,
            Section::Reports => self.handle_reports_key(action).await,
            Section::Analytics => {
                if action == AppAction::Input('r') {
                    self.load_analytics().await;
                }
            }
            Section::Settings => self.handle_settings_key(action).await,
        }
    }

    async fn switch_section(&mut self, section: Section) {
        if section.needs_trip() && self.state.trip.flow.is_none() {
            self.toast(ToastLevel::Info, "Open a trip first");
            return;
        }
        self.state.section = section;
        match section {
            Section::Trips if !self.state.trips.loaded => self.load_trips().await,
            Section::Reports => self.load_report(false).await,
            Section::Analytics if self.state.analytics.summary.is_none() => {
                self.load_analytics().await;
            }
            Section::Settings if self.state.settings.value.is_none() => {
                self.load_settings().await;
            }
            _ => {}
        }
    }

    // Trips dashboard

    async fn handle_trips_key(&mut self, action: AppAction) {
        match self.state.trips.mode {
            TripsMode::Wizard => return self.handle_wizard_key(action).await,
            TripsMode::ConfirmDelete => {
                if action == AppAction::Input('y') {
                    self.delete_selected_trip().await;
                }
                self.state.trips.mode = TripsMode::List;
                return;
            }
            TripsMode::List => {}
        }

        match action {
            AppAction::Up | AppAction::Input('k') => self.state.trips.select_prev(),
            AppAction::Down | AppAction::Input('j') => self.state.trips.select_next(),
            AppAction::Submit => {
                if let Some(id) = self.state.trips.selected_trip().map(|t| t.id.clone()) {
                    self.open_trip(&id).await;
                }
            }
            AppAction::Input('r') => self.load_trips().await,
            AppAction::Input('n') => self.start_wizard().await,
            AppAction::Input('d') if self.state.trips.selected_trip().is_some() => {
                self.state.trips.mode = TripsMode::ConfirmDelete;
            }
            _ => {}
        }
    }

    async fn load_trips(&mut self) {
        match self.api.trips_list().await {
            Ok(list) => {
                let trips = &mut self.state.trips;
                trips.items = list.trips;
                trips.selected = trips.selected.min(trips.items.len().saturating_sub(1));
                trips.loaded = true;
                trips.error = None;
            }
            Err(err) => {
                self.state.trips.error = Some(err.to_string());
                self.fail("Loading trips failed", err);
            }
        }
    }

    async fn delete_selected_trip(&mut self) {
        let Some(trip) = self.state.trips.selected_trip().cloned() else {
            return;
        };
        match self.api.trip_delete(&trip.id).await {
            Ok(()) => {
                tracing::info!(trip_id = %trip.id, "trip deleted");
                if self.current_trip_id().as_deref() == Some(trip.id.as_str()) {
                    self.state.trip = TripState::default();
                    self.state.reports = ReportsState::default();
                    self.state.versions = VersionsState::default();
                }
                let title = trip.title.unwrap_or_else(|| "trip".to_string());
                self.toast(ToastLevel::Success, format!("Deleted {title}"));
                self.load_trips().await;
            }
            Err(err) => self.fail("Delete failed", err),
        }
    }

    async fn start_wizard(&mut self) {
        let templates = match self.api.templates_list().await {
            Ok(templates) => templates,
            Err(err) => {
                tracing::warn!("templates unavailable: {err}");
                Vec::new()
            }
        };
        self.state.trips.wizard = Some(WizardState::new(templates));
        self.state.trips.mode = TripsMode::Wizard;
    }

    async fn handle_wizard_key(&mut self, action: AppAction) {
        let Some(wizard) = self.state.trips.wizard.as_mut() else {
            self.state.trips.mode = TripsMode::List;
            return;
        };
        let on_template = wizard.step == WizardStep::Template;
        let on_confirm = wizard.step == WizardStep::Confirm;

        match action {
            AppAction::Cancel => {
                if !wizard.back() {
                    self.state.trips.wizard = None;
                    self.state.trips.mode = TripsMode::List;
                }
            }
            AppAction::Up if on_template => wizard.select_prev(),
            AppAction::Down if on_template => wizard.select_next(),
            AppAction::NextField | AppAction::Down | AppAction::Up => wizard.next_field(),
            AppAction::Backspace => wizard.pop(),
            AppAction::Input(ch) => wizard.push(ch),
            AppAction::Submit if on_confirm => self.create_trip().await,
            AppAction::Submit => {
                if let Err(message) = wizard.advance() {
                    wizard.error = Some(message);
                }
            }
            _ => {}
        }
    }

    async fn create_trip(&mut self) {
        let Some(wizard) = self.state.trips.wizard.as_mut() else {
            return;
        };
        let payload = match wizard.to_create() {
            Ok(payload) => payload,
            Err(message) => {
                wizard.error = Some(message);
                return;
            }
        };

        match self.api.trip_create(&payload).await {
            Ok(trip) => {
                tracing::info!(trip_id = %trip.id, "trip created");
                self.state.trips.wizard = None;
                self.state.trips.mode = TripsMode::List;
                self.toast(ToastLevel::Success, format!("Created {}", payload.title));
                self.load_trips().await;
                self.open_trip(&trip.id).await;
            }
            Err(err) => {
                if let Some(wizard) = self.state.trips.wizard.as_mut() {
                    wizard.error = Some(err.to_string());
                }
                self.fail("Create failed", err);
            }
        }
    }

    // Trip page

    async fn open_trip(&mut self, trip_id: &str) {
        let limit = self.config.versions_page_size;
        match planner::load_trip_page(&self.api, trip_id, limit).await {
            Ok(page) => {
                tracing::info!(%trip_id, version = ?page.current_version(), "trip opened");
                let flow = EditFlow::new(page.trip.clone(), self.config.poll_policy());
                self.state.trip = TripState {
                    page: Some(page),
                    flow: Some(flow),
                    ..Default::default()
                };
                self.state.versions = VersionsState::default();
                self.state.reports = ReportsState::default();
                self.state.section = Section::Trip;

                if let Some(email) = self.state.user_email.clone() {
                    self.local.set_last_trip(&email, trip_id);
                    self.save_local_state();
                }
            }
            Err(err) => self.fail("Opening trip failed", err),
        }
    }

    fn current_trip_id(&self) -> Option<String> {
        self.state
            .trip
            .flow
            .as_ref()
            .map(|flow| flow.trip().id.clone())
    }

    async fn handle_trip_key(&mut self, action: AppAction) {
        match self.state.trip.mode {
            TripMode::Edit => self.handle_edit_key(action),
            TripMode::Cover => match action {
                AppAction::Cancel => self.state.trip.mode = TripMode::Overview,
                AppAction::Backspace => {
                    self.state.trip.cover_path.pop();
                }
                AppAction::Input(ch) => self.state.trip.cover_path.push(ch),
                AppAction::Submit => self.upload_cover().await,
                _ => {}
            },
            TripMode::Overview => match action {
                AppAction::Input('e') => self.begin_edit(),
                AppAction::Input('i') => {
                    self.state.trip.cover_path.clear();
                    self.state.trip.mode = TripMode::Cover;
                }
                AppAction::Input('c') => self.cancel_recalculation().await,
                AppAction::Input('r') => self.retry_recalculation().await,
                AppAction::Input('l') => self.reload_trip().await,
                _ => {}
            },
        }
    }

    fn begin_edit(&mut self) {
        if self.state.trip.recalculating() {
            self.toast(
                ToastLevel::Info,
                "Wait for the recalculation to finish before editing",
            );
            return;
        }
        let trip_state = &mut self.state.trip;
        let Some(flow) = trip_state.flow.as_ref() else {
            return;
        };
        trip_state.form = TripForm::from_trip(flow.trip());
        trip_state.error = None;
        trip_state.mode = TripMode::Edit;
    }

    fn handle_edit_key(&mut self, action: AppAction) {
        let trip_state = &mut self.state.trip;
        match action {
            AppAction::Cancel => {
                trip_state.mode = TripMode::Overview;
                trip_state.error = None;
            }
            AppAction::NextField | AppAction::Down => trip_state.form.fields.next(),
            AppAction::PrevField | AppAction::Up => trip_state.form.fields.prev(),
            AppAction::Backspace => trip_state.form.fields.pop(),
            AppAction::Input(ch) => trip_state.form.fields.push(ch),
            AppAction::Submit => {
                let Some(flow) = trip_state.flow.as_ref() else {
                    return;
                };
                let update = trip_state.form.to_update(flow.trip());
                match update {
                    Ok(update) => self.preview(update),
                    Err(message) => self.state.trip.error = Some(message),
                }
            }
            _ => {}
        }
    }

    /// Opens the confirmation dialog for `update`.
    fn preview(&mut self, update: TripUpdate) {
        let Some(flow) = self.state.trip.flow.as_mut() else {
            return;
        };
        match flow.preview_edits(update) {
            Ok(true) => {
                self.state.trip.error = None;
            }
            Ok(false) => {
                self.state.trip.mode = TripMode::Overview;
                self.toast(ToastLevel::Info, "No changes to save");
            }
            Err(err @ PlannerError::Invalid(_)) => {
                self.state.trip.error = Some(err.to_string());
            }
            Err(err) => self.fail_planner("Cannot preview changes", err),
        }
    }

    async fn handle_dialog_key(&mut self, action: AppAction) {
        if action == AppAction::Submit {
            return self.confirm_edit().await;
        }
        let Some(flow) = self.state.trip.flow.as_mut() else {
            return;
        };
        match action {
            AppAction::Input(' ') | AppAction::Input('t') => {
                let recalculate = !flow.recalculate();
                flow.set_recalculate(recalculate);
            }
            AppAction::Cancel => flow.cancel_edit(),
            _ => {}
        }
    }

    async fn confirm_edit(&mut self) {
        let Some(flow) = self.state.trip.flow.as_mut() else {
            return;
        };
        if flow.phase() == EditPhase::Previewing
            && let Err(err) = flow.open_confirmation()
        {
            return self.fail_planner("Cannot confirm", err);
        }

        let result = flow.confirm(&self.api).await;
        let version = flow.version();
        let notice = flow.error().map(str::to_string);
        match result {
            Ok(ApplyOutcome::Saved) => {
                self.state.trip.mode = TripMode::Overview;
                self.toast(
                    ToastLevel::Success,
                    format!("Saved as version {}", version.unwrap_or_default()),
                );
                self.reload_history().await;
            }
            Ok(ApplyOutcome::Recalculating) => {
                self.state.trip.mode = TripMode::Overview;
                self.state.reports.clear();
                self.toast(ToastLevel::Info, "Saved. Recalculating reports");
                self.reload_history().await;
            }
            Ok(ApplyOutcome::Recalculated) => {
                self.state.trip.mode = TripMode::Overview;
                self.state.reports.clear();
                match notice {
                    Some(message) => self.toast(ToastLevel::Error, message),
                    None => self.toast(ToastLevel::Success, "Saved. Reports updated"),
                }
                self.reload_history().await;
            }
            Ok(ApplyOutcome::Conflict) => {
                self.toast(
                    ToastLevel::Error,
                    "Trip changed elsewhere. Review and confirm again",
                );
            }
            Ok(ApplyOutcome::AlreadyApplied) => {
                self.state.trip.mode = TripMode::Overview;
                self.toast(ToastLevel::Info, "These changes are already saved");
                self.reload_history().await;
            }
            Err(PlannerError::Backend(
                err @ (BackendError::NotAuthenticated | BackendError::Unauthorized),
            )) => self.fail("Save failed", err),
            // The edits no longer fit the refetched trip; back to the form.
            Err(err @ PlannerError::Invalid(_)) => {
                self.state.trip.error = Some(err.to_string());
                self.toast(
                    ToastLevel::Error,
                    "Trip changed elsewhere and the edits no longer fit",
                );
            }
            // Shown inline by the dialog.
            Err(_) => {}
        }
    }

    async fn cancel_recalculation(&mut self) {
        let Some(flow) = self.state.trip.flow.as_mut() else {
            return;
        };
        if !flow.tracker().is_some_and(|t| t.status().is_active()) {
            self.toast(ToastLevel::Info, "No recalculation running");
            return;
        }
        match flow.cancel_recalculation(&self.api).await {
            Ok(()) => self.toast(ToastLevel::Info, "Recalculation cancelled"),
            Err(err) => self.fail_planner("Cancel request failed", err),
        }
    }

    async fn retry_recalculation(&mut self) {
        let Some(flow) = self.state.trip.flow.as_mut() else {
            return;
        };
        if flow.tracker().is_some_and(RecalcTracker::is_polling) {
            self.toast(ToastLevel::Info, "A recalculation is already running");
            return;
        }
        let result = flow.retry_recalculation(&self.api).await;
        match result {
            Ok(status) => {
                self.state.reports.clear();
                match status {
                    RecalculationStatus::Completed => {
                        self.toast(ToastLevel::Success, "Reports updated");
                        self.reload_history().await;
                    }
                    status if status.is_active() => {
                        self.toast(ToastLevel::Info, "Full recalculation started");
                    }
                    status => self.toast(
                        ToastLevel::Error,
                        format!("Recalculation {}", status.label()),
                    ),
                }
            }
            Err(err) => {
                self.state.reports.clear();
                self.fail_planner("Retry failed", err);
            }
        }
    }

    async fn reload_trip(&mut self) {
        if self.state.trip.recalculating() {
            self.toast(ToastLevel::Info, "Wait for the recalculation to finish");
            return;
        }
        let Some(trip_id) = self.current_trip_id() else {
            return;
        };
        let limit = self.config.versions_page_size;
        match planner::load_trip_page(&self.api, &trip_id, limit).await {
            Ok(page) => {
                if let Some(flow) = self.state.trip.flow.as_mut() {
                    flow.reset(page.trip.clone());
                }
                self.state.trip.page = Some(page);
                self.state.trip.mode = TripMode::Overview;
            }
            Err(err) => self.fail("Reload failed", err),
        }
    }

    /// Refreshes the version list after the trip changed.
    async fn reload_history(&mut self) {
        let Some(trip_id) = self.current_trip_id() else {
            return;
        };
        let result = self
            .api
            .list_versions(&trip_id, self.config.versions_page_size)
            .await;

        let trip_state = &mut self.state.trip;
        let (Some(page), Some(flow)) = (trip_state.page.as_mut(), trip_state.flow.as_ref()) else {
            return;
        };
        page.trip = flow.trip().clone();
        match result {
            Ok(history) => {
                page.history = history;
                page.history_error = None;
            }
            Err(err) => {
                tracing::warn!(%trip_id, "version history unavailable: {err}");
                page.history_error = Some(err.to_string());
            }
        }
    }

    async fn upload_cover(&mut self) {
        let path = self.state.trip.cover_path.trim().to_string();
        let Some(trip_id) = self.current_trip_id() else {
            return;
        };
        if path.is_empty() {
            self.state.trip.mode = TripMode::Overview;
            return;
        }
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.toast(ToastLevel::Error, format!("Cannot read {path}: {err}"));
                return;
            }
        };
        let file_name = Path::new(&path)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "cover".to_string());

        match self
            .storage
            .upload_cover_image(&trip_id, &file_name, bytes)
            .await
        {
            Ok(url) => {
                self.state.trip.mode = TripMode::Overview;
                self.preview(TripUpdate {
                    cover_image_url: Some(url),
                    ..Default::default()
                });
            }
            Err(err) => self.fail("Upload failed", err),
        }
    }

    // Versions

    async fn handle_versions_key(&mut self, action: AppAction) {
        if let Some(version) = self.state.versions.confirm_restore.take() {
            if action == AppAction::Input('y') {
                self.restore(version).await;
            }
            return;
        }

        let count = self
            .state
            .trip
            .page
            .as_ref()
            .map_or(0, |page| page.history.versions.len());
        let selected_version = self.state.trip.page.as_ref().and_then(|page| {
            page.history
                .versions
                .get(self.state.versions.selected)
                .map(|v| v.version)
        });
        let versions = &mut self.state.versions;

        match action {
            AppAction::Up | AppAction::Input('k') => {
                versions.selected = versions.selected.saturating_sub(1);
            }
            AppAction::Down | AppAction::Input('j') => {
                versions.selected = (versions.selected + 1).min(count.saturating_sub(1));
            }
            AppAction::Input(' ') | AppAction::Input('m') => {
                if let Some(version) = selected_version {
                    versions.toggle_mark(version);
                }
            }
            AppAction::Input('c') => versions.marked.clear(),
            AppAction::Submit => {
                let current = self
                    .state
                    .trip
                    .page
                    .as_ref()
                    .and_then(TripPage::current_version);
                match selected_version {
                    Some(version) if Some(version) == current => {
                        self.toast(ToastLevel::Info, "That is the current version");
                    }
                    Some(version) => self.state.versions.confirm_restore = Some(version),
                    None => {}
                }
            }
            _ => {}
        }
    }

    async fn restore(&mut self, version: u32) {
        if self.state.trip.recalculating() {
            self.toast(ToastLevel::Info, "Wait for the recalculation to finish");
            return;
        }
        let Some(trip_id) = self.current_trip_id() else {
            return;
        };
        let limit = self.config.versions_page_size;
        match planner::restore_version(&self.api, &trip_id, version, limit).await {
            Ok(page) => {
                let current = page.current_version().unwrap_or_default();
                if let Some(flow) = self.state.trip.flow.as_mut() {
                    flow.reset(page.trip.clone());
                }
                self.state.trip.page = Some(page);
                self.state.versions = VersionsState::default();
                self.state.reports.clear();
                self.toast(
                    ToastLevel::Success,
                    format!("Restored version {version} as version {current}"),
                );
            }
            Err(err) => self.fail("Restore failed", err),
        }
    }

    // Reports

    async fn handle_reports_key(&mut self, action: AppAction) {
        match action {
            AppAction::Right | AppAction::NextField => {
                self.state.reports.tab = self.state.reports.tab.next();
                self.load_report(false).await;
            }
            AppAction::Left | AppAction::PrevField => {
                self.state.reports.tab = self.state.reports.tab.prev();
                self.load_report(false).await;
            }
            AppAction::Input('r') => self.load_report(true).await,
            _ => {}
        }
    }

    async fn load_report(&mut self, force: bool) {
        let Some(flow) = self.state.trip.flow.as_ref() else {
            return;
        };
        let trip = flow.trip();
        let trip_id = trip.id.clone();
        let country = trip.destination_country.clone().unwrap_or_default();
        let city = trip.destination_city.clone();

        let reports = &mut self.state.reports;
        match reports.tab {
            ReportTab::Visa if force || reports.visa.is_none() => {
                let result = self.api.report_visa(&trip_id).await;
                reports.visa = Some(ReportOutcome::from_result(result.map_err(Into::into)));
            }
            ReportTab::Destination if force || reports.destination.is_none() => {
                let result = self.api.report_destination(&trip_id).await;
                reports.destination = Some(
                    ReportOutcome::from_result(result.map_err(Into::into))
                        .or_sample(|| sample_destination_report(&country, city.as_deref())),
                );
            }
            ReportTab::Itinerary if force || reports.itinerary.is_none() => {
                let result = self.api.report_itinerary(&trip_id).await;
                reports.itinerary = Some(ReportOutcome::from_result(result.map_err(Into::into)));
            }
            _ => {}
        }
    }

    // Analytics

    async fn load_analytics(&mut self) {
        match self.api.analytics_summary().await {
            Ok(summary) => {
                self.state.analytics.summary = Some(summary);
                self.state.analytics.error = None;
            }
            Err(err) => {
                self.state.analytics.error = Some(err.to_string());
                self.fail("Loading analytics failed", err);
            }
        }
    }

    // Settings

    async fn load_settings(&mut self) {
        match self.api.settings_get().await {
            Ok(settings) => {
                self.adopt_timezone(&settings);
                self.state.settings.form = SettingsForm::from_settings(&settings);
                self.state.settings.value = Some(Speculative::new(settings));
                self.state.settings.error = None;
            }
            Err(err) => {
                self.state.settings.error = Some(err.to_string());
                self.fail("Loading settings failed", err);
            }
        }
    }

    async fn handle_settings_key(&mut self, action: AppAction) {
        let settings = &mut self.state.settings;
        if !settings.editing {
            match action {
                AppAction::Input('e') => {
                    if let Some(value) = &settings.value {
                        settings.form = SettingsForm::from_settings(value.get());
                        settings.editing = true;
                        settings.error = None;
                    }
                }
                AppAction::Input('r') => self.load_settings().await,
                _ => {}
            }
            return;
        }

        match action {
            AppAction::Cancel => {
                settings.editing = false;
                settings.error = None;
            }
            AppAction::NextField | AppAction::Down => settings.form.fields.next(),
            AppAction::PrevField | AppAction::Up => settings.form.fields.prev(),
            AppAction::Backspace => settings.form.fields.pop(),
            AppAction::Input(ch) => settings.form.input(ch),
            AppAction::Submit => self.save_settings().await,
            _ => {}
        }
    }

    /// Shows the new settings at once; a failed save puts the old ones back.
    async fn save_settings(&mut self) {
        let settings = &mut self.state.settings;
        let updated = match settings.form.to_settings() {
            Ok(updated) => updated,
            Err(message) => {
                settings.error = Some(message);
                return;
            }
        };
        let Some(value) = settings.value.as_mut() else {
            return;
        };
        settings.editing = false;

        let api = &self.api;
        let result = value
            .apply_speculative(updated, |settings| async move {
                api.settings_update(&settings).await
            })
            .await;

        match result {
            Ok(()) => {
                if let Some(saved) = self.state.settings.value.as_ref().map(|v| v.get().clone()) {
                    self.adopt_timezone(&saved);
                }
                self.toast(ToastLevel::Success, "Settings saved");
            }
            Err(err) => self.fail("Settings not saved", err),
        }
    }

    fn adopt_timezone(&mut self, settings: &UserSettings) {
        if let Some(tz) = settings
            .timezone
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok())
        {
            self.state.timezone = tz;
        }
    }

    // Shared

    fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.state.toast = Some(ToastState {
            message: message.into(),
            level,
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    /// Surfaces a failed call; an expired session goes back to sign-in.
    fn fail(&mut self, action: &str, err: impl Into<BackendError>) {
        let err = err.into();
        tracing::warn!("{action}: {err}");
        if matches!(
            err,
            BackendError::NotAuthenticated | BackendError::Unauthorized
        ) {
            self.state.screen = Screen::Login;
            self.state.login.focus = LoginField::Password;
            self.state.login.message = Some("Session expired. Sign in again.".to_string());
            return;
        }
        self.toast(ToastLevel::Error, format!("{action}: {err}"));
    }

    fn fail_planner(&mut self, action: &str, err: PlannerError) {
        match err {
            PlannerError::Backend(err) => self.fail(action, err),
            other => {
                tracing::warn!("{action}: {other}");
                self.toast(ToastLevel::Error, format!("{action}: {other}"));
            }
        }
    }

    fn save_local_state(&self) {
        if let Err(err) = self.local.save(&self.config.state_file) {
            tracing::warn!("could not save local state: {err}");
        }
    }
}

fn login_message_for_error(err: &ClientError) -> String {
    match err {
        ClientError::Unauthorized | ClientError::Forbidden(_) => {
            "Wrong email or password.".to_string()
        }
        ClientError::Validation(message) => message.clone(),
        ClientError::Transport(err) => format!("Auth service unreachable: {err}"),
        other => other.to_string(),
    }
}
