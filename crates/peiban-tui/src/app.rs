//! Application state management for the Peiban terminal client.
//!
//! This module contains the core `App` struct that owns the session store,
//! the router, per-screen form state and background task coordination.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use peiban_core::api::client::DEFAULT_PAGE_SIZE;
use peiban_core::api::{ApiClient, ApiError, ImageUpload};
use peiban_core::auth::{storage, AuthError, Resolved, Route, Router, SessionStore, TokenStorage};
use peiban_core::models::{
    CheckinCalendar, CheckinStatus, Gender, LogEntry, LogPage, LoginResponse, ProfileUpdate, User,
};
use peiban_core::{validate, Config};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for file path input.
const MAX_PATH_LENGTH: usize = 260;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state (overlays on top of the current screen)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    ConfirmingLogout,
    ConfirmingDelete,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Phone,
    Code,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Input,
    Wechat,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub step: LoginStep,
    pub focus: LoginFocus,
    pub phone: String,
    pub code: String,
    pub error: Option<String>,
}

impl LoginForm {
    fn new(phone: Option<String>) -> Self {
        Self {
            step: LoginStep::Phone,
            focus: LoginFocus::Input,
            phone: phone.unwrap_or_default(),
            code: String::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HomeState {
    pub status: Option<CheckinStatus>,
    pub calendar: CheckinCalendar,
    /// Month shown in the calendar as (year, month)
    pub month: (i32, u32),
}

impl HomeState {
    fn new(today: NaiveDate) -> Self {
        Self {
            status: None,
            calendar: CheckinCalendar::default(),
            month: (today.year(), today.month()),
        }
    }

    pub fn checked_in(&self) -> bool {
        self.status.as_ref().map(|s| s.checked_in).unwrap_or(false)
    }

    pub fn shift_month(&mut self, delta: i32) {
        let (year, month) = self.month;
        let index = year * 12 + (month as i32 - 1) + delta;
        self.month = (index.div_euclid(12), index.rem_euclid(12) as u32 + 1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Nickname,
    Gender,
    Signature,
    AvatarPath,
    Save,
}

impl ProfileField {
    pub fn next(&self) -> Self {
        match self {
            ProfileField::Nickname => ProfileField::Gender,
            ProfileField::Gender => ProfileField::Signature,
            ProfileField::Signature => ProfileField::AvatarPath,
            ProfileField::AvatarPath => ProfileField::Save,
            ProfileField::Save => ProfileField::Nickname,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ProfileField::Nickname => ProfileField::Save,
            ProfileField::Gender => ProfileField::Nickname,
            ProfileField::Signature => ProfileField::Gender,
            ProfileField::AvatarPath => ProfileField::Signature,
            ProfileField::Save => ProfileField::AvatarPath,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileForm {
    pub focus: ProfileField,
    pub nickname: String,
    pub gender: Option<Gender>,
    pub signature: String,
    pub avatar_path: String,
    pub error: Option<String>,
}

impl ProfileForm {
    fn from_user(user: Option<&User>) -> Self {
        Self {
            focus: ProfileField::Nickname,
            nickname: user.and_then(|u| u.nickname.clone()).unwrap_or_default(),
            gender: user.and_then(|u| u.gender),
            signature: user.and_then(|u| u.signature.clone()).unwrap_or_default(),
            avatar_path: String::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeField {
    Content,
    ImagePath,
    Submit,
}

impl ComposeField {
    pub fn next(&self) -> Self {
        match self {
            ComposeField::Content => ComposeField::ImagePath,
            ComposeField::ImagePath => ComposeField::Submit,
            ComposeField::Submit => ComposeField::Content,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ComposeField::Content => ComposeField::Submit,
            ComposeField::ImagePath => ComposeField::Content,
            ComposeField::Submit => ComposeField::ImagePath,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposeForm {
    pub focus: ComposeField,
    pub content: String,
    pub image_input: String,
    pub images: Vec<PathBuf>,
    pub error: Option<String>,
}

impl Default for ComposeForm {
    fn default() -> Self {
        Self {
            focus: ComposeField::Content,
            content: String::new(),
            image_input: String::new(),
            images: Vec::new(),
            error: None,
        }
    }
}

impl ComposeForm {
    /// Validate and queue the typed image path.
    pub fn add_image(&mut self) {
        let raw = self.image_input.trim();
        if raw.is_empty() {
            return;
        }
        let path = PathBuf::from(raw);
        if self.images.len() >= validate::MAX_IMAGES {
            self.error = Some("At most 9 images per entry".to_string());
        } else if let Err(msg) = validate::image_path(&path) {
            self.error = Some(msg.to_string());
        } else {
            self.images.push(path);
            self.image_input.clear();
            self.error = None;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryState {
    pub logs: Vec<LogEntry>,
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub selection: usize,
}

impl HistoryState {
    pub fn has_more(&self) -> bool {
        self.page < self.pages
    }

    fn apply_page(&mut self, page: LogPage) {
        if page.page <= 1 {
            self.logs = page.logs;
            self.selection = 0;
        } else {
            self.logs.extend(page.logs);
        }
        self.page = page.page;
        self.pages = page.pages;
        self.total = page.total;
    }

    fn remove(&mut self, id: i64) {
        self.logs.retain(|l| l.id != id);
        self.total = self.total.saturating_sub(1);
        self.selection = self.selection.min(self.logs.len().saturating_sub(1));
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned tasks back to the event loop.
enum TaskResult {
    /// Startup restore finished; the session store already holds the outcome
    SessionSettled,
    /// Backend health check; `None` when it answered normally
    Health(Option<String>),
    Overview(CheckinStatus, CheckinCalendar),
    CheckedIn,
    Logs(LogPage),
    LogDetail(LogEntry),
    LogCreated,
    LogDeleted(i64),
    ProfileSaved,
    /// The profile write succeeded but re-reading the user did not
    ProfileSavedStale(String),
    AvatarUploaded,
    Failed {
        message: String,
        auth_rejected: bool,
    },
}

/// A result tagged with the session generation its task started under.
struct TaskMessage {
    generation: u64,
    result: TaskResult,
}

fn failure(e: ApiError, fallback: &str) -> TaskResult {
    warn!(error = %e, "Request failed");
    TaskResult::Failed {
        message: e.user_message(fallback),
        auth_rejected: e.is_auth_rejection(),
    }
}

fn local_failure(message: String) -> TaskResult {
    TaskResult::Failed {
        message,
        auth_rejected: false,
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub api: ApiClient,
    pub session: Arc<SessionStore>,
    pub router: Router,

    /// What the guard allowed for the current route on the last tick
    pub view: Resolved,
    entered: Option<Route>,

    pub state: AppState,
    pub login: LoginForm,
    pub home: HomeState,
    pub profile: ProfileForm,
    pub compose: ComposeForm,
    pub history: HistoryState,
    pub detail: Option<LogEntry>,

    // Background task channel
    task_rx: mpsc::Receiver<TaskMessage>,
    task_tx: mpsc::Sender<TaskMessage>,
    pending_tasks: usize,

    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let token_storage = storage::from_config(&config)?;
        Self::with_storage(config, token_storage)
    }

    fn with_storage(config: Config, token_storage: Box<dyn TokenStorage>) -> Result<Self> {
        let api = ApiClient::from_config(&config)?;
        let session = Arc::new(SessionStore::new(Arc::new(api.clone()), token_storage));
        debug!(api = %config.api_base_url, storage = ?config.token_storage, "App configured");

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let login = LoginForm::new(config.last_phone.clone());

        Ok(Self {
            config,
            api,
            session,
            router: Router::default(),
            view: Resolved::Waiting,
            entered: None,
            state: AppState::Normal,
            login,
            home: HomeState::new(Local::now().date_naive()),
            profile: ProfileForm::from_user(None),
            compose: ComposeForm::default(),
            history: HistoryState::default(),
            detail: None,
            task_rx: rx,
            task_tx: tx,
            pending_tasks: 0,
            status_message: None,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.pending_tasks > 0
    }

    /// API client carrying the current session token, if any.
    fn authed_api(&self) -> Option<ApiClient> {
        self.session.token().map(|t| self.api.with_token(t))
    }

    fn spawn<F>(&mut self, status: &str, task: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        let tx = self.task_tx.clone();
        let generation = self.session.generation();
        self.pending_tasks += 1;
        self.status_message = Some(status.to_string());
        tokio::spawn(async move {
            let result = task.await;
            if let Err(e) = tx.send(TaskMessage { generation, result }).await {
                error!(error = %e, "Failed to send task result - channel closed");
            }
        });
    }

    /// Kick off the startup restore in the background.
    pub fn start_restore(&mut self) {
        let session = self.session.clone();
        self.spawn("Restoring session...", async move {
            let state = session.restore().await;
            debug!(?state, "Restore settled");
            TaskResult::SessionSettled
        });
    }

    // =========================================================================
    // Event loop hooks
    // =========================================================================

    /// Drain finished tasks, then re-run the guard for the current route.
    pub fn tick(&mut self) {
        while let Ok(message) = self.task_rx.try_recv() {
            self.pending_tasks = self.pending_tasks.saturating_sub(1);
            // Issued under a session that has since logged out or been replaced
            if message.generation != self.session.generation() {
                debug!("Dropping result from a previous session");
                continue;
            }
            self.process_result(message.result);
        }

        let session = self.session.snapshot();
        self.view = self.router.resolve(&session);

        if let Resolved::Screen(route) = self.view {
            if self.entered != Some(route) {
                self.entered = Some(route);
                self.on_enter(route);
            }
        }
    }

    fn on_enter(&mut self, route: Route) {
        debug!(?route, "Entering screen");
        match route {
            Route::Login => {
                self.login = LoginForm::new(self.config.last_phone.clone());
                self.check_health();
            }
            Route::Home => self.load_overview(),
            Route::Profile => {
                let session = self.session.snapshot();
                self.profile = ProfileForm::from_user(session.user());
            }
            Route::Compose => self.compose = ComposeForm::default(),
            Route::History => {
                if self.history.page == 0 {
                    self.load_logs(1);
                }
            }
            Route::LogDetail(id) => {
                if self.detail.as_ref().map(|d| d.id) != Some(id) {
                    self.detail = None;
                }
                self.load_log(id);
            }
        }
    }

    pub fn navigate(&mut self, route: Route) {
        self.router.navigate(route);
    }

    pub fn go_back(&mut self) {
        self.router.back();
    }

    fn process_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::SessionSettled => {
                self.status_message = None;
            }
            TaskResult::Health(problem) => {
                self.status_message = problem;
            }
            TaskResult::Overview(status, calendar) => {
                self.home.status = Some(status);
                self.home.calendar = calendar;
                self.status_message = None;
            }
            TaskResult::CheckedIn => {
                self.status_message = Some("Checked in for today".to_string());
                self.load_overview();
            }
            TaskResult::Logs(page) => {
                self.history.apply_page(page);
                self.status_message = None;
            }
            TaskResult::LogDetail(entry) => {
                self.detail = Some(entry);
                self.status_message = None;
            }
            TaskResult::LogCreated => {
                info!("Journal entry created");
                self.compose = ComposeForm::default();
                self.history = HistoryState::default();
                self.status_message = Some("Entry saved".to_string());
                self.router.reset(Route::Home);
                self.entered = None;
            }
            TaskResult::LogDeleted(id) => {
                info!(log_id = id, "Journal entry deleted");
                self.history.remove(id);
                self.detail = None;
                self.status_message = Some("Entry deleted".to_string());
                if self.router.current() == Route::LogDetail(id) {
                    self.router.back();
                }
            }
            TaskResult::ProfileSaved => {
                self.status_message = Some("Profile saved".to_string());
                self.router.reset(Route::Home);
                self.entered = None;
            }
            TaskResult::ProfileSavedStale(msg) => {
                self.profile.error = Some(msg.clone());
                self.status_message = Some(msg);
            }
            TaskResult::AvatarUploaded => {
                self.profile.avatar_path.clear();
                self.status_message = Some("Avatar updated".to_string());
            }
            TaskResult::Failed {
                message,
                auth_rejected,
            } => {
                if auth_rejected {
                    info!("Backend rejected the session token");
                    self.logout();
                    self.status_message = Some("Session expired, please log in again".to_string());
                } else {
                    match self.router.current() {
                        Route::Profile => self.profile.error = Some(message.clone()),
                        Route::Compose => self.compose.error = Some(message.clone()),
                        _ => {}
                    }
                    self.status_message = Some(message);
                }
            }
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Ask the backend for its health so the login screen can say when it is unreachable
    fn check_health(&mut self) {
        let api = self.api.clone();
        let url = self.config.api_base_url.clone();
        self.spawn("Contacting server...", async move {
            match api.health().await {
                Ok(health) if health.is_ok() => TaskResult::Health(None),
                Ok(health) => TaskResult::Health(Some(format!(
                    "Server reports status '{}'",
                    health.status
                ))),
                Err(e) => {
                    warn!(error = %e, url = %url, "Health check failed");
                    TaskResult::Health(Some(format!("Cannot reach server at {}", url)))
                }
            }
        });
    }

    /// Request a verification code for the phone in the login form
    pub async fn send_code(&mut self) {
        let phone = self.login.phone.trim().to_string();
        if let Err(msg) = validate::phone(&phone) {
            self.login.error = Some(msg.to_string());
            return;
        }
        self.login.error = None;

        match self.api.send_code(&phone).await {
            Ok(resp) => {
                info!("Verification code requested");
                self.login.step = LoginStep::Code;
                // Development backends echo the code; pre-fill it
                self.login.code = resp.code.unwrap_or_default();
            }
            Err(e) => {
                warn!(error = %e, "Failed to send verification code");
                self.login.error = Some(e.user_message("Failed to send verification code"));
            }
        }
    }

    /// Exchange phone + code for a session
    pub async fn verify_code(&mut self) {
        if let Err(msg) = validate::code(&self.login.code) {
            self.login.error = Some(msg.to_string());
            return;
        }
        self.login.error = None;

        let phone = self.login.phone.trim().to_string();
        match self.api.verify_phone(&phone, self.login.code.trim()).await {
            Ok(resp) => {
                self.config.last_phone = Some(phone);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.complete_login(resp);
            }
            Err(e) => {
                error!(error = %e, "Phone login failed");
                self.login.error = Some(e.user_message("Invalid verification code"));
            }
        }
    }

    pub async fn wechat_login(&mut self) {
        self.login.error = None;
        let code = self.config.wechat_dev_code.clone();
        match self.api.wechat_login(&code).await {
            Ok(resp) => self.complete_login(resp),
            Err(e) => {
                error!(error = %e, "WeChat login failed");
                self.login.error = Some(e.user_message("WeChat login failed"));
            }
        }
    }

    fn complete_login(&mut self, resp: LoginResponse) {
        self.session.login(resp.token, resp.user);
        self.login = LoginForm::new(self.config.last_phone.clone());
        self.router.reset(Route::Home);
        self.entered = None;
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.home = HomeState::new(Local::now().date_naive());
        self.history = HistoryState::default();
        self.detail = None;
        self.status_message = Some("Logged out".to_string());
        self.router.reset(Route::Login);
    }

    // =========================================================================
    // Check-in
    // =========================================================================

    pub fn load_overview(&mut self) {
        let Some(api) = self.authed_api() else { return };
        self.spawn("Loading check-ins...", async move {
            match api.checkin_overview().await {
                Ok((status, calendar)) => TaskResult::Overview(status, calendar),
                Err(e) => failure(e, "Failed to load check-in data"),
            }
        });
    }

    pub fn checkin(&mut self) {
        if self.home.checked_in() {
            self.status_message = Some("Already checked in today".to_string());
            return;
        }
        let Some(api) = self.authed_api() else { return };
        self.spawn("Checking in...", async move {
            match api.checkin().await {
                Ok(_) => TaskResult::CheckedIn,
                Err(e) => failure(e, "Check-in failed"),
            }
        });
    }

    // =========================================================================
    // Journal
    // =========================================================================

    pub fn load_logs(&mut self, page: u32) {
        let Some(api) = self.authed_api() else { return };
        self.spawn("Loading history...", async move {
            match api.logs(page, DEFAULT_PAGE_SIZE).await {
                Ok(page) => TaskResult::Logs(page),
                Err(e) => failure(e, "Failed to load history"),
            }
        });
    }

    pub fn load_more_logs(&mut self) {
        if self.history.has_more() && !self.is_busy() {
            self.load_logs(self.history.page + 1);
        }
    }

    fn load_log(&mut self, id: i64) {
        let Some(api) = self.authed_api() else { return };
        self.spawn("Loading entry...", async move {
            match api.log(id).await {
                Ok(entry) => TaskResult::LogDetail(entry),
                Err(e) => failure(e, "Failed to load entry"),
            }
        });
    }

    pub fn delete_current_log(&mut self) {
        let Route::LogDetail(id) = self.router.current() else { return };
        let Some(api) = self.authed_api() else { return };
        self.spawn("Deleting entry...", async move {
            match api.delete_log(id).await {
                Ok(()) => TaskResult::LogDeleted(id),
                Err(e) => failure(e, "Failed to delete entry"),
            }
        });
    }

    pub fn submit_log(&mut self) {
        let content = self.compose.content.clone();
        if let Err(msg) = validate::log_entry(&content, self.compose.images.len()) {
            self.compose.error = Some(msg.to_string());
            return;
        }
        self.compose.error = None;

        let Some(api) = self.authed_api() else { return };
        let paths = self.compose.images.clone();
        self.spawn("Saving entry...", async move {
            let mut uploads = Vec::with_capacity(paths.len());
            for path in &paths {
                match ImageUpload::from_path(path).await {
                    Ok(upload) => uploads.push(upload),
                    Err(e) => {
                        return local_failure(format!("Cannot read {}: {}", path.display(), e))
                    }
                }
            }
            match api.create_log(&content, uploads).await {
                Ok(_) => TaskResult::LogCreated,
                Err(e) => failure(e, "Failed to save entry"),
            }
        });
    }

    // =========================================================================
    // Profile
    // =========================================================================

    pub fn save_profile(&mut self) {
        let nickname = self.profile.nickname.trim().to_string();
        let signature = self.profile.signature.trim().to_string();
        if let Err(msg) = validate::profile(&nickname, &signature) {
            self.profile.error = Some(msg.to_string());
            return;
        }
        self.profile.error = None;

        let update = ProfileUpdate {
            nickname: Some(nickname),
            gender: self.profile.gender,
            signature: Some(signature),
        };
        let Some(api) = self.authed_api() else { return };
        let session = self.session.clone();
        self.spawn("Saving profile...", async move {
            if let Err(e) = api.update_profile(&update).await {
                return failure(e, "Failed to save profile");
            }
            match session.refresh_user().await {
                Ok(_) => TaskResult::ProfileSaved,
                Err(e) => stale_profile(e),
            }
        });
    }

    pub fn upload_avatar(&mut self) {
        let raw = self.profile.avatar_path.trim().to_string();
        if raw.is_empty() {
            self.profile.error = Some("Enter the path of an image file".to_string());
            return;
        }
        let path = PathBuf::from(raw);
        if let Err(msg) = validate::image_path(&path) {
            self.profile.error = Some(msg.to_string());
            return;
        }
        self.profile.error = None;

        let Some(api) = self.authed_api() else { return };
        let session = self.session.clone();
        self.spawn("Uploading avatar...", async move {
            let upload = match ImageUpload::from_path(&path).await {
                Ok(upload) => upload,
                Err(e) => return local_failure(format!("Cannot read {}: {}", path.display(), e)),
            };
            if let Err(e) = api.upload_avatar(upload).await {
                return failure(e, "Failed to upload avatar");
            }
            match session.refresh_user().await {
                Ok(_) => TaskResult::AvatarUploaded,
                Err(e) => stale_profile(e),
            }
        });
    }
}

fn stale_profile(e: AuthError) -> TaskResult {
    warn!(error = %e, "Saved, but failed to reload profile");
    let reason = match e {
        AuthError::Api(api) => api.user_message("request failed"),
        other => other.to_string(),
    };
    TaskResult::ProfileSavedStale(format!("Saved, but reloading the profile failed: {}", reason))
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_phone_char(current_len: usize, c: char) -> bool {
    current_len < validate::PHONE_LENGTH && c.is_ascii_digit()
}

pub fn can_add_code_char(current_len: usize, c: char) -> bool {
    current_len < validate::MAX_CODE_LENGTH && c.is_ascii_alphanumeric()
}

/// Limits are in characters, matching the backend's column sizes
pub fn can_add_text_char(current: &str, max_chars: usize, c: char) -> bool {
    current.chars().count() < max_chars && is_valid_input_char(c)
}

pub fn can_add_path_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PATH_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use peiban_core::auth::MemoryTokenStorage;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn app_with_base(api_base_url: String) -> App {
        let config = Config {
            api_base_url,
            ..Config::default()
        };
        App::with_storage(config, Box::new(MemoryTokenStorage::default())).expect("build app")
    }

    fn app_against(server: &MockServer) -> App {
        app_with_base(format!("{}/api", server.uri()))
    }

    fn login_as(token: &str, id: i64) -> LoginResponse {
        LoginResponse {
            token: token.to_string(),
            user: serde_json::from_value(serde_json::json!({ "id": id })).expect("user"),
        }
    }

    async fn mount_overview(server: &MockServer, response: ResponseTemplate, token: Option<&str>) {
        for endpoint in ["/api/checkin/status", "/api/checkin/calendar"] {
            let mock = Mock::given(method("GET")).and(path(endpoint));
            let mock = match token {
                Some(token) => mock.and(bearer_token(token)).respond_with(response.clone()),
                None => mock.respond_with(response.clone()),
            };
            mock.mount(server).await;
        }
    }

    fn entry(id: i64) -> LogEntry {
        LogEntry {
            id,
            user_id: 1,
            content: Some(format!("entry {}", id)),
            images: vec![],
            created_at: None,
        }
    }

    #[test]
    fn test_shift_month_wraps_years() {
        let mut home = HomeState::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        home.shift_month(-1);
        assert_eq!(home.month, (2023, 12));
        home.shift_month(1);
        assert_eq!(home.month, (2024, 1));
        home.shift_month(12);
        assert_eq!(home.month, (2025, 1));
        home.shift_month(-13);
        assert_eq!(home.month, (2023, 12));
    }

    #[test]
    fn test_history_paging() {
        let mut history = HistoryState::default();
        history.apply_page(LogPage { logs: vec![entry(3), entry(2)], total: 3, page: 1, per_page: 2, pages: 2 });
        assert!(history.has_more());
        history.selection = 1;

        history.apply_page(LogPage { logs: vec![entry(1)], total: 3, page: 2, per_page: 2, pages: 2 });
        assert_eq!(history.logs.len(), 3);
        assert!(!history.has_more());
        assert_eq!(history.selection, 1);

        // Reloading the first page replaces the list
        history.apply_page(LogPage { logs: vec![entry(3)], total: 1, page: 1, per_page: 2, pages: 1 });
        assert_eq!(history.logs.len(), 1);
        assert_eq!(history.selection, 0);
    }

    #[test]
    fn test_history_remove_clamps_selection() {
        let mut history = HistoryState::default();
        history.apply_page(LogPage { logs: vec![entry(2), entry(1)], total: 2, page: 1, per_page: 20, pages: 1 });
        history.selection = 1;
        history.remove(1);
        assert_eq!(history.logs.len(), 1);
        assert_eq!(history.selection, 0);
        assert_eq!(history.total, 1);
    }

    #[test]
    fn test_compose_add_image() {
        let mut form = ComposeForm::default();
        form.image_input = "/tmp/photo.bmp".to_string();
        form.add_image();
        assert!(form.images.is_empty());
        assert!(form.error.is_some());

        form.image_input = "/tmp/photo.jpg".to_string();
        form.add_image();
        assert_eq!(form.images.len(), 1);
        assert!(form.image_input.is_empty());
        assert!(form.error.is_none());

        for i in 0..10 {
            form.image_input = format!("/tmp/{}.png", i);
            form.add_image();
        }
        assert_eq!(form.images.len(), validate::MAX_IMAGES);
        assert!(form.error.is_some());
    }

    #[test]
    fn test_profile_form_from_user() {
        let mut user = User::new(4).with_nickname("Ann");
        user.gender = Some(Gender::Female);
        let form = ProfileForm::from_user(Some(&user));
        assert_eq!(form.nickname, "Ann");
        assert_eq!(form.gender, Some(Gender::Female));
        assert_eq!(form.signature, "");

        let empty = ProfileForm::from_user(None);
        assert_eq!(empty.nickname, "");
    }

    #[test]
    fn test_profile_field_cycle() {
        let mut field = ProfileField::Nickname;
        for _ in 0..5 {
            field = field.next();
        }
        assert_eq!(field, ProfileField::Nickname);
        assert_eq!(ProfileField::Nickname.prev(), ProfileField::Save);
    }

    #[test]
    fn test_can_add_phone_char() {
        assert!(can_add_phone_char(0, '1'));
        assert!(can_add_phone_char(10, '9'));
        assert!(!can_add_phone_char(11, '1'));
        assert!(!can_add_phone_char(0, 'a'));
        assert!(!can_add_phone_char(0, '-'));
    }

    #[test]
    fn test_can_add_code_char() {
        assert!(can_add_code_char(0, '1'));
        assert!(!can_add_code_char(6, '1'));
        assert!(!can_add_code_char(0, ' '));
    }

    #[test]
    fn test_can_add_text_char() {
        assert!(can_add_text_char("", 50, '字'));
        assert!(can_add_text_char(&"字".repeat(49), 50, 'a'));
        assert!(!can_add_text_char(&"字".repeat(50), 50, 'a'));
        assert!(!can_add_text_char("", 50, '\n'));
    }

    #[tokio::test]
    async fn test_rejected_token_returns_to_login() {
        let server = MockServer::start().await;
        mount_overview(&server, ResponseTemplate::new(401), None).await;

        let mut app = app_against(&server);
        app.complete_login(login_as("expired", 1));
        app.tick();
        assert_eq!(app.view, Resolved::Screen(Route::Home));

        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            app.tick();
            if app.session.snapshot().user().is_none() {
                break;
            }
        }

        assert!(app.session.snapshot().user().is_none());
        assert_eq!(app.session.token(), None);
        assert_eq!(app.view, Resolved::Screen(Route::Login));
    }

    #[tokio::test]
    async fn test_late_rejection_from_previous_session_is_dropped() {
        let server = MockServer::start().await;
        mount_overview(
            &server,
            ResponseTemplate::new(401).set_delay(Duration::from_millis(300)),
            Some("A"),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/api/checkin/status"))
            .and(bearer_token("B"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "checked_in": true, "date": "2024-05-03"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/checkin/calendar"))
            .and(bearer_token("B"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "checkin_dates": ["2024-05-03"]
            })))
            .mount(&server)
            .await;

        let mut app = app_against(&server);
        app.complete_login(login_as("A", 1));
        app.load_overview();
        app.logout();
        app.complete_login(login_as("B", 2));

        tokio::time::sleep(Duration::from_millis(800)).await;
        app.tick();

        assert_eq!(app.session.snapshot().user().map(|u| u.id), Some(2));
        assert_eq!(app.session.token().as_deref(), Some("B"));
        assert_eq!(app.view, Resolved::Screen(Route::Home));
    }

    #[test]
    fn test_log_deleted_only_leaves_its_own_detail_screen() {
        let mut app = app_with_base("http://localhost:5000/api".to_string());
        app.navigate(Route::History);
        app.history.logs = vec![entry(1), entry(2)];

        // Deleted while the user had already moved on
        app.process_result(TaskResult::LogDeleted(2));
        assert_eq!(app.router.current(), Route::History);
        assert_eq!(app.history.logs.len(), 1);

        app.navigate(Route::LogDetail(1));
        app.process_result(TaskResult::LogDeleted(1));
        assert_eq!(app.router.current(), Route::History);
    }
}
