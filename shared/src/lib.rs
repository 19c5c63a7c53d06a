#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod api;
pub mod app;
pub mod capabilities;
pub mod config;
pub mod debounce;
pub mod event;
pub mod filters;
pub mod form;
pub mod model;
pub mod multipart;
pub mod refine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::ClientConfig;
pub use crux_core::App as CruxApp;
pub use event::Event;
pub use filters::{FilterUpdate, SearchFilters, SortBy};
pub use model::{Listing, ListingId, ListingType, PropertyType, Session, User, UserId};

use debounce::Debouncer;
use filters::ServerFilterKey;
use form::ListingForm;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const DEBOUNCE_MS: u64 = 800;
pub const MAX_LISTING_IMAGES: usize = 4;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const DESCRIPTION_PREVIEW_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    RateLimited,
    Serialization,
    Deserialization,
    ImageTooLarge,
    ImageFormatUnsupported,
    TooManyImages,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::ImageTooLarge => "IMAGE_TOO_LARGE",
            Self::ImageFormatUnsupported => "IMAGE_FORMAT_UNSUPPORTED",
            Self::TooManyImages => "TOO_MANY_IMAGES",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Conflict
        )
    }
}

/// Crate-wide error surfaced to the user as a toast.
///
/// `message` is for logs. `server_message` carries the `message` field of an
/// API error body and wins over the generic per-kind text when shown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub server_message: Option<String>,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            server_message: None,
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        if let Some(server) = self.server_message.as_deref().filter(|m| !m.trim().is_empty()) {
            return server.to_string();
        }

        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Authentication => "Your session has expired. Please sign in again.".into(),
            ErrorKind::Authorization => "You don't have permission to perform this action.".into(),
            ErrorKind::Validation
            | ErrorKind::ImageTooLarge
            | ErrorKind::ImageFormatUnsupported
            | ErrorKind::TooManyImages => self.message.clone(),
            ErrorKind::NotFound => "The requested item could not be found.".into(),
            ErrorKind::Conflict => {
                "This action conflicts with a recent change. Please refresh and try again.".into()
            }
            ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.".into(),
            ErrorKind::Serialization | ErrorKind::Deserialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::InvalidState => "Something went wrong. Please reload the page.".into(),
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 | 422 => ErrorKind::Validation,
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimited,
            408 => ErrorKind::Timeout,
            500..=599 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        };

        let server_message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .map(|e| e.message)
            .filter(|m| !m.is_empty());

        let mut error = Self::new(kind, format!("HTTP error: {status}"))
            .with_context("http_status", status.to_string());
        error.server_message = server_message;
        error
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: String,
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Info => 3000,
            Self::Success => 2000,
            Self::Warning => 4000,
            Self::Error => 5000,
        }
    }
}

/// Groups the integer part in threes: `1250000.5` becomes `1,250,000.50`.
#[must_use]
pub fn format_price(amount: f64) -> String {
    if !amount.is_finite() {
        return "-".into();
    }

    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cents = cents as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    if fraction == 0 {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction:02}")
    }
}

/// Shortest text that parses back to the same number (`1000`, `12.5`).
#[must_use]
pub fn format_number(value: f64) -> String {
    value.to_string()
}

#[must_use]
pub fn description_preview(text: &str, max_len: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_len {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_len).collect();
    format!("{}...", cut.trim_end())
}

#[must_use]
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_secs = (now - then).num_seconds();
    if diff_secs < 0 {
        return if diff_secs > -60 {
            "Just now".into()
        } else {
            "Upcoming".into()
        };
    }

    if diff_secs < 5 {
        return "Just now".into();
    }
    if diff_secs < 60 {
        return format!("{diff_secs}s ago");
    }

    let diff_mins = diff_secs / 60;
    if diff_mins < 60 {
        return format!("{diff_mins}m ago");
    }

    let diff_hours = diff_mins / 60;
    if diff_hours < 24 {
        return format!("{diff_hours}h ago");
    }

    let diff_days = diff_hours / 24;
    if diff_days < 7 {
        return format!("{diff_days}d ago");
    }
    if diff_days < 30 {
        return format!("{}w ago", diff_days / 7);
    }
    if diff_days < 365 {
        return format!("{}mo ago", diff_days / 30);
    }

    format!("{}y ago", diff_days / 365)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchState {
    #[default]
    Idle,
    /// No result set yet; the shell shows a blocking overlay.
    InitialLoading,
    /// Results are on screen and get dimmed while the new set loads.
    Refreshing,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Page {
    #[default]
    Search,
    Listing {
        id: ListingId,
    },
    CreateListing,
    EditListing {
        id: ListingId,
    },
    Profile,
    SignIn,
    SignUp,
}

#[derive(Debug)]
pub struct SearchState {
    pub filters: SearchFilters,
    pub min_price_input: String,
    pub max_price_input: String,
    pub min_price_debounce: Debouncer<String>,
    pub max_price_debounce: Debouncer<String>,
    pub listings: Vec<Listing>,
    pub fetch_state: FetchState,
    pub initialized: bool,
    pub loaded_once: bool,
    pub request_seq: u64,
    pub last_key: Option<ServerFilterKey>,
    /// Set while the shown results were fetched with a `location` filter.
    pub scoped_location: Option<String>,
}

impl Default for SearchState {
    fn default() -> Self {
        let interval = Duration::from_millis(DEBOUNCE_MS);
        Self {
            filters: SearchFilters::baseline(),
            min_price_input: String::new(),
            max_price_input: String::new(),
            min_price_debounce: Debouncer::new(interval),
            max_price_debounce: Debouncer::new(interval),
            listings: Vec::new(),
            fetch_state: FetchState::Idle,
            initialized: false,
            loaded_once: false,
            request_seq: 0,
            last_key: None,
            scoped_location: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct DetailState {
    pub listing: Option<Listing>,
    pub loading: bool,
}

#[derive(Debug, Default)]
pub struct ProfileState {
    pub listings: Vec<Listing>,
    pub loading: bool,
    pub saving: bool,
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: ClientConfig,
    pub session: Option<Session>,
    pub page: Page,
    pub search: SearchState,
    pub detail: DetailState,
    pub form: Option<ListingForm>,
    pub profile: ProfileState,
    pub auth_pending: bool,
    pub toast: Option<ToastMessage>,
    /// Reference time from the shell, used for "3d ago" labels.
    pub now: Option<DateTime<Utc>>,
    next_toast_id: u64,
}

impl Model {
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.next_toast_id += 1;
        self.toast = Some(ToastMessage {
            id: self.next_toast_id,
            message: message.into(),
            kind,
            duration_ms: kind.default_duration_ms(),
        });
    }

    pub fn show_error(&mut self, error: &AppError) {
        self.show_toast(error.user_facing_message(), ToastKind::Error);
    }

    pub fn dismiss_toast(&mut self, id: u64) {
        if self.toast.as_ref().is_some_and(|t| t.id == id) {
            self.toast = None;
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Drops everything that belongs to the signed-in user.
    pub fn clear_session(&mut self) {
        self.session = None;
        self.form = None;
        self.profile = ProfileState::default();
    }
}

pub use app::view::{
    ExistingImageView, FormView, ListingCard, ListingDetailView, PageView, PendingImageView,
    ProfileView, SearchView, ToastView, UserView, ViewModel,
};
