use leptos::{IntoView, View};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::session::Role;

pub const DRIVERS: &str = "drivers";
pub const USERS: &str = "users";
pub const RACES: &str = "races";

#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialAttempt {
    pub username: String,
    pub password: String,
}

impl CredentialAttempt {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for CredentialAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialAttempt")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub id: Option<Value>,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDriver {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    pub number_of_wins: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorPoints {
    pub year: i32,
    pub constructor: String,
    pub total_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitRaceCount {
    pub circuit_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub race_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalityStat {
    pub nationality: String,
    pub driver_count: i64,
    pub winners_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonOverview {
    pub year: i32,
    pub total_races: i64,
    pub unique_drivers: i64,
    pub unique_constructors: i64,
    pub avg_points_per_result: f64,
    pub total_wins: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceDetails {
    pub id: i64,
    pub year: i32,
    pub round: i32,
    pub name: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub circuit: Option<Value>,
    #[serde(default)]
    pub drivers: Vec<Value>,
    #[serde(default)]
    pub constructors: Vec<Value>,
}

/// Failure category surfaced to screens. Serialized as the `code` of an
/// [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    AuthRejected,
    NotAuthenticated,
    AuthRequired,
    AccessDenied,
    Conflict,
    ValidationFailed,
    NotFound,
    ServerFault,
    NoPermissions,
    NoIdentity,
    RequestFailed,
    Unknown,
}

impl ErrorKind {
    pub fn as_code(&self) -> &'static str {
        match self {
            ErrorKind::AuthRejected => "AUTH_REJECTED",
            ErrorKind::NotAuthenticated => "NOT_AUTHENTICATED",
            ErrorKind::AuthRequired => "AUTH_REQUIRED",
            ErrorKind::AccessDenied => "ACCESS_DENIED",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::ValidationFailed => "VALIDATION_FAILED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ServerFault => "SERVER_FAULT",
            ErrorKind::NoPermissions => "NO_PERMISSIONS",
            ErrorKind::NoIdentity => "NO_IDENTITY",
            ErrorKind::RequestFailed => "REQUEST_FAILED",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct ApiError {
    pub error: String,
    #[serde(rename = "code")]
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<ApiError> for String {
    fn from(error: ApiError) -> Self {
        error.error
    }
}

impl IntoView for ApiError {
    fn into_view(self) -> View {
        self.error.into_view()
    }
}

impl ApiError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            kind,
            status: None,
            details: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, msg)
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, msg)
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestFailed, msg)
    }

    pub fn auth_rejected(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthRejected, msg)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorKind::NotAuthenticated, "Not authenticated")
    }

    pub fn auth_required() -> Self {
        Self::new(
            ErrorKind::AuthRequired,
            "Your session has expired. Please log in again.",
        )
    }

    pub fn code(&self) -> &'static str {
        self.kind.as_code()
    }

    /// True when the remote service answered, as opposed to a transport or
    /// client-side failure.
    pub fn is_remote(&self) -> bool {
        self.status.is_some()
    }
}
