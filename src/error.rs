//! Error taxonomy shared by every service, and its mapping onto HTTP responses.

use std::{borrow::Cow, fmt, sync::Arc};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

/// Closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Database,
    Internal,
    Failure,
    UserAlreadyExists,
    PasswordHashing,
    WrongLogin,
    WrongPassword,
    WrongEmail,
    TokenExpired,
    InvalidToken,
    ConfigurationError,
    WrongUserId,
    WrongPlaylistId,
    Unauthorized,
    UserAlreadyAdded,
    UserNotAdded,
    SongAlreadyAdded,
    SongNotAdded,
    PlaylistNotPublic,
    AlreadyFavorited,
    NotFavorited,
    ApiFailure,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 23] = [
        ErrorKind::Validation,
        ErrorKind::Database,
        ErrorKind::Internal,
        ErrorKind::Failure,
        ErrorKind::UserAlreadyExists,
        ErrorKind::PasswordHashing,
        ErrorKind::WrongLogin,
        ErrorKind::WrongPassword,
        ErrorKind::WrongEmail,
        ErrorKind::TokenExpired,
        ErrorKind::InvalidToken,
        ErrorKind::ConfigurationError,
        ErrorKind::WrongUserId,
        ErrorKind::WrongPlaylistId,
        ErrorKind::Unauthorized,
        ErrorKind::UserAlreadyAdded,
        ErrorKind::UserNotAdded,
        ErrorKind::SongAlreadyAdded,
        ErrorKind::SongNotAdded,
        ErrorKind::PlaylistNotPublic,
        ErrorKind::AlreadyFavorited,
        ErrorKind::NotFavorited,
        ErrorKind::ApiFailure,
    ];

    /// Canonical human readable description of the kind.
    pub const fn description(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation failed",
            ErrorKind::Database => "Unexpected database error",
            ErrorKind::Internal => "Internal server error",
            ErrorKind::Failure => "The operation failed, please try again",
            ErrorKind::UserAlreadyExists => {
                "User with the provided email address or nickname already exists"
            }
            ErrorKind::PasswordHashing => "Failed to process the password",
            ErrorKind::WrongLogin => "User with the provided login does not exist",
            ErrorKind::WrongPassword => "Wrong password",
            ErrorKind::WrongEmail => "User with the provided email address does not exist",
            ErrorKind::TokenExpired => "Token has expired",
            ErrorKind::InvalidToken => "Invalid token",
            ErrorKind::ConfigurationError => "Server configuration error",
            ErrorKind::WrongUserId => "User with the provided id does not exist",
            ErrorKind::WrongPlaylistId => "Playlist with the provided id does not exist",
            ErrorKind::Unauthorized => "You are not allowed to perform this action",
            ErrorKind::UserAlreadyAdded => "User is already a collaborator of this playlist",
            ErrorKind::UserNotAdded => "User is not a collaborator of this playlist",
            ErrorKind::SongAlreadyAdded => "Song is already in this playlist",
            ErrorKind::SongNotAdded => "Song is not in this playlist",
            ErrorKind::PlaylistNotPublic => "Playlist is not public",
            ErrorKind::AlreadyFavorited => "Playlist is already in favorites",
            ErrorKind::NotFavorited => "Playlist is not in favorites",
            ErrorKind::ApiFailure => "External API request failed",
        }
    }
}

/// Payload carried by an [`Error`]: plain text, or structured details
/// (validation failures report per-field messages).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Description {
    Text(Cow<'static, str>),
    Details(Value),
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Description::Text(text) => f.write_str(text),
            Description::Details(details) => write!(f, "{details}"),
        }
    }
}

type Cause = Arc<dyn std::error::Error + Send + Sync>;

/// A failure travelling through an `Outcome` chain.
///
/// Two errors are equal when their kinds are equal; the description and the
/// cause do not take part in comparison.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{description}")]
pub struct Error {
    kind: ErrorKind,
    description: Description,
    #[source]
    cause: Option<Cause>,
}

impl Error {
    pub const VALIDATION: Error = Error::of(ErrorKind::Validation);
    pub const DATABASE: Error = Error::of(ErrorKind::Database);
    pub const INTERNAL: Error = Error::of(ErrorKind::Internal);
    pub const FAILURE: Error = Error::of(ErrorKind::Failure);
    pub const USER_ALREADY_EXISTS: Error = Error::of(ErrorKind::UserAlreadyExists);
    pub const PASSWORD_HASHING: Error = Error::of(ErrorKind::PasswordHashing);
    pub const WRONG_LOGIN: Error = Error::of(ErrorKind::WrongLogin);
    pub const WRONG_PASSWORD: Error = Error::of(ErrorKind::WrongPassword);
    pub const WRONG_EMAIL: Error = Error::of(ErrorKind::WrongEmail);
    pub const TOKEN_EXPIRED: Error = Error::of(ErrorKind::TokenExpired);
    pub const INVALID_TOKEN: Error = Error::of(ErrorKind::InvalidToken);
    pub const CONFIGURATION_ERROR: Error = Error::of(ErrorKind::ConfigurationError);
    pub const WRONG_USER_ID: Error = Error::of(ErrorKind::WrongUserId);
    pub const WRONG_PLAYLIST_ID: Error = Error::of(ErrorKind::WrongPlaylistId);
    pub const UNAUTHORIZED: Error = Error::of(ErrorKind::Unauthorized);
    pub const USER_ALREADY_ADDED: Error = Error::of(ErrorKind::UserAlreadyAdded);
    pub const USER_NOT_ADDED: Error = Error::of(ErrorKind::UserNotAdded);
    pub const SONG_ALREADY_ADDED: Error = Error::of(ErrorKind::SongAlreadyAdded);
    pub const SONG_NOT_ADDED: Error = Error::of(ErrorKind::SongNotAdded);
    pub const PLAYLIST_NOT_PUBLIC: Error = Error::of(ErrorKind::PlaylistNotPublic);
    pub const ALREADY_FAVORITED: Error = Error::of(ErrorKind::AlreadyFavorited);
    pub const NOT_FAVORITED: Error = Error::of(ErrorKind::NotFavorited);
    pub const API_FAILURE: Error = Error::of(ErrorKind::ApiFailure);

    /// The canonical error of a kind.
    pub const fn of(kind: ErrorKind) -> Self {
        Self {
            kind,
            description: Description::Text(Cow::Borrowed(kind.description())),
            cause: None,
        }
    }

    pub fn new(kind: ErrorKind, description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            description: Description::Text(description.into()),
            cause: None,
        }
    }

    /// Validation failure with a structured, field-keyed payload.
    pub fn validation(details: Value) -> Self {
        Self {
            kind: ErrorKind::Validation,
            description: Description::Details(details),
            cause: None,
        }
    }

    /// Attaches the underlying library error. It is kept for logs and
    /// `source()` only and is never rendered to the client.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Logs a failed `action` and converts it into an error of `kind`.
    pub fn failure<E>(kind: ErrorKind, action: &'static str, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        error!(kind = ?kind, action, error = %cause, "operation failed");
        Self::of(kind).with_cause(cause)
    }

    /// Shorthand for store failures.
    pub fn database<E>(action: &'static str, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::failure(ErrorKind::Database, action, cause)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> &Description {
        &self.description
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::of(kind)
    }
}

/// JSON body rendered for a failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    fn message(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }
}

/// Maps an error onto the status code and body the client receives.
pub fn to_http_outcome(err: &Error) -> (StatusCode, ErrorBody) {
    let kind = err.kind();
    match kind {
        ErrorKind::Validation => {
            let details = match err.description() {
                Description::Details(details) => details.clone(),
                Description::Text(text) => Value::String(text.to_string()),
            };
            (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: kind,
                    message: kind.description().to_owned(),
                    details: Some(details),
                },
            )
        }
        ErrorKind::WrongLogin
        | ErrorKind::WrongEmail
        | ErrorKind::WrongUserId
        | ErrorKind::WrongPlaylistId => (
            StatusCode::NOT_FOUND,
            ErrorBody::message(kind, err.description().to_string()),
        ),
        ErrorKind::WrongPassword
        | ErrorKind::UserAlreadyAdded
        | ErrorKind::UserNotAdded
        | ErrorKind::SongAlreadyAdded
        | ErrorKind::SongNotAdded
        | ErrorKind::AlreadyFavorited
        | ErrorKind::NotFavorited
        | ErrorKind::PlaylistNotPublic => (
            StatusCode::BAD_REQUEST,
            ErrorBody::message(kind, err.description().to_string()),
        ),
        ErrorKind::UserAlreadyExists => (
            StatusCode::CONFLICT,
            ErrorBody::message(kind, err.description().to_string()),
        ),
        ErrorKind::Unauthorized => (
            StatusCode::FORBIDDEN,
            ErrorBody::message(kind, err.description().to_string()),
        ),
        ErrorKind::InvalidToken | ErrorKind::TokenExpired => (
            StatusCode::UNAUTHORIZED,
            ErrorBody::message(kind, err.description().to_string()),
        ),
        ErrorKind::ConfigurationError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::message(kind, "An unexpected error occurred"),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::message(
                kind,
                format!("An unexpected error occurred: {}", err.description()),
            ),
        ),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = to_http_outcome(&self);
        if status.is_server_error() {
            error!(kind = ?self.kind, %status, cause = ?self.cause, "request failed");
        }
        (status, Json(body)).into_response()
    }
}
