use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("LLM provider error {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Malformed provider response: {message}")]
    MalformedProviderResponse {
        message: String,
        detail: Option<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structured error object recorded on failed jobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Error {
    pub fn malformed(message: impl Into<String>, detail: Option<String>) -> Self {
        Error::MalformedProviderResponse {
            message: message.into(),
            detail,
        }
    }

    /// Provider and transport failures may succeed on a later attempt;
    /// persistence and configuration failures will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Reqwest(_) | Error::MalformedProviderResponse { .. } => true,
            Error::Provider { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::BadRequest(_) => "bad_request",
            Error::NotFound(_) => "not_found",
            Error::Database(_) | Error::Migration(_) => "database",
            Error::Validation(_) => "validation",
            Error::Json(_) => "json",
            Error::Reqwest(_) | Error::Provider { .. } => "provider",
            Error::MalformedProviderResponse { .. } => "malformed_provider_response",
            Error::Io(_) => "io",
            Error::Anyhow(_) => "internal",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let (message, detail) = match self {
            Error::MalformedProviderResponse { message, detail } => {
                (message.clone(), detail.clone())
            }
            Error::Provider { status, body } => (
                format!("LLM provider returned status {}", status),
                Some(body.clone()),
            ),
            other => (other.to_string(), None),
        };
        ErrorBody {
            error: self.kind(),
            message,
            detail,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
