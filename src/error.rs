use reqwest::StatusCode;
use thiserror::Error;

/// Shown when an error carries neither a backend `detail` nor a message.
pub const FALLBACK_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed with status code {}", .status.as_u16())]
    Status {
        status: StatusCode,
        /// `detail` field of the error body, if the backend sent one.
        detail: Option<serde_json::Value>,
    },

    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Structured detail as display text. Strings are returned as-is, other
    /// non-null JSON is rendered compactly.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::Status { detail: Some(detail), .. } => match detail {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) if s.is_empty() => None,
                serde_json::Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            },
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage quota exceeded writing {key}: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
}

/// Normalize any error into one line fit for an error notice.
///
/// Looks for a backend `detail` first, then the error's own message, then
/// falls back to [`FALLBACK_ERROR_MESSAGE`].
pub fn error_message(error: &(dyn std::error::Error + 'static)) -> String {
    if let Some(detail) = error.downcast_ref::<ApiError>().and_then(ApiError::detail) {
        return detail;
    }

    let message = error.to_string();
    if message.trim().is_empty() {
        FALLBACK_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}
