//! Error types for backend access

use serde::Deserialize;

/// Errors raised while talking to the backend
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Server answered with a non-success status
    #[error("server returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Http {
        status: u16,
        /// Message extracted from the error body, if any
        message: Option<String>,
    },

    /// Request never completed (connect, timeout, TLS)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Body could not be encoded or decoded
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Client configuration is unusable
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// Backend unavailable for another reason
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    /// Message suitable for showing to the user, when the server sent one
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// HTTP status, if the server answered
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transient failures that may succeed if repeated by the user
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Transport(_) | Self::Unavailable(_) => true,
            Self::Payload(_) | Self::Config(_) => false,
        }
    }
}

/// Error body shapes the backend is known to send
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Extract a human-readable message from an error body
pub(crate) fn parse_error_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(parsed) => parsed.message.or(parsed.error).filter(|m| !m.trim().is_empty()),
        // plain-text bodies are passed through unless they look like HTML
        Err(_) if !trimmed.starts_with('<') => Some(trimmed.to_string()),
        Err(_) => None,
    }
}

/// Result alias for backend calls
pub type RemoteResult<T> = Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_display_includes_message() {
        let err = RemoteError::Http {
            status: 422,
            message: Some("Title already used".into()),
        };
        assert_eq!(err.to_string(), "server returned 422: Title already used");
        assert_eq!(err.server_message(), Some("Title already used"));

        let bare = RemoteError::Http {
            status: 500,
            message: None,
        };
        assert_eq!(bare.to_string(), "server returned 500");
        assert!(bare.is_retryable());
    }

    #[test]
    fn error_body_shapes() {
        assert_eq!(parse_error_body(r#"{"message":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(parse_error_body(r#"{"error":"denied"}"#).as_deref(), Some("denied"));
        assert_eq!(parse_error_body("Bad gateway").as_deref(), Some("Bad gateway"));
        assert_eq!(parse_error_body("<html>502</html>"), None);
        assert_eq!(parse_error_body("  "), None);
        assert_eq!(parse_error_body(r#"{"message":""}"#), None);
    }

    #[test]
    fn client_errors_are_terminal() {
        let err = RemoteError::Http {
            status: 403,
            message: None,
        };
        assert!(!err.is_retryable());
        assert!(!RemoteError::Config("bad url".into()).is_retryable());
    }
}
