use thiserror::Error;

/// Errors produced by the console and its HTTP client.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Transport-level failure talking to the key service.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The key service answered with a non-2xx status.
    #[error("server returned {status}: {detail}")]
    Server { status: u16, detail: String },

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// A form field failed a client-side check.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Another request is still pending.
    #[error("a request is already in progress")]
    Busy,

    /// The user declined a confirmation prompt.
    #[error("cancelled by user")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsoleError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        ConsoleError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Returns true if the error came from the key service rather than local checks.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ConsoleError::Network(_) | ConsoleError::Server { .. } | ConsoleError::Decode(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_names_field() {
        let err = ConsoleError::validation("system_id", "is required");
        assert_eq!(err.to_string(), "system_id: is required");
        assert!(!err.is_remote());
    }

    #[test]
    fn server_error_is_remote() {
        let err = ConsoleError::Server {
            status: 500,
            detail: "Failed to store activation record".to_string(),
        };
        assert!(err.is_remote());
        assert!(err.to_string().contains("500"));
    }
}
