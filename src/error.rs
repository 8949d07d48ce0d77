use std::io;
use std::time::Duration;
use thiserror::Error;

/// Custom result type alias for the service
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Message returned when a repository is missing or not public
pub const NOT_FOUND_MESSAGE: &str =
    "Repository not found or private. Please ensure the repository is public.";

/// Message returned when the input does not name a repository
pub const INVALID_REFERENCE_MESSAGE: &str =
    "Invalid GitHub URL format. Expected: github.com/owner/repo";

/// Errors that can occur while generating a document or counting visitors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing repository reference
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Repository does not exist or is private
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other failure talking to the repository host
    #[error("GitHub API Error: {message}")]
    Upstream {
        /// Upstream HTTP status, when a response was received at all
        status: Option<u16>,
        /// Upstream error description
        message: String,
    },

    /// Failure contacting or parsing the text-generation endpoint
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// The generation flow ran past its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ServiceError {
    /// Builds an upstream error from a non-success status
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status: Some(status),
            message: message.into(),
        }
    }

    /// HTTP status code this error is reported with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            // Only pass through statuses that are actually errors
            Self::Upstream { status: Some(code), .. } if (400..600).contains(code) => *code,
            Self::Timeout(_) => 504,
            _ => 500,
        }
    }

    /// Text shown to the caller. Generation and internal failures never leak detail.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::NotFound(_) => NOT_FOUND_MESSAGE.to_string(),
            Self::Upstream { message, .. } => format!("GitHub API Error: {}", message),
            Self::Timeout(_) => "Request timed out".to_string(),
            _ => "Internal Server Error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(ServiceError::NotFound("a/b".into()).status_code(), 404);
        assert_eq!(ServiceError::upstream(403, "rate limited").status_code(), 403);
        assert_eq!(ServiceError::GenerationFailed("boom".into()).status_code(), 500);
        assert_eq!(ServiceError::Timeout(Duration::from_secs(1)).status_code(), 504);

        let no_status = ServiceError::Upstream { status: None, message: "reset".into() };
        assert_eq!(no_status.status_code(), 500);
    }

    #[test]
    fn test_public_message_hides_internal_detail() {
        let error = ServiceError::GenerationFailed("invalid api key sk-123".into());
        assert_eq!(error.public_message(), "Internal Server Error");

        let error = ServiceError::NotFound("octocat/missing".into());
        assert_eq!(error.public_message(), NOT_FOUND_MESSAGE);

        let error = ServiceError::upstream(502, "Bad Gateway");
        assert_eq!(error.public_message(), "GitHub API Error: Bad Gateway");
    }
}
