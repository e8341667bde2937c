//! Error types for the REST query chain.

use databuilder_core::error::{ExtractError, TemplateError};

/// Errors raised while executing a REST query chain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RestApiError {
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Transport {
        url: String,
        message: String,
        timeout: bool,
    },

    #[error("Invalid URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("Invalid JSONPath {json_path:?}: {message}")]
    InvalidJsonPath { json_path: String, message: String },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("No result from {url} for JSONPath {json_path:?}")]
    NoResult { url: String, json_path: String },

    #[error("Invalid query configuration: {message}")]
    Config { message: String },

    #[error("Authentication failed: {message}")]
    Auth { message: String },
}

impl RestApiError {
    pub(crate) fn transport(url: &str, error: &reqwest::Error) -> Self {
        RestApiError::Transport {
            url: url.to_string(),
            message: error.to_string(),
            timeout: error.is_timeout(),
        }
    }

    /// Transport failures, HTTP 5xx and 429 are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            RestApiError::Transport { .. } => true,
            RestApiError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// HTTP status of the failed request, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            RestApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<RestApiError> for ExtractError {
    fn from(error: RestApiError) -> Self {
        ExtractError::Upstream {
            source_name: "restapi".to_string(),
            source: Box::new(error),
        }
    }
}
