//! Error types for each stage of a run

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Invalid or missing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid {key} value \"{value}\": expected YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD")]
    InvalidDate { key: &'static str, value: String },

    #[error("Could not determine a home directory for the default recording path")]
    NoHomeDir,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("Token request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Token endpoint returned HTTP {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("Unexpected token response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ListError {
    #[error("Invalid date range: {from} is after {to}")]
    InvalidRange { from: String, to: String },

    #[error("Recording list request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Recording list returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Could not parse recording list: {0}")]
    Parse(String),

    #[error("Entry {index} of a recordings page has no usable \"{field}\"")]
    MissingField { index: usize, field: &'static str },

    #[error("API returned the same page token twice: {0}")]
    PaginationLoop(String),

    #[error(transparent)]
    Auth(#[from] AuthenticationError),
}

/// A single recording could not be saved
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Download request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Download returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download truncated: expected {expected} bytes, received {actual}")]
    Truncated { expected: u64, actual: u64 },

    #[error(transparent)]
    Auth(#[from] AuthenticationError),
}

/// Fatal errors that stop a run before any download happens
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthenticationError),

    #[error("Listing recordings failed: {0}")]
    List(#[from] ListError),
}

pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_carries_status_and_body() {
        let err = AuthenticationError::Rejected {
            status: StatusCode::UNAUTHORIZED,
            body: "{\"reason\":\"Invalid client_id or client_secret\"}".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Invalid client_id"));
    }

    #[test]
    fn list_error_wraps_auth_error_transparently() {
        let err: ListError = AuthenticationError::Malformed("empty access_token".into()).into();
        assert_eq!(err.to_string(), "Unexpected token response: empty access_token");
    }

    #[test]
    fn missing_var_names_the_variable() {
        let err = ConfigError::MissingVar("CLIENT_SECRET");
        assert!(err.to_string().contains("CLIENT_SECRET"));
    }
}
