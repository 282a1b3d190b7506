//! Fetch session error types.

use thiserror::Error;

/// Errors from fetching a page through the shared session.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The session could not be built and stays unavailable.
    #[error("Fetch session unavailable: {0}")]
    SessionUnavailable(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out loading {0}")]
    Timeout(String),

    #[error("Giving up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: String,
    },
}

impl FetchError {
    pub fn navigation(url: &str, message: impl std::fmt::Display) -> Self {
        Self::Navigation {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}
