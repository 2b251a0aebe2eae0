//! Errors returned by `TrackerClient`
//!
use snafu::prelude::*;

/// Errors returned by aquatrack crate
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TrackerError {
    // Http connection or timeout error
    #[snafu(display("HTTP error {method} url:{url}"))]
    Http {
        method: String,
        url: String,
        source: reqwest::Error,
    },

    /// Server responded with a non-success status.
    /// `message` is the response body text, as sent by the server.
    #[snafu(display("Api Server reported error ({code}) {method} {url}: {message}"))]
    ApiError {
        code: u16,
        method: String,
        url: String,
        message: String,
    },

    /// Client is not logged in (http 401). `message` is the response body text.
    #[snafu(display("Not logged in: {message}"))]
    Unauthorized { message: String },

    /// Deserialization error. This means we didn't deserialize a server response correctly.
    #[snafu(display("Deserialization: {source}"))]
    Deserialization { source: serde_json::Error },

    /// Serialization error. unlikely to occur.
    #[snafu(display("Serialization: {source}"))]
    Serialization { source: serde_json::Error },

    /// Validation error: a client-side parameter check failed.
    #[snafu(display("Validation error: {message}"))]
    Validation { message: String },

    /// Some other error occurred
    #[snafu(display("{message}"))]
    Other { message: String },
}

impl TrackerError {
    /// Message suitable for a user-visible notification.
    ///
    /// For server-reported failures this is the response body text; for
    /// everything else it is the error's display string.
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiError { message, .. } | Self::Unauthorized { message }
                if !message.is_empty() =>
            {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    /// Returns true if the server rejected the request because the client is not logged in.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
