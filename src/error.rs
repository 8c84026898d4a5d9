//! Error types for the leads view.

use thiserror::Error;

/// Failures talking to the hosted `leads` table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Store URL or API key missing from the environment
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request never got a response
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the store
    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Response body was not what we expected
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Parse(err.to_string())
        } else {
            StoreError::Network(err.to_string())
        }
    }
}

/// Errors surfaced to the user. `Display` is the notification text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeadsError {
    #[error("Appointment is required.")]
    MissingAppointment,

    #[error("Error fetching leads.")]
    FetchFailed(#[source] StoreError),

    #[error("Error adding lead.")]
    InsertFailed(#[source] StoreError),
}
