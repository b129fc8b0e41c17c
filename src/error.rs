//! Error types for the data-access layer
//!
//! Every failure surfaces to the immediate caller. There is no retry and no
//! fallback between the direct store and the aggregation service; masking a
//! backend failure with the other backend's partial results is worse than
//! reporting it.

use thiserror::Error;

/// Errors surfaced by the data-access layer.
#[derive(Debug, Error)]
pub enum DataError {
    /// Single-entity lookup matched zero rows.
    #[error("{table} row not found: {id}")]
    NotFound { table: String, id: String },

    /// The direct store rejected or failed a query.
    #[error("store query failed: {0}")]
    Store(String),

    /// Transport-level failure (connection, timeout) on either backend.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The aggregation service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service rejected the credential (401/403). Distinct from
    /// `Status` so callers can prompt re-authentication instead of
    /// showing a generic failure.
    #[error("authorization rejected ({status})")]
    Auth { status: u16 },

    /// A change-bus channel failed to open or closed unexpectedly.
    /// Non-fatal to other subscriptions.
    #[error("subscription failed: {0}")]
    Subscription(String),

    /// A response body did not match the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    /// Endpoint/key configuration was missing or unparseable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DataError {
    /// True if the failure was a credential rejection.
    pub fn is_auth(&self) -> bool {
        matches!(self, DataError::Auth { .. })
    }

    /// True if a single-entity lookup missed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound { .. })
    }
}
