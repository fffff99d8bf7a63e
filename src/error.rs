//! Errors raised while probing a single endpoint

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a probe task produced no record
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid probe address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {address} failed: {source}")]
    Fetch {
        address: String,
        #[source]
        source: BoxError,
    },

    #[error("unreadable response body from {address}: {source}")]
    Body {
        address: String,
        #[source]
        source: BoxError,
    },

    #[error("probe cancelled before completion")]
    Cancelled,

    #[error("probe task panicked: {0}")]
    Panicked(String),
}

impl ProbeError {
    /// Short machine-readable label for the JSON summary
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::InvalidAddress { .. } => "INVALID_ADDRESS",
            ProbeError::Fetch { .. } => "FETCH_FAILED",
            ProbeError::Body { .. } => "BAD_BODY",
            ProbeError::Cancelled => "CANCELLED",
            ProbeError::Panicked(_) => "PANICKED",
        }
    }
}
