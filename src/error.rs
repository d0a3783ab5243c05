//! Planning errors

use thiserror::Error;

/// Why a planning run was aborted. No partial plan accompanies an error.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Request cannot be planned as given
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Directions or geocoding service failed or returned garbage
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable {
        service: &'static str,
        message: String,
    },
}

impl PlanError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PlanError::InvalidInput(message.into())
    }

    /// Wrap an upstream error, keeping the whole context chain in the message
    pub fn upstream(service: &'static str, error: anyhow::Error) -> Self {
        PlanError::UpstreamUnavailable {
            service,
            message: format!("{:#}", error),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            PlanError::InvalidInput(_) => "INVALID_INPUT",
            PlanError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
        }
    }
}

pub type PlanResult<T> = std::result::Result<T, PlanError>;
