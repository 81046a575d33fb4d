use thiserror::Error;

use crate::transport::TransportError;

/// Failures surfaced to the immediate caller of the registry or orchestrator
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session '{0}' already exists")]
    DuplicateSession(String),

    #[error("Session '{0}' is not active")]
    NotActive(String),

    #[error("Transport provisioning failed: {0}")]
    Provisioning(#[from] TransportError),

    #[error("Unsupported {stage} provider '{provider}'")]
    UnsupportedProvider { stage: &'static str, provider: String },

    #[error("No transport registered for '{0}'")]
    UnsupportedTransport(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
