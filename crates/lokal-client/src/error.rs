//! Error types for talking to the Lokal agent

use thiserror::Error;

/// Errors returned by the agent client and tunnel handles
#[derive(Debug, Error)]
pub enum LokalError {
    /// The agent did not advertise a version, or advertised one below the minimum
    #[error("Incompatible server: {0}")]
    IncompatibleServer(String),

    /// The agent answered with a client or server error status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the envelope the agent is expected to send
    #[error("Invalid response from agent: {0}")]
    InvalidResponse(String),

    /// Rejected locally before sending, or reported as a failure by the agent
    #[error("{0}")]
    Validation(String),

    /// The requested address was never configured on this tunnel
    #[error("{0}")]
    NotConfigured(String),

    /// The agent has not yet assigned a port for the public address
    #[error("Tunnel is using a random port, but it has not been assigned yet. Please try again later")]
    PortNotYetAssigned,
}

impl LokalError {
    /// True for failures of the HTTP exchange itself (status or network)
    pub fn is_transport(&self) -> bool {
        matches!(self, LokalError::Http { .. } | LokalError::Transport(_))
    }

    /// True when the caller is expected to retry address resolution later
    pub fn is_retryable(&self) -> bool {
        matches!(self, LokalError::PortNotYetAssigned)
    }
}

pub type Result<T> = std::result::Result<T, LokalError>;
