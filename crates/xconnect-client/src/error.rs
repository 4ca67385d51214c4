use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XConnectError {
    #[error("xdb execution failed: {0}")]
    Execution(String),
    #[error("xdb conflict: {0}")]
    Conflict(String),
    #[error("xconnect transport failed: {0}")]
    Transport(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("facet serialization failed: {0}")]
    Serialization(String),
}

impl XConnectError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Execution(_) => "xdb_execution",
            Self::Conflict(_) => "xdb_conflict",
            Self::Transport(_) => "transport",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::Serialization(_) => "serialization",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Execution(message)
            | Self::Conflict(message)
            | Self::Transport(message)
            | Self::InvalidOperation(message)
            | Self::Serialization(message) => message.clone(),
        }
    }

    /// Failures raised by the store while executing a batch, as opposed to
    /// failures reaching it or misuse of the client.
    #[must_use]
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::Execution(_) | Self::Conflict(_))
    }
}
