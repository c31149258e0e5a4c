use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Network-level failure reaching the RPC endpoint. Reads retry these
    /// with backoff; writes surface them immediately.
    #[error("rpc transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("rpc endpoint rejected {operation} (status {status}): {message}")]
    Endpoint {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The endpoint answered 200 with a body we could not interpret.
    #[error("invalid rpc response for {operation}: {message}")]
    InvalidResponse {
        operation: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// Transient errors are worth retrying for read-only calls.
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::Transport(err) => !err.is_builder() && !err.is_decode(),
            LedgerError::Endpoint { status, .. } => matches!(status, 502 | 503 | 504),
            LedgerError::InvalidResponse { .. } => false,
        }
    }
}
