//! Error taxonomy for the remote processing exchange.
//!
//! Every collaborator re-classifies raw underlying errors (HTTP, IO, JSON)
//! into these structured codes before they cross a crate boundary. Control
//! flow branches on [`ErrorCode`] values, never on message strings.

use thiserror::Error;

/// Classified outcome codes for a failed remote processing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bearer token missing, expired, or rejected. The caller must
    /// re-authenticate before restarting the action.
    AuthExpired,
    /// The processing service failed or returned a malformed body.
    ServerError,
    /// The request never reached the service (connect/DNS/transport failure).
    NetworkUnavailable,
    /// The attempt exceeded its wall-clock budget.
    Timeout,
    /// The external cancellation signal fired.
    Cancelled,
}

impl ErrorCode {
    /// Whether the local retry policy may transparently re-issue a request
    /// after this code.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorCode::ServerError | ErrorCode::NetworkUnavailable | ErrorCode::Timeout
        )
    }

    /// Machine-readable code string for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::AuthExpired => "AUTH_EXPIRED",
            ErrorCode::ServerError => "SERVER_ERROR",
            ErrorCode::NetworkUnavailable => "NETWORK_UNAVAILABLE",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Cancelled => "CANCELLED",
        }
    }
}

/// Classified failure of a remote processing action.
///
/// `retryable` is true only while the local retry budget for the logical
/// action is unspent. Once the budget is exhausted (or the code is not
/// transient) the error is terminal and carries `retryable = false`; the
/// caller may still restart the whole action under a new idempotency key.
#[derive(Debug, Error)]
#[error("{}: {message}", .code.as_str())]
pub struct ProcessingError {
    pub code: ErrorCode,
    pub retryable: bool,
    pub message: String,
}

impl ProcessingError {
    /// An error whose retryability follows from its code alone.
    pub fn transient(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            retryable: code.is_transient(),
            message: message.into(),
        }
    }

    /// An error with the retry budget already spent.
    pub fn terminal(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            retryable: false,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::terminal(ErrorCode::Cancelled, "operation cancelled")
    }

    pub fn auth_expired(message: impl Into<String>) -> Self {
        Self::terminal(ErrorCode::AuthExpired, message)
    }

    /// Spend the retry budget, forcing `retryable = false`.
    pub fn into_terminal(mut self) -> Self {
        self.retryable = false;
        self
    }
}
