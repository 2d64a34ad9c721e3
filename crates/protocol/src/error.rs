//! Error types for the debug protocol boundary.

use crate::request::RequestId;

/// Errors reported by a [`VirtualMachine`](crate::VirtualMachine).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The connection to the target is gone. Any further operation fails.
    #[error("target virtual machine disconnected")]
    Disconnected,

    /// A blocking wait on the event queue was interrupted before a batch
    /// arrived.
    #[error("event queue wait interrupted")]
    Interrupted,

    /// The type was compiled without line-number information.
    #[error("no line number information for {0}")]
    AbsentInformation(String),

    /// The request id does not name a live request.
    #[error("unknown event request {0}")]
    InvalidRequest(RequestId),

    #[error("{0}")]
    Other(String),
}

impl ProtocolError {
    /// True when the error means the connection has been lost.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}
