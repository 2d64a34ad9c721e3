use protocol::{ProtocolError, ThreadId};

/// Conditions that end a trace run early.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// A locatable event arrived from a second thread. Multi-threaded targets
    /// are not supported and the run is aborted.
    #[error("assumes one thread: tracking {tracked}, saw event from {observed}")]
    MultipleThreads {
        tracked: ThreadId,
        observed: ThreadId,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TraceError {
    pub(crate) fn is_disconnect(&self) -> bool {
        matches!(self, TraceError::Protocol(e) if e.is_disconnect())
    }
}
