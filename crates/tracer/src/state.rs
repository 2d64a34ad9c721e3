/// Lifecycle of a trace run, owned by the dispatch loop.
///
/// `Running -> Draining -> Terminated`, or straight from `Running` to
/// `Terminated` when the disconnect event arrives in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// The connection failed mid-operation; only termination events matter.
    Draining,
    Terminated,
}

impl LoopState {
    /// Transition taken when an operation reports the connection as gone.
    pub(crate) fn on_disconnect(self) -> Self {
        match self {
            LoopState::Running => LoopState::Draining,
            other => other,
        }
    }

    pub fn is_terminated(self) -> bool {
        self == LoopState::Terminated
    }
}

/// What the loop must do after a single event has been classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    Continue,
    TargetTerminated,
    ConnectionLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_only_moves_a_running_loop() {
        assert_eq!(LoopState::Running.on_disconnect(), LoopState::Draining);
        assert_eq!(LoopState::Draining.on_disconnect(), LoopState::Draining);
        assert_eq!(LoopState::Terminated.on_disconnect(), LoopState::Terminated);
    }
}
