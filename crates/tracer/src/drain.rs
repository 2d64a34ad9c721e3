use protocol::{DebugEvent, ProtocolError, VirtualMachine};

/// Consumes the remaining event queue after the connection failed
/// mid-operation.
///
/// Only termination events are inspected; everything else is discarded. The
/// drain holds the only mutable borrow of the target, so nothing else can
/// touch it until the drain finishes.
pub(crate) struct DisconnectDrain<'a> {
    vm: &'a mut dyn VirtualMachine,
    target_died: bool,
}

impl<'a> DisconnectDrain<'a> {
    pub(crate) fn new(vm: &'a mut dyn VirtualMachine) -> Self {
        Self {
            vm,
            target_died: false,
        }
    }

    /// Drain until the disconnect event arrives or the queue fails. Returns
    /// whether the target was seen terminating.
    #[tracing::instrument(skip(self))]
    pub(crate) fn run(mut self) -> bool {
        loop {
            let batch = match self.vm.next_batch() {
                Ok(batch) => batch,
                Err(ProtocolError::Interrupted) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "event queue closed while draining");
                    break;
                }
            };

            let mut connection_lost = false;
            for event in batch.events() {
                match event {
                    DebugEvent::TargetTerminated => {
                        tracing::debug!("target terminated while draining");
                        self.target_died = true;
                    }
                    DebugEvent::ConnectionLost => connection_lost = true,
                    _ => {}
                }
            }
            if connection_lost {
                break;
            }

            // the target is usually gone already
            let _ = self.vm.resume();
        }
        self.target_died
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{EventBatch, Location, ThreadId, testing::ScriptedVm};

    fn step() -> DebugEvent {
        DebugEvent::SingleStep {
            thread: ThreadId(1),
            location: Location::new("Main", "main", "Main.java", 2),
        }
    }

    #[test]
    fn drains_up_to_the_disconnect_event() {
        let mut vm = ScriptedVm::new(vec![
            EventBatch::single(step()),
            EventBatch::single(step()),
        ]);

        assert!(DisconnectDrain::new(&mut vm).run());
        assert_eq!(vm.delivered(), 4);
        assert!(vm.next_batch().is_err());
    }

    #[test]
    fn queue_failure_ends_the_drain() {
        let mut vm = ScriptedVm::new(Vec::<EventBatch>::new());
        while vm.next_batch().is_ok() {}

        assert!(!DisconnectDrain::new(&mut vm).run());
    }

    #[test]
    fn disconnect_without_termination() {
        let mut vm = ScriptedVm::new(vec![EventBatch::single(DebugEvent::ConnectionLost)]);
        assert!(!DisconnectDrain::new(&mut vm).run());
    }
}
