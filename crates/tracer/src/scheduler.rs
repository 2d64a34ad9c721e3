use protocol::{
    DebugEvent, EventRequest, ProtocolError, RequestId, RequestKind, StepDepth, StepSize,
    SuspendPolicy, ThreadId, VirtualMachine,
};

use crate::{config::TracerConfig, convert::Converter};

/// An armed one-shot step request. Deliberately not `Clone`: the scheduler
/// is its only owner.
#[derive(Debug)]
pub(crate) struct StepRequestHandle {
    id: RequestId,
    thread: ThreadId,
}

/// Owns the single outstanding step request.
#[derive(Debug, Default)]
pub(crate) struct StepScheduler {
    armed: Option<StepRequestHandle>,
}

impl StepScheduler {
    pub(crate) fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// The thread to step after this event, if its next instruction must be
    /// observed too.
    pub(crate) fn step_target<C: Converter>(
        event: &DebugEvent,
        converter: &C,
        config: &TracerConfig,
    ) -> Option<ThreadId> {
        if matches!(event, DebugEvent::ThreadTerminated { .. }) {
            return None;
        }
        let (thread, location) = event.locatable()?;
        (converter.reports_at(location) || config.is_bootstrap(&location.class_name))
            .then_some(thread)
    }

    /// Disable and delete the armed request, if any. The handle is given up
    /// even when the target refuses the calls.
    pub(crate) fn release(&mut self, vm: &mut dyn VirtualMachine) -> Result<(), ProtocolError> {
        let Some(handle) = self.armed.take() else {
            return Ok(());
        };
        tracing::trace!(request = %handle.id, thread = %handle.thread, "releasing step request");
        vm.disable_request(handle.id)?;
        vm.delete_request(handle.id)?;
        Ok(())
    }

    /// Arm a step on `thread` that fires on the next instruction only.
    pub(crate) fn arm(
        &mut self,
        vm: &mut dyn VirtualMachine,
        thread: ThreadId,
    ) -> Result<(), ProtocolError> {
        self.release(vm)?;

        let request = EventRequest::new(RequestKind::Step {
            thread,
            size: StepSize::Min,
            depth: StepDepth::Into,
        })
        .suspend(SuspendPolicy::All)
        .count(1);

        let id = vm.create_request(request)?;
        self.armed = Some(StepRequestHandle { id, thread });
        vm.enable_request(id)?;
        tracing::trace!(request = %id, %thread, "armed step request");
        Ok(())
    }
}
