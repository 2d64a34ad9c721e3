//! Per-event handling for the dispatch loop.

use protocol::{
    DebugEvent, EventRequest, Location, ProtocolError, ReferenceType, RequestKind, ThreadId,
    VirtualMachine,
};

use crate::{
    convert::Converter,
    error::TraceError,
    internals::TracerInternals,
    launch::Launcher,
    limiter::Admission,
    state::Signal,
};

impl<C, L> TracerInternals<C, L>
where
    C: Converter,
    L: Launcher,
{
    /// Handle one event, in delivery order.
    ///
    /// Connection loss surfaces as `Err(TraceError::Protocol(Disconnected))`
    /// from any target operation made along the way.
    #[tracing::instrument(skip(self, vm, event), fields(event = event.kind()), level = "trace")]
    pub(crate) fn on_event(
        &mut self,
        vm: &mut dyn VirtualMachine,
        event: &DebugEvent,
    ) -> Result<Signal, TraceError> {
        match event {
            DebugEvent::ClassLoaded { ty } => {
                self.on_class_loaded(vm, ty)?;
                Ok(Signal::Continue)
            }
            DebugEvent::TargetTerminated => Ok(Signal::TargetTerminated),
            DebugEvent::ConnectionLost => Ok(Signal::ConnectionLost),
            DebugEvent::Breakpoint { thread, location }
            | DebugEvent::SingleStep { thread, location }
            | DebugEvent::MethodEntered { thread, location }
            | DebugEvent::MethodExited {
                thread, location, ..
            }
            | DebugEvent::ExceptionThrown {
                thread, location, ..
            } => {
                self.on_locatable(vm, event, *thread, location)?;
                Ok(Signal::Continue)
            }
            DebugEvent::ThreadTerminated {
                thread,
                location: Some(location),
            } => {
                self.on_locatable(vm, event, *thread, location)?;
                Ok(Signal::Continue)
            }
            DebugEvent::ThreadTerminated {
                thread,
                location: None,
            } => {
                tracing::debug!(%thread, "thread terminated");
                Ok(Signal::Continue)
            }
        }
    }

    fn on_class_loaded(
        &mut self,
        vm: &mut dyn VirtualMachine,
        ty: &ReferenceType,
    ) -> Result<(), TraceError> {
        let internal = self.config.is_internal(&ty.name);
        if !internal {
            self.converter.register_type(ty);
        }

        let bootstrap = self.config.is_bootstrap(&ty.name);
        let user_class = !internal
            && self.config.breakpoint_user_classes
            && !self.config.is_excluded(&ty.name);
        if !(bootstrap || user_class) {
            return Ok(());
        }

        let locations = match vm.line_locations(ty) {
            Ok(locations) => locations,
            Err(ProtocolError::AbsentInformation(_)) => {
                tracing::warn!(class = %ty.name, "no line number information, skipping breakpoints");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(class = %ty.name, count = locations.len(), "installing line breakpoints");
        for location in locations {
            let id = vm.create_request(EventRequest::new(RequestKind::Breakpoint { location }))?;
            vm.enable_request(id)?;
        }
        Ok(())
    }

    fn on_locatable(
        &mut self,
        vm: &mut dyn VirtualMachine,
        event: &DebugEvent,
        thread: ThreadId,
        location: &Location,
    ) -> Result<(), TraceError> {
        self.track_thread(thread)?;

        if !self.launched && self.config.is_bootstrap(&location.class_name) {
            self.launched = true;
            tracing::debug!(%thread, "bootstrap reached, starting launcher");
            if let Err(e) = self.launcher.start(thread) {
                tracing::error!(error = %e, "failed to start launcher");
            }
        }

        if self.limiter.exhausted() || !self.converter.reports_at(location) {
            return Ok(());
        }

        let records = match self.converter.convert(vm, event, location, thread) {
            Ok(records) => records,
            Err(e) if is_disconnect(&e) => return Err(ProtocolError::Disconnected.into()),
            Err(e) => {
                tracing::warn!(error = ?e, %location, "conversion failed, dropping record");
                return Ok(());
            }
        };

        for record in records {
            match self.limiter.admit(record, &mut self.assembler) {
                Admission::Accepted => {}
                Admission::LimitReached(limit) => {
                    tracing::info!(
                        ?limit,
                        steps = self.limiter.steps(),
                        "resource limit reached, terminating target"
                    );
                    vm.exit(0)?;
                    break;
                }
                Admission::Rejected => {
                    tracing::debug!(tripped = ?self.limiter.tripped(), "budget spent, dropping record");
                    break;
                }
            }
        }
        Ok(())
    }
}

fn is_disconnect(report: &eyre::Report) -> bool {
    report
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<ProtocolError>(), Some(e) if e.is_disconnect()))
}
