use std::io::Write;

use eyre::WrapErr;
use protocol::{
    DebugEvent, EventBatch, EventRequest, ProtocolError, RequestKind, SuspendPolicy,
    VirtualMachine,
};

use crate::{
    assembler::TraceAssembler,
    config::TracerConfig,
    convert::{Converter, FrameConverter},
    drain::DisconnectDrain,
    error::TraceError,
    internals::TracerInternals,
    launch::Launcher,
    state::{LoopState, Signal},
    types::{OutputDocument, TraceRecord},
};

/// Drives a suspended target one instruction at a time and records what it
/// does.
pub struct Tracer<V, C, L> {
    vm: V,
    internals: TracerInternals<C, L>,
    code: String,
    state: LoopState,
    target_died: bool,
}

impl<V, L> Tracer<V, FrameConverter, L>
where
    V: VirtualMachine,
    L: Launcher,
{
    /// Tracer rendering records with the [`FrameConverter`].
    pub fn with_defaults(
        vm: V,
        config: TracerConfig,
        code: impl Into<String>,
        launcher: L,
    ) -> eyre::Result<Self> {
        let converter = FrameConverter::new(config.clone());
        Self::new(vm, config, code, converter, launcher)
    }
}

impl<V, C, L> Tracer<V, C, L>
where
    V: VirtualMachine,
    C: Converter,
    L: Launcher,
{
    /// Install the standing subscriptions on the target.
    #[tracing::instrument(skip_all)]
    pub fn new(
        mut vm: V,
        config: TracerConfig,
        code: impl Into<String>,
        converter: C,
        launcher: L,
    ) -> eyre::Result<Self> {
        let exclusions = &config.exclusions;
        let subscriptions = [
            EventRequest::new(RequestKind::Exception {
                caught: true,
                uncaught: true,
            })
            .suspend(SuspendPolicy::All)
            .exclude(exclusions),
            EventRequest::new(RequestKind::MethodEntry)
                .suspend(SuspendPolicy::EventThread)
                .exclude(exclusions),
            EventRequest::new(RequestKind::MethodExit)
                .suspend(SuspendPolicy::EventThread)
                .exclude(exclusions),
            // exclusion filters are not supported for thread death
            EventRequest::new(RequestKind::ThreadDeath).suspend(SuspendPolicy::All),
            EventRequest::new(RequestKind::ClassPrepare)
                .suspend(SuspendPolicy::All)
                .exclude(exclusions),
        ];

        for request in subscriptions {
            let kind = format!("{:?}", request.kind);
            let id = vm
                .create_request(request)
                .wrap_err_with(|| format!("creating {kind} subscription"))?;
            vm.enable_request(id)
                .wrap_err_with(|| format!("enabling {kind} subscription"))?;
        }
        tracing::debug!(exclusions = ?config.exclusions, "standing subscriptions installed");

        Ok(Self {
            vm,
            internals: TracerInternals::new(config, converter, launcher),
            code: code.into(),
            state: LoopState::Running,
            target_died: false,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn vm(&self) -> &V {
        &self.vm
    }

    /// Records collected so far.
    pub fn records(&self) -> &[TraceRecord] {
        self.internals.records()
    }

    /// Whether the target was seen terminating.
    pub fn target_died(&self) -> bool {
        self.target_died
    }

    /// Run until the connection to the target is gone, then write the
    /// resulting document to `out` and return it.
    ///
    /// Fails without writing anything if a second thread shows up, which
    /// aborts the run.
    #[tracing::instrument(skip_all)]
    pub fn run(&mut self, out: impl Write) -> eyre::Result<OutputDocument> {
        eyre::ensure!(
            self.state == LoopState::Running,
            "tracer has already run ({:?})",
            self.state
        );

        while self.state == LoopState::Running {
            let batch = match self.vm.next_batch() {
                Ok(batch) => batch,
                Err(ProtocolError::Interrupted) => {
                    tracing::warn!("event queue wait interrupted");
                    continue;
                }
                Err(e) => {
                    if !e.is_disconnect() {
                        tracing::warn!(error = %e, "event queue failed, treating as disconnect");
                    }
                    self.state = self.state.on_disconnect();
                    continue;
                }
            };

            if let Err(e) = self.dispatch_batch(batch) {
                tracing::error!(error = %e, "aborting trace");
                let _ = self.vm.exit(1);
                self.internals.abandon();
                self.state = LoopState::Terminated;
                return Err(e).wrap_err("tracing target");
            }
        }

        if self.state == LoopState::Draining {
            tracing::debug!("connection lost, draining remaining events");
            self.target_died |= DisconnectDrain::new(&mut self.vm).run();
            self.state = LoopState::Terminated;
        }

        tracing::debug!(
            target_died = self.target_died,
            records = self.records().len(),
            "trace finished"
        );
        let document = self.internals.finish(&self.code);
        TraceAssembler::emit(&document, out)?;
        Ok(document)
    }

    /// Handle every event of one batch in order, then resume the target.
    /// Only fatal conditions are returned as errors.
    fn dispatch_batch(&mut self, batch: EventBatch) -> Result<(), TraceError> {
        tracing::trace!(events = batch.len(), "dispatching batch");

        for event in batch {
            match self.handle_event(&event) {
                Ok(Signal::Continue) => {}
                Ok(Signal::TargetTerminated) => {
                    tracing::debug!("target terminated");
                    self.target_died = true;
                }
                Ok(Signal::ConnectionLost) => {
                    tracing::debug!("connection closed");
                    self.state = LoopState::Terminated;
                    return Ok(());
                }
                Err(e) if e.is_disconnect() => {
                    tracing::debug!(event = event.kind(), "connection lost mid-operation");
                    self.state = self.state.on_disconnect();
                    return Ok(());
                }
                Err(e @ TraceError::MultipleThreads { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, event = event.kind(), "failed to handle event");
                }
            }
        }

        match self.vm.resume() {
            Ok(()) => {}
            Err(e) if e.is_disconnect() => self.state = self.state.on_disconnect(),
            Err(e) => tracing::warn!(error = %e, "failed to resume target"),
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &DebugEvent) -> Result<Signal, TraceError> {
        let signal = self.internals.on_event(&mut self.vm, event)?;
        if signal != Signal::ConnectionLost {
            self.internals.reschedule_step(&mut self.vm, event)?;
        }
        Ok(signal)
    }
}
