use protocol::{DebugEvent, ThreadId, VirtualMachine};

use crate::{
    assembler::TraceAssembler,
    config::TracerConfig,
    convert::Converter,
    error::TraceError,
    launch::Launcher,
    limiter::ResourceLimiter,
    scheduler::StepScheduler,
    types::{OutputDocument, TraceRecord},
};

/// State touched only from the dispatch loop's own thread.
pub(crate) struct TracerInternals<C, L> {
    pub(crate) config: TracerConfig,
    pub(crate) converter: C,
    pub(crate) launcher: L,

    // the single thread of interest, fixed by the first locatable event
    pub(crate) tracked_thread: Option<ThreadId>,
    pub(crate) launched: bool,

    pub(crate) scheduler: StepScheduler,
    pub(crate) limiter: ResourceLimiter,
    pub(crate) assembler: TraceAssembler,
}

impl<C, L> TracerInternals<C, L>
where
    C: Converter,
    L: Launcher,
{
    pub(crate) fn new(config: TracerConfig, converter: C, launcher: L) -> Self {
        let limiter = ResourceLimiter::new(config.max_steps, config.max_stack_depth);
        Self {
            config,
            converter,
            launcher,
            tracked_thread: None,
            launched: false,
            scheduler: StepScheduler::default(),
            limiter,
            assembler: TraceAssembler::default(),
        }
    }

    pub(crate) fn records(&self) -> &[TraceRecord] {
        self.assembler.records()
    }

    /// Record the first thread seen, and refuse any other.
    pub(crate) fn track_thread(&mut self, thread: ThreadId) -> Result<(), TraceError> {
        match self.tracked_thread {
            None => {
                tracing::debug!(%thread, "tracking thread");
                self.tracked_thread = Some(thread);
                Ok(())
            }
            Some(tracked) if tracked == thread => Ok(()),
            Some(tracked) => Err(TraceError::MultipleThreads {
                tracked,
                observed: thread,
            }),
        }
    }

    /// Drop the previous step request and arm a new one if this event's
    /// location must be followed instruction by instruction.
    pub(crate) fn reschedule_step(
        &mut self,
        vm: &mut dyn VirtualMachine,
        event: &DebugEvent,
    ) -> Result<(), TraceError> {
        self.scheduler.release(vm)?;

        if self.limiter.exhausted() {
            return Ok(());
        }
        if let Some(thread) = StepScheduler::step_target(event, &self.converter, &self.config) {
            self.scheduler.arm(vm, thread)?;
        }
        Ok(())
    }

    /// Wait for a started launcher and discard its outcome, for runs that end
    /// without a document.
    pub(crate) fn abandon(&mut self) {
        if let Some(outcome) = self.launcher.outcome() {
            tracing::debug!(success = outcome.success, "discarding launch outcome");
        }
    }

    pub(crate) fn finish(&mut self, code: &str) -> OutputDocument {
        if self.scheduler.is_armed() {
            tracing::debug!("step request still armed at shutdown");
        }
        let launch = self.launcher.outcome();
        let assembler = std::mem::take(&mut self.assembler);
        assembler.finish(code, launch, &self.converter)
    }
}
