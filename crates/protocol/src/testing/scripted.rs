//! In-memory virtual machine for tests and replays.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::{
    DebugEvent, EventBatch, EventRequest, Frame, Location, ProtocolError, ReferenceType,
    RequestId, ThreadId, Variable, VirtualMachine, testing::Script,
};

/// A request as seen by the [`ScriptedVm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub id: RequestId,
    pub request: EventRequest,
    pub enabled: bool,
    pub deleted: bool,
}

impl RecordedRequest {
    fn is_armed_step(&self) -> bool {
        self.request.kind.is_step() && self.enabled && !self.deleted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Live,
    /// `exit` was called, terminal events are still queued.
    Exiting,
    /// The disconnect event has been delivered.
    Gone,
}

/// A [`VirtualMachine`] that replays scripted event batches.
///
/// The script may be infinite. When it runs dry, or when [`exit`] is
/// called, the VM delivers a `TargetTerminated` batch followed by a
/// `ConnectionLost` batch; after `exit` every other operation fails with
/// [`ProtocolError::Disconnected`], and once the disconnect has been
/// delivered the queue fails too.
///
/// Call stacks are simulated from the delivered events: method entry pushes
/// a frame, method exit pops it before the next event, and every other
/// locatable event moves the top frame.
///
/// [`exit`]: VirtualMachine::exit
pub struct ScriptedVm {
    script: Box<dyn Iterator<Item = EventBatch> + Send>,
    terminal: VecDeque<EventBatch>,
    phase: Phase,

    requests: BTreeMap<RequestId, RecordedRequest>,
    next_request: u64,
    max_armed_steps: usize,

    stacks: HashMap<ThreadId, Vec<Frame>>,
    pending_pops: HashSet<ThreadId>,
    line_tables: HashMap<String, Vec<Location>>,
    statics: HashMap<String, Vec<Variable>>,

    exit_code: Option<i32>,
    resumes: usize,
    delivered: usize,
}

impl ScriptedVm {
    pub fn new<I>(batches: I) -> Self
    where
        I: IntoIterator<Item = EventBatch>,
        I::IntoIter: Send + 'static,
    {
        Self {
            script: Box::new(batches.into_iter()),
            terminal: VecDeque::new(),
            phase: Phase::Live,
            requests: BTreeMap::new(),
            next_request: 0,
            max_armed_steps: 0,
            stacks: HashMap::new(),
            pending_pops: HashSet::new(),
            line_tables: HashMap::new(),
            statics: HashMap::new(),
            exit_code: None,
            resumes: 0,
            delivered: 0,
        }
    }

    pub fn from_script(script: Script) -> Self {
        let Script {
            batches,
            line_tables,
            statics,
        } = script;
        let mut vm = Self::new(batches);
        vm.line_tables = line_tables;
        vm.statics = statics;
        vm
    }

    pub fn with_line_table(
        mut self,
        class_name: impl Into<String>,
        locations: Vec<Location>,
    ) -> Self {
        self.line_tables.insert(class_name.into(), locations);
        self
    }

    pub fn with_statics(mut self, class_name: impl Into<String>, fields: Vec<Variable>) -> Self {
        self.statics.insert(class_name.into(), fields);
        self
    }

    pub fn requests(&self) -> impl Iterator<Item = &RecordedRequest> {
        self.requests.values()
    }

    pub fn step_requests(&self) -> impl Iterator<Item = &RecordedRequest> {
        self.requests().filter(|r| r.request.kind.is_step())
    }

    /// Step requests currently enabled and not deleted.
    pub fn armed_steps(&self) -> usize {
        self.requests().filter(|r| r.is_armed_step()).count()
    }

    /// Highest number of simultaneously armed step requests seen so far.
    pub fn max_armed_steps(&self) -> usize {
        self.max_armed_steps
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn resumes(&self) -> usize {
        self.resumes
    }

    /// Number of batches handed out, terminal batches included.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    fn ensure_live(&self) -> Result<(), ProtocolError> {
        match self.phase {
            Phase::Live => Ok(()),
            Phase::Exiting | Phase::Gone => Err(ProtocolError::Disconnected),
        }
    }

    fn request_mut(&mut self, id: RequestId) -> Result<&mut RecordedRequest, ProtocolError> {
        self.requests
            .get_mut(&id)
            .filter(|r| !r.deleted)
            .ok_or(ProtocolError::InvalidRequest(id))
    }

    fn queue_termination(&mut self) {
        self.terminal
            .push_back(EventBatch::single(DebugEvent::TargetTerminated));
        self.terminal
            .push_back(EventBatch::single(DebugEvent::ConnectionLost));
    }

    fn settle(&mut self, thread: ThreadId) {
        if self.pending_pops.remove(&thread) {
            if let Some(stack) = self.stacks.get_mut(&thread) {
                stack.pop();
            }
        }
    }

    fn move_top(&mut self, thread: ThreadId, location: &Location) {
        let stack = self.stacks.entry(thread).or_default();
        match stack.last_mut() {
            Some(top) => top.location = location.clone(),
            None => stack.push(Frame::new(location.clone())),
        }
    }

    fn observe(&mut self, event: &DebugEvent) {
        match event {
            DebugEvent::MethodEntered { thread, location } => {
                self.settle(*thread);
                self.stacks
                    .entry(*thread)
                    .or_default()
                    .push(Frame::new(location.clone()));
            }
            DebugEvent::MethodExited {
                thread, location, ..
            } => {
                self.settle(*thread);
                self.move_top(*thread, location);
                self.pending_pops.insert(*thread);
            }
            DebugEvent::Breakpoint { thread, location }
            | DebugEvent::SingleStep { thread, location }
            | DebugEvent::ExceptionThrown {
                thread, location, ..
            } => {
                self.settle(*thread);
                self.move_top(*thread, location);
            }
            DebugEvent::ThreadTerminated { thread, .. } => {
                self.stacks.remove(thread);
                self.pending_pops.remove(thread);
            }
            DebugEvent::ClassLoaded { .. }
            | DebugEvent::TargetTerminated
            | DebugEvent::ConnectionLost => {}
        }
    }
}

impl VirtualMachine for ScriptedVm {
    fn next_batch(&mut self) -> Result<EventBatch, ProtocolError> {
        if self.phase == Phase::Gone {
            return Err(ProtocolError::Disconnected);
        }

        if self.terminal.is_empty() && self.phase == Phase::Live {
            match self.script.next() {
                Some(batch) => {
                    for event in batch.events() {
                        self.observe(event);
                    }
                    self.delivered += 1;
                    return Ok(batch);
                }
                None => {
                    tracing::debug!("script exhausted, terminating target");
                    self.queue_termination();
                }
            }
        }

        let batch = self.terminal.pop_front().ok_or(ProtocolError::Disconnected)?;
        if batch
            .events()
            .iter()
            .any(|e| matches!(e, DebugEvent::ConnectionLost))
        {
            self.phase = Phase::Gone;
        }
        self.delivered += 1;
        Ok(batch)
    }

    fn create_request(&mut self, request: EventRequest) -> Result<RequestId, ProtocolError> {
        self.ensure_live()?;
        self.next_request += 1;
        let id = RequestId(self.next_request);
        self.requests.insert(
            id,
            RecordedRequest {
                id,
                request,
                enabled: false,
                deleted: false,
            },
        );
        Ok(id)
    }

    fn enable_request(&mut self, id: RequestId) -> Result<(), ProtocolError> {
        self.ensure_live()?;
        self.request_mut(id)?.enabled = true;
        self.max_armed_steps = self.max_armed_steps.max(self.armed_steps());
        Ok(())
    }

    fn disable_request(&mut self, id: RequestId) -> Result<(), ProtocolError> {
        self.ensure_live()?;
        self.request_mut(id)?.enabled = false;
        Ok(())
    }

    fn delete_request(&mut self, id: RequestId) -> Result<(), ProtocolError> {
        self.ensure_live()?;
        let request = self.request_mut(id)?;
        request.enabled = false;
        request.deleted = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), ProtocolError> {
        self.ensure_live()?;
        self.resumes += 1;
        Ok(())
    }

    fn exit(&mut self, code: i32) -> Result<(), ProtocolError> {
        self.ensure_live()?;
        tracing::debug!(code, "target exit requested");
        self.exit_code = Some(code);
        self.script = Box::new(std::iter::empty());
        self.terminal.clear();
        self.queue_termination();
        self.phase = Phase::Exiting;
        Ok(())
    }

    fn frames(&mut self, thread: ThreadId) -> Result<Vec<Frame>, ProtocolError> {
        self.ensure_live()?;
        Ok(self
            .stacks
            .get(&thread)
            .map(|stack| stack.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    fn line_locations(&mut self, ty: &ReferenceType) -> Result<Vec<Location>, ProtocolError> {
        self.ensure_live()?;
        self.line_tables
            .get(&ty.name)
            .cloned()
            .ok_or_else(|| ProtocolError::AbsentInformation(ty.name.clone()))
    }

    fn static_fields(&mut self, ty: &ReferenceType) -> Result<Vec<Variable>, ProtocolError> {
        self.ensure_live()?;
        Ok(self.statics.get(&ty.name).cloned().unwrap_or_default())
    }
}
