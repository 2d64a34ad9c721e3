use serde::{Deserialize, Serialize};

use crate::{
    error::ProtocolError,
    event::{EventBatch, Location, ReferenceType, ThreadId},
    request::{EventRequest, RequestId},
};

/// A named value, already rendered to text by the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One activation on a suspended thread's stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub location: Location,
    #[serde(default)]
    pub locals: Vec<Variable>,
}

impl Frame {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            locals: Vec::new(),
        }
    }
}

/// Handle on a debuggee process.
///
/// Every operation may fail with [`ProtocolError::Disconnected`] once the
/// target has gone away. [`VirtualMachine::next_batch`] is the only
/// operation allowed to block.
pub trait VirtualMachine {
    /// Wait for the next batch of events.
    fn next_batch(&mut self) -> Result<EventBatch, ProtocolError>;

    /// Register a request. The request starts disabled.
    fn create_request(&mut self, request: EventRequest) -> Result<RequestId, ProtocolError>;

    fn enable_request(&mut self, id: RequestId) -> Result<(), ProtocolError>;

    fn disable_request(&mut self, id: RequestId) -> Result<(), ProtocolError>;

    /// Release a request. The id is invalid afterwards.
    fn delete_request(&mut self, id: RequestId) -> Result<(), ProtocolError>;

    /// Resume the threads suspended by the last delivered batch.
    fn resume(&mut self) -> Result<(), ProtocolError>;

    /// Terminate the target with the given exit code.
    fn exit(&mut self, code: i32) -> Result<(), ProtocolError>;

    /// Stack of a suspended thread, innermost frame first.
    fn frames(&mut self, thread: ThreadId) -> Result<Vec<Frame>, ProtocolError>;

    /// Every executable line of a loaded type.
    fn line_locations(&mut self, ty: &ReferenceType) -> Result<Vec<Location>, ProtocolError>;

    /// Current values of a loaded type's static fields.
    fn static_fields(&mut self, _ty: &ReferenceType) -> Result<Vec<Variable>, ProtocolError> {
        Ok(Vec::new())
    }
}
