use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a thread inside the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread#{}", self.0)
    }
}

/// A code location in the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub class_name: String,
    #[serde(default)]
    pub method: String,
    pub source: String,
    pub line: u32,
}

impl Location {
    pub fn new(
        class_name: impl Into<String>,
        method: impl Into<String>,
        source: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            method: method.into(),
            source: source.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({}:{})",
            self.class_name, self.method, self.source, self.line
        )
    }
}

/// A type loaded by the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceType {
    pub name: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl ReferenceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
        }
    }
}

/// A single event reported by the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebugEvent {
    ClassLoaded {
        ty: ReferenceType,
    },
    TargetTerminated,
    ConnectionLost,
    Breakpoint {
        thread: ThreadId,
        location: Location,
    },
    SingleStep {
        thread: ThreadId,
        location: Location,
    },
    MethodEntered {
        thread: ThreadId,
        location: Location,
    },
    MethodExited {
        thread: ThreadId,
        location: Location,
        #[serde(default)]
        return_value: Option<String>,
    },
    ExceptionThrown {
        thread: ThreadId,
        location: Location,
        exception: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        caught: bool,
    },
    ThreadTerminated {
        thread: ThreadId,
        #[serde(default)]
        location: Option<Location>,
    },
}

impl DebugEvent {
    /// The owning thread and code location, for events tied to both.
    pub fn locatable(&self) -> Option<(ThreadId, &Location)> {
        match self {
            DebugEvent::Breakpoint { thread, location }
            | DebugEvent::SingleStep { thread, location }
            | DebugEvent::MethodEntered { thread, location }
            | DebugEvent::MethodExited {
                thread, location, ..
            }
            | DebugEvent::ExceptionThrown {
                thread, location, ..
            } => Some((*thread, location)),
            DebugEvent::ThreadTerminated {
                thread,
                location: Some(location),
            } => Some((*thread, location)),
            DebugEvent::ThreadTerminated { location: None, .. }
            | DebugEvent::ClassLoaded { .. }
            | DebugEvent::TargetTerminated
            | DebugEvent::ConnectionLost => None,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DebugEvent::ClassLoaded { .. } => "class_loaded",
            DebugEvent::TargetTerminated => "target_terminated",
            DebugEvent::ConnectionLost => "connection_lost",
            DebugEvent::Breakpoint { .. } => "breakpoint",
            DebugEvent::SingleStep { .. } => "single_step",
            DebugEvent::MethodEntered { .. } => "method_entered",
            DebugEvent::MethodExited { .. } => "method_exited",
            DebugEvent::ExceptionThrown { .. } => "exception_thrown",
            DebugEvent::ThreadTerminated { .. } => "thread_terminated",
        }
    }
}

/// Events the target emitted before suspending, in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventBatch {
    events: Vec<DebugEvent>,
}

impl EventBatch {
    pub fn new(events: Vec<DebugEvent>) -> Self {
        Self { events }
    }

    pub fn single(event: DebugEvent) -> Self {
        Self {
            events: vec![event],
        }
    }

    pub fn events(&self) -> &[DebugEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl From<Vec<DebugEvent>> for EventBatch {
    fn from(events: Vec<DebugEvent>) -> Self {
        Self::new(events)
    }
}

impl IntoIterator for EventBatch {
    type Item = DebugEvent;
    type IntoIter = std::vec::IntoIter<DebugEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
