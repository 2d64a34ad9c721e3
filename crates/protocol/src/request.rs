use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{Location, ThreadId};

/// Handle for a request registered with the request manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request#{}", self.0)
    }
}

/// Which target threads are halted when a request fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspendPolicy {
    None,
    EventThread,
    #[default]
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSize {
    /// Smallest step the target can report.
    Min,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDepth {
    Into,
    Over,
    Out,
}

/// What a request subscribes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestKind {
    Exception {
        caught: bool,
        uncaught: bool,
    },
    MethodEntry,
    MethodExit,
    ThreadDeath,
    ClassPrepare,
    Breakpoint {
        location: Location,
    },
    Step {
        thread: ThreadId,
        size: StepSize,
        depth: StepDepth,
    },
}

impl RequestKind {
    pub fn is_step(&self) -> bool {
        matches!(self, RequestKind::Step { .. })
    }
}

/// A subscription to be registered with the request manager.
///
/// Requests are created disabled; enabling is a separate operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequest {
    pub kind: RequestKind,
    pub suspend_policy: SuspendPolicy,
    pub class_exclusions: Vec<String>,
    /// Fire only on the n-th occurrence, then expire.
    pub count_filter: Option<u32>,
}

impl EventRequest {
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            suspend_policy: SuspendPolicy::default(),
            class_exclusions: Vec::new(),
            count_filter: None,
        }
    }

    pub fn suspend(mut self, policy: SuspendPolicy) -> Self {
        self.suspend_policy = policy;
        self
    }

    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_exclusions
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count_filter = Some(count);
        self
    }

    /// True when `class_name` is filtered out by this request.
    pub fn excludes(&self, class_name: &str) -> bool {
        self.class_exclusions
            .iter()
            .any(|pattern| class_matches(pattern, class_name))
    }
}

/// Match a class name against a restricted glob.
///
/// Patterns either begin or end with `*` (`java.*`, `*.Foo`), or are an
/// exact class name.
pub fn class_matches(pattern: &str, class_name: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        class_name.starts_with(prefix)
    } else if let Some(suffix) = pattern.strip_prefix('*') {
        class_name.ends_with(suffix)
    } else {
        pattern == class_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_patterns() {
        assert!(class_matches("java.*", "java.lang.String"));
        assert!(class_matches("com.sun.*", "com.sun.tools.Main"));
        assert!(!class_matches("java.*", "javax.swing.JFrame"));
        assert!(!class_matches("sun.*", "Main"));
    }

    #[test]
    fn suffix_patterns() {
        assert!(class_matches("*.Helper", "org.example.Helper"));
        assert!(!class_matches("*.Helper", "org.example.Helpers"));
    }

    #[test]
    fn exact_patterns() {
        assert!(class_matches("Main", "Main"));
        assert!(!class_matches("Main", "MainTest"));
    }

    #[test]
    fn builder_accumulates_settings() {
        let request = EventRequest::new(RequestKind::MethodEntry)
            .suspend(SuspendPolicy::EventThread)
            .exclude(["java.*", "sun.*"])
            .count(1);

        assert_eq!(request.suspend_policy, SuspendPolicy::EventThread);
        assert_eq!(request.count_filter, Some(1));
        assert!(request.excludes("java.util.List"));
        assert!(!request.excludes("Main"));
    }

    #[test]
    fn default_suspend_policy_halts_everything() {
        let request = EventRequest::new(RequestKind::ClassPrepare);
        assert_eq!(request.suspend_policy, SuspendPolicy::All);
        assert!(request.class_exclusions.is_empty());
    }
}
