//! Testing utilities for the debug protocol boundary.
//!
//! [`ScriptedVm`] stands in for a live debuggee: it replays a sequence of
//! event batches, records every request made against it, and reacts to
//! `exit` the way a real target does.

mod scripted;

pub use scripted::{RecordedRequest, ScriptedVm};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{EventBatch, Location, Variable};

/// A recorded debugging session.
///
/// # Example
///
/// ```
/// use protocol::testing::Script;
/// use serde_json::json;
///
/// let script: Script = serde_json::from_value(json!({
///     "batches": [
///         [{"type": "breakpoint", "thread": 1,
///           "location": {"class_name": "Main", "method": "main", "source": "Main.java", "line": 3}}]
///     ],
///     "line_tables": {
///         "Main": [{"class_name": "Main", "method": "main", "source": "Main.java", "line": 3}]
///     }
/// }))
/// .unwrap();
///
/// assert_eq!(script.batches.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub batches: Vec<EventBatch>,

    /// Executable lines per class name. Classes without an entry have no
    /// line information.
    #[serde(default)]
    pub line_tables: HashMap<String, Vec<Location>>,

    /// Static field values per class name.
    #[serde(default)]
    pub statics: HashMap<String, Vec<Variable>>,
}
