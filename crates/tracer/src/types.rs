use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use serde_json::{Map, Value};

/// Event tag of the synthetic record appended when a resource cap trips.
pub const LIMIT_REACHED_EVENT: &str = "instruction_limit_reached";

/// One observed execution point, in the visualizer's record format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceRecord(Map<String, Value>);

impl TraceRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> eyre::Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => eyre::bail!("trace record must be a JSON object, got {other}"),
        }
    }

    /// Terminal record signalling that a resource limit was reached.
    pub fn sentinel(message: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("exception_msg".to_string(), Value::from(message));
        fields.insert("event".to_string(), Value::from(LIMIT_REACHED_EVENT));
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn event(&self) -> Option<&str> {
        self.get("event").and_then(Value::as_str)
    }

    pub fn is_sentinel(&self) -> bool {
        self.event() == Some(LIMIT_REACHED_EVENT)
    }

    /// Number of frames the visualizer would draw for this record.
    pub fn stack_depth(&self) -> usize {
        self.get("stack_to_render")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Failure reported by the launch collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchFailure {
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl LaunchFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

/// Outcome of compiling and starting the user program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchResult {
    pub success: bool,
    pub error: Option<LaunchFailure>,
}

impl LaunchResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(failure: LaunchFailure) -> Self {
        Self {
            success: false,
            error: Some(failure),
        }
    }

    /// The failure to report, if the launch did not succeed.
    pub fn failure(&self) -> Option<LaunchFailure> {
        if self.success {
            return None;
        }
        Some(
            self.error
                .clone()
                .unwrap_or_else(|| LaunchFailure::new("<unknown launch failure>")),
        )
    }
}

/// Report for a program that could not be compiled or started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileErrorDocument {
    pub code: String,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl Serialize for CompileErrorDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            event: &'static str,
            exception_msg: &'a str,
            line: u32,
            offset: u32,
        }

        let mut state = serializer.serialize_struct("CompileErrorDocument", 2)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field(
            "trace",
            &[Entry {
                event: "uncaught_exception",
                exception_msg: &self.message,
                line: self.line,
                offset: self.column,
            }],
        )?;
        state.end()
    }
}

/// Execution trace of a program that ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceDocument {
    pub code: String,
    pub trace: Vec<TraceRecord>,
}

/// The single document a run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputDocument {
    CompileError(CompileErrorDocument),
    Trace(TraceDocument),
}

impl OutputDocument {
    pub fn is_trace(&self) -> bool {
        matches!(self, OutputDocument::Trace(_))
    }

    /// Trace records, empty for a compile error.
    pub fn records(&self) -> &[TraceRecord] {
        match self {
            OutputDocument::Trace(doc) => &doc.trace,
            OutputDocument::CompileError(_) => &[],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinel_shape() {
        let record = TraceRecord::sentinel("<ran for maximum execution time limit>");
        assert!(record.is_sentinel());
        assert_eq!(record.stack_depth(), 0);
        assert_eq!(
            record.into_value(),
            json!({
                "exception_msg": "<ran for maximum execution time limit>",
                "event": "instruction_limit_reached",
            })
        );
    }

    #[test]
    fn stack_depth_counts_rendered_frames() {
        let record = TraceRecord::from_value(json!({
            "event": "step_line",
            "stack_to_render": [{"func_name": "main"}, {"func_name": "f"}],
        }))
        .unwrap();
        assert_eq!(record.stack_depth(), 2);
        assert!(!record.is_sentinel());
    }

    #[test]
    fn records_must_be_objects() {
        assert!(TraceRecord::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn compile_error_document_format() {
        let doc = OutputDocument::CompileError(CompileErrorDocument {
            code: "class Main {".to_string(),
            message: "reached end of file while parsing".to_string(),
            line: 1,
            column: 13,
        });

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "code": "class Main {",
                "trace": [{
                    "event": "uncaught_exception",
                    "exception_msg": "reached end of file while parsing",
                    "line": 1,
                    "offset": 13,
                }],
            })
        );
        assert!(doc.records().is_empty());
    }

    #[test]
    fn trace_document_format() {
        let doc = OutputDocument::Trace(TraceDocument {
            code: "x".to_string(),
            trace: vec![TraceRecord::sentinel("m")],
        });
        let value: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(value["code"], "x");
        assert_eq!(value["trace"][0]["event"], LIMIT_REACHED_EVENT);
    }

    #[test]
    fn failed_launch_without_details_still_reports() {
        let result = LaunchResult {
            success: false,
            error: None,
        };
        assert_eq!(
            result.failure().unwrap().message,
            "<unknown launch failure>"
        );
        assert!(LaunchResult::succeeded().failure().is_none());
    }
}
