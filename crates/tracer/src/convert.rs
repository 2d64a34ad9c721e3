//! Turning debug events into trace records
//!
//! The [`Converter`] trait is the seam between the dispatch loop and the
//! record format understood by the visualizer. [`FrameConverter`] renders
//! records from the suspended thread's stack frames.

use eyre::WrapErr;
use protocol::{DebugEvent, Frame, Location, ReferenceType, ThreadId, VirtualMachine};
use serde_json::{Map, Value, json};

use crate::{
    config::TracerConfig,
    types::{CompileErrorDocument, LaunchFailure, OutputDocument, TraceDocument, TraceRecord},
};

pub trait Converter {
    /// Whether events at this location belong in the trace.
    fn reports_at(&self, location: &Location) -> bool;

    /// Remember a loaded type for static introspection.
    fn register_type(&mut self, ty: &ReferenceType);

    /// Render the records for one event. The thread is suspended while this
    /// runs.
    fn convert(
        &mut self,
        vm: &mut dyn VirtualMachine,
        event: &DebugEvent,
        location: &Location,
        thread: ThreadId,
    ) -> eyre::Result<Vec<TraceRecord>>;

    fn compile_error_document(&self, code: &str, failure: &LaunchFailure) -> OutputDocument {
        OutputDocument::CompileError(CompileErrorDocument {
            code: code.to_string(),
            message: failure.message.clone(),
            line: failure.line.unwrap_or(1),
            column: failure.column.unwrap_or(1),
        })
    }

    fn trace_document(&self, code: &str, records: Vec<TraceRecord>) -> OutputDocument {
        OutputDocument::Trace(TraceDocument {
            code: code.to_string(),
            trace: records,
        })
    }
}

/// Default [`Converter`]: one record per event, built from stack frames.
#[derive(Debug)]
pub struct FrameConverter {
    config: TracerConfig,
    static_types: Vec<ReferenceType>,
}

impl FrameConverter {
    pub fn new(config: TracerConfig) -> Self {
        Self {
            config,
            static_types: Vec::new(),
        }
    }

    pub fn registered_types(&self) -> &[ReferenceType] {
        &self.static_types
    }

    fn event_name(event: &DebugEvent) -> Option<&'static str> {
        match event {
            DebugEvent::Breakpoint { .. } | DebugEvent::SingleStep { .. } => Some("step_line"),
            DebugEvent::MethodEntered { .. } => Some("call"),
            DebugEvent::MethodExited { .. } => Some("return"),
            DebugEvent::ExceptionThrown { .. } => Some("exception"),
            DebugEvent::ThreadTerminated { .. }
            | DebugEvent::ClassLoaded { .. }
            | DebugEvent::TargetTerminated
            | DebugEvent::ConnectionLost => None,
        }
    }

    fn render_stack(&self, frames: &[Frame], event: &DebugEvent) -> Vec<Value> {
        // frames arrive innermost first, the visualizer wants outermost first
        let visible: Vec<&Frame> = frames
            .iter()
            .rev()
            .filter(|f| self.reports_at(&f.location))
            .collect();
        let top = visible.len().saturating_sub(1);

        visible
            .iter()
            .enumerate()
            .map(|(index, frame)| {
                let frame_id = index + 1;
                let mut locals = Map::new();
                let mut ordered = Vec::new();
                for var in &frame.locals {
                    locals.insert(var.name.clone(), Value::from(var.value.as_str()));
                    ordered.push(Value::from(var.name.as_str()));
                }
                if index == top {
                    if let DebugEvent::MethodExited {
                        return_value: Some(value),
                        ..
                    } = event
                    {
                        locals.insert("__return__".to_string(), Value::from(value.as_str()));
                        ordered.push(Value::from("__return__"));
                    }
                }

                json!({
                    "func_name": frame.location.method,
                    "line": frame.location.line,
                    "frame_id": frame_id,
                    "unique_hash": format!("{}_f{}", frame.location.method, frame_id),
                    "encoded_locals": locals,
                    "ordered_varnames": ordered,
                    "is_highlighted": index == top,
                    "is_parent": false,
                    "is_zombie": false,
                    "parent_frame_id_list": [],
                })
            })
            .collect()
    }

    fn render_globals(
        &self,
        vm: &mut dyn VirtualMachine,
    ) -> eyre::Result<(Map<String, Value>, Vec<Value>)> {
        let mut globals = Map::new();
        let mut ordered = Vec::new();
        for ty in &self.static_types {
            let fields = vm
                .static_fields(ty)
                .with_context(|| format!("reading static fields of {}", ty.name))?;
            for field in fields {
                let name = format!("{}.{}", ty.name, field.name);
                globals.insert(name.clone(), Value::from(field.value));
                ordered.push(Value::from(name));
            }
        }
        Ok((globals, ordered))
    }
}

impl Converter for FrameConverter {
    fn reports_at(&self, location: &Location) -> bool {
        location.line > 0
            && !self.config.is_excluded(&location.class_name)
            && !self.config.is_internal(&location.class_name)
            && !self.config.is_bootstrap(&location.class_name)
    }

    fn register_type(&mut self, ty: &ReferenceType) {
        if !self.static_types.contains(ty) {
            self.static_types.push(ty.clone());
        }
    }

    #[tracing::instrument(skip(self, vm, event), fields(event = event.kind()), level = "trace")]
    fn convert(
        &mut self,
        vm: &mut dyn VirtualMachine,
        event: &DebugEvent,
        location: &Location,
        thread: ThreadId,
    ) -> eyre::Result<Vec<TraceRecord>> {
        let Some(name) = Self::event_name(event) else {
            tracing::trace!("event has no trace representation");
            return Ok(Vec::new());
        };

        let frames = vm
            .frames(thread)
            .with_context(|| format!("reading frames of {thread}"))?;
        let stack = self.render_stack(&frames, event);
        let (globals, ordered_globals) = self.render_globals(vm)?;

        let mut record = Map::new();
        record.insert("event".to_string(), Value::from(name));
        record.insert("line".to_string(), Value::from(location.line));
        record.insert("func_name".to_string(), Value::from(location.method.as_str()));
        record.insert("stack_to_render".to_string(), Value::from(stack));
        record.insert("globals".to_string(), Value::Object(globals));
        record.insert("ordered_globals".to_string(), Value::from(ordered_globals));
        // target output and heap objects are not captured
        record.insert("heap".to_string(), Value::Object(Map::new()));
        record.insert("stdout".to_string(), Value::from(""));

        if let DebugEvent::ExceptionThrown {
            exception, message, ..
        } = event
        {
            let text = match message {
                Some(message) => format!("{exception}: {message}"),
                None => exception.clone(),
            };
            record.insert("exception_msg".to_string(), Value::from(text));
        }

        Ok(vec![TraceRecord::new(record)])
    }
}
