//! Debug protocol boundary for the execution tracer.
//!
//! This crate models the parts of a JDI-style debugger interface that the
//! tracer consumes:
//!
//! - [`DebugEvent`]s delivered in atomic [`EventBatch`]es by a blocking queue
//! - [`EventRequest`]s created, enabled, disabled and deleted through a
//!   request manager
//! - resume and forced exit of the target
//! - read-only inspection of stack [`Frame`]s, line tables and static fields
//!
//! All of it sits behind the [`VirtualMachine`] trait so the tracer can be
//! driven by a real debuggee connection or by the in-memory
//! [`testing::ScriptedVm`].
//!
//! # Scope
//!
//! Deciding what to trace, and what a trace looks like, belongs in the
//! `tracer` crate.

mod error;
mod event;
mod request;
mod vm;

pub mod testing;

pub use error::ProtocolError;
pub use event::{DebugEvent, EventBatch, Location, ReferenceType, ThreadId};
pub use request::{
    EventRequest, RequestId, RequestKind, StepDepth, StepSize, SuspendPolicy, class_matches,
};
pub use vm::{Frame, Variable, VirtualMachine};
