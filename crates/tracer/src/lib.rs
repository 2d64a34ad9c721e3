//! Single-step execution tracer
//!
//! A [`Tracer`] attaches standing subscriptions to a suspended target, steps
//! the one thread of interest instruction by instruction, and turns every
//! reportable stop into a [`TraceRecord`]. The run ends with exactly one
//! [`OutputDocument`]: either the trace, or a compile-error report when the
//! user program could not be launched.
//!
//! Runs are bounded: at most [`DEFAULT_MAX_STEPS`] records, and no record
//! deeper than [`DEFAULT_MAX_STACK_DEPTH`] frames. Crossing either cap
//! appends an `instruction_limit_reached` sentinel and kills the target.
//!
//! ```
//! use protocol::{DebugEvent, EventBatch, Location, ThreadId, testing::ScriptedVm};
//! use tracer::{LaunchResult, ThreadedLauncher, Tracer, TracerConfig};
//!
//! let step = |line| {
//!     EventBatch::single(DebugEvent::SingleStep {
//!         thread: ThreadId(1),
//!         location: Location::new("Main", "main", "Main.java", line),
//!     })
//! };
//! let vm = ScriptedVm::new(vec![step(3), step(4)]);
//! let launcher = ThreadedLauncher::new(|_| LaunchResult::succeeded());
//!
//! let mut tracer = Tracer::with_defaults(vm, TracerConfig::default(), "...", launcher)?;
//! let document = tracer.run(std::io::sink())?;
//! assert_eq!(document.records().len(), 2);
//! # Ok::<(), eyre::Report>(())
//! ```

mod assembler;
mod classifier;
mod config;
mod convert;
mod drain;
mod error;
mod internals;
mod launch;
mod limiter;
mod scheduler;
mod state;
mod tracer;
mod types;

pub use assembler::TraceAssembler;
pub use config::{DEFAULT_EXCLUSIONS, DEFAULT_MAX_STACK_DEPTH, DEFAULT_MAX_STEPS, TracerConfig};
pub use convert::{Converter, FrameConverter};
pub use error::TraceError;
pub use launch::{Launcher, ThreadedLauncher};
pub use limiter::Limit;
pub use state::LoopState;
pub use tracer::Tracer;
pub use types::{
    CompileErrorDocument, LIMIT_REACHED_EVENT, LaunchFailure, LaunchResult, OutputDocument,
    TraceDocument, TraceRecord,
};
