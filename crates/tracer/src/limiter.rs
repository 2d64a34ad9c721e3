use crate::{assembler::TraceAssembler, types::TraceRecord};

/// A resource cap that ended the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    StackDepth,
    Steps,
}

impl Limit {
    pub fn message(self) -> &'static str {
        match self {
            Limit::StackDepth => "<exceeded maximum visualizer stack size>",
            Limit::Steps => "<ran for maximum execution time limit>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Accepted,
    /// The record was kept and a sentinel appended after it.
    LimitReached(Limit),
    /// The budget was already spent; the record was dropped.
    Rejected,
}

/// Counts recorded steps and checks every record against both caps.
///
/// The stack-depth cap is checked before the step cap, so a record that
/// trips both is reported as a stack overflow.
#[derive(Debug)]
pub(crate) struct ResourceLimiter {
    steps: usize,
    max_steps: usize,
    max_stack_depth: usize,
    tripped: Option<Limit>,
}

impl ResourceLimiter {
    pub(crate) fn new(max_steps: usize, max_stack_depth: usize) -> Self {
        Self {
            steps: 0,
            max_steps,
            max_stack_depth,
            tripped: None,
        }
    }

    pub(crate) fn steps(&self) -> usize {
        self.steps
    }

    pub(crate) fn tripped(&self) -> Option<Limit> {
        self.tripped
    }

    pub(crate) fn exhausted(&self) -> bool {
        self.tripped.is_some() || self.steps >= self.max_steps
    }

    pub(crate) fn admit(
        &mut self,
        record: TraceRecord,
        assembler: &mut TraceAssembler,
    ) -> Admission {
        if self.exhausted() {
            return Admission::Rejected;
        }

        let depth = record.stack_depth();
        assembler.push(record);
        self.steps += 1;

        let limit = if depth >= self.max_stack_depth {
            Some(Limit::StackDepth)
        } else if self.steps >= self.max_steps {
            Some(Limit::Steps)
        } else {
            None
        };

        match limit {
            Some(limit) => {
                assembler.push(TraceRecord::sentinel(limit.message()));
                self.tripped = Some(limit);
                Admission::LimitReached(limit)
            }
            None => Admission::Accepted,
        }
    }
}
