use crate::tools::ToolOutput;
use crate::{Error, Result};

/// Why a fan-out task failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retry budget spent on per-attempt deadline overruns.
    Timeout,
    /// Retry budget spent on operation errors, or a non-retried tool error.
    Operation,
    /// The tool implements neither entry point.
    Unimplemented,
    /// Lookup failure (only reachable through single dispatch).
    NotFound,
    /// The task itself died: panicked or aborted worker.
    Internal,
}

impl From<&Error> for FailureKind {
    fn from(error: &Error) -> Self {
        match error {
            Error::TimeoutExceeded { .. } => Self::Timeout,
            Error::Unimplemented { .. } => Self::Unimplemented,
            Error::ToolNotFound { .. } => Self::NotFound,
            Error::TaskJoin(_) => Self::Internal,
            _ => Self::Operation,
        }
    }
}

/// Failed half of a task outcome.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub message: String,
    pub attempts: u32,
}

impl From<Error> for TaskFailure {
    fn from(error: Error) -> Self {
        Self {
            kind: FailureKind::from(&error),
            attempts: error.attempts().unwrap_or(1),
            message: error.to_string(),
        }
    }
}

/// Settled result of one fan-out task; immutable once produced.
///
/// Every scheduled task yields exactly one of these - a gather never signals
/// a single task's failure by unwinding.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Success(ToolOutput),
    Failure(TaskFailure),
}

impl TaskOutcome {
    pub(crate) fn from_result(result: Result<ToolOutput>) -> Self {
        match result {
            Ok(output) => Self::Success(output),
            Err(error) => Self::Failure(TaskFailure::from(error)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(&self) -> Option<&ToolOutput> {
        match self {
            Self::Success(output) => Some(output),
            Self::Failure(_) => None,
        }
    }

    pub fn into_success(self) -> Option<ToolOutput> {
        match self {
            Self::Success(output) => Some(output),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}
