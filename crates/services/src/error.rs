//! Shared error types for the services crate.

use thiserror::Error;

use backend::BackendError;
use exam_core::LedgerError;
use exam_core::model::{SequenceId, SessionState};

/// Why a section could not be loaded. The session stays in `Loading` and may retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoadError {
    #[error("section has no questions")]
    Empty,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted by the exam session controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("{action} is not allowed while the session is {state}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },
    #[error("session was abandoned")]
    Abandoned,
    #[error("select an option first")]
    NoSelection,
    #[error("clear the selection before marking for review")]
    SelectionPending,
    #[error("question {0} has no option {1:?}")]
    UnknownOption(SequenceId, String),
    #[error("question {0} is unavailable")]
    QuestionUnavailable(SequenceId),
    #[error("no question {0} in the current section")]
    UnknownQuestion(SequenceId),
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Errors emitted by `DashboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}
