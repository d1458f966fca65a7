use services::{LoadError, SessionError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    /// The section could not be fetched; the screen offers a retry.
    LoadFailed,
    EmptySection,
    NeedsSelection,
    SelectionPending,
    NotAllowed,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::LoadFailed => "Could not load the section. Check your connection and retry.",
            Self::EmptySection => "This section has no questions yet. Please retry later.",
            Self::NeedsSelection => "Choose an option first.",
            Self::SelectionPending => "Clear your selection to mark this question for review.",
            Self::NotAllowed => "That action is not available right now.",
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }

    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::LoadFailed | Self::EmptySection)
    }
}

impl From<&SessionError> for ViewError {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::Load(LoadError::Empty) => Self::EmptySection,
            SessionError::Load(_) => Self::LoadFailed,
            SessionError::NoSelection => Self::NeedsSelection,
            SessionError::SelectionPending => Self::SelectionPending,
            SessionError::InvalidState { .. }
            | SessionError::Abandoned
            | SessionError::QuestionUnavailable(_)
            | SessionError::UnknownOption(..)
            | SessionError::UnknownQuestion(_) => Self::NotAllowed,
            _ => Self::Unknown,
        }
    }
}
