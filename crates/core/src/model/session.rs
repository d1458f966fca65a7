use std::fmt;

/// Lifecycle of a mock-exam session on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Waiting for a section (first load, retry after a failed load).
    #[default]
    Loading,
    InQuestion,
    /// Every question of the section was visited or the section clock ran out.
    SectionComplete,
    /// Terminal.
    ExamComplete,
}

impl SessionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ExamComplete)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::InQuestion => "in_question",
            Self::SectionComplete => "section_complete",
            Self::ExamComplete => "exam_complete",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
