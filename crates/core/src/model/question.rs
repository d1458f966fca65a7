use serde::{Deserialize, Serialize};

use crate::model::SequenceId;

/// One selectable option, normalized to a `{label, text}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    pub text: String,
}

impl QuestionOption {
    #[must_use]
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Renderable content of a question.
///
/// Questions that arrive without a stem or without options are kept in the
/// section as `Unavailable` so the rest of the exam stays usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionBody {
    Available {
        stem: String,
        options: Vec<QuestionOption>,
    },
    Unavailable {
        reason: String,
    },
}

impl QuestionBody {
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    #[must_use]
    pub fn stem(&self) -> Option<&str> {
        match self {
            Self::Available { stem, .. } => Some(stem),
            Self::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        match self {
            Self::Available { options, .. } => options,
            Self::Unavailable { .. } => &[],
        }
    }

    #[must_use]
    pub fn has_option(&self, label: &str) -> bool {
        self.options().iter().any(|opt| opt.label == label)
    }
}

/// Immutable question content as loaded for a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    sequence_id: SequenceId,
    body: QuestionBody,
    correct_answer: Option<String>,
    explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn new(
        sequence_id: SequenceId,
        body: QuestionBody,
        correct_answer: Option<String>,
        explanation: Option<String>,
    ) -> Self {
        Self {
            sequence_id,
            body,
            correct_answer,
            explanation,
        }
    }

    #[must_use]
    pub fn sequence_id(&self) -> SequenceId {
        self.sequence_id
    }

    #[must_use]
    pub fn body(&self) -> &QuestionBody {
        &self.body
    }

    #[must_use]
    pub fn correct_answer(&self) -> Option<&str> {
        self.correct_answer.as_deref()
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}
