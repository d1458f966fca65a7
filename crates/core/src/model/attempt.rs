use serde::{Deserialize, Serialize};

use crate::model::{Question, SequenceId};

//
// ─── INTENTS ───────────────────────────────────────────────────────────────────
//

/// What the student did with a question on one visit.
///
/// Exactly one intent is recorded per submit; the intent decides the three
/// fields that go over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptIntent {
    /// `Next` with an option selected.
    Answer(String),
    Skip,
    /// Mark for review; only offered while nothing is selected.
    Review,
    /// The section clock ran out while the question was on screen.
    Timeout(Option<String>),
}

impl AttemptIntent {
    #[must_use]
    pub fn fields(&self) -> SubmissionFields {
        match self {
            Self::Answer(selected) => SubmissionFields {
                student_answer: Some(selected.clone()),
                is_skipped: false,
                is_review: false,
            },
            Self::Skip => SubmissionFields {
                student_answer: None,
                is_skipped: true,
                is_review: false,
            },
            Self::Review => SubmissionFields {
                student_answer: None,
                is_skipped: false,
                is_review: true,
            },
            Self::Timeout(selected) => SubmissionFields {
                student_answer: selected.clone(),
                is_skipped: selected.is_none(),
                is_review: false,
            },
        }
    }
}

/// The `{student_answer, is_skipped, is_review}` triple carried by every submit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmissionFields {
    pub student_answer: Option<String>,
    pub is_skipped: bool,
    pub is_review: bool,
}

impl SubmissionFields {
    /// Correctness is only known when both the student's answer and the key are present.
    #[must_use]
    pub fn is_correct(&self, correct_answer: Option<&str>) -> Option<bool> {
        match (self.student_answer.as_deref(), correct_answer) {
            (Some(given), Some(key)) => Some(given == key),
            _ => None,
        }
    }
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptStatus {
    Unanswered,
    Answered,
    Skipped,
    Marked,
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// A question plus the student's latest recorded outcome for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAttempt {
    question: Question,
    fields: SubmissionFields,
    is_correct: Option<bool>,
}

impl QuestionAttempt {
    #[must_use]
    pub fn new(question: Question) -> Self {
        Self {
            question,
            fields: SubmissionFields::default(),
            is_correct: None,
        }
    }

    #[must_use]
    pub fn sequence_id(&self) -> SequenceId {
        self.question.sequence_id()
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn student_answer(&self) -> Option<&str> {
        self.fields.student_answer.as_deref()
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.fields.is_skipped
    }

    #[must_use]
    pub fn is_review(&self) -> bool {
        self.fields.is_review
    }

    #[must_use]
    pub fn is_correct(&self) -> Option<bool> {
        self.is_correct
    }

    #[must_use]
    pub fn fields(&self) -> &SubmissionFields {
        &self.fields
    }

    /// Overwrite the recorded outcome (last write wins).
    pub fn record(&mut self, intent: &AttemptIntent) -> &SubmissionFields {
        let fields = intent.fields();
        self.is_correct = fields.is_correct(self.question.correct_answer());
        self.fields = fields;
        &self.fields
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        if self.fields.is_review {
            AttemptStatus::Marked
        } else if self.fields.is_skipped {
            AttemptStatus::Skipped
        } else if self.fields.student_answer.is_some() {
            AttemptStatus::Answered
        } else {
            AttemptStatus::Unanswered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionBody, QuestionOption};

    fn attempt(correct: Option<&str>) -> QuestionAttempt {
        let body = QuestionBody::Available {
            stem: "Drug of choice?".into(),
            options: vec![QuestionOption::new("A", "One"), QuestionOption::new("B", "Two")],
        };
        QuestionAttempt::new(Question::new(
            SequenceId::new(1),
            body,
            correct.map(str::to_owned),
            None,
        ))
    }

    fn set_flags(fields: &SubmissionFields) -> usize {
        usize::from(fields.student_answer.is_some())
            + usize::from(fields.is_skipped)
            + usize::from(fields.is_review)
    }

    #[test]
    fn every_intent_sets_at_most_one_flag() {
        let intents = [
            AttemptIntent::Answer("A".into()),
            AttemptIntent::Skip,
            AttemptIntent::Review,
            AttemptIntent::Timeout(Some("B".into())),
            AttemptIntent::Timeout(None),
        ];
        for intent in &intents {
            assert_eq!(set_flags(&intent.fields()), 1, "{intent:?}");
        }
    }

    #[test]
    fn timeout_without_selection_is_a_skip() {
        let fields = AttemptIntent::Timeout(None).fields();
        assert_eq!(fields.student_answer, None);
        assert!(fields.is_skipped);
        assert!(!fields.is_review);
    }

    #[test]
    fn correctness_needs_answer_and_key() {
        let mut a = attempt(Some("A"));
        a.record(&AttemptIntent::Answer("A".into()));
        assert_eq!(a.is_correct(), Some(true));
        a.record(&AttemptIntent::Answer("B".into()));
        assert_eq!(a.is_correct(), Some(false));
        a.record(&AttemptIntent::Skip);
        assert_eq!(a.is_correct(), None);

        let mut unknown = attempt(None);
        unknown.record(&AttemptIntent::Answer("A".into()));
        assert_eq!(unknown.is_correct(), None);
    }

    #[test]
    fn later_record_overwrites_earlier_one() {
        let mut a = attempt(Some("B"));
        a.record(&AttemptIntent::Review);
        assert_eq!(a.status(), AttemptStatus::Marked);
        a.record(&AttemptIntent::Answer("B".into()));
        assert_eq!(a.status(), AttemptStatus::Answered);
        assert!(!a.is_review());
        assert_eq!(a.student_answer(), Some("B"));
    }
}
