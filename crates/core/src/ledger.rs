use std::collections::HashMap;

use thiserror::Error;

use crate::model::{AttemptIntent, AttemptStatus, Question, QuestionAttempt, SequenceId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("a section needs at least one question")]
    Empty,

    #[error("sequence id {0} appears more than once in the section")]
    DuplicateSequence(SequenceId),

    #[error("no question with sequence id {0} in this section")]
    UnknownSequence(SequenceId),
}

/// Counts per palette category. The four buckets partition the section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerSummary {
    pub answered: usize,
    pub skipped: usize,
    pub marked: usize,
    pub unanswered: usize,
}

impl LedgerSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.answered + self.skipped + self.marked + self.unanswered
    }
}

/// Attempts for the currently loaded section, in presentation order.
#[derive(Debug, Clone)]
pub struct AnswerLedger {
    attempts: Vec<QuestionAttempt>,
    index: HashMap<SequenceId, usize>,
}

impl AnswerLedger {
    /// # Errors
    ///
    /// Returns `LedgerError::Empty` for an empty section and
    /// `LedgerError::DuplicateSequence` if two questions share a sequence id.
    pub fn new(questions: Vec<Question>) -> Result<Self, LedgerError> {
        if questions.is_empty() {
            return Err(LedgerError::Empty);
        }

        let mut index = HashMap::with_capacity(questions.len());
        let mut attempts = Vec::with_capacity(questions.len());
        for (pos, question) in questions.into_iter().enumerate() {
            if index.insert(question.sequence_id(), pos).is_some() {
                return Err(LedgerError::DuplicateSequence(question.sequence_id()));
            }
            attempts.push(QuestionAttempt::new(question));
        }

        Ok(Self { attempts, index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    #[must_use]
    pub fn position(&self, id: SequenceId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    #[must_use]
    pub fn get(&self, id: SequenceId) -> Option<&QuestionAttempt> {
        self.position(id).map(|pos| &self.attempts[pos])
    }

    #[must_use]
    pub fn at(&self, pos: usize) -> Option<&QuestionAttempt> {
        self.attempts.get(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionAttempt> {
        self.attempts.iter()
    }

    /// Record an outcome for a question in place.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnknownSequence` if the id is not part of this section.
    pub fn update(
        &mut self,
        id: SequenceId,
        intent: &AttemptIntent,
    ) -> Result<&QuestionAttempt, LedgerError> {
        let pos = self
            .position(id)
            .ok_or(LedgerError::UnknownSequence(id))?;
        let attempt = &mut self.attempts[pos];
        attempt.record(intent);
        Ok(attempt)
    }

    #[must_use]
    pub fn summary(&self) -> LedgerSummary {
        let mut summary = LedgerSummary::default();
        for attempt in &self.attempts {
            match attempt.status() {
                AttemptStatus::Answered => summary.answered += 1,
                AttemptStatus::Skipped => summary.skipped += 1,
                AttemptStatus::Marked => summary.marked += 1,
                AttemptStatus::Unanswered => summary.unanswered += 1,
            }
        }
        summary
    }
}
