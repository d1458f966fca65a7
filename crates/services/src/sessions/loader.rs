use std::sync::Arc;

use backend::{RawOptionEntry, RawOptions, RawQuestion, RawSection, SectionPayload, SectionSource};
use exam_core::AnswerLedger;
use exam_core::model::{
    AttemptIntent, ClockTime, ExamSerial, Question, QuestionBody, QuestionOption, SequenceId,
    StudentId,
};
use tracing::{debug, warn};

use crate::error::LoadError;

/// A section ready to be played: normalized questions and a starting clock.
#[derive(Debug, Clone)]
pub struct LoadedSection {
    pub name: String,
    pub remaining_seconds: u32,
    pub ledger: AnswerLedger,
    /// Number of questions that came back with a stored outcome.
    pub resumed: usize,
}

#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Section(LoadedSection),
    ExamFinished,
}

/// Fetches sections and converts the wire shape into domain types.
#[derive(Clone)]
pub struct SectionLoader {
    source: Arc<dyn SectionSource>,
    default_seconds: u32,
}

impl SectionLoader {
    #[must_use]
    pub fn new(source: Arc<dyn SectionSource>, default_seconds: u32) -> Self {
        Self {
            source,
            default_seconds,
        }
    }

    /// # Errors
    ///
    /// Returns `LoadError::Backend` when the call fails, `LoadError::Empty` when
    /// the section has no questions, and `LoadError::Ledger` for duplicate ids.
    pub async fn load(
        &self,
        student_id: &StudentId,
        exam_serial: ExamSerial,
    ) -> Result<LoadOutcome, LoadError> {
        match self.source.load_section(student_id, exam_serial).await? {
            SectionPayload::ExamFinished => Ok(LoadOutcome::ExamFinished),
            SectionPayload::Section(raw) => {
                self.build_section(exam_serial, raw).map(LoadOutcome::Section)
            }
        }
    }

    fn build_section(
        &self,
        exam_serial: ExamSerial,
        raw: RawSection,
    ) -> Result<LoadedSection, LoadError> {
        if raw.questions.is_empty() {
            return Err(LoadError::Empty);
        }

        let remaining_seconds = section_clock(raw.time_remaining.as_deref(), self.default_seconds);
        let prior: Vec<(SequenceId, AttemptIntent)> = raw
            .questions
            .iter()
            .filter_map(|q| prior_intent(q).map(|intent| (SequenceId::new(q.react_order), intent)))
            .collect();
        let questions: Vec<Question> = raw.questions.into_iter().map(normalize_question).collect();

        let mut ledger = AnswerLedger::new(questions)?;
        for (id, intent) in &prior {
            ledger.update(*id, intent)?;
        }

        debug!(
            %exam_serial,
            section = %raw.section,
            questions = ledger.len(),
            resumed = prior.len(),
            remaining_seconds,
            "section loaded"
        );

        Ok(LoadedSection {
            name: raw.section,
            remaining_seconds,
            ledger,
            resumed: prior.len(),
        })
    }
}

/// Starting clock for a section.
///
/// Missing time means a fresh section and falls back to the default. A value
/// that cannot be read as a non-negative `HH:MM:SS` is treated as zero.
#[must_use]
pub fn section_clock(raw: Option<&str>, default_seconds: u32) -> u32 {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return default_seconds;
    };
    match raw.parse::<ClockTime>() {
        Ok(time) => time.as_secs(),
        Err(err) => {
            warn!(raw, error = %err, "unreadable section clock, treating as expired");
            0
        }
    }
}

fn prior_intent(raw: &RawQuestion) -> Option<AttemptIntent> {
    if let Some(answer) = raw.student_answer.as_deref().filter(|a| !a.trim().is_empty()) {
        Some(AttemptIntent::Answer(answer.to_owned()))
    } else if raw.is_review {
        Some(AttemptIntent::Review)
    } else if raw.is_skipped {
        Some(AttemptIntent::Skip)
    } else {
        None
    }
}

fn normalize_question(raw: RawQuestion) -> Question {
    let sequence_id = SequenceId::new(raw.react_order);
    let body = match (
        raw.question.filter(|stem| !stem.trim().is_empty()),
        raw.options.and_then(normalize_options),
    ) {
        (Some(stem), Some(options)) => QuestionBody::Available { stem, options },
        (None, _) => unavailable(sequence_id, "question text is missing"),
        (Some(_), None) => unavailable(sequence_id, "options are missing or malformed"),
    };
    Question::new(sequence_id, body, raw.correct_answer, raw.explanation)
}

fn unavailable(sequence_id: SequenceId, reason: &str) -> QuestionBody {
    warn!(%sequence_id, reason, "question content unavailable");
    QuestionBody::Unavailable {
        reason: reason.to_owned(),
    }
}

/// Positional label: A, B, ... Z, then 27, 28, ...
fn positional_label(pos: usize) -> String {
    u8::try_from(pos)
        .ok()
        .filter(|p| *p < 26)
        .map_or_else(|| (pos + 1).to_string(), |p| char::from(b'A' + p).to_string())
}

/// Flatten both option shapes into one ordered `{label, text}` list.
///
/// Returns `None` when no usable option remains.
#[must_use]
pub fn normalize_options(raw: RawOptions) -> Option<Vec<QuestionOption>> {
    let options: Vec<QuestionOption> = match raw {
        RawOptions::List(entries) => entries
            .into_iter()
            .enumerate()
            .map(|(pos, entry)| match entry {
                RawOptionEntry::Text(text) => QuestionOption::new(positional_label(pos), text),
                RawOptionEntry::Labeled { label, text } => QuestionOption::new(
                    label
                        .filter(|l| !l.trim().is_empty())
                        .unwrap_or_else(|| positional_label(pos)),
                    text,
                ),
            })
            .collect(),
        RawOptions::Keyed(map) => map
            .into_iter()
            .map(|(label, text)| QuestionOption::new(label, text))
            .collect(),
        RawOptions::Other(_) => return None,
    };

    let options: Vec<QuestionOption> = options
        .into_iter()
        .filter(|opt| !opt.text.trim().is_empty())
        .collect();
    (!options.is_empty()).then_some(options)
}
