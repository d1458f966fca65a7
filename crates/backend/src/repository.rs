use async_trait::async_trait;
use exam_core::model::{
    ClockTime, CompletedAttempt, ExamSerial, MockWindow, SequenceId, StudentId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by backend adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    #[error("not found")]
    NotFound,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend responded with status {0}")]
    HttpStatus(u16),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── SECTION WIRE SHAPES ───────────────────────────────────────────────────────
//

/// One option entry as the backend sends it: a bare string or a labelled object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOptionEntry {
    Text(String),
    Labeled {
        #[serde(default)]
        label: Option<String>,
        text: String,
    },
}

/// Options arrive either as an ordered array or as a label-keyed map.
///
/// Anything else is kept as `Other` so the loader can mark the question unavailable
/// instead of failing the whole section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOptions {
    List(Vec<RawOptionEntry>),
    Keyed(BTreeMap<String, String>),
    Other(serde_json::Value),
}

/// Question row as returned by the section procedure, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub react_order: u32,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Option<RawOptions>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    /// Previously stored outcome, present when resuming a section.
    #[serde(default)]
    pub student_answer: Option<String>,
    #[serde(default)]
    pub is_skipped: bool,
    #[serde(default)]
    pub is_review: bool,
}

impl RawQuestion {
    #[must_use]
    pub fn new(react_order: u32, question: impl Into<String>, options: RawOptions) -> Self {
        Self {
            react_order,
            question: Some(question.into()),
            options: Some(options),
            correct_answer: None,
            explanation: None,
            student_answer: None,
            is_skipped: false,
            is_review: false,
        }
    }

    #[must_use]
    pub fn with_correct_answer(mut self, answer: impl Into<String>) -> Self {
        self.correct_answer = Some(answer.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSection {
    pub section: String,
    /// `"HH:MM:SS"`; absent when the server has no stored clock for this section.
    #[serde(default)]
    pub time_remaining: Option<String>,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionPayload {
    Section(RawSection),
    /// The exam has no section left for this student.
    ExamFinished,
}

/// Durable record of one question outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub student_id: StudentId,
    pub exam_serial: ExamSerial,
    pub sequence_id: SequenceId,
    pub correct_answer: Option<String>,
    pub student_answer: Option<String>,
    pub is_correct: Option<bool>,
    pub is_skipped: bool,
    pub is_review: bool,
    pub time_remaining: ClockTime,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait SectionSource: Send + Sync {
    /// Fetch the current (or next unfinished) section of an exam for a student.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the section cannot be fetched or decoded.
    async fn load_section(
        &self,
        student_id: &StudentId,
        exam_serial: ExamSerial,
    ) -> Result<SectionPayload, BackendError>;
}

#[async_trait]
pub trait AnswerSink: Send + Sync {
    /// Persist one answer record. The backend keeps the last write per question.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the record was not accepted.
    async fn submit_answer(&self, record: &AnswerRecord) -> Result<(), BackendError>;
}

#[async_trait]
pub trait MockCatalog: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` on transport or decoding failures.
    async fn mock_windows(&self) -> Result<Vec<MockWindow>, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` on transport or decoding failures.
    async fn completed_attempts(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<CompletedAttempt>, BackendError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    sections: VecDeque<Result<SectionPayload, BackendError>>,
    load_calls: Vec<(StudentId, ExamSerial)>,
    submit_calls: usize,
    failing_submits: usize,
    submissions: Vec<AnswerRecord>,
    windows: Vec<MockWindow>,
    completed: Vec<(StudentId, CompletedAttempt)>,
}

/// Scripted in-memory backend for tests and offline runs.
///
/// Sections are served in the order they were pushed; submissions are recorded.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut InMemoryState) -> T) -> Result<T, BackendError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(f(&mut guard))
    }

    fn script(&self, entry: Result<SectionPayload, BackendError>) {
        let _ = self.with_state(|s| s.sections.push_back(entry));
    }

    pub fn push_section(&self, section: RawSection) {
        self.script(Ok(SectionPayload::Section(section)));
    }

    pub fn push_exam_finished(&self) {
        self.script(Ok(SectionPayload::ExamFinished));
    }

    pub fn push_load_failure(&self, err: BackendError) {
        self.script(Err(err));
    }

    /// Reject the next `count` submissions with a transport error.
    pub fn fail_next_submissions(&self, count: usize) {
        let _ = self.with_state(|s| s.failing_submits = count);
    }

    pub fn add_window(&self, window: MockWindow) {
        let _ = self.with_state(|s| s.windows.push(window));
    }

    pub fn add_completed(&self, student_id: StudentId, attempt: CompletedAttempt) {
        let _ = self.with_state(|s| s.completed.push((student_id, attempt)));
    }

    /// Accepted submissions, in arrival order.
    #[must_use]
    pub fn submissions(&self) -> Vec<AnswerRecord> {
        self.with_state(|s| s.submissions.clone()).unwrap_or_default()
    }

    /// Every submit call, accepted or rejected.
    #[must_use]
    pub fn submit_calls(&self) -> usize {
        self.with_state(|s| s.submit_calls).unwrap_or_default()
    }

    #[must_use]
    pub fn load_calls(&self) -> Vec<(StudentId, ExamSerial)> {
        self.with_state(|s| s.load_calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SectionSource for InMemoryBackend {
    async fn load_section(
        &self,
        student_id: &StudentId,
        exam_serial: ExamSerial,
    ) -> Result<SectionPayload, BackendError> {
        self.with_state(|s| {
            s.load_calls.push((student_id.clone(), exam_serial));
            s.sections.pop_front().unwrap_or(Err(BackendError::NotFound))
        })?
    }
}

#[async_trait]
impl AnswerSink for InMemoryBackend {
    async fn submit_answer(&self, record: &AnswerRecord) -> Result<(), BackendError> {
        self.with_state(|s| {
            s.submit_calls += 1;
            if s.failing_submits > 0 {
                s.failing_submits -= 1;
                return Err(BackendError::Transport("simulated network failure".into()));
            }
            s.submissions.push(record.clone());
            Ok(())
        })?
    }
}

#[async_trait]
impl MockCatalog for InMemoryBackend {
    async fn mock_windows(&self) -> Result<Vec<MockWindow>, BackendError> {
        self.with_state(|s| s.windows.clone())
    }

    async fn completed_attempts(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<CompletedAttempt>, BackendError> {
        self.with_state(|s| {
            s.completed
                .iter()
                .filter(|(owner, _)| owner == student_id)
                .map(|(_, attempt)| attempt.clone())
                .collect()
        })
    }
}

/// Aggregates the remote contracts behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Backend {
    pub sections: Arc<dyn SectionSource>,
    pub answers: Arc<dyn AnswerSink>,
    pub catalog: Arc<dyn MockCatalog>,
}

impl Backend {
    #[must_use]
    pub fn in_memory(backend: InMemoryBackend) -> Self {
        let sections: Arc<dyn SectionSource> = Arc::new(backend.clone());
        let answers: Arc<dyn AnswerSink> = Arc::new(backend.clone());
        let catalog: Arc<dyn MockCatalog> = Arc::new(backend);
        Self {
            sections,
            answers,
            catalog,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str) -> RawSection {
        RawSection {
            section: name.into(),
            time_remaining: Some("00:42:00".into()),
            questions: vec![RawQuestion::new(
                1,
                "Q1",
                RawOptions::List(vec![RawOptionEntry::Text("a".into())]),
            )],
        }
    }

    fn record(seq: u32) -> AnswerRecord {
        AnswerRecord {
            student_id: StudentId::new("s1"),
            exam_serial: ExamSerial::new(7),
            sequence_id: SequenceId::new(seq),
            correct_answer: Some("A".into()),
            student_answer: Some("A".into()),
            is_correct: Some(true),
            is_skipped: false,
            is_review: false,
            time_remaining: ClockTime::from_secs(60),
        }
    }

    #[tokio::test]
    async fn serves_scripted_sections_in_order() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A"));
        backend.push_load_failure(BackendError::HttpStatus(503));
        backend.push_exam_finished();
        let student = StudentId::new("s1");

        let first = backend.load_section(&student, ExamSerial::new(7)).await.unwrap();
        assert!(matches!(first, SectionPayload::Section(ref s) if s.section == "A"));
        let err = backend.load_section(&student, ExamSerial::new(7)).await.unwrap_err();
        assert_eq!(err, BackendError::HttpStatus(503));
        let last = backend.load_section(&student, ExamSerial::new(7)).await.unwrap();
        assert_eq!(last, SectionPayload::ExamFinished);
        assert_eq!(
            backend.load_section(&student, ExamSerial::new(7)).await.unwrap_err(),
            BackendError::NotFound
        );
        assert_eq!(backend.load_calls().len(), 4);
    }

    #[tokio::test]
    async fn failing_submissions_are_counted_but_not_stored() {
        let backend = InMemoryBackend::new();
        backend.fail_next_submissions(1);

        assert!(backend.submit_answer(&record(1)).await.is_err());
        backend.submit_answer(&record(2)).await.unwrap();

        assert_eq!(backend.submit_calls(), 2);
        let stored = backend.submissions();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].sequence_id, SequenceId::new(2));
    }

    #[test]
    fn options_accept_both_wire_shapes() {
        let list: RawOptions =
            serde_json::from_str(r#"["Aspirin", {"label": "B", "text": "Heparin"}]"#).unwrap();
        assert!(matches!(list, RawOptions::List(ref entries) if entries.len() == 2));

        let keyed: RawOptions = serde_json::from_str(r#"{"A": "Aspirin", "B": "Heparin"}"#).unwrap();
        assert!(matches!(keyed, RawOptions::Keyed(ref map) if map.len() == 2));

        let other: RawOptions = serde_json::from_str("42").unwrap();
        assert!(matches!(other, RawOptions::Other(_)));
    }

    #[test]
    fn raw_question_defaults_missing_fields() {
        let q: RawQuestion = serde_json::from_str(r#"{"react_order": 4}"#).unwrap();
        assert_eq!(q.react_order, 4);
        assert!(q.question.is_none());
        assert!(q.options.is_none());
        assert!(!q.is_skipped);
    }
}
