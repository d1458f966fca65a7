use chrono::{DateTime, Utc};
use exam_core::model::{CompletedAttempt, ExamSerial, MockWindow, StudentId};
use serde::{Deserialize, Serialize};

use crate::repository::{AnswerRecord, BackendError, RawQuestion, RawSection, SectionPayload};

/// Arguments of the section procedure.
#[derive(Debug, Serialize)]
pub(crate) struct LoadSectionParams<'a> {
    pub p_student_id: &'a str,
    pub p_exam_serial: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentParams<'a> {
    pub p_student_id: &'a str,
}

/// Arguments of the submit procedure, one per question outcome.
#[derive(Debug, Serialize)]
pub(crate) struct SubmitAnswerParams<'a> {
    pub p_student_id: &'a str,
    pub p_exam_serial: u64,
    pub p_react_order: u32,
    pub p_correct_answer: Option<&'a str>,
    pub p_student_answer: Option<&'a str>,
    pub p_is_correct: Option<bool>,
    pub p_is_skipped: bool,
    pub p_is_review: bool,
    pub p_time_remaining: String,
}

impl<'a> SubmitAnswerParams<'a> {
    pub(crate) fn from_record(record: &'a AnswerRecord) -> Self {
        Self {
            p_student_id: record.student_id.as_str(),
            p_exam_serial: record.exam_serial.value(),
            p_react_order: record.sequence_id.value(),
            p_correct_answer: record.correct_answer.as_deref(),
            p_student_answer: record.student_answer.as_deref(),
            p_is_correct: record.is_correct,
            p_is_skipped: record.is_skipped,
            p_is_review: record.is_review,
            p_time_remaining: record.time_remaining.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SectionResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub time_remaining: Option<String>,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

/// Label used when the server sends questions without naming the section.
pub(crate) const UNNAMED_SECTION: &str = "Section";

impl SectionResponse {
    /// `ExamFinished` only when the server says so: `status: "completed"`, or
    /// any other status with neither a section nor questions. A body with no
    /// status, section or questions is rejected so the caller can retry.
    pub(crate) fn into_payload(self) -> Result<SectionPayload, BackendError> {
        let finished = match self.status.as_deref() {
            Some(status) if status.eq_ignore_ascii_case("completed") => true,
            Some(_) => self.section.is_none() && self.questions.is_empty(),
            None => false,
        };
        if finished {
            return Ok(SectionPayload::ExamFinished);
        }
        if self.section.is_none() && self.questions.is_empty() {
            return Err(BackendError::Serialization(
                "section response carries no section and no questions".into(),
            ));
        }
        Ok(SectionPayload::Section(RawSection {
            section: self.section.unwrap_or_else(|| UNNAMED_SECTION.to_owned()),
            time_remaining: self.time_remaining,
            questions: self.questions,
        }))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MockWindowRow {
    pub exam_serial: u64,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl From<MockWindowRow> for MockWindow {
    fn from(row: MockWindowRow) -> Self {
        Self {
            exam_serial: ExamSerial::new(row.exam_serial),
            title: row.title,
            opens_at: row.start_date,
            closes_at: row.end_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletedAttemptRow {
    pub exam_serial: u64,
    pub completed_at: DateTime<Utc>,
}

impl From<CompletedAttemptRow> for CompletedAttempt {
    fn from(row: CompletedAttemptRow) -> Self {
        Self {
            exam_serial: ExamSerial::new(row.exam_serial),
            completed_at: row.completed_at,
        }
    }
}

pub(crate) fn student_params(student_id: &StudentId) -> StudentParams<'_> {
    StudentParams {
        p_student_id: student_id.as_str(),
    }
}
