use chrono::{DateTime, Utc};

use crate::model::ExamSerial;

/// A published mock exam and the period during which it can be attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWindow {
    pub exam_serial: ExamSerial,
    pub title: String,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    Upcoming,
    Open,
    Closed,
}

impl MockWindow {
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> WindowStatus {
        if now < self.opens_at {
            WindowStatus::Upcoming
        } else if now >= self.closes_at {
            WindowStatus::Closed
        } else {
            WindowStatus::Open
        }
    }
}

/// A finished attempt of a mock exam by one student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedAttempt {
    pub exam_serial: ExamSerial,
    pub completed_at: DateTime<Utc>,
}
