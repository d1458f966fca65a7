use std::collections::HashMap;
use std::sync::Arc;

use backend::MockCatalog;
use chrono::{DateTime, Utc};
use exam_core::Clock;
use exam_core::model::{ExamSerial, MockWindow, StudentId, WindowStatus};

use crate::error::DashboardError;

/// One published mock exam as seen by a particular student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardEntry {
    pub window: MockWindow,
    pub status: WindowStatus,
    /// Latest completion by this student, if any.
    pub completed_at: Option<DateTime<Utc>>,
}

impl DashboardEntry {
    /// Whether a session may be started (or resumed) for this exam now.
    #[must_use]
    pub fn can_start(&self) -> bool {
        self.status == WindowStatus::Open && self.completed_at.is_none()
    }
}

/// Pre-session dashboard: which mock exams exist and which ones the student finished.
#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    catalog: Arc<dyn MockCatalog>,
}

impl DashboardService {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<dyn MockCatalog>) -> Self {
        Self { clock, catalog }
    }

    /// Windows ordered by opening time, merged with the student's completions.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Backend` if either remote call fails.
    pub async fn entries(&self, student_id: &StudentId) -> Result<Vec<DashboardEntry>, DashboardError> {
        let windows = self.catalog.mock_windows().await?;
        let attempts = self.catalog.completed_attempts(student_id).await?;

        let mut latest: HashMap<ExamSerial, DateTime<Utc>> = HashMap::new();
        for attempt in attempts {
            latest
                .entry(attempt.exam_serial)
                .and_modify(|at| *at = (*at).max(attempt.completed_at))
                .or_insert(attempt.completed_at);
        }

        let now = self.clock.now();
        let mut entries: Vec<DashboardEntry> = windows
            .into_iter()
            .map(|window| DashboardEntry {
                status: window.status_at(now),
                completed_at: latest.get(&window.exam_serial).copied(),
                window,
            })
            .collect();
        entries.sort_by_key(|entry| (entry.window.opens_at, entry.window.exam_serial));
        Ok(entries)
    }
}
