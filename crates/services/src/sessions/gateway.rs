use std::sync::Arc;
use std::time::Duration;

use backend::{AnswerRecord, AnswerSink};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

/// Delivery counters for submissions handled so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitStats {
    pub accepted: usize,
    pub failed: usize,
    /// Calls still in flight when the counters were taken.
    pub pending: usize,
}

/// Fire-and-forget delivery of answer records.
///
/// Every record is its own network call on its own task, so a call that
/// never resolves holds up nothing but itself. Failures are logged and
/// dropped; nothing is retried.
pub struct SubmissionGateway {
    sink: Arc<dyn AnswerSink>,
    in_flight: JoinSet<bool>,
    dispatched: usize,
    accepted: usize,
    failed: usize,
}

impl SubmissionGateway {
    #[must_use]
    pub fn new(sink: Arc<dyn AnswerSink>) -> Self {
        Self {
            sink,
            in_flight: JoinSet::new(),
            dispatched: 0,
            accepted: 0,
            failed: 0,
        }
    }

    /// Number of records handed off so far.
    #[must_use]
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    #[must_use]
    pub fn stats(&self) -> SubmitStats {
        SubmitStats {
            accepted: self.accepted,
            failed: self.failed,
            pending: self.in_flight.len(),
        }
    }

    pub fn dispatch(&mut self, record: AnswerRecord) {
        self.reap();
        self.in_flight.spawn(submit(Arc::clone(&self.sink), record));
        self.dispatched += 1;
    }

    /// Wait until every record dispatched so far has been attempted.
    ///
    /// Does not return while a call is hung; use `drain_within` when the
    /// caller cannot wait forever.
    pub async fn drain(&mut self) -> SubmitStats {
        while let Some(result) = self.in_flight.join_next().await {
            self.settle(result);
        }
        self.stats()
    }

    /// Like `drain`, but gives up after `limit`. Calls still running are
    /// reported as `pending` and keep running.
    pub async fn drain_within(&mut self, limit: Duration) -> SubmitStats {
        let deadline = Instant::now() + limit;
        while !self.in_flight.is_empty() {
            match timeout_at(deadline, self.in_flight.join_next()).await {
                Ok(Some(result)) => self.settle(result),
                Ok(None) => break,
                Err(_) => {
                    warn!(pending = self.in_flight.len(), "stopped waiting for answer submissions");
                    break;
                }
            }
        }
        self.stats()
    }

    fn reap(&mut self) {
        while let Some(result) = self.in_flight.try_join_next() {
            self.settle(result);
        }
    }

    fn settle(&mut self, result: Result<bool, JoinError>) {
        match result {
            Ok(true) => self.accepted += 1,
            Ok(false) => self.failed += 1,
            Err(err) => {
                warn!(error = %err, "answer submission task ended abnormally");
                self.failed += 1;
            }
        }
    }
}

impl Drop for SubmissionGateway {
    fn drop(&mut self) {
        // Calls already sent keep running after the session is gone.
        self.in_flight.detach_all();
    }
}

async fn submit(sink: Arc<dyn AnswerSink>, record: AnswerRecord) -> bool {
    match sink.submit_answer(&record).await {
        Ok(()) => {
            debug!(
                exam_serial = %record.exam_serial,
                sequence_id = %record.sequence_id,
                "answer submitted"
            );
            true
        }
        Err(err) => {
            warn!(
                exam_serial = %record.exam_serial,
                sequence_id = %record.sequence_id,
                error = %err,
                "answer submission failed, keeping local state"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{BackendError, InMemoryBackend};
    use exam_core::model::{ClockTime, ExamSerial, SequenceId, StudentId};

    fn record(seq: u32, answer: &str) -> AnswerRecord {
        AnswerRecord {
            student_id: StudentId::new("s1"),
            exam_serial: ExamSerial::new(3),
            sequence_id: SequenceId::new(seq),
            correct_answer: Some("A".into()),
            student_answer: Some(answer.into()),
            is_correct: Some(answer == "A"),
            is_skipped: false,
            is_review: false,
            time_remaining: ClockTime::from_secs(100),
        }
    }

    #[tokio::test]
    async fn drain_without_dispatch_is_empty() {
        let mut gateway = SubmissionGateway::new(Arc::new(InMemoryBackend::new()));
        assert_eq!(gateway.drain().await, SubmitStats::default());
    }

    #[tokio::test]
    async fn every_record_gets_its_own_call() {
        let backend = InMemoryBackend::new();
        let mut gateway = SubmissionGateway::new(Arc::new(backend.clone()));

        gateway.dispatch(record(1, "A"));
        gateway.dispatch(record(2, "B"));
        gateway.dispatch(record(1, "C"));
        let stats = gateway.drain().await;

        assert_eq!(stats, SubmitStats { accepted: 3, failed: 0, pending: 0 });
        let mut sent: Vec<(u32, Option<String>)> = backend
            .submissions()
            .into_iter()
            .map(|r| (r.sequence_id.value(), r.student_answer))
            .collect();
        sent.sort();
        assert_eq!(
            sent,
            vec![
                (1, Some("A".into())),
                (1, Some("C".into())),
                (2, Some("B".into())),
            ]
        );
    }

    /// Never answers for question 1; forwards everything else.
    struct StuckOnFirst(InMemoryBackend);

    #[async_trait::async_trait]
    impl AnswerSink for StuckOnFirst {
        async fn submit_answer(&self, record: &AnswerRecord) -> Result<(), BackendError> {
            if record.sequence_id == SequenceId::new(1) {
                std::future::pending::<()>().await;
            }
            self.0.submit_answer(record).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_does_not_hold_back_other_questions() {
        let backend = InMemoryBackend::new();
        let mut gateway = SubmissionGateway::new(Arc::new(StuckOnFirst(backend.clone())));

        gateway.dispatch(record(1, "A"));
        gateway.dispatch(record(2, "B"));
        gateway.dispatch(record(3, "C"));
        let stats = gateway.drain_within(Duration::from_secs(3600)).await;

        assert_eq!(stats, SubmitStats { accepted: 2, failed: 0, pending: 1 });
        let mut delivered: Vec<u32> = backend
            .submissions()
            .iter()
            .map(|r| r.sequence_id.value())
            .collect();
        delivered.sort_unstable();
        assert_eq!(delivered, vec![2, 3]);
    }

    #[tokio::test]
    async fn failures_are_counted_and_swallowed() {
        let backend = InMemoryBackend::new();
        backend.fail_next_submissions(1);
        let mut gateway = SubmissionGateway::new(Arc::new(backend.clone()));

        gateway.dispatch(record(1, "A"));
        gateway.dispatch(record(2, "A"));
        let stats = gateway.drain().await;

        assert_eq!(stats, SubmitStats { accepted: 1, failed: 1, pending: 0 });
        assert_eq!(gateway.dispatched(), 2);
        assert_eq!(backend.submit_calls(), 2);
        assert_eq!(backend.submissions().len(), 1);
    }
}
