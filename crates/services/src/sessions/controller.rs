use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use backend::{AnswerRecord, AnswerSink, SectionSource};
use exam_core::model::{
    AttemptIntent, AttemptStatus, ClockTime, ExamSerial, QuestionAttempt, SequenceId,
    SessionState, StudentId,
};
use exam_core::{AnswerLedger, LedgerSummary};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::gateway::{SubmissionGateway, SubmitStats};
use super::loader::{LoadOutcome, LoadedSection, SectionLoader};
use super::progress::SectionProgress;
use crate::config::ExamConfig;
use crate::error::SessionError;
use crate::timer::{Countdown, SectionTimer, TickOutcome, TimerHandle, TimerTick};

//
// ─── SECTION STATE ─────────────────────────────────────────────────────────────
//

/// Per-section session data. Replaced wholesale on every section load.
#[derive(Debug)]
struct ExamSession {
    section: String,
    ledger: AnswerLedger,
    current: usize,
    /// Option picked on screen but not yet submitted.
    selection: Option<String>,
    /// Set once an outcome was sent for the current visit; reset on every move.
    visit_submitted: bool,
}

impl ExamSession {
    fn new(loaded: LoadedSection) -> Self {
        let selection = loaded
            .ledger
            .at(0)
            .and_then(|a| a.student_answer().map(str::to_owned));
        Self {
            section: loaded.name,
            ledger: loaded.ledger,
            current: 0,
            selection,
            visit_submitted: false,
        }
    }

    fn current_attempt(&self) -> Option<&QuestionAttempt> {
        self.ledger.at(self.current)
    }

    fn is_last(&self) -> bool {
        self.current + 1 >= self.ledger.len()
    }

    fn move_to(&mut self, pos: usize, restore: bool) {
        self.current = pos;
        self.visit_submitted = false;
        self.selection = if restore {
            self.ledger
                .at(pos)
                .and_then(|a| a.student_answer().map(str::to_owned))
        } else {
            None
        };
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one mock-exam attempt through its sections.
///
/// The controller is the only writer of the answer ledger. It is driven by user
/// actions and by `TimerTick`s received from `recv_tick`; both paths go through
/// `&mut self`, so there is never more than one transition in flight.
pub struct ExamSessionController {
    student_id: StudentId,
    exam_serial: ExamSerial,
    config: ExamConfig,
    loader: SectionLoader,
    gateway: SubmissionGateway,
    state: SessionState,
    session: Option<ExamSession>,
    sections_loaded: u32,
    countdown: Countdown,
    timer: Option<TimerHandle>,
    generation: u64,
    ticks_tx: mpsc::UnboundedSender<TimerTick>,
    ticks_rx: mpsc::UnboundedReceiver<TimerTick>,
    abandoned: bool,
}

impl ExamSessionController {
    #[must_use]
    pub fn new(
        student_id: StudentId,
        exam_serial: ExamSerial,
        config: ExamConfig,
        sections: Arc<dyn SectionSource>,
        answers: Arc<dyn AnswerSink>,
    ) -> Self {
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
        Self {
            loader: SectionLoader::new(sections, config.default_section_seconds),
            gateway: SubmissionGateway::new(answers),
            student_id,
            exam_serial,
            config,
            state: SessionState::Loading,
            session: None,
            sections_loaded: 0,
            countdown: Countdown::default(),
            timer: None,
            generation: 0,
            ticks_tx,
            ticks_rx,
            abandoned: false,
        }
    }

    // ─── accessors ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    #[must_use]
    pub fn exam_serial(&self) -> ExamSerial {
        self.exam_serial
    }

    #[must_use]
    pub fn section_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.section.as_str())
    }

    /// 1-based number of the loaded section within this attempt.
    #[must_use]
    pub fn section_number(&self) -> u32 {
        self.sections_loaded
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.current)
    }

    #[must_use]
    pub fn current_attempt(&self) -> Option<&QuestionAttempt> {
        self.session.as_ref().and_then(ExamSession::current_attempt)
    }

    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.selection.as_deref())
    }

    #[must_use]
    pub fn ledger(&self) -> Option<&AnswerLedger> {
        self.session.as_ref().map(|s| &s.ledger)
    }

    #[must_use]
    pub fn summary(&self) -> LedgerSummary {
        self.ledger().map(AnswerLedger::summary).unwrap_or_default()
    }

    /// `None` while no section timer is active.
    #[must_use]
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.countdown.remaining()
    }

    /// Generation of the running section timer; ticks from any other generation are ignored.
    #[must_use]
    pub fn timer_generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_timer_running(&self) -> bool {
        self.timer.is_some() && self.countdown.is_running()
    }

    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    #[must_use]
    pub fn progress(&self) -> Option<SectionProgress> {
        let session = self.session.as_ref()?;
        Some(SectionProgress {
            section: session.section.clone(),
            section_number: self.sections_loaded,
            position: session.current + 1,
            total: session.ledger.len(),
            remaining_seconds: self.countdown.remaining(),
            summary: session.ledger.summary(),
        })
    }

    #[must_use]
    pub fn submissions_dispatched(&self) -> usize {
        self.gateway.dispatched()
    }

    // ─── loading ───────────────────────────────────────────────────────────────

    /// Load the current section (first start, or retry after a failed load).
    ///
    /// On failure the session stays in `Loading` and nothing of the previous
    /// section is kept.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Load` for backend or content failures and
    /// `SessionError::InvalidState` outside `Loading`.
    pub async fn load_section(&mut self) -> Result<SessionState, SessionError> {
        self.ensure(&[SessionState::Loading], "load section")?;

        let outcome = self
            .loader
            .load(&self.student_id, self.exam_serial)
            .await?;

        match outcome {
            LoadOutcome::ExamFinished => {
                info!(exam_serial = %self.exam_serial, "no section left, exam complete");
                self.enter_exam_complete();
            }
            LoadOutcome::Section(loaded) => self.enter_section(loaded),
        }
        Ok(self.state)
    }

    /// Leave a completed section and load the next one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the section is complete, and
    /// `SessionError::Load` if the next section cannot be fetched (the session is
    /// then in `Loading` and `load_section` retries).
    pub async fn continue_to_next_section(&mut self) -> Result<SessionState, SessionError> {
        self.ensure(&[SessionState::SectionComplete], "continue to next section")?;
        self.stop_timer();
        self.countdown.clear();
        self.session = None;
        self.state = SessionState::Loading;
        self.load_section().await
    }

    fn enter_section(&mut self, loaded: LoadedSection) {
        self.stop_timer();
        let remaining = loaded.remaining_seconds;
        self.session = Some(ExamSession::new(loaded));
        self.sections_loaded += 1;
        self.state = SessionState::InQuestion;

        self.generation += 1;
        self.countdown.start(remaining);
        self.timer = Some(SectionTimer::start(
            self.generation,
            self.config.tick_period,
            self.ticks_tx.clone(),
        ));

        info!(
            exam_serial = %self.exam_serial,
            section = self.section_name().unwrap_or_default(),
            section_number = self.sections_loaded,
            remaining_seconds = remaining,
            "section started"
        );

        if remaining == 0 {
            self.expire();
        }
    }

    // ─── selection ─────────────────────────────────────────────────────────────

    /// Pick an option on the current question. Nothing is sent until an action.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuestionUnavailable` for placeholder questions and
    /// `SessionError::UnknownOption` for labels the question does not offer.
    pub fn select(&mut self, label: &str) -> Result<(), SessionError> {
        self.ensure(&[SessionState::InQuestion], "select")?;
        let session = self.active_session_mut()?;
        let attempt = session
            .current_attempt()
            .ok_or(SessionError::InvalidState {
                action: "select",
                state: SessionState::InQuestion,
            })?;
        let id = attempt.sequence_id();
        let body = attempt.question().body();
        if !body.is_available() {
            return Err(SessionError::QuestionUnavailable(id));
        }
        if !body.has_option(label) {
            return Err(SessionError::UnknownOption(id, label.to_owned()));
        }
        session.selection = Some(label.to_owned());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` outside `InQuestion`.
    pub fn clear_selection(&mut self) -> Result<(), SessionError> {
        self.ensure(&[SessionState::InQuestion], "clear selection")?;
        self.active_session_mut()?.selection = None;
        Ok(())
    }

    // ─── actions ───────────────────────────────────────────────────────────────

    /// Submit the selected option and advance.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` when nothing is selected.
    pub fn next(&mut self) -> Result<SessionState, SessionError> {
        self.ensure(&[SessionState::InQuestion], "next")?;
        let selected = self
            .selection()
            .map(str::to_owned)
            .ok_or(SessionError::NoSelection)?;
        self.act(AttemptIntent::Answer(selected))
    }

    /// Record a skip and advance. Any selection is discarded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` outside `InQuestion`.
    pub fn skip(&mut self) -> Result<SessionState, SessionError> {
        self.ensure(&[SessionState::InQuestion], "skip")?;
        self.act(AttemptIntent::Skip)
    }

    /// Mark for review and advance. Only allowed while nothing is selected.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SelectionPending` when an option is selected.
    pub fn review(&mut self) -> Result<SessionState, SessionError> {
        self.ensure(&[SessionState::InQuestion], "review")?;
        if self.selection().is_some() {
            return Err(SessionError::SelectionPending);
        }
        self.act(AttemptIntent::Review)
    }

    fn act(&mut self, intent: AttemptIntent) -> Result<SessionState, SessionError> {
        self.commit(&intent)?;
        let session = self.active_session_mut()?;
        session.selection = None;
        if session.is_last() {
            self.complete_section();
        } else {
            let next = session.current + 1;
            session.move_to(next, false);
        }
        Ok(self.state)
    }

    /// Jump to any question of the section from the palette.
    ///
    /// A pending selection on the question being left is submitted first; an
    /// untouched question is left as it was. The target's stored answer becomes
    /// the new selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownQuestion` if the id is not in this section.
    pub fn jump_to(&mut self, target: SequenceId) -> Result<(), SessionError> {
        self.ensure(&[SessionState::InQuestion], "jump")?;
        let pos = self
            .active_session()?
            .ledger
            .position(target)
            .ok_or(SessionError::UnknownQuestion(target))?;

        if let Some(selected) = self.selection().map(str::to_owned) {
            self.commit(&AttemptIntent::Answer(selected))?;
        }
        self.active_session_mut()?.move_to(pos, true);
        debug!(sequence_id = %target, "palette jump");
        Ok(())
    }

    /// Finish the exam. The caller is responsible for asking the student to confirm.
    ///
    /// An outcome for the question on screen is sent unless one was already sent
    /// for this visit. A revisited question with no pending selection keeps its
    /// stored outcome.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once the exam is already complete.
    pub fn finish(&mut self) -> Result<SessionState, SessionError> {
        self.ensure(
            &[
                SessionState::Loading,
                SessionState::InQuestion,
                SessionState::SectionComplete,
            ],
            "finish",
        )?;
        if self.state == SessionState::InQuestion {
            let pending = self.selection().map(str::to_owned);
            let untouched_revisit = pending.is_none()
                && self
                    .current_attempt()
                    .is_some_and(|a| a.status() != AttemptStatus::Unanswered);
            if !untouched_revisit {
                self.commit(&AttemptIntent::Timeout(pending))?;
            }
        }
        self.enter_exam_complete();
        info!(exam_serial = %self.exam_serial, "exam finished by student");
        Ok(self.state)
    }

    /// The student left the exam screen: stop the clock without recording anything.
    pub fn abandon(&mut self) {
        self.stop_timer();
        self.countdown.stop();
        self.abandoned = true;
        debug!(exam_serial = %self.exam_serial, state = %self.state, "session abandoned");
    }

    // ─── timer ─────────────────────────────────────────────────────────────────

    /// Wait for the next tick of the running section timer.
    ///
    /// Returns `None` only if the tick channel closed, which cannot happen while
    /// the controller is alive.
    pub async fn recv_tick(&mut self) -> Option<TimerTick> {
        self.ticks_rx.recv().await
    }

    /// Apply one timer tick. Ticks from replaced timers are ignored.
    pub fn on_tick(&mut self, tick: TimerTick) -> TickOutcome {
        if self.abandoned
            || tick.generation != self.generation
            || self.state != SessionState::InQuestion
        {
            return TickOutcome::Idle;
        }
        let outcome = self.countdown.tick();
        if outcome == TickOutcome::Expired {
            self.expire();
        }
        outcome
    }

    fn expire(&mut self) {
        if self.state != SessionState::InQuestion {
            return;
        }
        let pending = self.selection().map(str::to_owned);
        info!(
            exam_serial = %self.exam_serial,
            section = self.section_name().unwrap_or_default(),
            "section time is up"
        );
        if self.commit(&AttemptIntent::Timeout(pending)).is_ok() {
            if let Some(session) = self.session.as_mut() {
                session.selection = None;
            }
        }
        self.complete_section();
    }

    /// Await delivery of every submission dispatched so far.
    pub async fn drain_submissions(&mut self) -> SubmitStats {
        self.gateway.drain().await
    }

    /// Bounded `drain_submissions`; hung calls are reported as pending.
    pub async fn drain_submissions_within(&mut self, limit: Duration) -> SubmitStats {
        self.gateway.drain_within(limit).await
    }

    // ─── internals ─────────────────────────────────────────────────────────────

    fn ensure(&self, allowed: &[SessionState], action: &'static str) -> Result<(), SessionError> {
        if self.abandoned {
            return Err(SessionError::Abandoned);
        }
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                action,
                state: self.state,
            })
        }
    }

    fn active_session(&self) -> Result<&ExamSession, SessionError> {
        self.session.as_ref().ok_or(SessionError::InvalidState {
            action: "access section",
            state: self.state,
        })
    }

    fn active_session_mut(&mut self) -> Result<&mut ExamSession, SessionError> {
        let state = self.state;
        self.session.as_mut().ok_or(SessionError::InvalidState {
            action: "access section",
            state,
        })
    }

    /// Record the outcome for the current visit locally and dispatch it.
    ///
    /// A second commit within the same visit is a no-op.
    fn commit(&mut self, intent: &AttemptIntent) -> Result<(), SessionError> {
        let time_remaining = ClockTime::from_secs(self.countdown.remaining().unwrap_or(0));
        let student_id = self.student_id.clone();
        let exam_serial = self.exam_serial;

        let session = self.active_session_mut()?;
        if session.visit_submitted {
            debug!("outcome already sent for this visit");
            return Ok(());
        }
        let id = session
            .current_attempt()
            .map(QuestionAttempt::sequence_id)
            .ok_or(SessionError::InvalidState {
                action: "submit",
                state: SessionState::InQuestion,
            })?;

        let attempt = session
            .ledger
            .update(id, intent)
            .map_err(|_| SessionError::UnknownQuestion(id))?;
        let fields = attempt.fields().clone();
        let record = AnswerRecord {
            student_id,
            exam_serial,
            sequence_id: id,
            correct_answer: attempt.question().correct_answer().map(str::to_owned),
            student_answer: fields.student_answer,
            is_correct: attempt.is_correct(),
            is_skipped: fields.is_skipped,
            is_review: fields.is_review,
            time_remaining,
        };
        session.visit_submitted = true;

        self.gateway.dispatch(record);
        Ok(())
    }

    fn complete_section(&mut self) {
        self.stop_timer();
        self.countdown.stop();
        self.state = SessionState::SectionComplete;
        info!(
            exam_serial = %self.exam_serial,
            section = self.section_name().unwrap_or_default(),
            "section complete"
        );
    }

    fn enter_exam_complete(&mut self) {
        self.stop_timer();
        self.countdown.clear();
        self.state = SessionState::ExamComplete;
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop();
        }
    }
}

impl Drop for ExamSessionController {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

impl fmt::Debug for ExamSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSessionController")
            .field("exam_serial", &self.exam_serial)
            .field("state", &self.state)
            .field("section", &self.section_name())
            .field("current", &self.current_index())
            .field("remaining", &self.countdown.remaining())
            .field("generation", &self.generation)
            .field("abandoned", &self.abandoned)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{InMemoryBackend, RawOptionEntry, RawOptions, RawQuestion, RawSection};

    fn question(id: u32) -> RawQuestion {
        RawQuestion::new(
            id,
            format!("Question {id}"),
            RawOptions::List(
                ["w", "x", "y", "z"]
                    .iter()
                    .map(|t| RawOptionEntry::Text((*t).to_owned()))
                    .collect(),
            ),
        )
        .with_correct_answer("A")
    }

    fn section(name: &str, n: u32, time: Option<&str>) -> RawSection {
        RawSection {
            section: name.into(),
            time_remaining: time.map(str::to_owned),
            questions: (1..=n).map(question).collect(),
        }
    }

    fn controller(backend: &InMemoryBackend) -> ExamSessionController {
        ExamSessionController::new(
            StudentId::new("stu-1"),
            ExamSerial::new(11),
            ExamConfig::default(),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
        )
    }

    fn tick(c: &mut ExamSessionController) -> TickOutcome {
        let generation = c.timer_generation();
        c.on_tick(TimerTick { generation })
    }

    #[tokio::test]
    async fn load_starts_first_question_with_server_clock() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 3, Some("00:10:00")));
        let mut c = controller(&backend);

        assert_eq!(c.load_section().await.unwrap(), SessionState::InQuestion);
        assert_eq!(c.current_index(), Some(0));
        assert_eq!(c.remaining_seconds(), Some(600));
        assert_eq!(c.section_name(), Some("A"));
        assert_eq!(c.section_number(), 1);
        assert!(c.is_timer_running());
        assert_eq!(backend.load_calls(), vec![(StudentId::new("stu-1"), ExamSerial::new(11))]);
    }

    #[tokio::test]
    async fn missing_clock_uses_default() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 1, None));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();
        assert_eq!(c.remaining_seconds(), Some(2520));
    }

    #[tokio::test]
    async fn failed_load_stays_loading_and_can_retry() {
        let backend = InMemoryBackend::new();
        backend.push_load_failure(backend::BackendError::HttpStatus(500));
        backend.push_section(section("A", 2, None));
        let mut c = controller(&backend);

        let err = c.load_section().await.unwrap_err();
        assert!(matches!(err, SessionError::Load(_)));
        assert_eq!(c.state(), SessionState::Loading);
        assert!(c.ledger().is_none());
        assert_eq!(c.remaining_seconds(), None);

        assert_eq!(c.load_section().await.unwrap(), SessionState::InQuestion);
    }

    #[tokio::test]
    async fn next_requires_a_selection() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 2, None));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();

        assert_eq!(c.next().unwrap_err(), SessionError::NoSelection);
        assert!(matches!(c.select("Q"), Err(SessionError::UnknownOption(_, _))));
        c.select("B").unwrap();
        assert_eq!(c.review().unwrap_err(), SessionError::SelectionPending);
        c.clear_selection().unwrap();
        c.review().unwrap();
        assert_eq!(c.current_index(), Some(1));
        assert_eq!(c.summary().marked, 1);
    }

    #[tokio::test]
    async fn next_records_answer_and_correctness() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 2, Some("00:05:00")));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();

        c.select("A").unwrap();
        c.next().unwrap();
        assert_eq!(c.selection(), None);
        c.drain_submissions().await;

        let sent = backend.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].sequence_id, SequenceId::new(1));
        assert_eq!(sent[0].student_answer.as_deref(), Some("A"));
        assert_eq!(sent[0].is_correct, Some(true));
        assert!(!sent[0].is_skipped && !sent[0].is_review);
        assert_eq!(sent[0].time_remaining.to_string(), "00:05:00");
    }

    #[tokio::test]
    async fn last_question_completes_section_and_stops_timer() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 1, None));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();

        assert_eq!(c.skip().unwrap(), SessionState::SectionComplete);
        assert!(!c.is_timer_running());
        assert_eq!(tick(&mut c), TickOutcome::Idle);
        assert!(matches!(c.skip(), Err(SessionError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn expiry_submits_selection_as_answer() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 3, Some("00:00:02")));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();

        c.select("C").unwrap();
        assert_eq!(tick(&mut c), TickOutcome::Running(1));
        assert_eq!(tick(&mut c), TickOutcome::Expired);
        assert_eq!(c.state(), SessionState::SectionComplete);
        assert_eq!(c.remaining_seconds(), Some(0));
        c.drain_submissions().await;

        let sent = backend.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].student_answer.as_deref(), Some("C"));
        assert!(!sent[0].is_skipped);
        assert_eq!(sent[0].time_remaining, ClockTime::ZERO);
        let summary = c.summary();
        assert_eq!(summary.answered, 1);
        assert_eq!(summary.unanswered, 2);
    }

    #[tokio::test]
    async fn zero_clock_expires_immediately() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 2, Some("garbage")));
        let mut c = controller(&backend);

        assert_eq!(c.load_section().await.unwrap(), SessionState::SectionComplete);
        c.drain_submissions().await;
        assert_eq!(backend.submissions().len(), 1);
        assert!(backend.submissions()[0].is_skipped);
    }

    #[tokio::test]
    async fn stale_ticks_are_ignored_after_section_change() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 1, Some("00:00:03")));
        backend.push_section(section("B", 1, Some("00:00:03")));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();
        let old = c.timer_generation();

        c.skip().unwrap();
        c.continue_to_next_section().await.unwrap();
        assert_ne!(c.timer_generation(), old);

        for _ in 0..5 {
            assert_eq!(c.on_tick(TimerTick { generation: old }), TickOutcome::Idle);
        }
        assert_eq!(c.remaining_seconds(), Some(3));
        assert_eq!(c.state(), SessionState::InQuestion);
    }

    #[tokio::test]
    async fn jump_restores_previous_answer() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 3, None));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();

        c.select("D").unwrap();
        c.next().unwrap();
        c.skip().unwrap();
        assert_eq!(c.current_index(), Some(2));

        c.jump_to(SequenceId::new(1)).unwrap();
        assert_eq!(c.current_index(), Some(0));
        assert_eq!(c.selection(), Some("D"));
        assert!(matches!(
            c.jump_to(SequenceId::new(99)),
            Err(SessionError::UnknownQuestion(_))
        ));
    }

    #[tokio::test]
    async fn jump_submits_pending_selection_only() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 3, None));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();

        c.jump_to(SequenceId::new(3)).unwrap();
        c.select("B").unwrap();
        c.jump_to(SequenceId::new(2)).unwrap();
        c.drain_submissions().await;

        let sent = backend.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].sequence_id, SequenceId::new(3));
        assert_eq!(
            c.ledger().unwrap().get(SequenceId::new(1)).unwrap().status(),
            AttemptStatus::Unanswered
        );
    }

    #[tokio::test]
    async fn finish_submits_current_question_once() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 2, None));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();

        c.select("A").unwrap();
        assert_eq!(c.finish().unwrap(), SessionState::ExamComplete);
        assert_eq!(c.remaining_seconds(), None);
        assert!(!c.is_timer_running());
        assert!(c.finish().is_err());
        c.drain_submissions().await;
        assert_eq!(backend.submit_calls(), 1);
    }

    #[tokio::test]
    async fn finish_on_marked_revisit_keeps_review_flag() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 3, None));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();

        c.review().unwrap();
        c.jump_to(SequenceId::new(1)).unwrap();
        assert_eq!(c.selection(), None);
        c.finish().unwrap();
        c.drain_submissions().await;

        assert_eq!(backend.submit_calls(), 1);
        assert!(backend.submissions()[0].is_review);
        assert_eq!(
            c.ledger().unwrap().get(SequenceId::new(1)).unwrap().status(),
            AttemptStatus::Marked
        );
    }

    #[tokio::test]
    async fn finish_on_fresh_question_records_a_skip() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 2, None));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();

        c.finish().unwrap();
        c.drain_submissions().await;
        assert_eq!(backend.submit_calls(), 1);
        assert!(backend.submissions()[0].is_skipped);
    }

    #[tokio::test]
    async fn finish_from_section_complete_sends_nothing_more() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 1, None));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();
        c.skip().unwrap();

        c.finish().unwrap();
        c.drain_submissions().await;
        assert_eq!(backend.submit_calls(), 1);
    }

    #[tokio::test]
    async fn no_next_section_completes_exam() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 1, None));
        backend.push_exam_finished();
        let mut c = controller(&backend);
        c.load_section().await.unwrap();
        c.skip().unwrap();

        assert_eq!(
            c.continue_to_next_section().await.unwrap(),
            SessionState::ExamComplete
        );
        assert!(c.ledger().is_none());
    }

    #[tokio::test]
    async fn abandon_stops_everything() {
        let backend = InMemoryBackend::new();
        backend.push_section(section("A", 2, Some("00:00:02")));
        let mut c = controller(&backend);
        c.load_section().await.unwrap();

        c.abandon();
        assert!(c.is_abandoned());
        assert!(!c.is_timer_running());
        assert_eq!(tick(&mut c), TickOutcome::Idle);
        assert_eq!(tick(&mut c), TickOutcome::Idle);
        assert_eq!(c.skip().unwrap_err(), SessionError::Abandoned);
        c.drain_submissions().await;
        assert_eq!(backend.submit_calls(), 0);
    }

    #[tokio::test]
    async fn unavailable_question_can_only_be_skipped() {
        let backend = InMemoryBackend::new();
        let mut broken = question(1);
        broken.options = None;
        backend.push_section(RawSection {
            section: "A".into(),
            time_remaining: None,
            questions: vec![broken, question(2)],
        });
        let mut c = controller(&backend);
        c.load_section().await.unwrap();

        assert_eq!(
            c.select("A").unwrap_err(),
            SessionError::QuestionUnavailable(SequenceId::new(1))
        );
        c.skip().unwrap();
        assert_eq!(c.current_index(), Some(1));
    }
}
