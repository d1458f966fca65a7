use std::time::Duration;

use exam_core::model::{QuestionBody, SequenceId, SessionState};
use services::{ExamSessionController, SessionError, SubmitStats, TickOutcome, TimerTick};

use super::palette_vm::{PaletteVm, map_palette};
use super::time_fmt::format_clock;
use crate::state::ViewError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExamIntent {
    Select(String),
    ClearSelection,
    Next,
    Skip,
    Review,
    Jump(SequenceId),
    ContinueSection,
    RetryLoad,
    RequestFinish,
    ConfirmFinish,
    CancelFinish,
    Leave,
}

/// Which screen the exam view shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExamScreen {
    Loading,
    Question,
    SectionComplete,
    ExamComplete,
    Left,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub label: String,
    pub text: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionVm {
    pub sequence_id: SequenceId,
    pub number: usize,
    pub total: usize,
    pub stem: Option<String>,
    pub options: Vec<OptionVm>,
    pub unavailable_reason: Option<String>,
}

pub struct ExamVm {
    controller: ExamSessionController,
    confirming_finish: bool,
    left: bool,
    error: Option<ViewError>,
}

/// Build the view model and load the first section.
///
/// A load failure is kept on the view (see `ExamVm::error`) so the screen can
/// offer a retry instead of failing construction.
pub async fn start_exam(controller: ExamSessionController) -> ExamVm {
    let mut vm = ExamVm::new(controller);
    vm.apply(ExamIntent::RetryLoad).await;
    vm
}

impl ExamVm {
    #[must_use]
    pub fn new(controller: ExamSessionController) -> Self {
        Self {
            controller,
            confirming_finish: false,
            left: false,
            error: None,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &ExamSessionController {
        &self.controller
    }

    #[must_use]
    pub fn screen(&self) -> ExamScreen {
        if self.left {
            return ExamScreen::Left;
        }
        match self.controller.state() {
            SessionState::Loading => ExamScreen::Loading,
            SessionState::InQuestion => ExamScreen::Question,
            SessionState::SectionComplete => ExamScreen::SectionComplete,
            SessionState::ExamComplete => ExamScreen::ExamComplete,
        }
    }

    /// Last intent's error, cleared by the next successful intent.
    #[must_use]
    pub fn error(&self) -> Option<ViewError> {
        self.error
    }

    #[must_use]
    pub fn is_confirming_finish(&self) -> bool {
        self.confirming_finish
    }

    #[must_use]
    pub fn clock_label(&self) -> String {
        format_clock(self.controller.remaining_seconds())
    }

    #[must_use]
    pub fn section_label(&self) -> Option<String> {
        self.controller.progress().map(|p| {
            format!(
                "Section {} ({}) · Question {} of {}",
                p.section_number, p.section, p.position, p.total
            )
        })
    }

    #[must_use]
    pub fn question(&self) -> Option<QuestionVm> {
        if self.controller.state() != SessionState::InQuestion {
            return None;
        }
        let attempt = self.controller.current_attempt()?;
        let progress = self.controller.progress()?;
        let selection = self.controller.selection();
        let body = attempt.question().body();

        let options = body
            .options()
            .iter()
            .map(|opt| OptionVm {
                label: opt.label.clone(),
                text: opt.text.clone(),
                selected: selection == Some(opt.label.as_str()),
            })
            .collect();
        let unavailable_reason = match body {
            QuestionBody::Unavailable { reason } => Some(reason.clone()),
            QuestionBody::Available { .. } => None,
        };

        Some(QuestionVm {
            sequence_id: attempt.sequence_id(),
            number: progress.position,
            total: progress.total,
            stem: body.stem().map(str::to_owned),
            options,
            unavailable_reason,
        })
    }

    #[must_use]
    pub fn palette(&self) -> Option<PaletteVm> {
        let ledger = self.controller.ledger()?;
        let current = self.controller.current_index()?;
        Some(map_palette(ledger, current))
    }

    /// Sequence id behind a 1-based palette number.
    #[must_use]
    pub fn sequence_at(&self, number: usize) -> Option<SequenceId> {
        let pos = number.checked_sub(1)?;
        self.controller
            .ledger()?
            .at(pos)
            .map(|attempt| attempt.sequence_id())
    }

    #[must_use]
    pub fn can_next(&self) -> bool {
        self.controller.state() == SessionState::InQuestion && self.controller.selection().is_some()
    }

    #[must_use]
    pub fn can_review(&self) -> bool {
        self.controller.state() == SessionState::InQuestion && self.controller.selection().is_none()
    }

    pub async fn apply(&mut self, intent: ExamIntent) {
        let result = self.dispatch(intent).await;
        self.error = result.as_ref().err().map(ViewError::from);
    }

    async fn dispatch(&mut self, intent: ExamIntent) -> Result<(), SessionError> {
        match intent {
            ExamIntent::Select(label) => self.controller.select(&label),
            ExamIntent::ClearSelection => self.controller.clear_selection(),
            ExamIntent::Next => self.controller.next().map(drop),
            ExamIntent::Skip => self.controller.skip().map(drop),
            ExamIntent::Review => self.controller.review().map(drop),
            ExamIntent::Jump(id) => self.controller.jump_to(id),
            ExamIntent::ContinueSection => self.controller.continue_to_next_section().await.map(drop),
            ExamIntent::RetryLoad => self.controller.load_section().await.map(drop),
            ExamIntent::RequestFinish => {
                if self.controller.state().is_terminal() {
                    return Err(SessionError::InvalidState {
                        action: "finish",
                        state: self.controller.state(),
                    });
                }
                self.confirming_finish = true;
                Ok(())
            }
            ExamIntent::CancelFinish => {
                self.confirming_finish = false;
                Ok(())
            }
            ExamIntent::ConfirmFinish => {
                if !self.confirming_finish {
                    return Ok(());
                }
                self.confirming_finish = false;
                self.controller.finish().map(drop)
            }
            ExamIntent::Leave => {
                self.controller.abandon();
                self.left = true;
                Ok(())
            }
        }
    }

    /// Wait for the next section timer beat.
    pub async fn next_tick(&mut self) -> Option<TimerTick> {
        self.controller.recv_tick().await
    }

    pub fn on_tick(&mut self, tick: TimerTick) -> TickOutcome {
        let outcome = self.controller.on_tick(tick);
        if outcome == TickOutcome::Expired {
            self.confirming_finish = false;
        }
        outcome
    }

    pub async fn flush(&mut self) -> SubmitStats {
        self.controller.drain_submissions().await
    }

    pub async fn flush_within(&mut self, limit: Duration) -> SubmitStats {
        self.controller.drain_submissions_within(limit).await
    }
}
