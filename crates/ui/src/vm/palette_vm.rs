use exam_core::AnswerLedger;
use exam_core::model::{AttemptStatus, SequenceId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteStatus {
    Answered,
    Skipped,
    Marked,
    Unanswered,
}

impl From<AttemptStatus> for PaletteStatus {
    fn from(status: AttemptStatus) -> Self {
        match status {
            AttemptStatus::Answered => Self::Answered,
            AttemptStatus::Skipped => Self::Skipped,
            AttemptStatus::Marked => Self::Marked,
            AttemptStatus::Unanswered => Self::Unanswered,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteCellVm {
    pub sequence_id: SequenceId,
    /// 1-based position shown on the palette button.
    pub number: usize,
    pub status: PaletteStatus,
    pub is_current: bool,
    pub is_unavailable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteVm {
    pub cells: Vec<PaletteCellVm>,
    pub answered: usize,
    pub skipped: usize,
    pub marked: usize,
    pub unanswered: usize,
}

impl PaletteVm {
    #[must_use]
    pub fn current(&self) -> Option<&PaletteCellVm> {
        self.cells.iter().find(|cell| cell.is_current)
    }

    #[must_use]
    pub fn legend(&self) -> String {
        format!(
            "{} answered · {} skipped · {} marked · {} not visited",
            self.answered, self.skipped, self.marked, self.unanswered
        )
    }
}

/// Derive the palette from the ledger. Holds no state of its own.
#[must_use]
pub fn map_palette(ledger: &AnswerLedger, current: usize) -> PaletteVm {
    let cells = ledger
        .iter()
        .enumerate()
        .map(|(pos, attempt)| PaletteCellVm {
            sequence_id: attempt.sequence_id(),
            number: pos + 1,
            status: attempt.status().into(),
            is_current: pos == current,
            is_unavailable: !attempt.question().body().is_available(),
        })
        .collect();
    let summary = ledger.summary();

    PaletteVm {
        cells,
        answered: summary.answered,
        skipped: summary.skipped,
        marked: summary.marked,
        unanswered: summary.unanswered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{AttemptIntent, Question, QuestionBody, QuestionOption};

    fn ledger() -> AnswerLedger {
        let available = |id: u32| {
            Question::new(
                SequenceId::new(id),
                QuestionBody::Available {
                    stem: format!("Q{id}"),
                    options: vec![QuestionOption::new("A", "a")],
                },
                None,
                None,
            )
        };
        let broken = Question::new(
            SequenceId::new(4),
            QuestionBody::Unavailable {
                reason: "missing".into(),
            },
            None,
            None,
        );
        AnswerLedger::new(vec![available(1), available(2), available(3), broken]).unwrap()
    }

    #[test]
    fn cells_follow_ledger_status() {
        let mut ledger = ledger();
        ledger
            .update(SequenceId::new(1), &AttemptIntent::Answer("A".into()))
            .unwrap();
        ledger.update(SequenceId::new(2), &AttemptIntent::Review).unwrap();

        let palette = map_palette(&ledger, 2);
        let statuses: Vec<PaletteStatus> = palette.cells.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                PaletteStatus::Answered,
                PaletteStatus::Marked,
                PaletteStatus::Unanswered,
                PaletteStatus::Unanswered,
            ]
        );
        assert_eq!(palette.current().unwrap().sequence_id, SequenceId::new(3));
        assert!(palette.cells[3].is_unavailable);
        assert_eq!(
            palette.answered + palette.skipped + palette.marked + palette.unanswered,
            palette.cells.len()
        );
    }

    #[test]
    fn recomputes_after_each_mutation() {
        let mut ledger = ledger();
        assert_eq!(map_palette(&ledger, 0).unanswered, 4);
        ledger.update(SequenceId::new(3), &AttemptIntent::Skip).unwrap();
        let palette = map_palette(&ledger, 0);
        assert_eq!(palette.skipped, 1);
        assert_eq!(palette.unanswered, 3);
        assert_eq!(palette.legend(), "0 answered · 1 skipped · 0 marked · 3 not visited");
    }
}
