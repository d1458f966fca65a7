use exam_core::LedgerSummary;

/// Snapshot of where the student is in the current section, for status lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionProgress {
    pub section: String,
    pub section_number: u32,
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub remaining_seconds: Option<u32>,
    pub summary: LedgerSummary,
}
