mod dashboard_vm;
mod exam_vm;
mod palette_vm;
mod time_fmt;

pub use dashboard_vm::{DashboardCardVm, map_dashboard_cards};
pub use exam_vm::{ExamIntent, ExamScreen, ExamVm, OptionVm, QuestionVm, start_exam};
pub use palette_vm::{PaletteCellVm, PaletteStatus, PaletteVm, map_palette};
pub use time_fmt::{CLOCK_PLACEHOLDER, format_clock, format_date};
