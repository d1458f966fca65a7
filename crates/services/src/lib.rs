#![forbid(unsafe_code)]

pub mod config;
pub mod dashboard;
pub mod error;
pub mod sessions;
pub mod timer;

pub use exam_core::Clock;

pub use config::ExamConfig;
pub use dashboard::{DashboardEntry, DashboardService};
pub use error::{DashboardError, LoadError, SessionError};
pub use sessions::{ExamSessionController, SectionProgress, SubmitStats};
pub use timer::{TickOutcome, TimerTick};
