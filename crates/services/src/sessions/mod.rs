mod controller;
mod gateway;
mod loader;
mod progress;

// Public API of the session subsystem.
pub use crate::error::{LoadError, SessionError};
pub use controller::ExamSessionController;
pub use gateway::{SubmissionGateway, SubmitStats};
pub use loader::{LoadOutcome, LoadedSection, SectionLoader, normalize_options, section_clock};
pub use progress::SectionProgress;
