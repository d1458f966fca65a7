mod attempt;
mod clock_time;
mod ids;
mod mock_window;
mod question;
mod session;

pub use attempt::{AttemptIntent, AttemptStatus, QuestionAttempt, SubmissionFields};
pub use clock_time::{ClockTime, ClockTimeError};
pub use ids::{ExamSerial, SequenceId, StudentId};
pub use mock_window::{CompletedAttempt, MockWindow, WindowStatus};
pub use question::{Question, QuestionBody, QuestionOption};
pub use session::SessionState;
