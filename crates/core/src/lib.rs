#![forbid(unsafe_code)]

pub mod ledger;
pub mod model;
pub mod time;

pub use ledger::{AnswerLedger, LedgerError, LedgerSummary};
pub use time::Clock;
