//! Presentation models for the mock-exam screens.
//!
//! Nothing here renders; the types are plain data a front end can draw from.

pub mod state;
pub mod vm;

pub use state::ViewError;
