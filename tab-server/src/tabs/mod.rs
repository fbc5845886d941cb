//! Tab lifecycle
//!
//! - **machine**: allowed status transitions
//! - **service**: tab and item commands, each in one DB transaction

pub mod machine;
pub mod service;

#[cfg(test)]
mod tests;

pub use machine::Transition;
pub use service::TabOutcome;
