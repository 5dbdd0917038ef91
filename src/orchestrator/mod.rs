//! Polling, dispatch and per-task handling.
//!
//! - [`service::ServiceLoop`] visits every repository on a timer.
//! - [`repository::RepositoryOrchestrator`] runs one poll-then-drain cycle.
//! - [`handler::TaskRunner`] turns one issue or comment into commits and replies.

pub mod handler;
pub mod repository;
pub mod service;

pub use handler::{AppliedChange, RunnerOptions, TaskRunner};
pub use repository::{CycleSummary, RepositoryOrchestrator};
pub use service::ServiceLoop;
