pub mod assign;
pub mod config;
pub mod display;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod roster;
pub mod web;

pub use error::{AssignError, Result};
pub use orchestrator::{Orchestrator, RunResponse};
