//! # Covey Testing
//!
//! Test doubles for the Covey runtime: scripted models that replay canned
//! replies, mock tools that record their arguments and mock coworkers that
//! stand in for whole agents inside a team.
//!
//! All doubles are cheap to clone; clones share their recorded history so a
//! test can hand one clone to the code under test and inspect another.

pub mod mock_coworker;
pub mod mock_model;
pub mod mock_tools;

pub use mock_coworker::MockCoworker;
pub use mock_model::{FailingModel, ScriptedModel};
pub use mock_tools::MockTool;
