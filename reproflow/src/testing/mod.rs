//! Testing utilities for reproflow.
//!
//! This module provides:
//! - Recording stages and a shared call log
//! - Graph fixtures
//! - Plan assertions

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{addresses, assert_plan_members, assert_respects_dependencies};
pub use fixtures::{diamond_graph, diamond_graph_with, layered_graph, stage, DIAMOND_EDGES, DIAMOND_STAGES};
pub use mocks::{CallKind, CallLog, RecordedCall, RecordingStage};
