//! Frozen-stage pruning.

use super::DependencyGraph;
use tracing::debug;

/// Returns a copy of `graph` in which every frozen stage has lost its
/// dependency edges.
///
/// Nothing underneath a frozen stage can then be pulled into an evaluation
/// closure through it. The input graph is left untouched.
#[must_use]
pub fn remove_frozen_edges(graph: &DependencyGraph) -> DependencyGraph {
    let mut active = graph.clone();
    for (node, stage) in graph.stages().iter().enumerate() {
        if !stage.is_frozen() {
            continue;
        }
        let removed = active.remove_outgoing(node);
        if removed > 0 {
            debug!(stage = %stage.address(), removed, "Disconnected frozen stage from its dependencies");
        }
    }
    active
}
