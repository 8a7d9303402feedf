//! Graph fixtures.

use super::RecordingStage;
use crate::graph::DependencyGraph;
use crate::stages::StageRef;
use std::sync::Arc;

/// Stage addresses of the diamond fixture, in insertion order.
pub const DIAMOND_STAGES: [&str; 7] = ["A", "B", "C", "D", "E", "F", "G"];

/// Edges of the diamond fixture as `(dependent, dependency)`.
///
/// ```text
///      A
///     / \
///    B   C
///     \ /
///      D   G
///      |   |
///      |   F
///       \ /
///        E
/// ```
///
/// Dependencies sit above their dependents.
pub const DIAMOND_EDGES: [(&str, &str); 7] = [
    ("B", "A"),
    ("C", "A"),
    ("D", "B"),
    ("D", "C"),
    ("E", "D"),
    ("E", "F"),
    ("F", "G"),
];

/// A plain unchanged stage.
#[must_use]
pub fn stage(address: &str) -> StageRef {
    Arc::new(RecordingStage::new(address))
}

/// The diamond fixture built from plain stages.
#[must_use]
pub fn diamond_graph() -> DependencyGraph {
    diamond_graph_with(|name| RecordingStage::new(name))
}

/// The diamond fixture with each stage built by `make`.
///
/// # Panics
///
/// Panics if `make` returns a stage whose address differs from `name`.
#[must_use]
pub fn diamond_graph_with(make: impl Fn(&str) -> RecordingStage) -> DependencyGraph {
    let stages = DIAMOND_STAGES.iter().map(|name| Arc::new(make(name)) as StageRef);
    DependencyGraph::from_parts(stages, DIAMOND_EDGES).expect("diamond fixture is a valid DAG")
}

/// A layered graph where each stage depends on every stage of the layer below.
///
/// Stage addresses are `L{layer}S{index}`.
///
/// # Panics
///
/// Never in practice; the construction is acyclic.
#[must_use]
pub fn layered_graph(layers: usize, width: usize) -> DependencyGraph {
    let name = |layer: usize, index: usize| format!("L{layer}S{index}");
    let mut graph = DependencyGraph::new();
    for layer in 0..layers {
        for index in 0..width {
            graph
                .add_stage(stage(&name(layer, index)))
                .expect("layered fixture addresses are unique");
            if layer > 0 {
                for below in 0..width {
                    graph
                        .add_dependency(&name(layer, index), &name(layer - 1, below))
                        .expect("layered fixture is a valid DAG");
                }
            }
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diamond_shape() {
        let graph = diamond_graph();
        assert_eq!(graph.len(), 7);
        assert_eq!(graph.edge_count(), 7);
        assert!(graph.has_dependency("E", "F"));
    }

    #[test]
    fn test_layered_shape() {
        let graph = layered_graph(3, 4);
        assert_eq!(graph.len(), 12);
        assert_eq!(graph.edge_count(), 32);
        assert_eq!(graph.roots().len(), 4);
    }
}
