//! Grouping a graph into disjoint pipelines.
//!
//! A pipeline is a weakly connected component: stages linked by dependency
//! edges in either direction belong to the same pipeline.

use super::DependencyGraph;
use crate::stages::StageRef;

/// Splits `graph` into its pipelines.
///
/// Pipelines are ordered by their earliest stage; each keeps the parent's
/// node and edge order.
#[must_use]
pub fn get_pipelines(graph: &DependencyGraph) -> Vec<DependencyGraph> {
    let mut assigned = vec![false; graph.len()];
    let mut pipelines = Vec::new();

    for start in 0..graph.len() {
        if assigned[start] {
            continue;
        }

        let mut members = Vec::new();
        let mut stack = vec![start];
        assigned[start] = true;
        while let Some(node) = stack.pop() {
            members.push(node);
            for &n in graph.outgoing_of(node).iter().chain(graph.incoming_of(node)) {
                if !assigned[n] {
                    assigned[n] = true;
                    stack.push(n);
                }
            }
        }

        pipelines.push(graph.induced(&members));
    }

    pipelines
}

/// Returns the pipeline containing `stage`.
#[must_use]
pub fn get_pipeline<'a>(pipelines: &'a [DependencyGraph], stage: &StageRef) -> Option<&'a DependencyGraph> {
    pipelines.iter().find(|p| p.contains(stage.address()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addresses, diamond_graph, stage};

    #[test]
    fn test_connected_graph_is_one_pipeline() {
        let graph = diamond_graph();
        let pipelines = get_pipelines(&graph);

        assert_eq!(pipelines.len(), 1);
        assert_eq!(pipelines[0].len(), 7);
        assert_eq!(pipelines[0].edge_count(), 7);
    }

    #[test]
    fn test_disjoint_pipelines() {
        let graph = DependencyGraph::from_parts(
            [stage("prepare"), stage("train"), stage("fetch"), stage("report"), stage("lonely")],
            [("train", "prepare"), ("report", "fetch")],
        )
        .unwrap();

        let pipelines = get_pipelines(&graph);
        assert_eq!(pipelines.len(), 3);
        assert_eq!(addresses(pipelines[0].stages()), vec!["prepare", "train"]);
        assert_eq!(addresses(pipelines[1].stages()), vec!["fetch", "report"]);
        assert_eq!(addresses(pipelines[2].stages()), vec!["lonely"]);

        assert_eq!(addresses(&pipelines[0].roots()), vec!["train"]);
    }

    #[test]
    fn test_get_pipeline_finds_component() {
        let graph = DependencyGraph::from_parts(
            [stage("a"), stage("b"), stage("c")],
            [("b", "a")],
        )
        .unwrap();
        let pipelines = get_pipelines(&graph);

        let found = get_pipeline(&pipelines, &stage("a")).unwrap();
        assert!(found.contains("b"));
        assert!(!found.contains("c"));
        assert!(get_pipeline(&pipelines, &stage("zzz")).is_none());
    }

    #[test]
    fn test_empty_graph_has_no_pipelines() {
        assert!(get_pipelines(&DependencyGraph::new()).is_empty());
    }
}
