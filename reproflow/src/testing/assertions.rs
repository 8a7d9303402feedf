//! Assertions over stages and evaluation plans.

use crate::graph::{DependencyGraph, EvaluationPlan};
use crate::stages::StageRef;
use std::collections::HashSet;

/// Addresses of `stages`, in order.
#[must_use]
pub fn addresses(stages: &[StageRef]) -> Vec<String> {
    stages.iter().map(|s| s.address().to_string()).collect()
}

/// Asserts that `plan` lists each stage once and that every dependency edge
/// between two planned stages points backwards in the plan.
///
/// # Panics
///
/// Panics when a stage repeats, is unknown to `graph`, or precedes one of its
/// planned dependencies.
pub fn assert_respects_dependencies(graph: &DependencyGraph, plan: &EvaluationPlan) {
    let planned = plan.addresses();
    let unique: HashSet<&String> = planned.iter().collect();
    assert_eq!(unique.len(), planned.len(), "Plan repeats a stage: {planned:?}");

    for (position, address) in planned.iter().enumerate() {
        let dependencies = graph
            .dependencies(address)
            .unwrap_or_else(|e| panic!("Planned stage '{address}' is not in the graph: {e}"));
        for dependency in dependencies {
            if let Some(dep_position) = plan.position(dependency.address()) {
                assert!(
                    dep_position < position,
                    "'{address}' runs before its dependency '{}' in {planned:?}",
                    dependency.address()
                );
            }
        }
    }
}

/// Asserts that `plan` holds exactly `expected`, in any order.
///
/// # Panics
///
/// Panics when the sets differ.
pub fn assert_plan_members(plan: &EvaluationPlan, expected: &[&str]) {
    let mut actual = plan.addresses();
    actual.sort();
    let mut expected: Vec<String> = expected.iter().map(|s| (*s).to_string()).collect();
    expected.sort();
    assert_eq!(actual, expected, "Plan members differ");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{diamond_graph, stage};

    #[test]
    fn test_valid_plan_passes() {
        let graph = diamond_graph();
        let plan = EvaluationPlan::from_stages(vec![stage("A"), stage("C"), stage("B"), stage("D")]);
        assert_respects_dependencies(&graph, &plan);
        assert_plan_members(&plan, &["D", "C", "B", "A"]);
    }

    #[test]
    #[should_panic(expected = "runs before its dependency")]
    fn test_reversed_plan_fails() {
        let graph = diamond_graph();
        let plan = EvaluationPlan::from_stages(vec![stage("B"), stage("A")]);
        assert_respects_dependencies(&graph, &plan);
    }

    #[test]
    #[should_panic(expected = "repeats a stage")]
    fn test_repeated_stage_fails() {
        let graph = diamond_graph();
        let plan = EvaluationPlan::from_stages(vec![stage("A"), stage("A")]);
        assert_respects_dependencies(&graph, &plan);
    }
}
