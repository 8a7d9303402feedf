//! Collaborator ports consumed by the reproduce operation.
//!
//! Target resolution, the run cache and source-control hooks are injected as
//! trait objects so the engine can be driven by real implementations or by
//! in-memory ones in tests.

use super::StageRef;
use crate::errors::{CollectError, RunCacheError};
use crate::graph::DependencyGraph;
use async_trait::async_trait;
use glob::Pattern;

/// Resolves user-facing targets into concrete stages.
pub trait StageCollector: Send + Sync {
    /// Resolves `target` into one or more stages.
    ///
    /// `recursive` treats the target as a directory; `glob` treats it as a
    /// shell-style pattern.
    fn collect(&self, target: &str, recursive: bool, glob: bool) -> Result<Vec<StageRef>, CollectError>;

    /// Resolves `target` into exactly one stage.
    fn get_target(&self, target: &str) -> Result<StageRef, CollectError> {
        let mut stages = self.collect(target, false, false)?;
        match stages.len() {
            1 => Ok(stages.remove(0)),
            count => Err(CollectError::Ambiguous {
                target: target.to_string(),
                count,
            }),
        }
    }
}

/// Store of precomputed stage results.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RunCache: Send + Sync {
    /// Prefetches results for `target`, or for every stage when `None`.
    async fn pull(&self, target: Option<String>) -> Result<(), RunCacheError>;
}

/// Hooks wrapped around a whole reproduce call.
pub trait ScmContext: Send + Sync {
    /// Called before any stage is touched.
    fn enter(&self) {}

    /// Called once the operation finished, successfully or not.
    fn exit(&self, _succeeded: bool) {}
}

/// Source-control hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpScmContext;

impl ScmContext for NoOpScmContext {}

/// A run cache for repositories without a remote able to serve one.
#[derive(Debug, Clone, Default)]
pub struct UnsupportedRunCache {
    reason: String,
}

impl UnsupportedRunCache {
    /// Creates a run cache that always reports `reason` as unsupported.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl RunCache for UnsupportedRunCache {
    async fn pull(&self, _target: Option<String>) -> Result<(), RunCacheError> {
        Err(RunCacheError::NotSupported(self.reason.clone()))
    }
}

/// Resolves targets against the stages of a graph.
///
/// A target matches a stage when it equals the stage address, when it names
/// the definition file the stage lives in (`dir/dvc.yaml` for
/// `dir/dvc.yaml:train`), or, with `recursive`, when it is a directory the
/// stage lives under. With `glob` the target is a shell-style pattern
/// (`*`, `?`, `[...]`, `[!...]`) matched against the whole address.
#[derive(Debug, Clone)]
pub struct GraphStageCollector {
    stages: Vec<StageRef>,
}

impl GraphStageCollector {
    /// Creates a collector over the stages of `graph`.
    #[must_use]
    pub fn new(graph: &DependencyGraph) -> Self {
        Self {
            stages: graph.stages().to_vec(),
        }
    }

    fn matches_exact(address: &str, target: &str) -> bool {
        address == target
            || address
                .strip_prefix(target)
                .is_some_and(|rest| rest.starts_with(':'))
    }

    fn matches_directory(address: &str, target: &str) -> bool {
        let dir = target.trim_end_matches('/');
        if dir.is_empty() || dir == "." {
            return true;
        }
        address
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl StageCollector for GraphStageCollector {
    fn collect(&self, target: &str, recursive: bool, glob: bool) -> Result<Vec<StageRef>, CollectError> {
        let matched: Vec<StageRef> = if glob {
            let pattern = Pattern::new(target).map_err(|e| CollectError::InvalidPattern {
                target: target.to_string(),
                reason: e.to_string(),
            })?;
            self.stages
                .iter()
                .filter(|s| pattern.matches(s.address()))
                .cloned()
                .collect()
        } else {
            self.stages
                .iter()
                .filter(|s| {
                    Self::matches_exact(s.address(), target)
                        || (recursive && Self::matches_directory(s.address(), target))
                })
                .cloned()
                .collect()
        };

        if matched.is_empty() {
            return Err(CollectError::NoStagesMatched {
                target: target.to_string(),
            });
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addresses, stage};

    fn collector() -> GraphStageCollector {
        let graph = DependencyGraph::from_parts(
            [
                stage("dvc.yaml:prepare"),
                stage("dvc.yaml:train"),
                stage("models/dvc.yaml:evaluate"),
                stage("models/nested/dvc.yaml:export"),
                stage("data.dvc"),
            ],
            [],
        )
        .unwrap();
        GraphStageCollector::new(&graph)
    }

    #[test]
    fn test_collect_exact_address() {
        let stages = collector().collect("dvc.yaml:train", false, false).unwrap();
        assert_eq!(addresses(&stages), vec!["dvc.yaml:train"]);
    }

    #[test]
    fn test_collect_definition_file() {
        let stages = collector().collect("dvc.yaml", false, false).unwrap();
        assert_eq!(addresses(&stages), vec!["dvc.yaml:prepare", "dvc.yaml:train"]);
    }

    #[test]
    fn test_collect_recursive_directory() {
        let stages = collector().collect("models/", true, false).unwrap();
        assert_eq!(
            addresses(&stages),
            vec!["models/dvc.yaml:evaluate", "models/nested/dvc.yaml:export"]
        );

        assert!(collector().collect("models", false, false).is_err());
    }

    #[test]
    fn test_collect_glob() {
        let stages = collector().collect("*:t*", false, true).unwrap();
        assert_eq!(addresses(&stages), vec!["dvc.yaml:train"]);

        let stages = collector().collect("data.?vc", false, true).unwrap();
        assert_eq!(addresses(&stages), vec!["data.dvc"]);
    }

    #[test]
    fn test_collect_glob_character_classes() {
        let graph = DependencyGraph::from_parts(
            [stage("dvc.yaml:train1"), stage("dvc.yaml:train2"), stage("dvc.yaml:train3")],
            [],
        )
        .unwrap();
        let c = GraphStageCollector::new(&graph);

        let stages = c.collect("dvc.yaml:train[12]", false, true).unwrap();
        assert_eq!(addresses(&stages), vec!["dvc.yaml:train1", "dvc.yaml:train2"]);

        let stages = c.collect("dvc.yaml:train[!3]", false, true).unwrap();
        assert_eq!(addresses(&stages), vec!["dvc.yaml:train1", "dvc.yaml:train2"]);
    }

    #[test]
    fn test_collect_invalid_glob() {
        let err = collector().collect("dvc.yaml:train[", false, true).unwrap_err();
        assert!(matches!(err, CollectError::InvalidPattern { .. }));
    }

    #[test]
    fn test_collect_no_match() {
        let err = collector().collect("missing", false, false).unwrap_err();
        assert_eq!(err.to_string(), "'missing' does not exist");
    }

    #[test]
    fn test_get_target_requires_single_stage() {
        let c = collector();
        assert_eq!(c.get_target("data.dvc").unwrap().address(), "data.dvc");
        assert!(matches!(
            c.get_target("dvc.yaml"),
            Err(CollectError::Ambiguous { count: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_unsupported_run_cache() {
        let cache = UnsupportedRunCache::new("no remote");
        let err = cache.pull(None).await.unwrap_err();
        assert!(matches!(err, RunCacheError::NotSupported(_)));
    }
}
