//! Options and targets for a reproduce call.

use crate::stages::StageFlags;
use serde::{Deserialize, Serialize};

/// Options controlling a reproduce call.
///
/// All flags default to `false` except `run_cache`.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReproduceOptions {
    /// Treat directory targets recursively.
    #[serde(default)]
    pub recursive: bool,
    /// Reproduce the whole pipeline each target belongs to.
    #[serde(default)]
    pub pipeline: bool,
    /// Reproduce every pipeline in the repository.
    #[serde(default)]
    pub all_pipelines: bool,
    /// Once a stage changes, force every later stage in the run.
    #[serde(default)]
    pub force_downstream: bool,
    /// Evaluate what depends on the targets instead of what they depend on.
    #[serde(default)]
    pub downstream: bool,
    /// Run exactly the resolved stages, without expanding or pruning.
    #[serde(default)]
    pub single_item: bool,
    /// Prefetch results before reproducing.
    #[serde(default)]
    pub pull: bool,
    /// Allow the prefetch to use the run cache.
    #[serde(default = "default_run_cache")]
    pub run_cache: bool,
    /// Only report what would run.
    #[serde(default)]
    pub dry: bool,
    /// Re-execute every stage regardless of change detection.
    #[serde(default)]
    pub force: bool,
    /// Ask before executing each stage.
    #[serde(default)]
    pub interactive: bool,
    /// Treat targets as shell-style patterns.
    #[serde(default)]
    pub glob: bool,
}

fn default_run_cache() -> bool {
    true
}

impl Default for ReproduceOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            pipeline: false,
            all_pipelines: false,
            force_downstream: false,
            downstream: false,
            single_item: false,
            pull: false,
            run_cache: default_run_cache(),
            dry: false,
            force: false,
            interactive: false,
            glob: false,
        }
    }
}

impl ReproduceOptions {
    /// Creates options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets recursive target resolution.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Sets whole-pipeline mode.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: bool) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Sets all-pipelines mode.
    #[must_use]
    pub fn with_all_pipelines(mut self, all_pipelines: bool) -> Self {
        self.all_pipelines = all_pipelines;
        self
    }

    /// Sets force-downstream propagation.
    #[must_use]
    pub fn with_force_downstream(mut self, force_downstream: bool) -> Self {
        self.force_downstream = force_downstream;
        self
    }

    /// Sets downstream evaluation.
    #[must_use]
    pub fn with_downstream(mut self, downstream: bool) -> Self {
        self.downstream = downstream;
        self
    }

    /// Sets single-item mode.
    #[must_use]
    pub fn with_single_item(mut self, single_item: bool) -> Self {
        self.single_item = single_item;
        self
    }

    /// Sets run cache prefetching.
    #[must_use]
    pub fn with_pull(mut self, pull: bool) -> Self {
        self.pull = pull;
        self
    }

    /// Allows or forbids the run cache.
    #[must_use]
    pub fn with_run_cache(mut self, run_cache: bool) -> Self {
        self.run_cache = run_cache;
        self
    }

    /// Sets dry-run mode.
    #[must_use]
    pub fn with_dry(mut self, dry: bool) -> Self {
        self.dry = dry;
        self
    }

    /// Forces every stage.
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Sets interactive mode.
    #[must_use]
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Sets glob target matching.
    #[must_use]
    pub fn with_glob(mut self, glob: bool) -> Self {
        self.glob = glob;
        self
    }

    /// The flags forwarded to each stage at the start of a run.
    #[must_use]
    pub fn stage_flags(&self) -> StageFlags {
        StageFlags {
            force: self.force,
            dry: self.dry,
            interactive: self.interactive,
        }
    }
}

/// Targets of a reproduce call: none, one, or many.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets(Vec<String>);

impl Targets {
    /// No explicit targets.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if no target was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolves the effective target list.
    ///
    /// Without targets, the project file is used unless every pipeline is
    /// being reproduced anyway.
    #[must_use]
    pub fn normalize(self, all_pipelines: bool, project_file: &str) -> Vec<String> {
        if self.0.is_empty() && !all_pipelines {
            return vec![project_file.to_string()];
        }
        self.0
    }
}

impl From<&str> for Targets {
    fn from(target: &str) -> Self {
        Self(vec![target.to_string()])
    }
}

impl From<String> for Targets {
    fn from(target: String) -> Self {
        Self(vec![target])
    }
}

impl From<Vec<String>> for Targets {
    fn from(targets: Vec<String>) -> Self {
        Self(targets)
    }
}

impl From<Vec<&str>> for Targets {
    fn from(targets: Vec<&str>) -> Self {
        Self(targets.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Targets {
    fn from(targets: [&str; N]) -> Self {
        Self(targets.iter().map(|t| (*t).to_string()).collect())
    }
}

impl<T: Into<Targets>> From<Option<T>> for Targets {
    fn from(targets: Option<T>) -> Self {
        targets.map_or_else(Self::none, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReproduceOptions::default();
        assert!(options.run_cache);
        assert!(!options.pull);
        assert!(!options.force_downstream);
        assert!(!options.single_item);
        assert_eq!(options.stage_flags(), StageFlags::default());
    }

    #[test]
    fn test_builder() {
        let options = ReproduceOptions::new()
            .with_force(true)
            .with_dry(true)
            .with_downstream(true);

        assert!(options.downstream);
        let flags = options.stage_flags();
        assert!(flags.force && flags.dry && !flags.interactive);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ReproduceOptions = serde_json::from_str(r#"{"pull": true}"#).unwrap();
        assert!(options.pull);
        assert!(options.run_cache);
    }

    #[test]
    fn test_single_target_becomes_sequence() {
        let targets: Targets = "train".into();
        assert_eq!(targets.normalize(false, "dvc.yaml"), vec!["train"]);
    }

    #[test]
    fn test_missing_targets_default_to_project_file() {
        assert_eq!(Targets::none().normalize(false, "dvc.yaml"), vec!["dvc.yaml"]);
        assert!(Targets::none().normalize(true, "dvc.yaml").is_empty());
        assert_eq!(Targets::from(Option::<&str>::None), Targets::none());
    }

    #[test]
    fn test_many_targets_keep_order() {
        let targets = Targets::from(["b", "a"]);
        assert_eq!(targets.normalize(true, "dvc.yaml"), vec!["b", "a"]);
    }
}
