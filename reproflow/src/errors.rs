//! Error types for the reproflow engine.
//!
//! Stage-level failures are wrapped into [`ReproductionError`] tagged with the
//! failing stage's address. Graph construction problems surface as
//! [`GraphError`], each carrying a [`ContractErrorInfo`] with a stable code.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for reproflow operations.
#[derive(Debug, Error)]
pub enum ReproflowError {
    /// A stage failed while being reproduced.
    #[error(transparent)]
    Reproduction(#[from] ReproductionError),

    /// The dependency graph is malformed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The run cache could not be prefetched.
    #[error(transparent)]
    RunCache(#[from] RunCacheError),

    /// A target could not be resolved into stages.
    #[error(transparent)]
    Collect(#[from] CollectError),

    /// The repository configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ReproflowError {
    /// Returns the address of the failing stage for reproduction failures.
    #[must_use]
    pub fn stage_address(&self) -> Option<&str> {
        match self {
            Self::Reproduction(err) => Some(&err.address),
            _ => None,
        }
    }
}

/// Metadata about a graph contract violation for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "GRAPH-004-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Raised when a stage's reproduce or persist call fails.
///
/// The whole run is aborted; stages reproduced before the failure keep
/// their persisted state.
#[derive(Debug, Error)]
#[error("failed to reproduce '{address}'")]
pub struct ReproductionError {
    /// Address of the failing stage.
    pub address: String,
    /// The underlying cause.
    #[source]
    pub source: anyhow::Error,
}

impl ReproductionError {
    /// Creates a new reproduction error for the given stage address.
    #[must_use]
    pub fn new(address: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            address: address.into(),
            source,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("ReproductionError"));
        map.insert("stage".to_string(), serde_json::json!(self.address));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map.insert("cause".to_string(), serde_json::json!(format!("{:#}", self.source)));
        map
    }
}

/// Errors raised while building or querying a dependency graph.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// Two stages share the same address.
    #[error("Stage '{address}' is already part of the graph")]
    DuplicateStage {
        /// The duplicated address.
        address: String,
    },

    /// An edge or query references a stage that is not in the graph.
    #[error("Unknown stage '{address}'")]
    UnknownStage {
        /// The unknown address.
        address: String,
    },

    /// A stage declares a dependency on itself.
    #[error("Stage '{address}' cannot depend on itself")]
    SelfDependency {
        /// The offending address.
        address: String,
    },

    /// The dependency edges form a cycle.
    #[error("Cycle detected in pipeline: {}", cycle_path.join(" -> "))]
    CycleDetected {
        /// The stages forming the cycle, first stage repeated at the end.
        cycle_path: Vec<String>,
    },
}

impl GraphError {
    /// Creates an unknown stage error.
    #[must_use]
    pub fn unknown(address: impl Into<String>) -> Self {
        Self::UnknownStage {
            address: address.into(),
        }
    }

    /// Returns the contract error info for this error.
    #[must_use]
    pub fn error_info(&self) -> ContractErrorInfo {
        match self {
            Self::DuplicateStage { address } => {
                ContractErrorInfo::new("GRAPH-001-DUPLICATE", format!("Duplicate stage '{address}'"))
                    .with_fix_hint("Give every stage a unique address.")
                    .with_context_entry("stage", address.clone())
            }
            Self::UnknownStage { address } => {
                ContractErrorInfo::new("GRAPH-002-UNKNOWN", format!("Stage '{address}' not found"))
                    .with_fix_hint("Add the stage to the graph before referencing it.")
                    .with_context_entry("stage", address.clone())
            }
            Self::SelfDependency { address } => {
                ContractErrorInfo::new("GRAPH-003-SELF", format!("Stage '{address}' depends on itself"))
                    .with_fix_hint("Remove the self-referencing dependency.")
                    .with_context_entry("stage", address.clone())
            }
            Self::CycleDetected { cycle_path } => ContractErrorInfo::new(
                "GRAPH-004-CYCLE",
                format!("Pipeline contains a dependency cycle: {}", cycle_path.join(" -> ")),
            )
            .with_fix_hint("Remove one of the dependencies in the cycle to break it."),
        }
    }
}

/// Errors reported by a run cache collaborator.
#[derive(Debug, Error)]
pub enum RunCacheError {
    /// The configured remote cannot serve a run cache. Callers tolerate this.
    #[error("run cache is not supported: {0}")]
    NotSupported(String),

    /// Any other failure while pulling.
    #[error("failed to pull run cache")]
    Failed(#[source] anyhow::Error),
}

/// Errors raised while resolving targets into stages.
#[derive(Debug, Clone, Error)]
pub enum CollectError {
    /// No stage matched the target.
    #[error("'{target}' does not exist")]
    NoStagesMatched {
        /// The unresolved target.
        target: String,
    },

    /// The target resolved to more than one stage where exactly one was needed.
    #[error("'{target}' is ambiguous, it matches {count} stages")]
    Ambiguous {
        /// The target.
        target: String,
        /// How many stages matched.
        count: usize,
    },

    /// The target is not a valid pattern.
    #[error("invalid target pattern '{target}': {reason}")]
    InvalidPattern {
        /// The target.
        target: String,
        /// Why it is invalid.
        reason: String,
    },
}

/// Errors raised while loading the repository configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for the expected schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
