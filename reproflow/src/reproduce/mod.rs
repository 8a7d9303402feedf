//! Planning and running a reproduction.
//!
//! [`Repository::reproduce`] resolves targets into seed stages, optionally
//! prefetches the run cache, derives an evaluation plan and hands it to the
//! [`ReproductionExecutor`].

mod executor;
mod operation;
mod options;
mod integration_tests;

pub use executor::{ReproductionExecutor, ReproductionResult};
pub use operation::{reproduce_stages, Repository};
pub use options::{ReproduceOptions, Targets};
