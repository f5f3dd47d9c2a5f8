//! Traversal and merge engine for cluster job results.
//!
//! Walks a submission store, lists, merges or removes submissions and jobs,
//! and reports every outcome as a [`ResultRecord`].

pub mod config;
pub mod merge;
pub mod operation;
pub mod outputs;
pub mod provenance;
pub mod record;
pub mod traversal;
mod workers;
pub mod workspace;

pub use config::{Archiver, ResultsConfig, DEFAULT_STORE_DIR};
pub use merge::Merger;
pub use operation::{Filter, JobWorker, Operation, SubmissionWorker, UsageError, Workers};
pub use provenance::{GitProvenance, Provenance};
pub use record::{
    Action, ForeignRecord, Outcome, OwnRecord, ResultRecord, Scope, Status, TaggedRecord,
};
pub use traversal::Traversal;
pub use workspace::{Workspace, WorkspaceError};
