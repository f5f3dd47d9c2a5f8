//! Dataset collaborator that prepares outputs and records executions.

mod git;

pub use git::GitProvenance;

use crate::record::ForeignRecord;
use camino::Utf8PathBuf;
use htc_core::RunArgs;

/// The dataset layer that tracks files and records provenance.
pub trait Provenance {
    /// Make existing output paths ready to be overwritten by extracted results.
    ///
    /// Returns one record per path that needed (or failed) preparation.
    fn prepare_outputs(&self, paths: &[Utf8PathBuf]) -> Vec<ForeignRecord>;

    /// Record that `args.cmd` was executed, without executing it again.
    ///
    /// The command's outputs are already in the working tree.
    fn record_replayed(&self, args: &RunArgs) -> Vec<ForeignRecord>;
}
