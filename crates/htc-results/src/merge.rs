//! Materializing one job's output in the dataset.
//!
//! Merging replays the remote job as if its command had run locally:
//! outputs are prepared, the job's `output` archive is unpacked into the
//! dataset, the execution is recorded without running the command again, and
//! finally the job directory is deleted. The submission directory always
//! stays behind so it can be resubmitted.

use crate::outputs::expand_patterns;
use crate::record::{Action, OwnRecord, Outcome};
use crate::workspace::Workspace;
use htc_core::{format_cmd_shorty, JobDir, SubmissionDir};
use std::fs;
use tracing::Span;

/// Job worker for [`crate::Operation::Merge`].
pub(crate) fn merge_job(workspace: &Workspace, job: &JobDir, submission: &SubmissionDir) -> Vec<Outcome> {
    Merger::new(workspace, workspace.span().clone()).merge(job, submission)
}

/// Merges jobs of one workspace, logging under the given span.
pub struct Merger<'w> {
    workspace: &'w Workspace,
    span: Span,
}

impl<'w> Merger<'w> {
    pub fn new(workspace: &'w Workspace, span: Span) -> Self {
        Self { workspace, span }
    }

    /// Merge `job` and return every record produced on the way.
    ///
    /// On failure the job directory is left in place for a retry or manual
    /// inspection; files already extracted are not cleaned up.
    pub fn merge(&self, job: &JobDir, submission: &SubmissionDir) -> Vec<Outcome> {
        let span = tracing::info_span!(
            parent: &self.span,
            "merge",
            submission = job.submission(),
            job = job.number()
        );
        let _entered = span.enter();

        let dataset = self.workspace.dataset();
        let provenance = self.workspace.provenance();
        let mut outcomes: Vec<Outcome> = Vec::new();

        let args_path = submission.runargs_path();
        let args = match submission.load_runargs() {
            Ok(args) => args,
            Err(e) => {
                outcomes.push(
                    OwnRecord::error(
                        Action::Merge,
                        job.path(),
                        format!("could not load submission arguments from '{args_path}': {e}"),
                    )
                    .into(),
                );
                return outcomes;
            }
        };

        let outputs = expand_patterns(dataset, &args.pwd, &args.outputs);
        if !outputs.is_empty() {
            tracing::debug!("Preparing {} outputs for overwriting", outputs.len());
            outcomes.extend(
                provenance
                    .prepare_outputs(&outputs)
                    .into_iter()
                    .map(Outcome::from),
            );
        }

        let archive = job.archive_path();
        if let Err(e) = self.workspace.extractor().extract(&archive, dataset) {
            tracing::warn!("Extracting {} failed: {}", archive, e);
            outcomes.push(
                OwnRecord::error(
                    Action::Merge,
                    job.path(),
                    format!("could not un-tar job results from '{archive}' at '{dataset}': {e}"),
                )
                .into(),
            );
            return outcomes;
        }

        let recorded = provenance.record_replayed(&args);
        let recording_failed = recorded.iter().any(|r| r.status.is_error());
        outcomes.extend(recorded.into_iter().map(Outcome::from));
        if recording_failed {
            outcomes.push(
                OwnRecord::error(
                    Action::Merge,
                    job.path(),
                    format!(
                        "could not record execution of {}; extracted results remain in '{}'",
                        format_cmd_shorty(&args.cmd),
                        dataset
                    ),
                )
                .into(),
            );
            return outcomes;
        }

        // Cleanup is best effort; a lingering directory can be removed later.
        if let Err(e) = fs::remove_dir_all(job.path()) {
            tracing::warn!("Could not remove merged job directory {}: {}", job.path(), e);
        }
        outcomes.push(OwnRecord::ok(Action::Merge, job.path()).into());
        outcomes
    }
}
