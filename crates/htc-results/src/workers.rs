//! List and remove workers for single submissions and jobs.

use crate::record::{Action, OwnRecord, Outcome};
use crate::workspace::Workspace;
use camino::Utf8Path;
use htc_core::{JobDir, SubmissionDir};
use std::fs;

/// Listing of a submission: its state and, if readable, its command.
fn describe_submission(submission: &SubmissionDir) -> OwnRecord {
    let path = submission.path();
    let state = match submission.status() {
        Ok(state) => state,
        Err(e) => {
            return OwnRecord::error(
                Action::List,
                path,
                format!("could not read submission status: {e}"),
            );
        }
    };

    let cmd = if submission.has_runargs() {
        match submission.load_runargs() {
            Ok(args) => Some(args.cmd.to_string()),
            Err(e) => {
                tracing::debug!("Ignoring unreadable run arguments: {}", e);
                None
            }
        }
    } else {
        None
    };

    OwnRecord {
        state,
        cmd,
        ..OwnRecord::ok(Action::List, path)
    }
}

pub(crate) fn list_submission(_workspace: &Workspace, submission: &SubmissionDir) -> Vec<Outcome> {
    vec![describe_submission(submission).into()]
}

/// Listing of a job, defaulting to its submission's fields.
pub(crate) fn list_job(
    _workspace: &Workspace,
    job: &JobDir,
    submission: &SubmissionDir,
) -> Vec<Outcome> {
    let defaults = describe_submission(submission);
    let path = job.path().to_owned();

    let record = if defaults.status.is_error() {
        OwnRecord { path, ..defaults }
    } else {
        match job.status() {
            Ok(own) => OwnRecord {
                state: own.or(defaults.state),
                path,
                contents: Some(job.contents()),
                ..defaults
            },
            Err(e) => OwnRecord::error(Action::List, path, format!("could not read job status: {e}")),
        }
    };

    vec![record.into()]
}

/// Recursively delete a submission or job directory.
pub(crate) fn remove_dir(path: &Utf8Path) -> OwnRecord {
    match fs::remove_dir_all(path) {
        Ok(()) => OwnRecord::ok(Action::Remove, path),
        Err(e) => OwnRecord::error(
            Action::Remove,
            path,
            format!("could not remove directory '{}': {}", path, e),
        ),
    }
}

pub(crate) fn remove_submission(_workspace: &Workspace, submission: &SubmissionDir) -> Vec<Outcome> {
    vec![remove_dir(submission.path()).into()]
}

pub(crate) fn remove_job(
    _workspace: &Workspace,
    job: &JobDir,
    _submission: &SubmissionDir,
) -> Vec<Outcome> {
    vec![remove_dir(job.path()).into()]
}
