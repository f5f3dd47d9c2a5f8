//! The three operations and their per-level workers.

use crate::merge::merge_job;
use crate::record::Outcome;
use crate::workers::{list_job, list_submission, remove_job, remove_submission};
use crate::workspace::Workspace;
use htc_core::{JobDir, JobNumber, SubmissionDir, SubmissionId};
use std::fmt;
use thiserror::Error;

pub type SubmissionWorker = fn(&Workspace, &SubmissionDir) -> Vec<Outcome>;
pub type JobWorker = fn(&Workspace, &JobDir, &SubmissionDir) -> Vec<Outcome>;

/// Rejected before any traversal starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("use the '--all' flag to remove all results across all submissions")]
    UnqualifiedRemove,
}

/// Restricts a traversal to one submission and/or one job number.
///
/// A job filter without a submission filter selects that job number in
/// every submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filter {
    pub submission: Option<SubmissionId>,
    pub job: Option<JobNumber>,
}

impl Filter {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn submission(id: SubmissionId) -> Self {
        Self {
            submission: Some(id),
            job: None,
        }
    }

    pub fn job(id: SubmissionId, number: JobNumber) -> Self {
        Self {
            submission: Some(id),
            job: Some(number),
        }
    }

    pub fn is_unqualified(&self) -> bool {
        self.submission.is_none() && self.job.is_none()
    }
}

/// Handlers for the two levels of the store.
#[derive(Debug, Clone, Copy)]
pub struct Workers {
    /// `None` when the operation has no meaning at submission level
    pub submission: Option<SubmissionWorker>,
    pub job: JobWorker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Merge,
    Remove,
}

impl Operation {
    pub fn workers(self) -> Workers {
        match self {
            Self::List => Workers {
                submission: Some(list_submission),
                job: list_job,
            },
            Self::Merge => Workers {
                submission: None,
                job: merge_job,
            },
            Self::Remove => Workers {
                submission: Some(remove_submission),
                job: remove_job,
            },
        }
    }

    /// Guard against accidentally destructive invocations.
    pub fn check(self, filter: Filter, all: bool) -> Result<(), UsageError> {
        if self == Self::Remove && filter.is_unqualified() && !all {
            return Err(UsageError::UnqualifiedRemove);
        }
        Ok(())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Merge => "merge",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
