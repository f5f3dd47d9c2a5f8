//! Result records produced while traversing the submission store.
//!
//! Workers emit [`Outcome`]s. Records of our own ([`OwnRecord`]) carry no
//! coordinates until the traversal tags them with a [`Scope`]; records from
//! collaborators ([`ForeignRecord`]) are passed through as they are.

use camino::{Utf8Path, Utf8PathBuf};
use htc_core::{JobContents, JobNumber, SubmissionId};
use serde::Serialize;

/// Actions in this crate's own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    #[serde(rename = "htc_result_list")]
    List,
    #[serde(rename = "htc_result_merge")]
    Merge,
    #[serde(rename = "htc_result_remove")]
    Remove,
    /// Resolving the requested submission/job scope
    #[serde(rename = "htc_results")]
    Lookup,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "htc_result_list",
            Self::Merge => "htc_result_merge",
            Self::Remove => "htc_result_remove",
            Self::Lookup => "htc_results",
        }
    }

    /// Short verb for display.
    pub fn verb(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Merge => "merge",
            Self::Remove => "remove",
            Self::Lookup => "results",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    NotNeeded,
    Impossible,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotNeeded => "notneeded",
            Self::Impossible => "impossible",
            Self::Error => "error",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

/// A record produced by one of our workers, before tagging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnRecord {
    pub action: Action,
    pub status: Status,
    pub path: Utf8PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional job files present, for job listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<JobContents>,
}

impl OwnRecord {
    pub fn ok(action: Action, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            action,
            status: Status::Ok,
            path: path.into(),
            state: None,
            cmd: None,
            message: None,
            contents: None,
        }
    }

    pub fn error(action: Action, path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            ..Self::ok(action, path)
        }
    }
}

/// A record produced by a collaborator; its action namespace is its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignRecord {
    pub action: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ForeignRecord {
    pub fn new(action: impl Into<String>, status: Status) -> Self {
        Self {
            action: action.into(),
            status,
            path: None,
            message: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// What a worker yields for one tree item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Own(OwnRecord),
    Foreign(ForeignRecord),
}

impl From<OwnRecord> for Outcome {
    fn from(record: OwnRecord) -> Self {
        Self::Own(record)
    }
}

impl From<ForeignRecord> for Outcome {
    fn from(record: ForeignRecord) -> Self {
        Self::Foreign(record)
    }
}

/// Where in the store a tagged record belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Store,
    Submission(SubmissionId),
    Job(SubmissionId, JobNumber),
}

/// An own record decorated with its coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedRecord {
    #[serde(flatten)]
    record: OwnRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    submission: Option<SubmissionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    job: Option<JobNumber>,
    refds: Utf8PathBuf,
}

impl TaggedRecord {
    pub fn new(record: OwnRecord, scope: Scope, refds: &Utf8Path) -> Self {
        let (submission, job) = match scope {
            Scope::Store => (None, None),
            Scope::Submission(id) => (Some(id), None),
            Scope::Job(id, number) => (Some(id), Some(number)),
        };
        Self {
            record,
            submission,
            job,
            refds: refds.to_owned(),
        }
    }

    pub fn record(&self) -> &OwnRecord {
        &self.record
    }

    pub fn scope(&self) -> Scope {
        match (self.submission, self.job) {
            (Some(id), Some(number)) => Scope::Job(id, number),
            (Some(id), None) => Scope::Submission(id),
            _ => Scope::Store,
        }
    }

    pub fn submission(&self) -> Option<SubmissionId> {
        self.submission
    }

    pub fn job(&self) -> Option<JobNumber> {
        self.job
    }

    /// Dataset the record refers to.
    pub fn refds(&self) -> &Utf8Path {
        &self.refds
    }
}

/// One item of the result stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResultRecord {
    Own(TaggedRecord),
    Foreign(ForeignRecord),
}

impl ResultRecord {
    pub fn status(&self) -> Status {
        match self {
            Self::Own(tagged) => tagged.record.status,
            Self::Foreign(foreign) => foreign.status,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status().is_error()
    }

    pub fn action(&self) -> &str {
        match self {
            Self::Own(tagged) => tagged.record.action.as_str(),
            Self::Foreign(foreign) => &foreign.action,
        }
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Own(tagged) => Some(&tagged.record.path),
            Self::Foreign(foreign) => foreign.path.as_deref(),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Own(tagged) => tagged.record.message.as_deref(),
            Self::Foreign(foreign) => foreign.message.as_deref(),
        }
    }

    pub fn as_own(&self) -> Option<&TaggedRecord> {
        match self {
            Self::Own(tagged) => Some(tagged),
            Self::Foreign(_) => None,
        }
    }
}
