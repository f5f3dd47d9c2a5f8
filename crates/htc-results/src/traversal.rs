//! Lazy walk over the submission store.
//!
//! A [`Traversal`] visits the selected submissions in order, runs the
//! submission worker (unless a job filter narrows the scope) and then the job
//! worker for each selected job. Own records are tagged with their
//! submission/job coordinates, collaborator records pass through untouched.
//!
//! Work happens only while the traversal is iterated, one store item at a
//! time. It is a single pass; a finished traversal stays finished.

use crate::operation::{Filter, Workers};
use crate::record::{Action, OwnRecord, Outcome, ResultRecord, Scope, TaggedRecord};
use crate::workspace::Workspace;
use camino::Utf8PathBuf;
use htc_core::{JobDir, SubmissionDir};
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::vec;

enum Stage {
    Start,
    Submissions(vec::IntoIter<SubmissionDir>),
    Jobs {
        submission: SubmissionDir,
        jobs: vec::IntoIter<JobDir>,
        rest: vec::IntoIter<SubmissionDir>,
    },
    Done,
}

/// Ordered, one-pass stream of result records.
pub struct Traversal<'w> {
    workspace: &'w Workspace,
    workers: Workers,
    filter: Filter,
    stage: Stage,
    pending: VecDeque<ResultRecord>,
}

impl<'w> Traversal<'w> {
    pub(crate) fn new(workspace: &'w Workspace, workers: Workers, filter: Filter) -> Self {
        Self {
            workspace,
            workers,
            filter,
            stage: Stage::Start,
            pending: VecDeque::new(),
        }
    }

    fn forward(&mut self, outcomes: Vec<Outcome>, scope: Scope) {
        let workspace = self.workspace;
        let refds = workspace.dataset();
        for outcome in outcomes {
            let record = match outcome {
                Outcome::Own(record) => ResultRecord::Own(TaggedRecord::new(record, scope, refds)),
                Outcome::Foreign(record) => ResultRecord::Foreign(record),
            };
            workspace.span().in_scope(|| {
                tracing::debug!(
                    action = record.action(),
                    status = record.status().as_str(),
                    "result"
                );
            });
            self.pending.push_back(record);
        }
    }

    fn lookup_error(&mut self, path: Utf8PathBuf, message: String, scope: Scope) {
        let record = OwnRecord::error(Action::Lookup, path, message);
        self.forward(vec![record.into()], scope);
    }

    fn start(&mut self) -> Stage {
        let workspace = self.workspace;
        let store = workspace.store();
        if !store.exists() {
            return Stage::Done;
        }

        match self.filter.submission {
            Some(id) => match store.submission(id) {
                Some(submission) => Stage::Submissions(vec![submission].into_iter()),
                // A store without any submissions is empty under every filter
                None if store.submissions().is_ok_and(|all| all.is_empty()) => Stage::Done,
                None => {
                    let path = store.submission_path(id);
                    self.lookup_error(path, format!("submission '{id}' does not exist"), Scope::Store);
                    Stage::Done
                }
            },
            None => match store.submissions() {
                Ok(submissions) => Stage::Submissions(submissions.into_iter()),
                Err(e) => {
                    let root = store.root().to_owned();
                    self.lookup_error(root, format!("could not scan submissions: {e}"), Scope::Store);
                    Stage::Done
                }
            },
        }
    }

    fn enter(&mut self, submission: SubmissionDir, rest: vec::IntoIter<SubmissionDir>) -> Stage {
        let scope = Scope::Submission(submission.id());

        if let (Some(worker), None) = (self.workers.submission, self.filter.job) {
            let workspace = self.workspace;
            let outcomes = workspace.span().in_scope(|| worker(workspace, &submission));
            self.forward(outcomes, scope);
        }

        // The submission worker may have removed it
        if !submission.path().is_dir() {
            return Stage::Submissions(rest);
        }

        let jobs = match self.filter.job {
            Some(number) => match submission.job(number) {
                Some(job) => vec![job],
                // Only a fully qualified target is worth reporting
                None if self.filter.submission.is_some() => {
                    let path = submission.job_path(number);
                    let message = format!(
                        "job '{number}' does not exist in submission '{}'",
                        submission.id()
                    );
                    self.lookup_error(path, message, Scope::Job(submission.id(), number));
                    vec![]
                }
                None => vec![],
            },
            None => match submission.jobs() {
                Ok(jobs) => jobs,
                Err(e) => {
                    let path = submission.path().to_owned();
                    self.lookup_error(path, format!("could not scan jobs: {e}"), scope);
                    vec![]
                }
            },
        };

        Stage::Jobs {
            submission,
            jobs: jobs.into_iter(),
            rest,
        }
    }

    fn visit(&mut self, job: &JobDir, submission: &SubmissionDir) {
        // Gone since the scan, e.g. merged by a concurrent traversal
        if !job.path().is_dir() {
            return;
        }
        let workspace = self.workspace;
        let worker = self.workers.job;
        let outcomes = workspace.span().in_scope(|| worker(workspace, job, submission));
        self.forward(outcomes, Scope::Job(job.submission(), job.number()));
    }
}

impl Iterator for Traversal<'_> {
    type Item = ResultRecord;

    fn next(&mut self) -> Option<ResultRecord> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(record);
            }

            self.stage = match std::mem::replace(&mut self.stage, Stage::Done) {
                Stage::Start => self.start(),
                Stage::Submissions(mut rest) => match rest.next() {
                    Some(submission) => self.enter(submission, rest),
                    None => Stage::Done,
                },
                Stage::Jobs {
                    submission,
                    mut jobs,
                    rest,
                } => match jobs.next() {
                    Some(job) => {
                        self.visit(&job, &submission);
                        Stage::Jobs {
                            submission,
                            jobs,
                            rest,
                        }
                    }
                    None => Stage::Submissions(rest),
                },
                Stage::Done => return None,
            };
        }
    }
}

impl FusedIterator for Traversal<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::Provenance;
    use crate::record::{ForeignRecord, Status};
    use htc_core::{RunArgs, Store};
    use htc_exec::TarBuiltin;
    use std::fs;
    use tempfile::TempDir;

    struct NoProvenance;

    impl Provenance for NoProvenance {
        fn prepare_outputs(&self, _paths: &[Utf8PathBuf]) -> Vec<ForeignRecord> {
            vec![]
        }

        fn record_replayed(&self, _args: &RunArgs) -> Vec<ForeignRecord> {
            vec![]
        }
    }

    fn workspace(root: &Utf8PathBuf) -> Workspace {
        Workspace::new(
            root.clone(),
            Store::new(root.join("store")),
            Box::new(NoProvenance),
            Box::new(TarBuiltin),
        )
    }

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        (temp, root)
    }

    #[test]
    fn test_missing_store_yields_nothing() {
        let (_temp, root) = temp_root();
        let ws = workspace(&root);
        assert_eq!(ws.list(Filter::everything()).count(), 0);
        assert_eq!(ws.list(Filter::submission(3)).count(), 0);
        assert_eq!(ws.merge(Filter::job(3, 1)).count(), 0);
    }

    #[test]
    fn test_empty_store_yields_nothing_under_filters() {
        let (_temp, root) = temp_root();
        fs::create_dir_all(root.join("store/unrelated")).unwrap();
        let ws = workspace(&root);
        assert_eq!(ws.list(Filter::submission(3)).count(), 0);
        assert_eq!(ws.remove(Filter::job(0, 0), false).unwrap().count(), 0);
    }

    #[test]
    fn test_traversal_is_lazy() {
        let (_temp, root) = temp_root();
        fs::create_dir_all(root.join("store/submit_0/job_0")).unwrap();
        let ws = workspace(&root);

        let mut traversal = ws.remove(Filter::submission(0), false).unwrap();
        assert!(root.join("store/submit_0").exists());

        let first = traversal.next().unwrap();
        assert_eq!(first.status(), Status::Ok);
        assert!(!root.join("store/submit_0").exists());
        // Removing the submission took its jobs with it
        assert!(traversal.next().is_none());
        assert!(traversal.next().is_none());
    }

    #[test]
    fn test_job_filter_across_submissions() {
        let (_temp, root) = temp_root();
        fs::create_dir_all(root.join("store/submit_0/job_1")).unwrap();
        fs::create_dir_all(root.join("store/submit_1/job_0")).unwrap();
        fs::create_dir_all(root.join("store/submit_2/job_1")).unwrap();
        let ws = workspace(&root);

        let filter = Filter {
            submission: None,
            job: Some(1),
        };
        let scopes: Vec<_> = ws
            .list(filter)
            .filter_map(|r| r.as_own().map(TaggedRecord::scope))
            .collect();
        assert_eq!(scopes, vec![Scope::Job(0, 1), Scope::Job(2, 1)]);
    }
}
