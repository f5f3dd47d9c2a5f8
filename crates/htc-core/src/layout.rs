//! Naming and addressing of the submission store.
//!
//! ```text
//! <store-root>/
//!   submit_<id>/
//!     status
//!     runargs.json
//!     job_<n>/
//!       status
//!       output
//!       logs/
//! ```

use crate::runargs::RunArgs;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::fs;
use std::io;
use thiserror::Error;

pub type SubmissionId = u64;
pub type JobNumber = u64;

const SUBMISSION_PREFIX: &str = "submit_";
const JOB_PREFIX: &str = "job_";
const STATUS_FILE: &str = "status";
const RUNARGS_FILE: &str = "runargs.json";
const OUTPUT_ARCHIVE: &str = "output";
const LOGS_DIR: &str = "logs";
const INPUT_FILES: &str = "input_files";

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LayoutError {
    fn io(path: &Utf8Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            source,
        }
    }
}

/// Parse a canonical decimal index (no sign, no leading zeros).
fn parse_index(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Decode `submit_<id>` into its id.
pub fn parse_submission_name(name: &str) -> Option<SubmissionId> {
    name.strip_prefix(SUBMISSION_PREFIX).and_then(parse_index)
}

/// Decode `job_<n>` into its number.
pub fn parse_job_name(name: &str) -> Option<JobNumber> {
    name.strip_prefix(JOB_PREFIX).and_then(parse_index)
}

/// Read an optional status marker. Missing or blank markers yield `None`.
fn read_status(dir: &Utf8Path) -> Result<Option<String>, LayoutError> {
    let path = dir.join(STATUS_FILE);
    match fs::read_to_string(&path) {
        Ok(content) => {
            let trimmed = content.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(LayoutError::io(&path, e)),
    }
}

/// Scan `dir` for subdirectories whose name decodes with `parse`, sorted by index.
fn scan_indexed<T>(
    dir: &Utf8Path,
    parse: fn(&str) -> Option<u64>,
    make: impl Fn(u64, Utf8PathBuf) -> T,
) -> Result<Vec<T>, LayoutError> {
    let mut found = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| LayoutError::io(dir, e))? {
        let entry = entry.map_err(|e| LayoutError::io(dir, e))?;

        // Names that are not UTF-8 cannot match the convention
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        let Some(index) = parse(&name) else {
            continue;
        };

        let path = dir.join(&name);
        if !path.is_dir() {
            continue;
        }
        found.push((index, path));
    }

    found.sort_by_key(|(index, _)| *index);
    Ok(found
        .into_iter()
        .map(|(index, path)| make(index, path))
        .collect())
}

/// Root of all submissions of one dataset.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// An absent or non-directory root is an empty store.
    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Path a submission with this id would live at, whether or not it exists.
    pub fn submission_path(&self, id: SubmissionId) -> Utf8PathBuf {
        self.root.join(format!("{SUBMISSION_PREFIX}{id}"))
    }

    /// Look up a single submission directory.
    pub fn submission(&self, id: SubmissionId) -> Option<SubmissionDir> {
        let path = self.submission_path(id);
        path.is_dir().then_some(SubmissionDir { id, path })
    }

    /// All submission directories, ordered by id.
    ///
    /// Entries that do not follow the `submit_<id>` convention are skipped.
    pub fn submissions(&self) -> Result<Vec<SubmissionDir>, LayoutError> {
        if !self.exists() {
            return Ok(vec![]);
        }
        scan_indexed(&self.root, parse_submission_name, |id, path| {
            SubmissionDir { id, path }
        })
    }
}

/// One `submit_<id>` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionDir {
    id: SubmissionId,
    path: Utf8PathBuf,
}

impl SubmissionDir {
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn status(&self) -> Result<Option<String>, LayoutError> {
        read_status(&self.path)
    }

    pub fn runargs_path(&self) -> Utf8PathBuf {
        self.path.join(RUNARGS_FILE)
    }

    pub fn has_runargs(&self) -> bool {
        self.runargs_path().is_file()
    }

    /// Load and parse `runargs.json`.
    pub fn load_runargs(&self) -> Result<RunArgs, LayoutError> {
        let path = self.runargs_path();
        let content = fs::read_to_string(&path).map_err(|e| LayoutError::io(&path, e))?;
        serde_json::from_str(&content).map_err(|source| LayoutError::Json { path, source })
    }

    pub fn job_path(&self, number: JobNumber) -> Utf8PathBuf {
        self.path.join(format!("{JOB_PREFIX}{number}"))
    }

    /// Look up a job by constructing its directory name; `None` if absent.
    pub fn job(&self, number: JobNumber) -> Option<JobDir> {
        let path = self.job_path(number);
        path.is_dir().then(|| JobDir {
            submission: self.id,
            number,
            path,
        })
    }

    /// All job directories of this submission, ordered by number.
    pub fn jobs(&self) -> Result<Vec<JobDir>, LayoutError> {
        scan_indexed(&self.path, parse_job_name, |number, path| JobDir {
            submission: self.id,
            number,
            path,
        })
    }
}

/// One `job_<n>` directory inside a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDir {
    submission: SubmissionId,
    number: JobNumber,
    path: Utf8PathBuf,
}

impl JobDir {
    pub fn submission(&self) -> SubmissionId {
        self.submission
    }

    pub fn number(&self) -> JobNumber {
        self.number
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The job's own status marker, without the submission fallback.
    pub fn status(&self) -> Result<Option<String>, LayoutError> {
        read_status(&self.path)
    }

    pub fn archive_path(&self) -> Utf8PathBuf {
        self.path.join(OUTPUT_ARCHIVE)
    }

    /// Whether the job produced an `output` archive that can be merged.
    pub fn has_archive(&self) -> bool {
        self.archive_path().is_file()
    }

    pub fn has_logs(&self) -> bool {
        self.path.join(LOGS_DIR).is_dir()
    }

    pub fn has_input_files(&self) -> bool {
        self.path.join(INPUT_FILES).exists()
    }

    pub fn contents(&self) -> JobContents {
        JobContents {
            output: self.has_archive(),
            logs: self.has_logs(),
            input_files: self.has_input_files(),
        }
    }
}

/// Which of the optional job files are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobContents {
    pub output: bool,
    pub logs: bool,
    pub input_files: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_root(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_submission_name("submit_0"), Some(0));
        assert_eq!(parse_submission_name("submit_42"), Some(42));
        assert_eq!(parse_submission_name("submit_"), None);
        assert_eq!(parse_submission_name("submit_007"), None);
        assert_eq!(parse_submission_name("submit_-1"), None);
        assert_eq!(parse_submission_name("submit_1a"), None);
        assert_eq!(parse_submission_name("job_1"), None);

        assert_eq!(parse_job_name("job_3"), Some(3));
        assert_eq!(parse_job_name("job_x"), None);
        assert_eq!(parse_job_name("submit_3"), None);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = Store::new(utf8_root(&temp).join("nope"));
        assert!(!store.exists());
        assert!(store.submissions().unwrap().is_empty());
    }

    #[test]
    fn test_root_that_is_a_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp).join("store");
        fs::write(&root, "not a dir").unwrap();
        assert!(Store::new(root).submissions().unwrap().is_empty());
    }

    #[test]
    fn test_scan_skips_foreign_entries_and_sorts() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp);
        fs::create_dir(root.join("submit_10")).unwrap();
        fs::create_dir(root.join("submit_2")).unwrap();
        fs::create_dir(root.join("other")).unwrap();
        fs::write(root.join("submit_3"), "a file").unwrap();
        fs::write(root.join("README"), "").unwrap();

        let store = Store::new(root);
        let ids: Vec<_> = store.submissions().unwrap().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![2, 10]);
    }

    #[test]
    fn test_jobs_and_status() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp);
        let sdir = root.join("submit_0");
        fs::create_dir_all(sdir.join("job_1")).unwrap();
        fs::create_dir_all(sdir.join("job_0")).unwrap();
        fs::create_dir_all(sdir.join("logs")).unwrap();
        fs::write(sdir.join("status"), "submitted\n").unwrap();
        fs::write(sdir.join("job_0").join("status"), "completed\n").unwrap();
        fs::write(sdir.join("job_1").join("status"), "   \n").unwrap();

        let store = Store::new(root);
        let submission = store.submission(0).unwrap();
        assert_eq!(submission.status().unwrap().as_deref(), Some("submitted"));

        let jobs = submission.jobs().unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].number(), 0);
        assert_eq!(jobs[0].submission(), 0);
        assert_eq!(jobs[0].status().unwrap().as_deref(), Some("completed"));
        assert_eq!(jobs[1].status().unwrap(), None);

        assert!(submission.job(1).is_some());
        assert!(submission.job(5).is_none());
        assert!(store.submission(1).is_none());
    }

    #[test]
    fn test_job_contents() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp);
        let jdir = root.join("submit_0/job_0");
        fs::create_dir_all(&jdir).unwrap();
        let job = Store::new(root).submission(0).unwrap().job(0).unwrap();

        assert_eq!(
            job.contents(),
            JobContents {
                output: false,
                logs: false,
                input_files: false
            }
        );

        fs::write(jdir.join("output"), "tar").unwrap();
        fs::create_dir(jdir.join("logs")).unwrap();
        fs::write(jdir.join("input_files"), "data/a.csv\n").unwrap();
        assert!(job.has_archive());
        assert!(job.has_logs());
        assert!(job.has_input_files());

        // A directory named like the archive is not an archive
        fs::remove_file(jdir.join("output")).unwrap();
        fs::create_dir(jdir.join("output")).unwrap();
        assert!(!job.has_archive());
    }

    #[test]
    fn test_load_runargs_errors() {
        let temp = TempDir::new().unwrap();
        let root = utf8_root(&temp);
        fs::create_dir_all(root.join("submit_0")).unwrap();
        let submission = Store::new(root).submission(0).unwrap();

        assert!(!submission.has_runargs());
        assert!(matches!(
            submission.load_runargs(),
            Err(LayoutError::Io { .. })
        ));

        fs::write(submission.runargs_path(), "{not json").unwrap();
        assert!(submission.has_runargs());
        assert!(matches!(
            submission.load_runargs(),
            Err(LayoutError::Json { .. })
        ));

        fs::write(submission.runargs_path(), r#"{"cmd": "make"}"#).unwrap();
        assert_eq!(submission.load_runargs().unwrap().cmd.to_string(), "make");
    }
}
