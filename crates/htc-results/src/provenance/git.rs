//! Run records committed to a git (or git-annex) dataset.
//!
//! The commit layout follows DataLad's run records, so replayed executions
//! can be inspected and rerun with DataLad tooling.

use super::Provenance;
use crate::outputs::{dataset_relative, expand_patterns};
use crate::record::{ForeignRecord, Status};
use camino::{Utf8Path, Utf8PathBuf};
use htc_core::{format_cmd_shorty, RunArgs};
use htc_exec::{CommandError, Runner};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::ffi::OsStr;
use std::fs;
use std::io;

const RUNINFO_DIR: &str = ".datalad/runinfo";
const ANNEX_OBJECTS: &str = ".git/annex/objects/";

/// Machine-readable part of the commit message.
#[derive(Debug, Serialize)]
struct RunRecord<'a> {
    chain: Vec<String>,
    cmd: String,
    dsid: Option<String>,
    exit: i32,
    extra_inputs: Vec<String>,
    inputs: Vec<String>,
    outputs: Vec<String>,
    pwd: &'a Utf8Path,
}

fn commit_message(args: &RunArgs, record_ref: &str) -> String {
    let summary = args
        .message
        .clone()
        .unwrap_or_else(|| format_cmd_shorty(&args.cmd));
    format!(
        "[DATALAD RUNCMD] {summary}\n\n=== Do not change lines below ===\n{record_ref}\n^^^ Do not change lines above ^^^"
    )
}

/// Locked annex content is a symlink into the annex object store.
fn is_annex_link(path: &Utf8Path) -> bool {
    fs::read_link(path).is_ok_and(|target| target.to_string_lossy().contains(ANNEX_OBJECTS))
}

/// Provenance backend that commits replayed executions with git.
#[derive(Debug, Clone)]
pub struct GitProvenance {
    dataset: Utf8PathBuf,
    runner: Runner,
    store: Option<Utf8PathBuf>,
}

impl GitProvenance {
    pub fn new(dataset: impl Into<Utf8PathBuf>, runner: Runner) -> Self {
        Self {
            dataset: dataset.into(),
            runner,
            store: None,
        }
    }

    /// Never stage anything below the submission store at `store`.
    pub fn with_store(mut self, store: impl Into<Utf8PathBuf>) -> Self {
        let store = store.into();
        self.store = Some(store.canonicalize_utf8().unwrap_or(store));
        self
    }

    /// Pathspec excluding the store when it lies in the worktree.
    fn store_exclude(&self) -> Option<String> {
        let dataset = self
            .dataset
            .canonicalize_utf8()
            .unwrap_or_else(|_| self.dataset.clone());
        let relative = self.store.as_deref()?.strip_prefix(&dataset).ok()?;
        // git never stages its own directory; an empty path would exclude everything
        match relative.components().next() {
            None => None,
            Some(first) if first.as_str() == ".git" => None,
            Some(_) => Some(format!(":(exclude){relative}")),
        }
    }

    fn git<I, S>(&self, args: I) -> Result<String, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.runner.run("git", args, &self.dataset)
    }

    fn prepare_one(&self, path: &Utf8Path) -> Option<ForeignRecord> {
        // Nothing to prepare for outputs that do not exist yet
        let meta = fs::symlink_metadata(path).ok()?;

        let record = if meta.file_type().is_symlink() {
            if !is_annex_link(path) {
                ForeignRecord::new("unlock", Status::Impossible)
                    .with_message("symlink is not annexed content and cannot be unlocked")
            } else {
                match self.git(["annex", "unlock", "--", path.as_str()]) {
                    Ok(_) => ForeignRecord::new("unlock", Status::Ok),
                    Err(e) => {
                        ForeignRecord::new("unlock", Status::Error).with_message(e.to_string())
                    }
                }
            }
        } else if meta.is_file() && meta.permissions().readonly() {
            match fs::remove_file(path) {
                Ok(()) => ForeignRecord::new("remove", Status::Ok)
                    .with_message("removed to allow overwriting"),
                Err(e) => ForeignRecord::new("remove", Status::Error)
                    .with_message(format!("could not remove '{}': {}", path, e)),
            }
        } else {
            ForeignRecord::new("unlock", Status::NotNeeded)
        };

        Some(record.with_path(path))
    }

    fn dataset_id(&self) -> Option<String> {
        self.git(["config", "-f", ".datalad/config", "--get", "datalad.dataset.id"])
            .ok()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }

    fn recorded_paths(&self, args: &RunArgs, patterns: &[String], expand: bool) -> Vec<String> {
        if !expand {
            return patterns.to_vec();
        }
        expand_patterns(&self.dataset, &args.pwd, patterns)
            .iter()
            .map(|path| dataset_relative(&self.dataset, path))
            .collect()
    }

    /// Paths to stage for an explicit run: the outputs that exist now.
    fn explicit_paths(&self, args: &RunArgs) -> Vec<String> {
        expand_patterns(&self.dataset, &args.pwd, &args.outputs)
            .into_iter()
            .filter(|path| fs::symlink_metadata(path).is_ok())
            .map(|path| dataset_relative(&self.dataset, &path))
            .collect()
    }

    /// Store the record under `.datalad/runinfo/<sha256>`; returns the id and relative path.
    fn write_sidecar(&self, record_json: &str) -> io::Result<(String, Utf8PathBuf)> {
        let id = hex::encode(Sha256::digest(record_json.as_bytes()));
        let relative = Utf8PathBuf::from(RUNINFO_DIR).join(&id);
        let full = self.dataset.join(&relative);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, record_json)?;
        Ok((id, relative))
    }

    fn save(&self, stage: &[String], message: &str) -> ForeignRecord {
        let failed = |e: CommandError| {
            ForeignRecord::new("save", Status::Error)
                .with_path(&self.dataset)
                .with_message(e.to_string())
        };

        if !stage.is_empty() {
            let exclude = self.store_exclude();
            let mut add = vec!["add", "--all", "--"];
            add.extend(stage.iter().map(String::as_str));
            add.extend(exclude.as_deref());
            if let Err(e) = self.git(add) {
                return failed(e);
            }
        }

        match self
            .runner
            .succeeds("git", ["diff", "--cached", "--quiet"], &self.dataset)
        {
            Ok(true) => {
                return ForeignRecord::new("save", Status::NotNeeded)
                    .with_path(&self.dataset)
                    .with_message("nothing to save");
            }
            Ok(false) => {}
            Err(e) => return failed(e),
        }

        match self.git(["commit", "--quiet", "-m", message]) {
            Ok(_) => ForeignRecord::new("save", Status::Ok).with_path(&self.dataset),
            Err(e) => failed(e),
        }
    }
}

impl Provenance for GitProvenance {
    fn prepare_outputs(&self, paths: &[Utf8PathBuf]) -> Vec<ForeignRecord> {
        paths.iter().filter_map(|path| self.prepare_one(path)).collect()
    }

    fn record_replayed(&self, args: &RunArgs) -> Vec<ForeignRecord> {
        let run_failed = |message: String| {
            vec![ForeignRecord::new("run", Status::Error)
                .with_path(&self.dataset)
                .with_message(message)]
        };

        let record = RunRecord {
            chain: vec![],
            cmd: args.cmd.to_string(),
            dsid: self.dataset_id(),
            exit: 0,
            extra_inputs: vec![],
            inputs: self.recorded_paths(args, &args.inputs, args.expands_inputs()),
            outputs: self.recorded_paths(args, &args.outputs, args.expands_outputs()),
            pwd: &args.pwd,
        };
        let json = match serde_json::to_string_pretty(&record) {
            Ok(json) => json,
            Err(e) => return run_failed(format!("could not serialize run record: {e}")),
        };

        let mut stage = if args.explicit {
            self.explicit_paths(args)
        } else {
            vec![".".to_string()]
        };

        let record_ref = if args.sidecar {
            match self.write_sidecar(&json) {
                Ok((id, relative)) => {
                    stage.push(relative.to_string());
                    id
                }
                Err(e) => return run_failed(format!("could not write run record: {e}")),
            }
        } else {
            json
        };

        tracing::debug!(cmd = %args.cmd, "recording replayed execution");
        vec![
            ForeignRecord::new("run", Status::Ok)
                .with_path(&self.dataset)
                .with_message(format!(
                    "recorded execution of {}",
                    format_cmd_shorty(&args.cmd)
                )),
            self.save(&stage, &commit_message(args, &record_ref)),
        ]
    }
}
