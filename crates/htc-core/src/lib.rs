//! Submission store layout for htc-results.
//!
//! This crate knows how cluster job submissions are laid out on disk
//! (`submit_<id>/job_<n>/...`) and how the stored run arguments look.

pub mod layout;
pub mod runargs;

pub use layout::{
    parse_job_name, parse_submission_name, JobContents, JobDir, JobNumber, LayoutError, Store,
    SubmissionDir, SubmissionId,
};
pub use runargs::{format_cmd_shorty, CommandLine, ExpandMode, RunArgs};
