//! One-line text rendering of result records.

use htc_core::{format_cmd_shorty, CommandLine};
use htc_results::{Action, ResultRecord, Status};

/// Render a successful own record, e.g. `merge 3 :0` or
/// `3 :0 [completed]: 'make all'`.
///
/// Collaborator records and anything not `ok` are left to the log.
pub fn render_text(record: &ResultRecord) -> Option<String> {
    let tagged = record.as_own()?;
    let own = tagged.record();
    if own.status != Status::Ok {
        return None;
    }
    let submission = tagged.submission()?;

    let mut line = String::new();
    if own.action != Action::List {
        line.push_str(own.action.verb());
        line.push(' ');
    }
    line.push_str(&submission.to_string());
    if let Some(job) = tagged.job() {
        line.push_str(&format!(" :{job}"));
    }
    if own.action == Action::List {
        let state = own.state.as_deref().filter(|s| !s.is_empty()).unwrap_or("unknown");
        line.push_str(&format!(" [{state}]"));
    }
    if let Some(cmd) = &own.cmd {
        let shorty = format_cmd_shorty(&CommandLine::Shell(cmd.clone()));
        line.push_str(&format!(": {shorty}"));
    }
    Some(line)
}

/// Render an error record for stderr.
pub fn render_error(record: &ResultRecord) -> String {
    let mut line = format!("error: {}", record.action());
    if let Some(path) = record.path() {
        line.push_str(&format!(" {path}"));
    }
    if let Some(message) = record.message() {
        line.push_str(&format!(": {message}"));
    }
    line
}
