//! Serialized arguments of the command a submission was prepared for.

use camino::Utf8PathBuf;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Commands longer than this are shortened for display.
const SHORTY_MAX_CHARS: usize = 40;

/// Deserialize a field that may be null, falling back to its default.
fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(|opt| opt.unwrap_or_default())
}

fn default_pwd() -> Utf8PathBuf {
    Utf8PathBuf::from(".")
}

/// The submitted command, either a shell string or an argument vector.
///
/// Displayed as a single shell command line; argv elements are quoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandLine {
    Shell(String),
    Argv(Vec<String>),
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell(cmd) => f.write_str(cmd),
            Self::Argv(argv) => f.write_str(&shell_words::join(argv)),
        }
    }
}

/// Which declared paths get glob-expanded in the run record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandMode {
    Inputs,
    Outputs,
    Both,
}

impl ExpandMode {
    pub fn covers_inputs(self) -> bool {
        matches!(self, Self::Inputs | Self::Both)
    }

    pub fn covers_outputs(self) -> bool {
        matches!(self, Self::Outputs | Self::Both)
    }
}

/// Contents of `runargs.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunArgs {
    /// Command that was run on the cluster
    pub cmd: CommandLine,

    /// Declared inputs (paths or glob patterns)
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub inputs: Vec<String>,

    /// Declared outputs (paths or glob patterns)
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub outputs: Vec<String>,

    /// Working directory of the command, relative to the dataset root
    #[serde(default = "default_pwd")]
    pub pwd: Utf8PathBuf,

    #[serde(default)]
    pub expand: Option<ExpandMode>,

    /// Only the declared outputs are saved
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub explicit: bool,

    /// Commit message for the run record
    #[serde(default)]
    pub message: Option<String>,

    /// Store the run record next to the commit instead of inside its message
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub sidecar: bool,
}

impl RunArgs {
    pub fn expands_inputs(&self) -> bool {
        self.expand.is_some_and(ExpandMode::covers_inputs)
    }

    pub fn expands_outputs(&self) -> bool {
        self.expand.is_some_and(ExpandMode::covers_outputs)
    }
}

/// Quoted, shortened rendering of a command for one-line summaries.
pub fn format_cmd_shorty(cmd: &CommandLine) -> String {
    let full = cmd.to_string();
    if full.chars().count() < SHORTY_MAX_CHARS {
        format!("'{}'", full)
    } else {
        let head: String = full.chars().take(SHORTY_MAX_CHARS).collect();
        format!("'{}...'", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argv_display_keeps_quoting() {
        let argv = CommandLine::Argv(vec![
            "echo".to_string(),
            "a b".to_string(),
            "it's".to_string(),
        ]);
        let line = argv.to_string();
        assert_eq!(line, r#"echo 'a b' 'it'\''s'"#);
        assert_eq!(
            shell_words::split(&line).unwrap(),
            vec!["echo", "a b", "it's"]
        );

        let shell = CommandLine::Shell("ls -laR > here".to_string());
        assert_eq!(shell.to_string(), "ls -laR > here");
    }

    #[test]
    fn test_parse_full_runargs() {
        let json = r#"{
            "cmd": "bash -c 'ls -laR > here'",
            "inputs": ["data/*.csv"],
            "outputs": ["here"],
            "pwd": ".",
            "expand": "both",
            "explicit": true,
            "message": "list everything",
            "sidecar": false
        }"#;

        let args: RunArgs = serde_json::from_str(json).unwrap();
        assert_eq!(args.cmd.to_string(), "bash -c 'ls -laR > here'");
        assert_eq!(args.inputs, vec!["data/*.csv"]);
        assert_eq!(args.expand, Some(ExpandMode::Both));
        assert!(args.explicit);
        assert!(args.expands_inputs());
        assert!(args.expands_outputs());
        assert_eq!(args.message.as_deref(), Some("list everything"));
    }

    #[test]
    fn test_parse_runargs_with_nulls() {
        let json = r#"{
            "cmd": ["python", "script.py"],
            "inputs": null,
            "outputs": null,
            "expand": null,
            "explicit": null,
            "message": null,
            "sidecar": null
        }"#;

        let args: RunArgs = serde_json::from_str(json).unwrap();
        assert_eq!(args.cmd.to_string(), "python script.py");
        assert!(args.inputs.is_empty());
        assert!(args.outputs.is_empty());
        assert_eq!(args.pwd, Utf8PathBuf::from("."));
        assert_eq!(args.expand, None);
        assert!(!args.explicit);
        assert!(!args.sidecar);
        assert!(!args.expands_outputs());
    }

    #[test]
    fn test_missing_cmd_is_an_error() {
        assert!(serde_json::from_str::<RunArgs>(r#"{"inputs": []}"#).is_err());
    }

    #[test]
    fn test_unknown_expand_mode_is_an_error() {
        let json = r#"{"cmd": "true", "expand": "everything"}"#;
        assert!(serde_json::from_str::<RunArgs>(json).is_err());
    }

    #[test]
    fn test_format_cmd_shorty() {
        let short = CommandLine::Shell("echo hi".to_string());
        assert_eq!(format_cmd_shorty(&short), "'echo hi'");

        let long = CommandLine::Shell("x".repeat(50));
        assert_eq!(format_cmd_shorty(&long), format!("'{}...'", "x".repeat(40)));
    }
}
