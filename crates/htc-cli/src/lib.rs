//! CLI argument parsing for htc-results.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use htc_results::{Archiver, Filter, Operation, ResultsConfig};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Show submissions and jobs with their state
    #[default]
    List,
    /// Unpack job outputs into the dataset and record the execution
    Merge,
    /// Delete submissions or jobs from the store
    Remove,
}

impl From<Command> for Operation {
    fn from(command: Command) -> Self {
        match command {
            Command::List => Operation::List,
            Command::Merge => Operation::Merge,
            Command::Remove => Operation::Remove,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiverArg {
    /// System tar
    #[default]
    Tar,
    /// Built-in extraction of plain tar archives
    Builtin,
}

impl From<ArchiverArg> for Archiver {
    fn from(arg: ArchiverArg) -> Self {
        match arg {
            ArchiverArg::Tar => Archiver::Tar,
            ArchiverArg::Builtin => Archiver::Builtin,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "htc-results")]
#[command(about = "Inspect, merge and remove results of HTCondor submissions")]
pub struct Args {
    /// Operation to perform
    #[arg(value_enum, default_value_t = Command::List)]
    pub command: Command,

    /// Restrict to this submission
    pub submission: Option<u64>,

    /// Restrict to this job number
    #[arg(short, long)]
    pub job: Option<u64>,

    /// Allow removing every submission
    #[arg(long)]
    pub all: bool,

    /// Dataset directory
    #[arg(short, long, default_value = ".")]
    pub dataset: Utf8PathBuf,

    /// Submission store, relative to the dataset unless absolute
    #[arg(long)]
    pub store: Option<Utf8PathBuf>,

    /// How job output archives are unpacked
    #[arg(long, value_enum, default_value_t = ArchiverArg::Tar)]
    pub archiver: ArchiverArg,

    /// Print one JSON record per line
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn operation(&self) -> Operation {
        self.command.into()
    }

    pub fn filter(&self) -> Filter {
        Filter {
            submission: self.submission,
            job: self.job,
        }
    }

    pub fn config(&self) -> ResultsConfig {
        ResultsConfig {
            dataset: self.dataset.clone(),
            store: self.store.clone(),
            archiver: self.archiver.into(),
        }
    }
}
