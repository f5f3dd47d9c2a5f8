//! External tools used while merging job results.
//!
//! Commands run on tokio's process support; [`Runner`] wraps that for the
//! synchronous traversal engine.

pub mod archive;
pub mod command;

pub use archive::{ExtractError, Extractor, TarBuiltin, TarCommand};
pub use command::{run_command, run_command_status, CommandError, Runner};
