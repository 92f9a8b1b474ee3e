//! Vigia CLI Library
//!
//! Command-line surface over the Vigia hybrid visual comparator.

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod error;
pub mod handlers;
pub mod logging;

pub use commands::{parse_ignore, Cli, Commands, CompareArgs, ModelArgs, ProbeArgs};
pub use error::{CliError, CliResult};
pub use handlers::{run_compare, run_probe, Outcome, ERROR_EXIT_CODE};
pub use logging::init_tracing;
