#![deny(clippy::all, warnings)]

mod consolidate;
mod outcome;
mod process;
mod toolkit;

pub use consolidate::{consolidate, ConsolidateRequest};
pub use outcome::{to_json_response, CommandStatus, ExecutionOutcome};
pub use process::RunOutput;
pub use toolkit::{OgrToolkit, ToolkitError};
