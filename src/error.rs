use std::path::PathBuf;
use thiserror::Error;

/// Outcomes the tools report to the user instead of failing with a trace.
///
/// Anything else (I/O, ZIP, XML, JSON) travels as a plain `anyhow::Error`
/// and aborts the run.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The user did not pick an input. Carries the notice to print.
    #[error("{0}")]
    NoSelection(&'static str),

    #[error("Invalid folder path. Please try again.")]
    InvalidFolder(PathBuf),

    #[error("No JSON files found in the provided folder.")]
    NoJsonFiles(PathBuf),
}

impl ToolError {
    /// Declining to pick an input is not a failure.
    pub fn is_graceful(&self) -> bool {
        matches!(self, ToolError::NoSelection(_))
    }
}
