use std::process::ExitStatus;

use crate::relay::SyncReport;

#[derive(Debug)]
pub enum ExecError
{
    Launch(std::io::Error),
    Io(std::io::Error),
    Status(ExitStatus),
}

impl std::error::Error for ExecError {}

impl std::fmt::Display for ExecError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self {
            ExecError::Launch(e) => write!(f, "cannot start process: {}", e),
            ExecError::Io(e) => write!(f, "process I/O failed: {}", e),
            ExecError::Status(s) => write!(f, "process exited with {}", s),
        }
    }
}

#[derive(Debug)]
pub enum RelayError
{
    ToolUnavailable(ExecError),
    TagExpansionFailed(registry_client::Error),
    PartialFailure(SyncReport),
    InvalidPlatform(String),
    InvalidTagFilter(regex::Error),
}

impl std::error::Error for RelayError {}

impl std::fmt::Display for RelayError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self {
            RelayError::ToolUnavailable(e) => write!(f, "cannot execute skopeo: {}", e),
            RelayError::TagExpansionFailed(e) => write!(f, "error expanding tags: {}", e),
            RelayError::PartialFailure(report) => write!(
                f,
                "errors during sync: {} of {} tag(s) failed",
                report.failed().count(),
                report.len()
            ),
            RelayError::InvalidPlatform(p) => write!(f, "invalid platform \"{}\"", p),
            RelayError::InvalidTagFilter(e) => write!(f, "invalid tag filter: {}", e),
        }
    }
}

impl From<registry_client::Error> for RelayError
{
    fn from(value: registry_client::Error) -> Self
    {
        Self::TagExpansionFailed(value)
    }
}

impl From<regex::Error> for RelayError
{
    fn from(value: regex::Error) -> Self
    {
        Self::InvalidTagFilter(value)
    }
}
