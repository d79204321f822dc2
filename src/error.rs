//! The error taxonomy surfaced by every layer of the sorter.
//!
//! Internally call sites use `anyhow::Result` with `.context(..)` the way
//! the CLI layer does, but anything that crosses a public boundary (the
//! sorter's `run_until_done`, the distributed runner, the wire codec)
//! returns one of these variants so the binary can map it to a distinct
//! exit code.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortError {
    /// A bad CLI argument, or an array size exceeding the platform's
    /// per-message count limit.
    Configuration(String),
    /// A channel closed unexpectedly, or a worker received an ill-formed
    /// task.
    Scheduling(String),
    /// A failure of the inter-rank message-passing interlayer, including a
    /// wire-codec decode failure.
    Messaging(String),
    /// The final check that the output is sorted failed.
    PostCondition(String),
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            SortError::Scheduling(msg) => write!(f, "scheduling error: {msg}"),
            SortError::Messaging(msg) => write!(f, "messaging error: {msg}"),
            SortError::PostCondition(msg) => write!(f, "post-condition error: {msg}"),
        }
    }
}

impl std::error::Error for SortError {}

impl SortError {
    /// The process exit code this error category maps to. `0` is reserved
    /// for success and is never returned here.
    pub fn exit_code(&self) -> i32 {
        match self {
            SortError::Configuration(_) => 1,
            SortError::Scheduling(_) => 2,
            SortError::Messaging(_) => 3,
            SortError::PostCondition(_) => 4,
        }
    }
}
