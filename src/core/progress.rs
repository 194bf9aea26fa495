//! Progress events emitted by directory jobs.
//!
//! A directory job sends exactly one [`ProgressEvent`] per processed file
//! over an `mpsc` channel, after that file has finished, whether it
//! succeeded or failed.  The consumer decides how to render them.

use std::sync::mpsc::Sender;

/// How a single entry ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    /// The error message; the full error is kept in the job report.
    Failed(String),
}

/// One processed entry of a directory job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 1-based position of this entry.
    pub current: usize,
    pub total: usize,
    /// Path relative to the job's input root.
    pub relative_path: String,
    pub outcome: Outcome,
}

impl ProgressEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Send an event if a channel was supplied.  A hung-up receiver is not
/// an error: the job keeps running.
pub(crate) fn emit(progress: Option<&Sender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = progress {
        let _ = tx.send(event);
    }
}
