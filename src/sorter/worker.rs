//! Worker actors: each executes one task at a time and reports completion.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crossbeam_channel::{Receiver, Sender};

use crate::merge::{merge_inplace, sort_inplace};
use crate::record::Record;
use crate::sync_slice::SyncSlice;
use crate::task::{Completion, Task};

/// A message sent from the Coordinator to one Worker's input channel.
pub(crate) enum WorkerMessage {
    Task(Task),
    Shutdown,
}

/// A message sent from any Worker to the Coordinator's shared feedback
/// channel.
pub(crate) enum FeedbackMessage {
    Completed(Completion),
    /// A task body panicked; carries a human-readable description. The
    /// Coordinator treats this as fatal (`SortError::Scheduling`).
    Failed(String),
}

/// Runs one worker: pulls tasks from `inbox` until a `Shutdown` message or
/// the channel closes, executing each task against the shared view of the
/// input sequence and reporting back on `feedback`.
pub(crate) fn run(
    worker_id: usize,
    shared: &SyncSlice<'_, Record>,
    inbox: &Receiver<WorkerMessage>,
    feedback: &Sender<FeedbackMessage>,
) {
    while let Ok(message) = inbox.recv() {
        let task = match message {
            WorkerMessage::Shutdown => break,
            WorkerMessage::Task(task) => task,
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| execute(shared, task)));
        let report = match outcome {
            Ok(()) => FeedbackMessage::Completed(task.into()),
            Err(panic) => FeedbackMessage::Failed(format!(
                "worker {worker_id} panicked on {task:?}: {}",
                panic_message(&panic)
            )),
        };
        if feedback.send(report).is_err() {
            // The Coordinator is gone; nothing left to report to.
            break;
        }
    }
}

/// Executes one task body against its (disjoint) range of the shared
/// sequence. Never retains a reference across calls.
fn execute(shared: &SyncSlice<'_, Record>, task: Task) {
    match task {
        Task::Sort { start, end } => {
            let range = unsafe { shared.get_mut_range(start, end) };
            let last = range.len() - 1;
            sort_inplace(range, 0, last);
        }
        Task::Merge { start, middle, end } => {
            let range = unsafe { shared.get_mut_range(start, end) };
            merge_inplace(range, 0, middle - start, end - start);
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
