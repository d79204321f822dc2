//! The Coordinator: single scheduling authority for one node's sort.
//!
//! Owns the Level Queue and the Reusable Task Pool; never touches record
//! storage itself except to sort the trailing short leaf at start-up and
//! to perform the final merge when only two ranges remain.

use crossbeam_channel::{Receiver, Sender};
use log::debug;

use crate::error::SortError;
use crate::merge::{merge_inplace, sort_inplace};
use crate::record::Record;
use crate::sync_slice::SyncSlice;
use crate::task::{LevelQueue, Task, TaskPool};

use super::worker::{self, FeedbackMessage, WorkerMessage};

/// Sorts `seq` in place using a farm of `worker_threads` Worker threads and
/// leaf ranges of at most `base_case_size` elements (`0` derives it as
/// `ceil(N / worker_threads)`).
pub(crate) fn run(
    seq: &mut [Record],
    worker_threads: usize,
    base_case_size: usize,
) -> Result<(), SortError> {
    let n = seq.len();
    if n <= 1 {
        return Ok(());
    }

    let worker_count = worker_threads.min(n).max(1);
    let base_case_size = if base_case_size == 0 {
        n.div_ceil(worker_count).max(1)
    } else {
        base_case_size
    };

    let shared = SyncSlice::new(seq);
    let (feedback_tx, feedback_rx) = crossbeam_channel::unbounded::<FeedbackMessage>();
    let inboxes: Vec<(Sender<WorkerMessage>, Receiver<WorkerMessage>)> =
        (0..worker_count).map(|_| crossbeam_channel::unbounded()).collect();

    let mut pool = TaskPool::with_capacity_for_leaves(n.div_ceil(base_case_size).max(1));
    let mut queue = LevelQueue::new();

    std::thread::scope(|scope| {
        for (id, (_, inbox)) in inboxes.iter().enumerate() {
            let shared = &shared;
            let feedback_tx = feedback_tx.clone();
            scope.spawn(move || worker::run(id, shared, inbox, &feedback_tx));
        }
        // Drop our own clone so the feedback channel closes once every
        // worker thread has exited.
        drop(feedback_tx);

        let senders: Vec<&Sender<WorkerMessage>> = inboxes.iter().map(|(tx, _)| tx).collect();

        let mut expected =
            dispatch_leaves(&shared, n, base_case_size, worker_count, &senders, &mut pool, &mut queue);
        let mut completed = 0usize;
        let mut active_workers = worker_count;

        let result = loop {
            if completed == expected {
                match queue.len() {
                    0 | 1 => break Ok(()),
                    2 => {
                        finish_inline(&shared, &pool, &queue);
                        break Ok(());
                    }
                    _ => {
                        let (next_queue, next_expected, next_active) = advance_level(
                            std::mem::take(&mut queue),
                            &mut pool,
                            &senders,
                            active_workers,
                        );
                        queue = next_queue;
                        expected = next_expected;
                        active_workers = next_active;
                        completed = 0;
                        continue;
                    }
                }
            }

            match feedback_rx.recv() {
                Ok(FeedbackMessage::Completed(_)) => {
                    completed += 1;
                }
                Ok(FeedbackMessage::Failed(msg)) => {
                    break Err(SortError::Scheduling(msg));
                }
                Err(_) => {
                    break Err(SortError::Scheduling(
                        "feedback channel closed before the sort completed".to_string(),
                    ));
                }
            }
        };

        for sender in &senders {
            let _ = sender.send(WorkerMessage::Shutdown);
        }

        result
    })
}

/// Dispatches leaf Sort tasks for `[0, n)` in chunks of `base_case_size`,
/// appending their ranges to `queue` in input order. If the last leaf is
/// shorter than `base_case_size`, the Coordinator sorts it itself instead
/// of dispatching it, and it does not count toward the returned expected
/// count.
fn dispatch_leaves(
    shared: &SyncSlice<'_, Record>,
    n: usize,
    base_case_size: usize,
    worker_count: usize,
    senders: &[&Sender<WorkerMessage>],
    pool: &mut TaskPool,
    queue: &mut LevelQueue,
) -> usize {
    let mut leaves = Vec::new();
    let mut i = 0;
    while i < n {
        let end = (i + base_case_size - 1).min(n - 1);
        leaves.push(Task::Sort { start: i, end });
        i = end + 1;
    }

    let last_is_short = leaves
        .last()
        .map(|t| t.len() < base_case_size)
        .unwrap_or(false);

    let retained = if last_is_short { leaves.pop() } else { None };

    let mut dispatched = 0usize;
    for (leaf_index, task) in leaves.into_iter().enumerate() {
        let task_index = pool.push(task);
        queue.push(task_index);
        let worker = leaf_index % worker_count;
        let _ = senders[worker].send(WorkerMessage::Task(task));
        dispatched += 1;
    }

    if let Some(Task::Sort { start, end }) = retained {
        debug!("coordinator sorting trailing short leaf [{start}, {end}] locally");
        let range = unsafe { shared.get_mut_range(start, end) };
        let last = range.len() - 1;
        sort_inplace(range, 0, last);
        let task_index = pool.push(Task::Sort { start, end });
        queue.push(task_index);
    }

    dispatched
}

/// Pairs up `queue`'s entries front-to-back, emits one Merge task per pair
/// (carrying any odd tail forward unchanged), prunes the worker pool down
/// to the new expected count, and returns the next level's queue.
fn advance_level(
    queue: LevelQueue,
    pool: &mut TaskPool,
    senders: &[&Sender<WorkerMessage>],
    previous_active: usize,
) -> (LevelQueue, usize, usize) {
    let (pairs, odd_tail) = queue.into_pairs();
    let mut next_queue = LevelQueue::new();
    let new_expected = pairs.len();
    let new_active = previous_active.min(new_expected.max(1));

    for (k, (left_index, right_index)) in pairs.into_iter().enumerate() {
        let left = pool.get(left_index);
        let right = pool.get(right_index);
        let merge = Task::Merge {
            start: left.start(),
            middle: left.end(),
            end: right.end(),
        };
        let task_index = pool.push(merge);
        next_queue.push(task_index);
        let worker = k % new_active;
        let _ = senders[worker].send(WorkerMessage::Task(merge));
    }

    if let Some(tail_index) = odd_tail {
        next_queue.push(tail_index);
    }

    for sender in senders.iter().skip(new_active).take(previous_active.saturating_sub(new_active)) {
        let _ = sender.send(WorkerMessage::Shutdown);
    }

    (next_queue, new_expected, new_active)
}

/// Performs the last merge inline on the Coordinator's own thread when
/// exactly two ranges remain.
fn finish_inline(shared: &SyncSlice<'_, Record>, pool: &TaskPool, queue: &LevelQueue) {
    debug_assert_eq!(queue.len(), 2);
    let left = pool.get(queue.entries()[0]);
    let right = pool.get(queue.entries()[1]);

    let range = unsafe { shared.get_mut_range(left.start(), right.end()) };
    let last = range.len() - 1;
    merge_inplace(range, 0, left.end() - left.start(), last);
}
