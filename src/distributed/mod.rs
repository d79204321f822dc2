//! The distributed merge tree: scatters an input across a power-of-two
//! group of simulated participants, sorts each share locally, then merges
//! pairwise up a binary tree until rank 0 holds the global result.

pub mod topology;
pub mod transport;
pub mod wire;

use log::{info, warn};

use crate::error::SortError;
use crate::merge::merge_appending;
use crate::record::Record;
use crate::sorter;
use topology::RankId;
use transport::{ChannelTransport, Transport};

/// The per-message element-count ceiling the implementation refuses to
/// exceed, matching the conventional MPI single-message count limit.
pub const MAX_MESSAGE_ELEMENTS: u64 = u32::MAX as u64;

/// Sorts `input` using `requested_ranks` simulated participants (each an
/// OS thread), each running the Task-Graph Sorter (§4.3) with
/// `worker_threads` workers and the given base-case size. Returns the
/// fully sorted sequence, owned by the caller.
pub fn run(
    input: Vec<Record>,
    requested_ranks: usize,
    worker_threads: usize,
    base_case_size: usize,
) -> Result<Vec<Record>, SortError> {
    let n = input.len();
    if n as u64 > MAX_MESSAGE_ELEMENTS {
        return Err(SortError::Configuration(format!(
            "array size {n} exceeds the per-message element limit of {MAX_MESSAGE_ELEMENTS}"
        )));
    }

    let p_prime = topology::active_participants(requested_ranks.max(1));
    if p_prime != requested_ranks {
        warn!(
            "participant count {requested_ranks} is not a power of two; \
             only the first {p_prime} ranks take part, the rest exit immediately"
        );
    }

    if p_prime == 1 {
        let mut local = input;
        sorter::sort(&mut local, worker_threads, base_case_size)?;
        return Ok(local);
    }

    let payload_len = input.first().map(|r| r.payload.len()).unwrap_or(0);
    let num_levels = topology::num_levels(p_prime);
    let transports = transport::build_group(p_prime, num_levels, payload_len);

    let chunks: Vec<Vec<Record>> = (0..p_prime)
        .map(|rank| {
            let (start, end) = topology::chunk_bounds(n, p_prime, rank);
            input[start..end].to_vec()
        })
        .collect();

    // Closing `abort_tx` wakes every rank currently blocked in
    // `Transport::recv` with an error instead of leaving it stuck forever
    // on a message a failed peer will never send (§4.4.7/§7: a messaging
    // failure anywhere is fatal for the whole run, not just its rank).
    let (abort_tx, abort_rx) = crossbeam_channel::bounded::<()>(0);
    let mut abort_tx = Some(abort_tx);
    let start = std::time::Instant::now();
    let mut outcomes: Vec<Option<Result<Vec<Record>, SortError>>> = (0..p_prime).map(|_| None).collect();

    std::thread::scope(|scope| {
        let (result_tx, result_rx) = crossbeam_channel::bounded::<(RankId, Result<Vec<Record>, SortError>)>(p_prime);

        for (rank, chunk) in chunks.into_iter().enumerate() {
            let result_tx = result_tx.clone();
            let abort_rx = abort_rx.clone();
            let transport = &transports[rank];
            scope.spawn(move || {
                let outcome = run_rank(rank, chunk, transport, num_levels, worker_threads, base_case_size, &abort_rx);
                let _ = result_tx.send((rank, outcome));
            });
        }
        drop(result_tx);

        // Drains every rank's outcome as it arrives (not just rank 0's), so
        // a non-root rank's failure is never silently discarded. As soon as
        // any rank reports an error, closes `abort_tx` so ranks still
        // blocked on a recv that will now never be satisfied wake up and
        // fail instead of hanging, while this loop keeps draining until
        // every rank has reported.
        while let Ok((rank, outcome)) = result_rx.recv() {
            if outcome.is_err() {
                abort_tx.take();
            }
            outcomes[rank] = Some(outcome);
        }
    });

    if let Some(err) = outcomes.iter().find_map(|o| match o {
        Some(Err(e)) => Some(e.clone()),
        _ => None,
    }) {
        return Err(err);
    }

    let sorted = outcomes[0].take().unwrap_or_else(|| {
        Err(SortError::Scheduling(
            "rank 0 exited without reporting a result".to_string(),
        ))
    })?;

    info!(
        "distributed sort of {n} records across {p_prime} ranks finished in {:.3}s",
        start.elapsed().as_secs_f64()
    );
    Ok(sorted)
}

/// One participant's full lifecycle: run the local sort, then walk the
/// merge-tree levels in order, sending once and exiting, or merging in an
/// incoming range, at each level. A receive at a level whose sender has
/// not sent yet simply waits on that level's channel directly, issued
/// from this rank's own thread (§5); the channel's capacity of one lets a
/// sender deposit its message as soon as it is ready, so communication
/// still overlaps with a receiving peer's local sort without needing a
/// second thread to pre-post the read.
fn run_rank(
    rank: RankId,
    mut local: Vec<Record>,
    transport: &ChannelTransport,
    num_levels: usize,
    worker_threads: usize,
    base_case_size: usize,
    abort: &crossbeam_channel::Receiver<()>,
) -> Result<Vec<Record>, SortError> {
    sorter::sort(&mut local, worker_threads, base_case_size)?;

    for level in 0..num_levels {
        if topology::is_sender_at_level(rank, level) {
            let target = topology::sender_partner(rank, level);
            transport.send(target, level, &local)?;
            return Ok(Vec::new());
        }
        if topology::is_receiver_at_level(rank, level, num_levels) {
            let partner = topology::receiver_partner(rank, level);
            let incoming = transport.recv(partner, level, abort)?;
            merge_appending(&mut local, incoming);
        }
    }

    Ok(local)
}
