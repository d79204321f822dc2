//! The message-passing interlayer, abstracted behind a trait so the
//! binary-tree protocol is exercised and tested on one machine without a
//! real multi-process MPI runtime.

use std::collections::HashMap;

use crossbeam_channel::{Receiver, Sender};

use super::topology::RankId;
use super::wire;
use crate::error::SortError;
use crate::record::Record;

/// The message-passing interlayer of the distributed merge tree. A real
/// multi-process backend (MPI or otherwise) would implement this trait in
/// place of [`ChannelTransport`]; nothing else in the distributed runner
/// would need to change.
///
/// `recv` takes a broadcast `abort` channel alongside the usual
/// `(from, level)` pair: a peer's failure can leave a rank waiting on a
/// message that will never arrive, and the caller closes `abort` to wake
/// every such wait with an error instead of leaving it blocked forever.
pub trait Transport {
    fn send(&self, to: RankId, level: usize, records: &[Record]) -> Result<(), SortError>;
    fn recv(&self, from: RankId, level: usize, abort: &Receiver<()>) -> Result<Vec<Record>, SortError>;
}

/// One rank's view of a set of channels wired up for the whole group, one
/// per `(sender rank, level)` pair the topology can produce. Channels are
/// pre-created before any rank starts running so that a receiver can take
/// ownership of its receiving end, and pre-post a read on it, before its
/// local sort begins (§4.4.5).
pub struct ChannelTransport {
    rank: RankId,
    payload_len: usize,
    senders: HashMap<(RankId, usize), Sender<Vec<u8>>>,
    receivers: HashMap<(RankId, usize), Receiver<Vec<u8>>>,
}

/// Builds the full set of `(sender rank, level)` channels for a group of
/// `p_prime` ranks over `num_levels` merge-tree levels, and splits them
/// into one [`ChannelTransport`] per rank.
pub fn build_group(p_prime: usize, num_levels: usize, payload_len: usize) -> Vec<ChannelTransport> {
    let mut senders: Vec<HashMap<(RankId, usize), Sender<Vec<u8>>>> = (0..p_prime).map(|_| HashMap::new()).collect();
    let mut receivers: Vec<HashMap<(RankId, usize), Receiver<Vec<u8>>>> =
        (0..p_prime).map(|_| HashMap::new()).collect();

    for rank in 0..p_prime {
        for level in 0..num_levels {
            if super::topology::is_sender_at_level(rank, level) {
                let (tx, rx) = crossbeam_channel::bounded::<Vec<u8>>(1);
                senders[rank].insert((rank, level), tx);
                let partner = super::topology::sender_partner(rank, level);
                receivers[partner].insert((rank, level), rx);
            }
        }
    }

    (0..p_prime)
        .map(|rank| ChannelTransport {
            rank,
            payload_len,
            senders: std::mem::take(&mut senders[rank]),
            receivers: std::mem::take(&mut receivers[rank]),
        })
        .collect()
}

impl Transport for ChannelTransport {
    fn send(&self, to: RankId, level: usize, records: &[Record]) -> Result<(), SortError> {
        let channel = self.senders.get(&(self.rank, level)).ok_or_else(|| {
            SortError::Messaging(format!(
                "rank {} has no outbound channel for level {level} (target rank {to})",
                self.rank
            ))
        })?;
        let bytes = wire::encode(records);
        channel
            .send(bytes)
            .map_err(|_| SortError::Messaging(format!("rank {to} is gone; send at level {level} failed")))
    }

    fn recv(&self, from: RankId, level: usize, abort: &Receiver<()>) -> Result<Vec<Record>, SortError> {
        let channel = self.receivers.get(&(from, level)).ok_or_else(|| {
            SortError::Messaging(format!(
                "rank {} has no inbound channel from rank {from} at level {level}",
                self.rank
            ))
        })?;

        let bytes = crossbeam_channel::select! {
            recv(channel) -> msg => msg.map_err(|_| {
                SortError::Messaging(format!("rank {from} is gone; recv at level {level} failed"))
            })?,
            recv(abort) -> _ => {
                return Err(SortError::Messaging(format!(
                    "rank {} aborted its recv from rank {from} at level {level}: a peer failed",
                    self.rank
                )))
            }
        };
        wire::decode(&bytes, self.payload_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_send_is_observed_by_its_topological_partner() {
        let group = build_group(4, 2, 0);
        let records = vec![Record::new(7, Vec::new()), Record::new(9, Vec::new())];
        let (_abort_tx, abort_rx) = crossbeam_channel::bounded::<()>(0);

        std::thread::scope(|scope| {
            let sender = &group[1];
            let receiver = &group[0];
            scope.spawn(|| sender.send(0, 0, &records).unwrap());
            let received = receiver.recv(1, 0, &abort_rx).unwrap();
            assert_eq!(received, records);
        });
    }

    #[test]
    fn recv_on_an_unwired_pair_fails_fast() {
        let group = build_group(4, 2, 0);
        let (_abort_tx, abort_rx) = crossbeam_channel::bounded::<()>(0);
        let err = group[1].recv(3, 0, &abort_rx).unwrap_err();
        assert!(matches!(err, SortError::Messaging(_)));
    }

    #[test]
    fn recv_is_woken_by_a_closed_abort_channel_instead_of_blocking_forever() {
        let group = build_group(4, 2, 0);
        let (abort_tx, abort_rx) = crossbeam_channel::bounded::<()>(0);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                std::thread::sleep(std::time::Duration::from_millis(20));
                drop(abort_tx);
            });
            // rank 0 receives from rank 1 at level 0, but rank 1 never sends.
            let err = group[0].recv(1, 0, &abort_rx).unwrap_err();
            assert!(matches!(err, SortError::Messaging(_)));
        });
    }
}
