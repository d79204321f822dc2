//! The single-node farm: one Coordinator and P Worker threads sorting a
//! contiguous range of records via a pairwise merge tree.

mod coordinator;
mod worker;

use crate::error::SortError;
use crate::record::Record;

/// A task-graph sorter bound to one contiguous view of records.
///
/// Construct with the view to sort, the worker count, and an optional
/// base-case size (`0` derives it from `N` and the worker count), then
/// call [`run_until_done`](Self::run_until_done) once.
pub struct TaskGraphSorter<'a> {
    seq: &'a mut [Record],
    worker_threads: usize,
    base_case_size: usize,
}

impl<'a> TaskGraphSorter<'a> {
    pub fn new(seq: &'a mut [Record], worker_threads: usize, base_case_size: usize) -> Self {
        Self {
            seq,
            worker_threads,
            base_case_size,
        }
    }

    /// Blocks until `seq` is fully sorted, or a worker panics.
    pub fn run_until_done(self) -> Result<(), SortError> {
        coordinator::run(self.seq, self.worker_threads, self.base_case_size)
    }
}

/// Convenience wrapper sorting `seq` in place with `worker_threads` workers
/// and a base-case size of `base_case_size` (`0` to derive it).
pub fn sort(seq: &mut [Record], worker_threads: usize, base_case_size: usize) -> Result<(), SortError> {
    TaskGraphSorter::new(seq, worker_threads, base_case_size).run_until_done()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::check_sorted;

    fn recs(keys: &[u64]) -> Vec<Record> {
        keys.iter().map(|&k| Record::new(k, Vec::new())).collect()
    }

    fn keys(seq: &[Record]) -> Vec<u64> {
        seq.iter().map(|r| r.key).collect()
    }

    #[test]
    fn scenario_n8_b2_p2() {
        let mut v = recs(&[5, 3, 8, 1, 7, 2, 6, 4]);
        sort(&mut v, 2, 2).unwrap();
        assert_eq!(keys(&v), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn scenario_all_equal_keys_take_fast_path() {
        let mut v = recs(&[9, 9, 9, 9, 9]);
        sort(&mut v, 3, 0).unwrap();
        assert_eq!(keys(&v), vec![9, 9, 9, 9, 9]);
    }

    #[test]
    fn sorts_one_thousand_records_with_four_workers() {
        let mut v = crate::generator::generate(1000, 8);
        sort(&mut v, 4, 0).unwrap();
        assert!(check_sorted(&v));
    }

    #[test]
    fn empty_input_terminates_immediately() {
        let mut v: Vec<Record> = Vec::new();
        sort(&mut v, 4, 0).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn single_record_is_unchanged() {
        let mut v = recs(&[42]);
        sort(&mut v, 4, 0).unwrap();
        assert_eq!(keys(&v), vec![42]);
    }

    #[test]
    fn worker_count_clamps_when_n_is_smaller() {
        let mut v = recs(&[3, 1, 2]);
        sort(&mut v, 16, 0).unwrap();
        assert_eq!(keys(&v), vec![1, 2, 3]);
    }

    #[test]
    fn base_case_at_least_n_emits_a_single_leaf() {
        let mut v = recs(&[5, 4, 3, 2, 1]);
        sort(&mut v, 4, 100).unwrap();
        assert_eq!(keys(&v), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn already_sorted_input_is_left_bitwise_unchanged() {
        let mut v = recs(&[1, 2, 3, 4, 5, 6, 7]);
        let before = v.clone();
        sort(&mut v, 3, 2).unwrap();
        assert_eq!(v, before);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let mut v = crate::generator::generate(777, 12);
        sort(&mut v, 4, 0).unwrap();
        let once = v.clone();
        sort(&mut v, 4, 0).unwrap();
        assert_eq!(v, once);
    }

    #[test]
    #[cfg_attr(not(feature = "slow_tests"), ignore)]
    fn ten_thousand_random_keys_end_up_sorted() {
        let mut v = crate::generator::generate(10_000, 4);
        sort(&mut v, 8, 0).unwrap();
        assert!(check_sorted(&v));
    }
}
