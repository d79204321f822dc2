//! A mutex-protected cursor handing out disjoint, fixed-stride index
//! ranges to concurrent pullers.
//!
//! The shape is the same one a dynamic work-stealing scheduler over an
//! index range would use: a single counter, advanced under a lock, one
//! pull at a time. The Task-Graph Sorter uses it for leaf-range dispatch.

use std::sync::Mutex;

pub struct ChunkDispatcher {
    end: usize,
    chunk_size: usize,
    cursor: Mutex<usize>,
}

impl ChunkDispatcher {
    /// Dispatches closed-range chunks of at most `chunk_size` elements
    /// over `[start, end]` inclusive.
    pub fn new(start: usize, end: usize, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            end,
            chunk_size,
            cursor: Mutex::new(start),
        }
    }

    /// Returns the next chunk as `Some((start, end))`, or `None` once the
    /// whole range has been handed out.
    pub fn next_chunk(&self) -> Option<(usize, usize)> {
        let mut cursor = self.cursor.lock().unwrap();
        if *cursor > self.end {
            return None;
        }
        let chunk_start = *cursor;
        let chunk_end = (chunk_start + self.chunk_size - 1).min(self.end);
        *cursor = chunk_end + 1;
        Some((chunk_start, chunk_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn hands_out_disjoint_chunks_until_exhausted() {
        let d = ChunkDispatcher::new(0, 9, 4);
        assert_eq!(d.next_chunk(), Some((0, 3)));
        assert_eq!(d.next_chunk(), Some((4, 7)));
        assert_eq!(d.next_chunk(), Some((8, 9)));
        assert_eq!(d.next_chunk(), None);
    }

    #[test]
    fn concurrent_pulls_never_overlap() {
        let d = Arc::new(ChunkDispatcher::new(0, 999, 10));
        let mut chunks = Vec::new();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let d = Arc::clone(&d);
                    scope.spawn(move || {
                        let mut local = Vec::new();
                        while let Some(chunk) = d.next_chunk() {
                            local.push(chunk);
                        }
                        local
                    })
                })
                .collect();
            for h in handles {
                chunks.extend(h.join().unwrap());
            }
        });
        chunks.sort_unstable();
        let mut expected_start = 0;
        for (start, end) in &chunks {
            assert_eq!(*start, expected_start);
            expected_start = end + 1;
        }
        assert_eq!(expected_start, 1000);
    }
}
