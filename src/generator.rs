//! Deterministic input generation.
//!
//! Seeded so that two runs over the same `(array_size, payload_size)`
//! produce bitwise identical input, which the idempotence properties in
//! the design rely on.

use rand::distr::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::record::Record;

/// The fixed seed used by every generated run.
pub const SEED: u64 = 42;

const KEY_LOW: u64 = 1;
const KEY_HIGH: u64 = 100_000;

/// Generates `count` records with keys drawn uniformly from
/// `[1, 100_000]` and payloads of `payload_size` bytes drawn uniformly
/// from the printable ASCII range `A..=Z`.
pub fn generate(count: usize, payload_size: usize) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(SEED);
    generate_with_rng(&mut rng, count, payload_size)
}

fn generate_with_rng(rng: &mut StdRng, count: usize, payload_size: usize) -> Vec<Record> {
    let key_dist = Uniform::new_inclusive(KEY_LOW, KEY_HIGH).expect("valid key range");
    let char_dist = Uniform::new_inclusive(b'A', b'Z').expect("valid payload byte range");

    (0..count)
        .map(|_| {
            let key = rng.sample(key_dist);
            let payload = (0..payload_size).map(|_| rng.sample(char_dist)).collect();
            Record::new(key, payload)
        })
        .collect()
}
