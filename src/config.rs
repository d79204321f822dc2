//! Typed configuration shared by the single-node and distributed runners.

use crate::error::SortError;

/// The per-run configuration derived from CLI arguments (§6 of the design).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// N: the number of records to generate and sort.
    pub array_size: usize,
    /// Bytes per record's payload.
    pub payload_size: usize,
    /// Leaf Sort range length. `0` means "derive as `ceil(N/P)`".
    pub base_case_size: usize,
    /// P: the per-node worker thread count.
    pub worker_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            array_size: 10240,
            payload_size: 1024,
            base_case_size: 0,
            worker_threads: num_cpus::get(),
        }
    }
}

impl Config {
    /// The base-case size to actually use, deriving it from `array_size`
    /// and `worker_threads` when the configured value is `0`.
    pub fn effective_base_case_size(&self) -> usize {
        if self.base_case_size != 0 {
            return self.base_case_size;
        }
        if self.worker_threads == 0 {
            return self.array_size.max(1);
        }
        self.array_size.div_ceil(self.worker_threads).max(1)
    }

    /// The worker count to actually use: at most `array_size` workers are
    /// ever useful, so a small N clamps P down.
    pub fn effective_worker_threads(&self) -> usize {
        self.worker_threads.min(self.array_size.max(1)).max(1)
    }
}

/// Parses a positive integer size, accepting an optional `K` or `M`
/// suffix (case-insensitive), matching the distillation's own multipliers:
/// `K` = 1_000, `M` = 1_000_000.
pub fn parse_size(arg: &str) -> anyhow::Result<usize> {
    let arg = arg.trim();
    anyhow::ensure!(!arg.is_empty(), "empty size argument");

    let (digits, multiplier) = match arg.chars().last() {
        Some('K') | Some('k') => (&arg[..arg.len() - 1], 1_000u64),
        Some('M') | Some('m') => (&arg[..arg.len() - 1], 1_000_000u64),
        _ => (arg, 1u64),
    };
    let n: u64 = digits
        .parse()
        .map_err(|_| SortError::Configuration(format!("invalid size: {arg}")))?;
    Ok((n * multiplier) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_integers() {
        assert_eq!(parse_size("10240").unwrap(), 10240);
        assert_eq!(parse_size("0").unwrap(), 0);
    }

    #[test]
    fn parses_k_and_m_suffixes_either_case() {
        assert_eq!(parse_size("10K").unwrap(), 10_000);
        assert_eq!(parse_size("10k").unwrap(), 10_000);
        assert_eq!(parse_size("2M").unwrap(), 2_000_000);
        assert_eq!(parse_size("2m").unwrap(), 2_000_000);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("10X").is_err());
    }

    #[test]
    fn base_case_size_derives_from_n_and_p() {
        let cfg = Config {
            array_size: 1000,
            payload_size: 8,
            base_case_size: 0,
            worker_threads: 4,
        };
        assert_eq!(cfg.effective_base_case_size(), 250);

        let cfg = Config {
            base_case_size: 0,
            array_size: 1001,
            worker_threads: 4,
            ..cfg
        };
        assert_eq!(cfg.effective_base_case_size(), 251);
    }

    #[test]
    fn worker_threads_clamp_to_array_size() {
        let cfg = Config {
            array_size: 3,
            worker_threads: 8,
            ..Config::default()
        };
        assert_eq!(cfg.effective_worker_threads(), 3);
    }
}
