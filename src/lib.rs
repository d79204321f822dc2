#![doc = include_str!("../README.md")]
// No warnings
//#![deny(warnings)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
//#![deny(unused_results)]

// the code must be documented and everything should have a debug print implementation
#![deny(unused_doc_comments)]
//#![deny(missing_docs)]

pub mod chunk_dispatcher;
pub mod config;
pub mod distributed;
pub mod error;
pub mod generator;
pub mod merge;
pub mod record;
pub mod sorter;
pub mod sync_slice;
pub mod task;

/// Prelude module to import everything from this crate
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::SortError;
    pub use crate::record::{check_sorted, Record};
    pub use crate::sorter::sort;
}
