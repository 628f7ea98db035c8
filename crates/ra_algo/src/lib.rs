// crates/ra_algo/src/lib.rs
//! ra_algo: Allocation Engine and Summary Calculator.
//!
//! Pure in-memory transformation over `ra_core::Unit` slices:
//! - `engine::allocate` runs the single-pass greedy match (origins × destinations)
//! - `summary::summarize` reduces before/after state + edges into metrics and
//!   cross-checks `amount_allocated` along both computation paths.
//!
//! No I/O, no RNG, no threads. One call = one independent run.

#![forbid(unsafe_code)]

pub mod engine;
pub mod summary;

pub use engine::allocate;
pub use summary::{summarize, Summary};

// ----------------------------- Errors ------------------------------------------------

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum AllocError {
        /// Configuration rejected before any unit is touched.
        #[error("invalid configuration: {0}")]
        InvalidConfig(String),
        /// Internal consistency violation (a bug, never a user error).
        #[error("invariant violated: {0}")]
        Invariant(String),
        #[error("arithmetic overflow: {0}")]
        Overflow(&'static str),
    }
}

pub use errors::AllocError;
