//! Teaching output for generated exercises.
//!
//! - [`trace`] - Step-by-step derivation of each exercise kind
//! - [`binary`] - Nibble-grouped binary renderings

mod binary;
mod trace;

// Re-export public functions
pub use binary::{nibble_binary, split_binary};
pub use trace::{build_trace, MagicMethod, TraceData};
