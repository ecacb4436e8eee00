//! The end-block resolution pass.
//!
//! [`end_block`] is called once per block at a fixed point of block finalization. It is
//! single-threaded and never suspends: the gas budget is the only bound on its work.
//!
//! Per-request outcomes never surface as errors. A request is either resolved (one
//! [`ResolveEvent`](crate::ResolveEvent) per terminal transition) or deferred together with the
//! rest of the list. [`ResolveError`] is reserved for faults after which the node must halt instead
//! of committing the block.

mod limit;
mod result;
mod scheduler;

pub use limit::*;
pub use result::*;
pub use scheduler::*;
