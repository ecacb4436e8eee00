//! End-block resolution of oracle data requests.
//!
//! Once per block the [`end_block`] entry point drains the pending resolve list, runs every
//! request's oracle script inside a gas-metered [`Sandbox`] and decides, under the
//! `end_block_execute_gas_limit` parameter, which requests resolve in this block and which are
//! carried over to the next one.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod event;
pub use event::*;

mod resolve;
pub use resolve::*;

mod sandbox;
pub use sandbox::*;

mod store;
pub use store::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod types;
pub use types::*;

pub use alloy_primitives::{Bytes, B256};
