//! Off-chain reporter and end-block resolution tooling for oracle data requests.
//!
//! The reporter side runs data source executables on remote function hosts through an
//! [`executor::Executor`] and collects the outputs as raw reports. The `resolve` command runs one
//! end-block resolution pass over a JSON state fixture with the Wasm sandbox.

mod cmd;
pub use cmd::*;

/// Shared error types, logging and input helpers
pub mod common;
/// The `execute` command
pub mod execute;
/// Off-chain executors of data source programs
pub mod executor;
/// Concurrent raw report collection and the `report` command
pub mod report;
/// The `resolve` command
pub mod resolve;
