//! Deterministic, gas-metered execution of oracle scripts.
//!
//! The resolver only depends on the [`Sandbox`] trait. [`WasmSandbox`] is the production
//! implementation; tests script outcomes with `test_utils::MockSandbox`.

use core::fmt::Debug;

use alloy_primitives::Bytes;
use auto_impl::auto_impl;

use crate::{RawReport, RequestId};

mod error;
mod wasm;

pub use error::*;
pub use wasm::*;

/// The per-request environment exposed to an oracle script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionEnv {
    /// The request being resolved.
    pub request_id: RequestId,
    /// Raw reports collected for the request, in submission order.
    pub raw_reports: Vec<RawReport>,
}

impl ExecutionEnv {
    /// Creates a fresh environment for one execution.
    pub fn new(request_id: RequestId, raw_reports: Vec<RawReport>) -> Self {
        Self { request_id, raw_reports }
    }
}

/// The outcome of executing an oracle script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// The returned bytes, or why execution failed.
    pub result: Result<Bytes, SandboxError>,
    /// Gas used by the execution. May exceed the gas limit by the cost of the operation that
    /// exhausted it; callers clamp.
    pub gas_used: u64,
}

impl ExecutionOutcome {
    /// A successful execution.
    pub fn success(output: impl Into<Bytes>, gas_used: u64) -> Self {
        Self { result: Ok(output.into()), gas_used }
    }

    /// A failed execution.
    pub fn failure(error: SandboxError, gas_used: u64) -> Self {
        Self { result: Err(error), gas_used }
    }
}

/// A deterministic executor of oracle script bytecode.
///
/// Implementations must produce identical outcomes for identical inputs on every node: no clock,
/// no randomness, no nondeterministic floating point and no work beyond `gas_limit`.
#[auto_impl(&, Box, Arc)]
pub trait Sandbox: Debug {
    /// Executes `entry_point` of `code` with `calldata` under `gas_limit`.
    fn execute(
        &self,
        env: &ExecutionEnv,
        code: &[u8],
        entry_point: &str,
        calldata: &[u8],
        gas_limit: u64,
    ) -> ExecutionOutcome;
}
