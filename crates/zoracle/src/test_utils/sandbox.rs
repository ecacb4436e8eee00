use std::{cell::RefCell, collections::BTreeMap};

use alloy_primitives::Bytes;

use crate::{ExecutionEnv, ExecutionOutcome, RequestId, Sandbox, SandboxError};

/// Scripted behavior of a mock oracle script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockScript {
    /// Returns the calldata.
    Echo {
        /// Gas reported as used.
        gas_used: u64,
    },
    /// Returns fixed bytes.
    Return {
        /// The returned bytes.
        output: Bytes,
        /// Gas reported as used.
        gas_used: u64,
    },
    /// Fails with the given error.
    Fail {
        /// The execution error.
        error: SandboxError,
        /// Gas reported as used.
        gas_used: u64,
    },
    /// Runs out of gas, reporting the full gas limit plus `overshoot` as used.
    OutOfGas {
        /// Gas reported above the limit.
        overshoot: u64,
    },
}

/// A recorded call into a [`MockSandbox`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// The request being resolved.
    pub request_id: RequestId,
    /// The entry point invoked.
    pub entry_point: String,
    /// The calldata passed.
    pub calldata: Bytes,
    /// The gas limit passed.
    pub gas_limit: u64,
    /// The number of raw reports in the environment.
    pub raw_report_count: usize,
}

/// A [`Sandbox`] whose outcomes are scripted per bytecode.
///
/// Code without a scripted behavior fails with [`SandboxError::InvalidModule`] and no gas.
#[derive(Debug, Default)]
pub struct MockSandbox {
    scripts: BTreeMap<Vec<u8>, MockScript>,
    calls: RefCell<Vec<MockCall>>,
}

impl MockSandbox {
    /// Scripts the behavior of `code`.
    pub fn with_script(mut self, code: impl AsRef<[u8]>, script: MockScript) -> Self {
        self.scripts.insert(code.as_ref().to_vec(), script);
        self
    }

    /// Returns the calls made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.borrow().clone()
    }

    /// Returns the ids of the requests executed so far, in order.
    pub fn executed(&self) -> Vec<RequestId> {
        self.calls.borrow().iter().map(|call| call.request_id).collect()
    }
}

impl Sandbox for MockSandbox {
    fn execute(
        &self,
        env: &ExecutionEnv,
        code: &[u8],
        entry_point: &str,
        calldata: &[u8],
        gas_limit: u64,
    ) -> ExecutionOutcome {
        self.calls.borrow_mut().push(MockCall {
            request_id: env.request_id,
            entry_point: entry_point.to_string(),
            calldata: Bytes::copy_from_slice(calldata),
            gas_limit,
            raw_report_count: env.raw_reports.len(),
        });

        match self.scripts.get(code) {
            Some(MockScript::Echo { gas_used }) => {
                ExecutionOutcome::success(Bytes::copy_from_slice(calldata), *gas_used)
            }
            Some(MockScript::Return { output, gas_used }) => {
                ExecutionOutcome::success(output.clone(), *gas_used)
            }
            Some(MockScript::Fail { error, gas_used }) => {
                ExecutionOutcome::failure(error.clone(), *gas_used)
            }
            Some(MockScript::OutOfGas { overshoot }) => {
                ExecutionOutcome::failure(SandboxError::OutOfGas, gas_limit.saturating_add(*overshoot))
            }
            None => ExecutionOutcome::failure(
                SandboxError::InvalidModule("unknown mock script".to_string()),
                0,
            ),
        }
    }
}
