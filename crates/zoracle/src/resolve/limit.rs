//! Gas budget enforcement for the end-block resolution pass.
//!
//! Every request goes through two checks against the `end_block_execute_gas_limit` parameter:
//!
//! 1. **Pre-execution** ([`ResolveGasLimiter::pre_execution_check`]), using the request's declared
//!    `execute_gas_limit`:
//!    - A request whose limit alone exceeds the budget fails with [`RequestLimitExceededError`].
//!      It can never fit in any block, so it is resolved as a failure and never retried.
//!    - A request whose limit does not fit the budget left in this block fails with
//!      [`BlockLimitExceededError`]. The pass stops and the request stays pending.
//! 2. **Post-execution** ([`ResolveGasLimiter::record_execution`]): the gas the sandbox reports is
//!    clamped to the declared limit and added to the accumulator. Since the pre-execution check
//!    already admitted the full declared limit, an overflow here is an invariant violation and is
//!    reported as the fatal [`ResolveError::GasOverflow`].
//!
//! The sum of clamped gas recorded by one limiter never exceeds its budget.

use crate::{
    BlockLimitExceededError, PreExecutionRejection, RequestId, RequestLimitExceededError,
    ResolveError,
};

/// Stateful tracker of the gas consumed by one resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveGasLimiter {
    /// The end-block execute gas limit of the pass.
    pub block_gas_limit: u64,
    /// Cumulative clamped gas charged so far.
    pub block_gas_used: u64,
}

impl ResolveGasLimiter {
    /// Creates a limiter with nothing consumed.
    pub fn new(block_gas_limit: u64) -> Self {
        Self { block_gas_limit, block_gas_used: 0 }
    }

    /// Gas left in the budget.
    pub fn remaining(&self) -> u64 {
        self.block_gas_limit.saturating_sub(self.block_gas_used)
    }

    /// Validates a request against the budget before executing it. Does not modify any state.
    pub fn pre_execution_check(
        &self,
        request_id: RequestId,
        execute_gas_limit: u64,
    ) -> Result<(), PreExecutionRejection> {
        // Check the request's own gas limit
        if execute_gas_limit > self.block_gas_limit {
            tracing::debug!(%request_id, execute_gas_limit, limit = self.block_gas_limit, "request can never fit the budget");
            return Err(RequestLimitExceededError::ExecuteGasLimit {
                execute_gas_limit,
                limit: self.block_gas_limit,
            }
            .into());
        }

        // Check the remaining block budget
        let Some(total) = self.block_gas_used.checked_add(execute_gas_limit) else {
            return Err(BlockLimitExceededError::Overflow {
                block_used: self.block_gas_used,
                execute_gas_limit,
            }
            .into());
        };
        if total > self.block_gas_limit {
            return Err(BlockLimitExceededError::ExecuteGasLimit {
                block_used: self.block_gas_used,
                execute_gas_limit,
                limit: self.block_gas_limit,
            }
            .into());
        }

        Ok(())
    }

    /// Charges the gas used by an executed request and returns the amount charged.
    ///
    /// `gas_used` is clamped to `execute_gas_limit`.
    pub fn record_execution<E>(
        &mut self,
        request_id: RequestId,
        execute_gas_limit: u64,
        gas_used: u64,
    ) -> Result<u64, ResolveError<E>> {
        if gas_used > execute_gas_limit {
            tracing::warn!(%request_id, gas_used, execute_gas_limit, "sandbox reported gas above the request limit, clamping");
        }
        let charged = gas_used.min(execute_gas_limit);
        self.block_gas_used = self.block_gas_used.checked_add(charged).ok_or(
            ResolveError::GasOverflow { request_id, consumed: self.block_gas_used, gas_used: charged },
        )?;
        Ok(charged)
    }
}
