use crate::{RequestId, ResolveEvent};

/// Error for a request that can never be resolved under the current parameters. The request is
/// resolved as a failure on first encounter and is never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestLimitExceededError {
    /// Request execute gas limit exceeds the end-block budget.
    #[error("Request execute gas limit exceeded: execute_gas_limit={execute_gas_limit} > limit={limit}")]
    ExecuteGasLimit {
        /// Execute gas limit declared by the request
        execute_gas_limit: u64,
        /// End-block execute gas limit
        limit: u64,
    },
}

/// Error for a request that does not fit the budget left in the current block. The request and
/// everything behind it in the pending resolve list are deferred to the next block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockLimitExceededError {
    /// Block execute gas budget exhausted.
    #[error("Block execute gas limit exceeded: block_used={block_used} + execute_gas_limit={execute_gas_limit} > limit={limit}")]
    ExecuteGasLimit {
        /// Gas consumed by the pass so far
        block_used: u64,
        /// Execute gas limit declared by the request
        execute_gas_limit: u64,
        /// End-block execute gas limit
        limit: u64,
    },
    /// The running gas accumulator would overflow.
    #[error("Block execute gas overflow: block_used={block_used} + execute_gas_limit={execute_gas_limit}")]
    Overflow {
        /// Gas consumed by the pass so far
        block_used: u64,
        /// Execute gas limit declared by the request
        execute_gas_limit: u64,
    },
}

/// Why a request was not admitted for execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreExecutionRejection {
    /// Permanent, resolve the request as a failure.
    #[error(transparent)]
    Request(#[from] RequestLimitExceededError),
    /// Transient, stop the pass and keep the request pending.
    #[error(transparent)]
    Block(#[from] BlockLimitExceededError),
}

/// A fatal fault of the resolution pass.
///
/// None of the pass' writes may be committed when this is returned. Ordinary per-request failures
/// are never reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError<E> {
    /// Charging gas already admitted by the pre-execution check overflowed.
    #[error("gas accounting overflow while resolving request {request_id}: consumed={consumed} + gas_used={gas_used}")]
    GasOverflow {
        /// The request being charged
        request_id: RequestId,
        /// Gas consumed by the pass before the request
        consumed: u64,
        /// Clamped gas used by the request
        gas_used: u64,
    },
    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[source] E),
}

/// The outcome of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    /// One event per terminal transition, in queue-processing order.
    pub events: Vec<ResolveEvent>,
    /// The new pending resolve list: the unprocessed suffix of the old one.
    pub pending: Vec<RequestId>,
    /// Total clamped gas charged during the pass.
    pub gas_consumed: u64,
    /// Why the pass stopped early, if it did.
    pub deferred: Option<BlockLimitExceededError>,
}

impl ResolveOutcome {
    /// Returns the ids resolved during the pass, in order.
    pub fn resolved(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.events.iter().map(|event| event.request_id)
    }
}
