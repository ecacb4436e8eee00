use alloy_primitives::Bytes;
use tracing::{debug, error, info, warn};

use crate::{
    constants::sandbox::EXECUTE_ENTRY_POINT, BlockLimitExceededError, ExecutionEnv, OracleResult,
    OracleStore, Params, PreExecutionRejection, RequestId, ResolveError, ResolveEvent,
    ResolveGasLimiter, ResolveOutcome, Sandbox, StoreOverlay,
};

/// What one pending resolve list entry came to.
#[derive(Debug)]
enum Step {
    /// The request reached a terminal status.
    Resolved(ResolveEvent),
    /// The entry was already terminal and is dropped without an event.
    Dropped,
    /// The request does not fit the remaining budget; the pass stops here.
    Deferred(BlockLimitExceededError),
}

/// Runs the end-block resolution pass of the current block.
///
/// Reads [`Params`] once, runs [`run_once`] against a [`StoreOverlay`] and hands the buffered
/// changes to `store` in one [`OracleStore::commit`], only if the pass finished. On error `store`
/// is left untouched and the block must not be committed.
pub fn end_block<S, X>(store: &mut S, sandbox: &X) -> Result<ResolveOutcome, ResolveError<S::Error>>
where
    S: OracleStore,
    X: Sandbox + ?Sized,
{
    let params = store.params().map_err(ResolveError::Store)?;

    let mut overlay = StoreOverlay::new(&*store);
    let outcome = run_once(&mut overlay, sandbox, &params).inspect_err(|err| {
        error!(%err, "end-block resolution aborted, discarding all changes");
    })?;
    let changes = overlay.into_changes();

    store.commit(changes).map_err(ResolveError::Store)?;
    Ok(outcome)
}

/// Resolves pending requests in FIFO order until the list is exhausted or the next request does
/// not fit the remaining `params.end_block_execute_gas_limit`.
///
/// Every processed entry is removed from the pending resolve list whatever its outcome. The list
/// written back is exactly the unprocessed suffix, in queue order. Writes go straight to
/// `store`; use [`end_block`] for all-or-nothing semantics.
pub fn run_once<S, X>(
    store: &mut S,
    sandbox: &X,
    params: &Params,
) -> Result<ResolveOutcome, ResolveError<S::Error>>
where
    S: OracleStore,
    X: Sandbox + ?Sized,
{
    let pending = store.pending_resolve_list().map_err(ResolveError::Store)?;
    let mut limiter = ResolveGasLimiter::new(params.end_block_execute_gas_limit);
    let mut events = Vec::new();
    let mut deferred = None;
    let mut first_unresolved = pending.len();

    for (index, &request_id) in pending.iter().enumerate() {
        match resolve_request(store, sandbox, params, &mut limiter, request_id)? {
            Step::Resolved(event) => {
                store
                    .set_resolve_status(request_id, event.resolve_status)
                    .map_err(ResolveError::Store)?;
                events.push(event);
            }
            Step::Dropped => {}
            Step::Deferred(reason) => {
                debug!(%request_id, %reason, "deferring request to the next block");
                first_unresolved = index;
                deferred = Some(reason);
                break;
            }
        }
    }

    let remaining = pending[first_unresolved..].to_vec();
    store.set_pending_resolve_list(remaining.clone()).map_err(ResolveError::Store)?;

    info!(
        resolved = events.len(),
        deferred = remaining.len(),
        gas_consumed = limiter.block_gas_used,
        gas_limit = params.end_block_execute_gas_limit,
        "resolved pending requests"
    );

    Ok(ResolveOutcome { events, pending: remaining, gas_consumed: limiter.block_gas_used, deferred })
}

fn resolve_request<S, X>(
    store: &mut S,
    sandbox: &X,
    params: &Params,
    limiter: &mut ResolveGasLimiter,
    request_id: RequestId,
) -> Result<Step, ResolveError<S::Error>>
where
    S: OracleStore,
    X: Sandbox + ?Sized,
{
    let failure = || Ok(Step::Resolved(ResolveEvent::failure(request_id)));

    if let Some(status) = store.resolve_status(request_id).map_err(ResolveError::Store)? {
        if status.is_terminal() {
            warn!(%request_id, ?status, "dropping already resolved request from the pending list");
            return Ok(Step::Dropped);
        }
    }

    let Some(request) = store.request(request_id).map_err(ResolveError::Store)? else {
        warn!(%request_id, "pending request not found");
        return failure();
    };

    match limiter.pre_execution_check(request_id, request.execute_gas_limit) {
        Ok(()) => {}
        Err(PreExecutionRejection::Request(err)) => {
            debug!(%request_id, %err, "request can never be resolved");
            return failure();
        }
        Err(PreExecutionRejection::Block(err)) => return Ok(Step::Deferred(err)),
    }

    let Some(raw_reports) = store.raw_reports(request_id).map_err(ResolveError::Store)? else {
        warn!(%request_id, "raw reports not found");
        return failure();
    };
    let env = ExecutionEnv::new(request_id, raw_reports);

    let Some(script) =
        store.oracle_script(request.oracle_script_id).map_err(ResolveError::Store)?
    else {
        warn!(%request_id, oracle_script_id = %request.oracle_script_id, "oracle script not found");
        return failure();
    };

    let outcome = sandbox.execute(
        &env,
        &script.code,
        EXECUTE_ENTRY_POINT,
        &request.calldata,
        request.execute_gas_limit,
    );
    let charged =
        limiter.record_execution(request_id, request.execute_gas_limit, outcome.gas_used)?;

    let data = match outcome.result {
        Ok(data) => data,
        Err(err) => {
            debug!(%request_id, gas = charged, %err, "oracle script failed");
            return failure();
        }
    };
    if exceeds(&data, params.max_result_size) {
        debug!(%request_id, gas = charged, size = data.len(), limit = params.max_result_size, "result too large");
        return failure();
    }

    store
        .set_result(
            request_id,
            OracleResult::new(request.oracle_script_id, request.calldata, data.clone()),
        )
        .map_err(ResolveError::Store)?;
    debug!(%request_id, gas = charged, "request resolved");
    Ok(Step::Resolved(ResolveEvent::success(request_id, data)))
}

fn exceeds(data: &Bytes, limit: u64) -> bool {
    u64::try_from(data.len()).map_or(true, |len| len > limit)
}
