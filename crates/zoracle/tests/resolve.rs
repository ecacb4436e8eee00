//! Tests for the end-block resolution pass.

use std::convert::Infallible;

use alloy_primitives::Bytes;
use rstest::rstest;
use zoracle::{
    end_block, run_once,
    test_utils::{MockScript, MockSandbox},
    BlockLimitExceededError, MemoryStore, OracleResult, OracleScript, OracleScriptId,
    OracleStore, Params, RawReport, Request, RequestId, ResolveError, ResolveEvent,
    ResolveStatus, SandboxError, StoreChanges,
};

const ECHO: &[u8] = b"echo";
const FAIL: &[u8] = b"fail";
const BIG: &[u8] = b"big";
const GREEDY: &[u8] = b"greedy";
const FULL: &[u8] = b"full";

const ECHO_ID: OracleScriptId = OracleScriptId(1);
const FAIL_ID: OracleScriptId = OracleScriptId(2);
const BIG_ID: OracleScriptId = OracleScriptId(3);
const GREEDY_ID: OracleScriptId = OracleScriptId(4);
const FULL_ID: OracleScriptId = OracleScriptId(5);

fn sandbox() -> MockSandbox {
    MockSandbox::default()
        .with_script(ECHO, MockScript::Echo { gas_used: 1_000 })
        .with_script(
            FAIL,
            MockScript::Fail { error: SandboxError::Trap("unreachable".into()), gas_used: 500 },
        )
        .with_script(BIG, MockScript::Return { output: Bytes::from(vec![7; 2048]), gas_used: 10 })
        .with_script(GREEDY, MockScript::OutOfGas { overshoot: 10_000 })
        .with_script(FULL, MockScript::Echo { gas_used: 400_000 })
}

fn store(budget: u64) -> MemoryStore {
    MemoryStore::default()
        .with_params(Params::default().with_end_block_execute_gas_limit(budget))
        .with_oracle_script(ECHO_ID, OracleScript::new("echo", ECHO))
        .with_oracle_script(FAIL_ID, OracleScript::new("fail", FAIL))
        .with_oracle_script(BIG_ID, OracleScript::new("big", BIG))
        .with_oracle_script(GREEDY_ID, OracleScript::new("greedy", GREEDY))
        .with_oracle_script(FULL_ID, OracleScript::new("full", FULL))
}

fn request(script: OracleScriptId, calldata: &'static [u8], gas: u64) -> Request {
    Request::new(script, Bytes::from_static(calldata), gas)
}

fn reports() -> Vec<RawReport> {
    vec![RawReport::new(1, 0, Bytes::from_static(b"100"))]
}

#[test]
fn test_requests_beyond_remaining_budget_are_deferred() {
    let mut store = store(1_000_000)
        .with_request(RequestId(1), request(FULL_ID, b"A", 400_000), reports())
        .with_request(RequestId(2), request(FULL_ID, b"B", 400_000), reports())
        .with_request(RequestId(3), request(FULL_ID, b"C", 400_000), reports());
    let sandbox = sandbox();

    let outcome = end_block(&mut store, &sandbox).unwrap();

    assert_eq!(
        outcome.events,
        vec![
            ResolveEvent::success(RequestId(1), Bytes::from_static(b"A")),
            ResolveEvent::success(RequestId(2), Bytes::from_static(b"B")),
        ]
    );
    assert_eq!(outcome.pending, vec![RequestId(3)]);
    assert_eq!(outcome.gas_consumed, 800_000);
    assert_eq!(
        outcome.deferred,
        Some(BlockLimitExceededError::ExecuteGasLimit {
            block_used: 800_000,
            execute_gas_limit: 400_000,
            limit: 1_000_000,
        })
    );
    // the deferred request is never handed to the sandbox
    assert_eq!(sandbox.executed(), vec![RequestId(1), RequestId(2)]);

    assert_eq!(store.pending, vec![RequestId(3)]);
    assert_eq!(store.resolve_status(RequestId(3)).unwrap(), Some(ResolveStatus::Open));
    assert_eq!(store.result(RequestId(1)).unwrap().unwrap().data, Bytes::from_static(b"A"));
}

#[test]
fn test_deferral_is_decided_on_declared_limit_not_gas_used() {
    // A and B only use 1_000 gas each, but the check admits on the declared limit.
    let mut store = store(1_000_000)
        .with_request(RequestId(1), request(ECHO_ID, b"A", 400_000), reports())
        .with_request(RequestId(2), request(ECHO_ID, b"B", 400_000), reports())
        .with_request(RequestId(3), request(ECHO_ID, b"C", 999_000), reports());

    let outcome = end_block(&mut store, &sandbox()).unwrap();
    assert_eq!(outcome.resolved().collect::<Vec<_>>(), vec![RequestId(1), RequestId(2)]);
    assert_eq!(outcome.gas_consumed, 2_000);
    assert_eq!(outcome.pending, vec![RequestId(3)]);
}

#[test]
fn test_oversized_request_fails_and_is_never_retried() {
    let mut store =
        store(1_000_000).with_request(RequestId(4), request(ECHO_ID, b"D", 2_000_000), reports());
    let sandbox = sandbox();

    let outcome = end_block(&mut store, &sandbox).unwrap();
    assert_eq!(outcome.events, vec![ResolveEvent::failure(RequestId(4))]);
    assert!(outcome.pending.is_empty());
    assert_eq!(outcome.gas_consumed, 0);
    assert!(sandbox.executed().is_empty());
    assert_eq!(store.resolve_status(RequestId(4)).unwrap(), Some(ResolveStatus::Failure));

    // raising the budget later does not bring the request back
    store.params = store.params.with_end_block_execute_gas_limit(5_000_000);
    let outcome = end_block(&mut store, &sandbox).unwrap();
    assert!(outcome.events.is_empty());
    assert_eq!(store.resolve_status(RequestId(4)).unwrap(), Some(ResolveStatus::Failure));
}

#[test]
fn test_oversized_request_does_not_block_the_queue() {
    let mut store = store(1_000_000)
        .with_request(RequestId(1), request(ECHO_ID, b"big", 2_000_000), reports())
        .with_request(RequestId(2), request(ECHO_ID, b"ok", 100_000), reports());

    let outcome = end_block(&mut store, &sandbox()).unwrap();
    assert_eq!(
        outcome.events,
        vec![
            ResolveEvent::failure(RequestId(1)),
            ResolveEvent::success(RequestId(2), Bytes::from_static(b"ok")),
        ]
    );
    assert!(store.pending.is_empty());
}

#[test]
fn test_reported_gas_is_clamped_to_request_limit() {
    let mut store = store(1_000_000)
        .with_request(RequestId(5), request(GREEDY_ID, b"E", 40_000), reports())
        .with_request(RequestId(6), request(ECHO_ID, b"F", 10_000), reports());

    let outcome = end_block(&mut store, &sandbox()).unwrap();
    // 40_000 clamped for E, 1_000 used by F
    assert_eq!(outcome.gas_consumed, 41_000);
    assert_eq!(outcome.events[0], ResolveEvent::failure(RequestId(5)));
    assert_eq!(outcome.events[1].resolve_status, ResolveStatus::Success);
}

#[rstest]
#[case::missing_request(RequestId(99), None)]
#[case::missing_script(RequestId(1), Some(request(OracleScriptId(42), b"x", 1_000)))]
#[case::script_error(RequestId(1), Some(request(FAIL_ID, b"x", 1_000)))]
#[case::result_too_large(RequestId(1), Some(request(BIG_ID, b"x", 1_000)))]
#[case::out_of_gas(RequestId(1), Some(request(GREEDY_ID, b"x", 1_000)))]
fn test_failing_request_resolves_with_one_event(
    #[case] id: RequestId,
    #[case] pending_request: Option<Request>,
) {
    let mut store = store(1_000_000);
    match pending_request {
        Some(request) => store.enqueue(id, request, reports()),
        None => store.pending.push(id),
    }

    let outcome = end_block(&mut store, &sandbox()).unwrap();
    assert_eq!(outcome.events, vec![ResolveEvent::failure(id)]);
    assert!(store.pending.is_empty());
    assert_eq!(store.resolve_status(id).unwrap(), Some(ResolveStatus::Failure));
    assert!(store.result(id).unwrap().is_none());
}

#[test]
fn test_missing_raw_reports_resolve_failure_with_event() {
    let mut store = store(1_000_000).with_request(RequestId(1), request(ECHO_ID, b"x", 1_000), vec![]);
    store.raw_reports.remove(&RequestId(1));
    let sandbox = sandbox();

    let outcome = end_block(&mut store, &sandbox).unwrap();
    assert_eq!(outcome.events, vec![ResolveEvent::failure(RequestId(1))]);
    assert!(sandbox.executed().is_empty());
}

#[test]
fn test_lookup_misses_consume_no_gas() {
    let mut store = store(1_000_000)
        .with_request(RequestId(1), request(OracleScriptId(42), b"x", 900_000), reports())
        .with_request(RequestId(2), request(ECHO_ID, b"y", 900_000), reports());

    let outcome = end_block(&mut store, &sandbox()).unwrap();
    assert_eq!(outcome.resolved().collect::<Vec<_>>(), vec![RequestId(1), RequestId(2)]);
    assert_eq!(outcome.gas_consumed, 1_000);
}

#[test]
fn test_failed_execution_still_charges_gas() {
    let mut store = store(1_000_000)
        .with_request(RequestId(1), request(FAIL_ID, b"x", 1_000), reports())
        .with_request(RequestId(2), request(BIG_ID, b"y", 1_000), reports());

    let outcome = end_block(&mut store, &sandbox()).unwrap();
    assert_eq!(outcome.gas_consumed, 510);
    assert!(outcome.events.iter().all(|event| event.resolve_status == ResolveStatus::Failure));
}

#[test]
fn test_success_stores_keyed_result_and_passes_environment() {
    let mut store = store(1_000_000).with_request(
        RequestId(8),
        request(ECHO_ID, b"BTC", 50_000),
        vec![RawReport::new(1, 0, Bytes::from_static(b"a")), RawReport::new(2, 1, Bytes::new())],
    );
    let sandbox = sandbox();

    end_block(&mut store, &sandbox).unwrap();

    let result = store.result(RequestId(8)).unwrap().unwrap();
    assert_eq!(
        result,
        OracleResult::new(ECHO_ID, Bytes::from_static(b"BTC"), Bytes::from_static(b"BTC"))
    );
    let calls = sandbox.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].entry_point, "execute");
    assert_eq!(calls[0].gas_limit, 50_000);
    assert_eq!(calls[0].raw_report_count, 2);
}

#[test]
fn test_terminal_queue_entries_are_dropped_without_event() {
    let mut store = store(1_000_000)
        .with_request(RequestId(1), request(ECHO_ID, b"x", 1_000), reports())
        .with_request(RequestId(2), request(ECHO_ID, b"y", 1_000), reports());
    store.statuses.insert(RequestId(1), ResolveStatus::Success);
    let sandbox = sandbox();

    let outcome = end_block(&mut store, &sandbox).unwrap();
    assert_eq!(outcome.resolved().collect::<Vec<_>>(), vec![RequestId(2)]);
    assert_eq!(sandbox.executed(), vec![RequestId(2)]);
    assert!(store.pending.is_empty());
}

#[test]
fn test_empty_queue_is_a_noop() {
    let mut store = store(1_000_000);
    let before = store.clone();
    let outcome = end_block(&mut store, &sandbox()).unwrap();
    assert_eq!(outcome, Default::default());
    assert_eq!(store, before);
}

#[test]
fn test_run_once_uses_given_params_over_stored() {
    let mut store = store(1)
        .with_request(RequestId(1), request(ECHO_ID, b"x", 1_000), reports());
    let outcome = run_once(&mut store, &sandbox(), &Params::default()).unwrap();
    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.events[0].resolve_status, ResolveStatus::Success);
}

#[test]
fn test_request_exactly_filling_budget_resolves() {
    let mut store = store(1_000)
        .with_request(RequestId(1), request(ECHO_ID, b"x", 1_000), reports())
        .with_request(RequestId(2), request(ECHO_ID, b"y", 1), reports());

    let outcome = end_block(&mut store, &sandbox()).unwrap();
    assert_eq!(outcome.resolved().collect::<Vec<_>>(), vec![RequestId(1)]);
    assert_eq!(outcome.pending, vec![RequestId(2)]);
}

/// A store whose writes fail after a number of successful ones.
#[derive(Debug)]
struct FailingStore {
    inner: MemoryStore,
    writes_left: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("disk full")]
struct DiskFull;

impl FailingStore {
    fn write(&mut self) -> Result<(), DiskFull> {
        if self.writes_left == 0 {
            return Err(DiskFull);
        }
        self.writes_left -= 1;
        Ok(())
    }
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

impl OracleStore for FailingStore {
    type Error = DiskFull;

    fn request(&self, id: RequestId) -> Result<Option<Request>, DiskFull> {
        Ok(infallible(self.inner.request(id)))
    }

    fn raw_reports(&self, id: RequestId) -> Result<Option<Vec<RawReport>>, DiskFull> {
        Ok(infallible(self.inner.raw_reports(id)))
    }

    fn oracle_script(&self, id: OracleScriptId) -> Result<Option<OracleScript>, DiskFull> {
        Ok(infallible(self.inner.oracle_script(id)))
    }

    fn result(&self, id: RequestId) -> Result<Option<OracleResult>, DiskFull> {
        Ok(infallible(self.inner.result(id)))
    }

    fn resolve_status(&self, id: RequestId) -> Result<Option<ResolveStatus>, DiskFull> {
        Ok(infallible(self.inner.resolve_status(id)))
    }

    fn pending_resolve_list(&self) -> Result<Vec<RequestId>, DiskFull> {
        Ok(infallible(self.inner.pending_resolve_list()))
    }

    fn params(&self) -> Result<Params, DiskFull> {
        Ok(infallible(self.inner.params()))
    }

    fn set_resolve_status(&mut self, id: RequestId, status: ResolveStatus) -> Result<(), DiskFull> {
        self.write()?;
        Ok(infallible(self.inner.set_resolve_status(id, status)))
    }

    fn set_result(&mut self, id: RequestId, result: OracleResult) -> Result<(), DiskFull> {
        self.write()?;
        Ok(infallible(self.inner.set_result(id, result)))
    }

    fn set_pending_resolve_list(&mut self, list: Vec<RequestId>) -> Result<(), DiskFull> {
        self.write()?;
        Ok(infallible(self.inner.set_pending_resolve_list(list)))
    }

    /// Stages the batch on a copy, one write budget unit per entry, and swaps it in on success.
    fn commit(&mut self, changes: StoreChanges) -> Result<(), DiskFull> {
        let mut staged = FailingStore { inner: self.inner.clone(), writes_left: self.writes_left };
        changes.apply(&mut staged)?;
        *self = staged;
        Ok(())
    }
}

#[test]
fn test_store_failure_during_commit_is_fatal() {
    let inner = store(1_000_000).with_request(RequestId(1), request(ECHO_ID, b"x", 1_000), reports());
    let mut store = FailingStore { inner, writes_left: 1 };

    // the batch holds a result, a status and the pending list, and only one write succeeds
    let err = end_block(&mut store, &sandbox()).unwrap_err();
    assert!(matches!(err, ResolveError::Store(DiskFull)));

    assert_eq!(store.inner.result(RequestId(1)).unwrap(), None);
    assert_eq!(store.inner.resolve_status(RequestId(1)).unwrap(), Some(ResolveStatus::Open));
    assert_eq!(store.inner.pending, vec![RequestId(1)]);
    assert_eq!(store.writes_left, 1);
}

#[test]
fn test_commit_with_enough_writes_lands_whole_batch() {
    let inner = store(1_000_000).with_request(RequestId(1), request(ECHO_ID, b"x", 1_000), reports());
    let mut store = FailingStore { inner, writes_left: 3 };

    let outcome = end_block(&mut store, &sandbox()).unwrap();

    assert_eq!(outcome.events, vec![ResolveEvent::success(RequestId(1), Bytes::from_static(b"x"))]);
    assert_eq!(store.inner.resolve_status(RequestId(1)).unwrap(), Some(ResolveStatus::Success));
    assert!(store.inner.result(RequestId(1)).unwrap().is_some());
    assert!(store.inner.pending.is_empty());
    assert_eq!(store.writes_left, 0);
}

#[test]
fn test_run_once_surfaces_store_errors() {
    let inner = store(1_000_000).with_request(RequestId(1), request(ECHO_ID, b"x", 1_000), reports());
    let mut store = FailingStore { inner, writes_left: 0 };

    let err = run_once(&mut store, &sandbox(), &Params::default()).unwrap_err();
    assert_eq!(err.to_string(), "store error: disk full");
    // nothing was written before the failing write
    assert_eq!(store.inner.resolve_status(RequestId(1)).unwrap(), Some(ResolveStatus::Open));
}
