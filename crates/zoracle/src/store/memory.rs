use core::convert::Infallible;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    OracleResult, OracleScript, OracleScriptId, OracleStore, Params, RawReport, Request,
    RequestId, ResolveStatus, StoreChanges,
};

/// An in-memory [`OracleStore`].
///
/// Ordered maps keep iteration, and therefore serialization, deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStore {
    /// Resolution parameters.
    pub params: Params,
    /// Oracle scripts by id.
    pub oracle_scripts: BTreeMap<OracleScriptId, OracleScript>,
    /// Requests by id.
    pub requests: BTreeMap<RequestId, Request>,
    /// Raw reports collected per request.
    pub raw_reports: BTreeMap<RequestId, Vec<RawReport>>,
    /// Stored results by request id.
    pub results: BTreeMap<RequestId, OracleResult>,
    /// Resolve status by request id.
    pub statuses: BTreeMap<RequestId, ResolveStatus>,
    /// The pending resolve list, in FIFO order.
    pub pending: Vec<RequestId>,
}

impl MemoryStore {
    /// Sets the resolution parameters.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Inserts an oracle script.
    pub fn insert_oracle_script(&mut self, id: OracleScriptId, script: OracleScript) {
        self.oracle_scripts.insert(id, script);
    }

    /// Inserts an oracle script.
    pub fn with_oracle_script(mut self, id: OracleScriptId, script: OracleScript) -> Self {
        self.insert_oracle_script(id, script);
        self
    }

    /// Creates a request: stores it, marks it open and appends it to the tail of the pending
    /// resolve list. Raw reports are stored as collected for the request.
    pub fn enqueue(&mut self, id: RequestId, request: Request, raw_reports: Vec<RawReport>) {
        self.requests.insert(id, request);
        self.raw_reports.insert(id, raw_reports);
        self.statuses.insert(id, ResolveStatus::Open);
        self.pending.push(id);
    }

    /// Creates a request. See [`Self::enqueue`].
    pub fn with_request(
        mut self,
        id: RequestId,
        request: Request,
        raw_reports: Vec<RawReport>,
    ) -> Self {
        self.enqueue(id, request, raw_reports);
        self
    }
}

impl OracleStore for MemoryStore {
    type Error = Infallible;

    fn request(&self, id: RequestId) -> Result<Option<Request>, Self::Error> {
        Ok(self.requests.get(&id).cloned())
    }

    fn raw_reports(&self, id: RequestId) -> Result<Option<Vec<RawReport>>, Self::Error> {
        Ok(self.raw_reports.get(&id).cloned())
    }

    fn oracle_script(&self, id: OracleScriptId) -> Result<Option<OracleScript>, Self::Error> {
        Ok(self.oracle_scripts.get(&id).cloned())
    }

    fn result(&self, id: RequestId) -> Result<Option<OracleResult>, Self::Error> {
        Ok(self.results.get(&id).cloned())
    }

    fn resolve_status(&self, id: RequestId) -> Result<Option<ResolveStatus>, Self::Error> {
        Ok(self.statuses.get(&id).copied())
    }

    fn pending_resolve_list(&self) -> Result<Vec<RequestId>, Self::Error> {
        Ok(self.pending.clone())
    }

    fn params(&self) -> Result<Params, Self::Error> {
        Ok(self.params)
    }

    fn set_resolve_status(
        &mut self,
        id: RequestId,
        status: ResolveStatus,
    ) -> Result<(), Self::Error> {
        self.statuses.insert(id, status);
        Ok(())
    }

    fn set_result(&mut self, id: RequestId, result: OracleResult) -> Result<(), Self::Error> {
        self.results.insert(id, result);
        Ok(())
    }

    fn set_pending_resolve_list(&mut self, list: Vec<RequestId>) -> Result<(), Self::Error> {
        self.pending = list;
        Ok(())
    }

    fn commit(&mut self, changes: StoreChanges) -> Result<(), Self::Error> {
        // in-memory writes cannot fail, so applying in place is all-or-nothing
        changes.apply(self)
    }
}
