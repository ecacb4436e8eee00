//! State store accessors used by the resolver.
//!
//! [`OracleStore`] is the only way the resolver touches persisted state. All accessors are
//! synchronous and local. Writes made during one end-block pass are buffered in a
//! [`StoreOverlay`] and only reach the backing store through one [`OracleStore::commit`] once the
//! pass has finished without a fatal fault.

use crate::{
    OracleResult, OracleScript, OracleScriptId, Params, RawReport, Request, RequestId,
    ResolveStatus,
};

mod memory;
mod overlay;

pub use memory::*;
pub use overlay::*;

/// Read/write access to the oracle module state.
///
/// Lookups return `Ok(None)` when the entry does not exist. `Err` is reserved for failures of the
/// backing storage itself, which the resolver treats as fatal.
pub trait OracleStore {
    /// The error type of the backing storage.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Gets a request by id.
    fn request(&self, id: RequestId) -> Result<Option<Request>, Self::Error>;

    /// Gets the raw reports collected for a request.
    fn raw_reports(&self, id: RequestId) -> Result<Option<Vec<RawReport>>, Self::Error>;

    /// Gets an oracle script by id.
    fn oracle_script(&self, id: OracleScriptId) -> Result<Option<OracleScript>, Self::Error>;

    /// Gets the stored result of a request.
    fn result(&self, id: RequestId) -> Result<Option<OracleResult>, Self::Error>;

    /// Gets the resolve status of a request. `None` if no status was ever recorded.
    fn resolve_status(&self, id: RequestId) -> Result<Option<ResolveStatus>, Self::Error>;

    /// Gets the pending resolve list in FIFO order.
    fn pending_resolve_list(&self) -> Result<Vec<RequestId>, Self::Error>;

    /// Gets the current resolution parameters.
    fn params(&self) -> Result<Params, Self::Error>;

    /// Records the resolve status of a request.
    fn set_resolve_status(&mut self, id: RequestId, status: ResolveStatus)
        -> Result<(), Self::Error>;

    /// Stores the result of a request.
    fn set_result(&mut self, id: RequestId, result: OracleResult) -> Result<(), Self::Error>;

    /// Replaces the pending resolve list.
    fn set_pending_resolve_list(&mut self, list: Vec<RequestId>) -> Result<(), Self::Error>;

    /// Writes `changes` as a single atomic batch.
    ///
    /// On `Ok` every change is visible. On `Err` none is: implementations must not leave a prefix
    /// of the batch behind.
    fn commit(&mut self, changes: StoreChanges) -> Result<(), Self::Error>;
}

impl<S: OracleStore + ?Sized> OracleStore for &mut S {
    type Error = S::Error;

    fn request(&self, id: RequestId) -> Result<Option<Request>, Self::Error> {
        (**self).request(id)
    }

    fn raw_reports(&self, id: RequestId) -> Result<Option<Vec<RawReport>>, Self::Error> {
        (**self).raw_reports(id)
    }

    fn oracle_script(&self, id: OracleScriptId) -> Result<Option<OracleScript>, Self::Error> {
        (**self).oracle_script(id)
    }

    fn result(&self, id: RequestId) -> Result<Option<OracleResult>, Self::Error> {
        (**self).result(id)
    }

    fn resolve_status(&self, id: RequestId) -> Result<Option<ResolveStatus>, Self::Error> {
        (**self).resolve_status(id)
    }

    fn pending_resolve_list(&self) -> Result<Vec<RequestId>, Self::Error> {
        (**self).pending_resolve_list()
    }

    fn params(&self) -> Result<Params, Self::Error> {
        (**self).params()
    }

    fn set_resolve_status(
        &mut self,
        id: RequestId,
        status: ResolveStatus,
    ) -> Result<(), Self::Error> {
        (**self).set_resolve_status(id, status)
    }

    fn set_result(&mut self, id: RequestId, result: OracleResult) -> Result<(), Self::Error> {
        (**self).set_result(id, result)
    }

    fn set_pending_resolve_list(&mut self, list: Vec<RequestId>) -> Result<(), Self::Error> {
        (**self).set_pending_resolve_list(list)
    }

    fn commit(&mut self, changes: StoreChanges) -> Result<(), Self::Error> {
        (**self).commit(changes)
    }
}
