use std::collections::BTreeMap;

use crate::{
    OracleResult, OracleScript, OracleScriptId, OracleStore, Params, RawReport, Request,
    RequestId, ResolveStatus,
};

/// Writes buffered during one resolution pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreChanges {
    /// Resolve statuses to record.
    pub statuses: BTreeMap<RequestId, ResolveStatus>,
    /// Results to store.
    pub results: BTreeMap<RequestId, OracleResult>,
    /// The replacement pending resolve list, if it was written.
    pub pending: Option<Vec<RequestId>>,
}

impl StoreChanges {
    /// Returns `true` if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty() && self.results.is_empty() && self.pending.is_none()
    }

    /// Folds `later` into `self`. Entries of `later` win, and its pending list replaces this one's
    /// if it was written.
    pub fn merge(&mut self, later: Self) {
        self.statuses.extend(later.statuses);
        self.results.extend(later.results);
        if later.pending.is_some() {
            self.pending = later.pending;
        }
    }

    /// Writes the buffered changes into `store` one entry at a time.
    ///
    /// Not atomic on its own: a failing write leaves the earlier ones in place. Backends call it
    /// against staged state from their [`OracleStore::commit`].
    pub fn apply<S: OracleStore>(self, store: &mut S) -> Result<(), S::Error> {
        for (id, result) in self.results {
            store.set_result(id, result)?;
        }
        for (id, status) in self.statuses {
            store.set_resolve_status(id, status)?;
        }
        if let Some(pending) = self.pending {
            store.set_pending_resolve_list(pending)?;
        }
        Ok(())
    }
}

/// A write-buffering view over a store.
///
/// Reads see the buffered writes first and fall through to the inner store. Writes never reach
/// the inner store; they are taken out with [`Self::into_changes`].
#[derive(Debug)]
pub struct StoreOverlay<'a, S> {
    inner: &'a S,
    changes: StoreChanges,
}

impl<'a, S: OracleStore> StoreOverlay<'a, S> {
    /// Creates an overlay with no buffered writes.
    pub fn new(inner: &'a S) -> Self {
        Self { inner, changes: StoreChanges::default() }
    }

    /// Returns the buffered writes.
    pub fn changes(&self) -> &StoreChanges {
        &self.changes
    }

    /// Consumes the overlay, returning the buffered writes.
    pub fn into_changes(self) -> StoreChanges {
        self.changes
    }
}

impl<S: OracleStore> OracleStore for StoreOverlay<'_, S> {
    type Error = S::Error;

    fn request(&self, id: RequestId) -> Result<Option<Request>, Self::Error> {
        self.inner.request(id)
    }

    fn raw_reports(&self, id: RequestId) -> Result<Option<Vec<RawReport>>, Self::Error> {
        self.inner.raw_reports(id)
    }

    fn oracle_script(&self, id: OracleScriptId) -> Result<Option<OracleScript>, Self::Error> {
        self.inner.oracle_script(id)
    }

    fn result(&self, id: RequestId) -> Result<Option<OracleResult>, Self::Error> {
        match self.changes.results.get(&id) {
            Some(result) => Ok(Some(result.clone())),
            None => self.inner.result(id),
        }
    }

    fn resolve_status(&self, id: RequestId) -> Result<Option<ResolveStatus>, Self::Error> {
        match self.changes.statuses.get(&id) {
            Some(status) => Ok(Some(*status)),
            None => self.inner.resolve_status(id),
        }
    }

    fn pending_resolve_list(&self) -> Result<Vec<RequestId>, Self::Error> {
        match &self.changes.pending {
            Some(pending) => Ok(pending.clone()),
            None => self.inner.pending_resolve_list(),
        }
    }

    fn params(&self) -> Result<Params, Self::Error> {
        self.inner.params()
    }

    fn set_resolve_status(
        &mut self,
        id: RequestId,
        status: ResolveStatus,
    ) -> Result<(), Self::Error> {
        self.changes.statuses.insert(id, status);
        Ok(())
    }

    fn set_result(&mut self, id: RequestId, result: OracleResult) -> Result<(), Self::Error> {
        self.changes.results.insert(id, result);
        Ok(())
    }

    fn set_pending_resolve_list(&mut self, list: Vec<RequestId>) -> Result<(), Self::Error> {
        self.changes.pending = Some(list);
        Ok(())
    }

    fn commit(&mut self, changes: StoreChanges) -> Result<(), Self::Error> {
        self.changes.merge(changes);
        Ok(())
    }
}
