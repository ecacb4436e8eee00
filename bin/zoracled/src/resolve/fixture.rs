use std::collections::BTreeMap;

use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};
use zoracle::{
    MemoryStore, OracleResult, OracleScript, OracleScriptId, Params, RawReport, Request,
    RequestId, ResolveStatus,
};

use crate::common::{Result, ZoracledError};

/// An oracle script given either as compiled Wasm or as WebAssembly text.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScriptSource {
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Compiled module, hex encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Bytes>,
    /// Module source in the WebAssembly text format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wat: Option<String>,
}

impl ScriptSource {
    fn compile(self, id: OracleScriptId) -> Result<OracleScript> {
        let code = match (self.code, self.wat) {
            (Some(code), None) => code,
            (None, Some(wat)) => wat::parse_str(&wat)
                .map_err(|err| ZoracledError::InvalidWat { id: id.0, reason: err.to_string() })?
                .into(),
            _ => {
                return Err(ZoracledError::InvalidInput(format!(
                    "oracle script {id} must set exactly one of `code` and `wat`"
                )))
            }
        };
        Ok(OracleScript::new(self.name, code))
    }
}

/// Chain state the resolution pass runs against.
///
/// Same layout as a serialized [`MemoryStore`], except that oracle scripts may be given as text.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveFixture {
    /// Resolution parameters.
    pub params: Params,
    /// Oracle scripts by id.
    pub oracle_scripts: BTreeMap<OracleScriptId, ScriptSource>,
    /// Requests by id.
    pub requests: BTreeMap<RequestId, Request>,
    /// Raw reports by request id.
    pub raw_reports: BTreeMap<RequestId, Vec<RawReport>>,
    /// Results already stored.
    pub results: BTreeMap<RequestId, OracleResult>,
    /// Resolve statuses by request id.
    pub statuses: BTreeMap<RequestId, ResolveStatus>,
    /// The pending resolve list, head first.
    pub pending: Vec<RequestId>,
}

impl ResolveFixture {
    /// Compiles the scripts and builds the store.
    pub fn into_store(self) -> Result<MemoryStore> {
        let oracle_scripts = self
            .oracle_scripts
            .into_iter()
            .map(|(id, source)| Ok((id, source.compile(id)?)))
            .collect::<Result<_>>()?;
        Ok(MemoryStore {
            params: self.params,
            oracle_scripts,
            requests: self.requests,
            raw_reports: self.raw_reports,
            results: self.results,
            statuses: self.statuses,
            pending: self.pending,
        })
    }
}
