use alloy_primitives::{keccak256, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::constants;

/// Identifier of an oracle data request, assigned at request creation.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
)]
#[serde(transparent)]
pub struct RequestId(pub u64);

/// Identifier of an oracle script.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
)]
#[serde(transparent)]
pub struct OracleScriptId(pub u64);

/// Resolve status of a request.
///
/// `Open` is the only non-terminal status. A request leaves `Open` exactly once.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ResolveStatus {
    /// Waiting in the pending resolve list.
    #[default]
    Open = 0,
    /// The oracle script ran to completion and its result is stored.
    Success = 1,
    /// The request was resolved without a result.
    Failure = 2,
}

impl ResolveStatus {
    /// Returns `true` for `Success` and `Failure`.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Open)
    }

    /// The numeric code used in event attributes.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// An oracle data request as stored on chain. Read-only to the resolver.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// The oracle script resolving this request.
    pub oracle_script_id: OracleScriptId,
    /// Opaque input supplied by the requester.
    pub calldata: Bytes,
    /// Gas cap for executing the oracle script of this request.
    pub execute_gas_limit: u64,
}

impl Request {
    /// Creates a new request.
    pub fn new(oracle_script_id: OracleScriptId, calldata: Bytes, execute_gas_limit: u64) -> Self {
        Self { oracle_script_id, calldata, execute_gas_limit }
    }
}

/// A raw data report submitted by a data provider before resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReport {
    /// Identifier of the external data source within the request.
    pub external_id: u64,
    /// Exit code of the data source executable. Zero means success.
    pub exit_code: u8,
    /// The reported payload.
    pub data: Bytes,
}

impl RawReport {
    /// Creates a new raw report.
    pub fn new(external_id: u64, exit_code: u8, data: impl Into<Bytes>) -> Self {
        Self { external_id, exit_code, data: data.into() }
    }
}

/// A deterministic program producing a request's result from its calldata and raw reports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleScript {
    /// Human readable name, informational only.
    #[serde(default)]
    pub name: String,
    /// Compiled script bytecode.
    pub code: Bytes,
}

impl OracleScript {
    /// Creates a new oracle script.
    pub fn new(name: impl Into<String>, code: impl Into<Bytes>) -> Self {
        Self { name: name.into(), code: code.into() }
    }
}

/// The stored outcome of a successfully resolved request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResult {
    /// The script that produced the result.
    pub oracle_script_id: OracleScriptId,
    /// The calldata the script was executed with.
    pub calldata: Bytes,
    /// The bytes returned by the script.
    pub data: Bytes,
    /// `keccak256(oracle_script_id || calldata)`, the key downstream verifiers look results up by.
    pub result_hash: B256,
}

impl OracleResult {
    /// Creates a new result and derives its lookup hash.
    pub fn new(oracle_script_id: OracleScriptId, calldata: Bytes, data: Bytes) -> Self {
        let result_hash = result_hash(oracle_script_id, &calldata);
        Self { oracle_script_id, calldata, data, result_hash }
    }
}

/// Computes the lookup hash of the result of `oracle_script_id` executed with `calldata`.
pub fn result_hash(oracle_script_id: OracleScriptId, calldata: &[u8]) -> B256 {
    let mut preimage = Vec::with_capacity(8 + calldata.len());
    preimage.extend_from_slice(&oracle_script_id.0.to_be_bytes());
    preimage.extend_from_slice(calldata);
    keccak256(preimage)
}

/// On-chain parameters of the resolution pass.
///
/// Parameters are governed outside of the resolver and may change between blocks. The pass reads
/// them once at its start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Params {
    /// Maximum aggregate gas the end-block pass may spend resolving requests.
    pub end_block_execute_gas_limit: u64,
    /// Maximum size in bytes of a stored result. Larger outputs resolve as failures.
    pub max_result_size: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            end_block_execute_gas_limit: constants::params::DEFAULT_END_BLOCK_EXECUTE_GAS_LIMIT,
            max_result_size: constants::params::DEFAULT_MAX_RESULT_SIZE,
        }
    }
}

impl Params {
    /// Set a custom end-block execute gas limit.
    pub fn with_end_block_execute_gas_limit(mut self, limit: u64) -> Self {
        self.end_block_execute_gas_limit = limit;
        self
    }

    /// Set a custom maximum result size.
    pub fn with_max_result_size(mut self, size: u64) -> Self {
        self.max_result_size = size;
        self
    }
}
