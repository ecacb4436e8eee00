//! Constants for oracle request resolution.
//!
//! Chain parameters are grouped in [`params`], sandbox metering constants in [`sandbox`].

/// Default values of the on-chain resolution parameters.
pub mod params {
    /// Default aggregate gas budget the end-block pass may spend resolving requests.
    pub const DEFAULT_END_BLOCK_EXECUTE_GAS_LIMIT: u64 = 10_000_000;

    /// Default maximum size in bytes of a stored oracle result.
    pub const DEFAULT_MAX_RESULT_SIZE: u64 = 1024;
}

/// Constants of the oracle script sandbox.
pub mod sandbox {
    /// The entry point invoked on every oracle script during resolution.
    pub const EXECUTE_ENTRY_POINT: &str = "execute";

    /// The host module exposing the oracle script ABI.
    pub const HOST_MODULE: &str = "env";

    /// The exported linear memory every oracle script must provide.
    pub const MEMORY_EXPORT: &str = "memory";

    /// Default maximum linear memory of a script instance (1 MiB).
    pub const DEFAULT_MAX_MEMORY_BYTES: usize = 1 << 20;

    /// Default maximum number of elements of a script's table.
    pub const DEFAULT_MAX_TABLE_ELEMENTS: u32 = 1024;

    /// Flat gas charged for every host function call.
    pub const DEFAULT_HOST_CALL_BASE_GAS: u64 = 100;

    /// Gas charged per byte copied across the host boundary.
    pub const DEFAULT_HOST_CALL_PER_BYTE_GAS: u64 = 1;

    /// Default maximum size of the data a script may return.
    pub const DEFAULT_MAX_RETURN_DATA_SIZE: usize = 64 * 1024;
}
