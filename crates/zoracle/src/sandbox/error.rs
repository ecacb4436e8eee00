/// Why an oracle script execution produced no result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
    /// The bytecode failed to compile or link.
    #[error("invalid module: {0}")]
    InvalidModule(String),
    /// The module does not export the requested entry point.
    #[error("missing entry point: {0}")]
    MissingEntryPoint(String),
    /// The gas limit was exhausted.
    #[error("out of gas")]
    OutOfGas,
    /// The script trapped.
    #[error("trap: {0}")]
    Trap(String),
    /// The script broke the host ABI contract.
    #[error("host violation: {0}")]
    HostViolation(String),
    /// The script finished without setting return data.
    #[error("no return data")]
    NoReturnData,
    /// The sandbox itself failed.
    #[error("internal sandbox error: {0}")]
    Internal(String),
}
