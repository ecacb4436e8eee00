//! Data source executors.
//!
//! An [`Executor`] runs a data source executable off-chain and reports its output. Executors
//! never fail: any transport or remote error collapses into [`ExecutionOutput::execution_error`],
//! which is what ends up in the raw report.

use std::{fmt::Debug, sync::Arc, time::Duration};

use alloy_primitives::Bytes;
use async_trait::async_trait;
use clap::Args;
use serde::{Deserialize, Serialize};

mod registry;
mod rest;

pub use registry::*;
pub use rest::*;

/// Output reported when a data source could not be executed.
pub const EXECUTION_ERROR: &[u8] = b"EXECUTION_ERROR";

/// Exit code reported together with [`EXECUTION_ERROR`].
pub const EXECUTION_ERROR_CODE: u8 = 255;

/// Default time a single data source may run, in milliseconds.
pub const DEFAULT_EXECUTOR_TIMEOUT_MS: u64 = 10_000;

/// The result of running one data source executable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    /// Standard output on success, standard error otherwise.
    pub output: Bytes,
    /// Process exit code, saturated into a byte.
    pub exit_code: u8,
}

impl ExecutionOutput {
    /// Creates a new output.
    pub fn new(output: impl Into<Bytes>, exit_code: u8) -> Self {
        Self { output: output.into(), exit_code }
    }

    /// The sentinel output of a failed execution.
    pub fn execution_error() -> Self {
        Self::new(Bytes::from_static(EXECUTION_ERROR), EXECUTION_ERROR_CODE)
    }

    /// Whether the executable exited with code zero.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs data source executables.
#[async_trait]
pub trait Executor: Debug + Send + Sync {
    /// Name the executor was registered under.
    fn name(&self) -> &str;

    /// Runs `executable` with `calldata` as its command line, giving up after `timeout`.
    async fn execute(&self, executable: &[u8], calldata: &str, timeout: Duration)
        -> ExecutionOutput;
}

/// Executor selection arguments shared by the commands that run data sources.
#[derive(Args, Debug, Clone)]
pub struct ExecutorArgs {
    /// Executor spec in the form `<name>:<url>`, e.g. `lambda:https://example.com/execute`
    #[arg(long = "executor", env = "ZORACLE_EXECUTOR")]
    pub executor: String,

    /// Time a single data source may run, in milliseconds
    #[arg(
        long = "executor.timeout-ms",
        visible_aliases = ["executor-timeout-ms"],
        env = "ZORACLE_EXECUTOR_TIMEOUT_MS",
        default_value_t = DEFAULT_EXECUTOR_TIMEOUT_MS
    )]
    pub timeout_ms: u64,
}

impl ExecutorArgs {
    /// Builds the configured executor from the default registry.
    pub fn build(&self) -> Result<Arc<dyn Executor>, ExecutorError> {
        ExecutorRegistry::default().create(&self.executor).map(Arc::from)
    }

    /// The per-execution timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
