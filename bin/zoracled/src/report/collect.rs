use std::{path::PathBuf, sync::Arc, time::Duration};

use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zoracle::RawReport;

use crate::executor::{ExecutionOutput, Executor};

/// One data source to run for a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataSourceJob {
    /// Identifier of the data source within the request.
    pub external_id: u64,
    /// The executable to run.
    pub executable: Bytes,
    /// Command line for the executable.
    pub calldata: String,
}

/// A data source job as described in a jobs file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataSourceJobSpec {
    /// Identifier of the data source within the request.
    pub external_id: u64,
    /// Path to the executable, relative to the jobs file.
    pub executable: PathBuf,
    /// Command line for the executable.
    #[serde(default)]
    pub calldata: String,
}

/// Runs every job concurrently and returns one report per job, in job order.
///
/// Each job is bounded by `timeout` on top of the executor's own deadline. A job that times out
/// or panics reports [`ExecutionOutput::execution_error`].
pub async fn collect_reports(
    executor: Arc<dyn Executor>,
    jobs: Vec<DataSourceJob>,
    timeout: Duration,
) -> Vec<RawReport> {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let executor = Arc::clone(&executor);
            let handle = tokio::spawn(async move {
                let run = executor.execute(&job.executable, &job.calldata, timeout);
                tokio::time::timeout(timeout, run).await
            });
            (job.external_id, handle)
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (external_id, handle) in handles {
        let output = match handle.await {
            Ok(Ok(output)) => output,
            Ok(Err(_elapsed)) => {
                warn!(external_id, ?timeout, "data source timed out");
                ExecutionOutput::execution_error()
            }
            Err(err) => {
                warn!(external_id, %err, "data source task failed");
                ExecutionOutput::execution_error()
            }
        };
        debug!(external_id, exit_code = output.exit_code, "collected raw report");
        reports.push(RawReport::new(external_id, output.exit_code, output.output));
    }
    reports
}
