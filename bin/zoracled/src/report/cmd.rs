use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use zoracle::RawReport;

use super::{collect_reports, DataSourceJob, DataSourceJobSpec};
use crate::{
    common::{read_file, read_json, relative_to, Result, ZoracledError},
    executor::ExecutorArgs,
};

/// Run a request's data sources and print the raw reports as JSON
#[derive(Parser, Debug)]
pub struct Cmd {
    /// JSON file listing the data sources: `[{"external_id", "executable", "calldata"}]`
    #[arg(value_name = "JOBS")]
    pub jobs: PathBuf,

    /// Executor configuration
    #[command(flatten)]
    pub executor: ExecutorArgs,
}

impl Cmd {
    /// Execute the command
    pub async fn run(&self) -> Result<()> {
        let reports = self.execute().await?;
        println!("{}", serde_json::to_string_pretty(&reports)?);
        Ok(())
    }

    /// Collects the raw reports of every job in the jobs file.
    pub async fn execute(&self) -> Result<Vec<RawReport>> {
        let jobs = self.load_jobs()?;
        let executor = self.executor.build()?;
        info!(executor = executor.name(), jobs = jobs.len(), "collecting raw reports");
        Ok(collect_reports(executor, jobs, self.executor.timeout()).await)
    }

    fn load_jobs(&self) -> Result<Vec<DataSourceJob>> {
        let specs: Vec<DataSourceJobSpec> = read_json(&self.jobs)?;
        let mut seen = std::collections::BTreeSet::new();
        specs
            .into_iter()
            .map(|spec| {
                if !seen.insert(spec.external_id) {
                    return Err(ZoracledError::InvalidInput(format!(
                        "duplicate external id {}",
                        spec.external_id
                    )));
                }
                let executable = read_file(&relative_to(&self.jobs, &spec.executable))?;
                Ok(DataSourceJob {
                    external_id: spec.external_id,
                    executable: executable.into(),
                    calldata: spec.calldata,
                })
            })
            .collect()
    }
}
