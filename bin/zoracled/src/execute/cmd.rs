use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::{
    common::{read_file, Result},
    executor::{ExecutionOutput, ExecutorArgs},
};

/// Run one data source executable and print its output as JSON
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Path to the data source executable
    #[arg(value_name = "EXECUTABLE")]
    pub executable: PathBuf,

    /// Command line passed to the executable
    #[arg(long = "calldata", default_value = "")]
    pub calldata: String,

    /// Executor configuration
    #[command(flatten)]
    pub executor: ExecutorArgs,
}

impl Cmd {
    /// Execute the command
    pub async fn run(&self) -> Result<()> {
        let output = self.execute().await?;
        println!("{}", serde_json::to_string(&output)?);
        Ok(())
    }

    /// Runs the executable and returns what the executor reported.
    pub async fn execute(&self) -> Result<ExecutionOutput> {
        let executable = read_file(&self.executable)?;
        let executor = self.executor.build()?;
        info!(executor = executor.name(), executable = %self.executable.display(), "executing data source");
        Ok(executor.execute(&executable, &self.calldata, self.executor.timeout()).await)
    }
}
