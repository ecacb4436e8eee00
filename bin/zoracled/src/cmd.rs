use clap::Parser;

use crate::common::{LogArgs, ZoracledError};

/// Command line interface of the zoracled tool
#[derive(Parser, Debug)]
#[command(version, about, infer_subcommands = true)]
pub struct Cli {
    /// The command to run
    #[command(subcommand)]
    pub cmd: MainCmd,

    /// Logging configuration
    #[command(flatten)]
    pub log: LogArgs,
}

/// Main command enumeration for the zoracled CLI tool
#[derive(clap::Subcommand, Debug)]
pub enum MainCmd {
    /// Run one data source executable on the off-chain executor
    Execute(crate::execute::Cmd),
    /// Collect raw reports for a batch of data source jobs
    Report(crate::report::Cmd),
    /// Run one end-block resolution pass over a state fixture
    Resolve(crate::resolve::Cmd),
}

/// Error types for the main command system
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command error
    #[error("{0}")]
    Zoracled(#[from] ZoracledError),
}

impl Cli {
    /// Initialize logging and execute the command
    pub async fn run(&self) -> Result<(), Error> {
        self.log.init()?;
        self.cmd.run().await
    }
}

impl MainCmd {
    /// Execute the main command
    pub async fn run(&self) -> Result<(), Error> {
        match self {
            Self::Execute(cmd) => cmd.run().await?,
            Self::Report(cmd) => cmd.run().await?,
            Self::Resolve(cmd) => cmd.run()?,
        }
        Ok(())
    }
}
