use std::{io::Write, path::PathBuf};

use clap::{Args, Parser};
use serde::Serialize;
use zoracle::{
    end_block, EventAttribute, MemoryStore, RequestId, ResolveEvent, ResolveOutcome, WasmSandbox,
    WasmSandboxConfig,
};

use super::ResolveFixture;
use crate::common::{read_json, write_json, Result};

/// Run one end-block resolution pass over a JSON state file
#[derive(Parser, Debug)]
pub struct Cmd {
    /// JSON state file with params, oracle scripts, requests, raw reports and the pending list
    #[arg(value_name = "STATE")]
    pub state: PathBuf,

    /// Override the end-block execute gas limit of the state file
    #[arg(long = "gas-limit")]
    pub gas_limit: Option<u64>,

    /// Override the maximum result size of the state file
    #[arg(long = "max-result-size")]
    pub max_result_size: Option<u64>,

    /// Write the committed state to this file instead of printing it
    #[arg(long = "output", short = 'o')]
    pub output: Option<PathBuf>,

    /// Sandbox configuration
    #[command(flatten)]
    pub sandbox: SandboxArgs,
}

/// Wasm sandbox limits.
#[derive(Args, Debug, Clone, Default)]
pub struct SandboxArgs {
    /// Maximum linear memory of an oracle script instance, in bytes
    #[arg(long = "sandbox.max-memory-bytes", visible_aliases = ["sandbox-max-memory-bytes"])]
    pub max_memory_bytes: Option<usize>,

    /// Maximum number of elements of an oracle script's table
    #[arg(long = "sandbox.max-table-elements", visible_aliases = ["sandbox-max-table-elements"])]
    pub max_table_elements: Option<u32>,

    /// Maximum size of the data an oracle script may return, in bytes
    #[arg(
        long = "sandbox.max-return-data-size",
        visible_aliases = ["sandbox-max-return-data-size"]
    )]
    pub max_return_data_size: Option<usize>,
}

impl SandboxArgs {
    /// Builds the sandbox configuration, keeping defaults for unset limits.
    pub fn config(&self) -> WasmSandboxConfig {
        let mut config = WasmSandboxConfig::default();
        if let Some(bytes) = self.max_memory_bytes {
            config = config.with_max_memory_bytes(bytes);
        }
        if let Some(elements) = self.max_table_elements {
            config = config.with_max_table_elements(elements);
        }
        if let Some(size) = self.max_return_data_size {
            config = config.with_max_return_data_size(size);
        }
        config
    }
}

/// An emitted event in its attribute form.
#[derive(Debug, Serialize)]
pub struct EventRecord {
    /// The event type.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// The event attributes.
    pub attributes: Vec<EventAttribute>,
}

impl From<&ResolveEvent> for EventRecord {
    fn from(event: &ResolveEvent) -> Self {
        Self { kind: event.kind(), attributes: event.attributes() }
    }
}

/// What the command prints.
#[derive(Debug, Serialize)]
pub struct ResolveReport {
    /// Events in emission order.
    pub events: Vec<EventRecord>,
    /// The pending resolve list left for the next block.
    pub pending: Vec<RequestId>,
    /// Gas charged by the pass.
    pub gas_consumed: u64,
    /// Why the pass stopped early, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deferred: Option<String>,
    /// The committed state, unless written to `--output`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<MemoryStore>,
}

impl Cmd {
    /// Execute the command
    pub fn run(&self) -> Result<()> {
        let (outcome, store) = self.execute()?;

        let state = match &self.output {
            Some(path) => {
                write_json(path, &store)?;
                None
            }
            None => Some(store),
        };
        let report = ResolveReport {
            events: outcome.events.iter().map(EventRecord::from).collect(),
            pending: outcome.pending,
            gas_consumed: outcome.gas_consumed,
            deferred: outcome.deferred.map(|reason| reason.to_string()),
            state,
        };

        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &report)?;
        writeln!(stdout)?;
        stdout.flush()?;
        Ok(())
    }

    /// Loads the state, applies the overrides and runs the pass.
    ///
    /// Returns the outcome together with the committed state.
    pub fn execute(&self) -> Result<(ResolveOutcome, MemoryStore)> {
        let fixture: ResolveFixture = read_json(&self.state)?;
        let mut store = fixture.into_store()?;
        if let Some(limit) = self.gas_limit {
            store.params = store.params.with_end_block_execute_gas_limit(limit);
        }
        if let Some(size) = self.max_result_size {
            store.params = store.params.with_max_result_size(size);
        }

        let sandbox = WasmSandbox::new(self.sandbox.config())?;
        let outcome = end_block(&mut store, &sandbox)?;
        Ok((outcome, store))
    }
}
