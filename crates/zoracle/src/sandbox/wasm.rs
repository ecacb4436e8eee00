use core::fmt;

use alloy_primitives::Bytes;
use wasmtime::{
    Caller, Config, Engine, Extern, Linker, Module, OptLevel, Store, StoreLimits,
    StoreLimitsBuilder, Trap,
};

use crate::{
    constants::sandbox::{
        DEFAULT_HOST_CALL_BASE_GAS, DEFAULT_HOST_CALL_PER_BYTE_GAS, DEFAULT_MAX_MEMORY_BYTES,
        DEFAULT_MAX_RETURN_DATA_SIZE, DEFAULT_MAX_TABLE_ELEMENTS, HOST_MODULE, MEMORY_EXPORT,
    },
    ExecutionEnv, ExecutionOutcome, RawReport, Sandbox, SandboxError,
};

/// Resource limits and host call pricing of a [`WasmSandbox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WasmSandboxConfig {
    /// Maximum linear memory of a script instance, in bytes.
    pub max_memory_bytes: usize,
    /// Maximum number of elements of a script's table. Growing past it fails deterministically.
    pub max_table_elements: u32,
    /// Gas charged for every host call.
    pub host_call_base_gas: u64,
    /// Gas charged per byte copied across the host boundary.
    pub host_call_per_byte_gas: u64,
    /// Maximum size of the data a script may return.
    pub max_return_data_size: usize,
}

impl Default for WasmSandboxConfig {
    fn default() -> Self {
        Self {
            max_memory_bytes: DEFAULT_MAX_MEMORY_BYTES,
            max_table_elements: DEFAULT_MAX_TABLE_ELEMENTS,
            host_call_base_gas: DEFAULT_HOST_CALL_BASE_GAS,
            host_call_per_byte_gas: DEFAULT_HOST_CALL_PER_BYTE_GAS,
            max_return_data_size: DEFAULT_MAX_RETURN_DATA_SIZE,
        }
    }
}

impl WasmSandboxConfig {
    /// Set a custom linear memory cap.
    pub fn with_max_memory_bytes(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    /// Set a custom table size cap.
    pub fn with_max_table_elements(mut self, elements: u32) -> Self {
        self.max_table_elements = elements;
        self
    }

    /// Set a custom base gas per host call.
    pub fn with_host_call_base_gas(mut self, gas: u64) -> Self {
        self.host_call_base_gas = gas;
        self
    }

    /// Set a custom gas per byte copied across the host boundary.
    pub fn with_host_call_per_byte_gas(mut self, gas: u64) -> Self {
        self.host_call_per_byte_gas = gas;
        self
    }

    /// Set a custom return data cap.
    pub fn with_max_return_data_size(mut self, size: usize) -> Self {
        self.max_return_data_size = size;
        self
    }
}

/// Builds the deterministic wasmtime configuration: fuel metering on, NaNs canonicalized and every
/// proposal that could behave differently across hosts disabled.
pub fn deterministic_wasmtime_config() -> Config {
    let mut cfg = Config::new();
    cfg.consume_fuel(true);
    cfg.cranelift_nan_canonicalization(true);
    cfg.cranelift_opt_level(OptLevel::None);
    cfg.wasm_simd(false);
    cfg.wasm_relaxed_simd(false);
    cfg.wasm_multi_memory(false);
    cfg.wasm_memory64(false);
    cfg
}

/// A [`Sandbox`] running WebAssembly oracle scripts on wasmtime. One unit of fuel is one unit of
/// gas.
///
/// # Host ABI
///
/// Scripts export `memory` and a `() -> ()` entry point, and may import from module `env`:
///
/// | Function | Signature | |
/// |---|---|---|
/// | `get_calldata_size` | `() -> i64` | |
/// | `read_calldata` | `(ptr: i32)` | copies the calldata to `ptr` |
/// | `get_raw_report_count` | `() -> i64` | |
/// | `get_raw_report_size` | `(index: i64) -> i64` | |
/// | `get_raw_report_exit_code` | `(index: i64) -> i64` | |
/// | `read_raw_report` | `(index: i64, ptr: i32)` | copies the report data to `ptr` |
/// | `set_return_data` | `(ptr: i32, len: i32)` | at most once |
///
/// Every call costs `host_call_base_gas` plus `host_call_per_byte_gas` per byte copied.
pub struct WasmSandbox {
    engine: Engine,
    config: WasmSandboxConfig,
}

impl fmt::Debug for WasmSandbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WasmSandbox").field("config", &self.config).finish_non_exhaustive()
    }
}

impl WasmSandbox {
    /// Creates a sandbox with the given limits.
    pub fn new(config: WasmSandboxConfig) -> Result<Self, SandboxError> {
        let engine = Engine::new(&deterministic_wasmtime_config())
            .map_err(|err| SandboxError::Internal(err.to_string()))?;
        Ok(Self { engine, config })
    }

    /// The sandbox limits.
    pub fn config(&self) -> &WasmSandboxConfig {
        &self.config
    }

    fn run(
        &self,
        store: &mut Store<HostState>,
        code: &[u8],
        entry_point: &str,
    ) -> Result<Bytes, SandboxError> {
        let module = Module::new(&self.engine, code)
            .map_err(|err| SandboxError::InvalidModule(err.to_string()))?;

        let mut linker = Linker::new(&self.engine);
        define_imports(&mut linker).map_err(|err| SandboxError::Internal(err.to_string()))?;

        let instance = linker.instantiate(&mut *store, &module).map_err(|err| {
            match host_failure(store) {
                Some(failure) => failure,
                None => SandboxError::InvalidModule(err.to_string()),
            }
        })?;
        let entry = instance
            .get_typed_func::<(), ()>(&mut *store, entry_point)
            .map_err(|_| SandboxError::MissingEntryPoint(entry_point.to_string()))?;
        entry.call(&mut *store, ()).map_err(|err| map_trap(store, err))?;

        store.data_mut().return_data.take().map(Bytes::from).ok_or(SandboxError::NoReturnData)
    }
}

impl Sandbox for WasmSandbox {
    fn execute(
        &self,
        env: &ExecutionEnv,
        code: &[u8],
        entry_point: &str,
        calldata: &[u8],
        gas_limit: u64,
    ) -> ExecutionOutcome {
        // caps every host allocation a script can trigger
        let limits = StoreLimitsBuilder::new()
            .memory_size(self.config.max_memory_bytes)
            .table_elements(self.config.max_table_elements)
            .memories(1)
            .tables(1)
            .instances(1)
            .build();
        let mut store = Store::new(
            &self.engine,
            HostState {
                config: self.config,
                limits,
                calldata: calldata.to_vec(),
                raw_reports: env.raw_reports.clone(),
                return_data: None,
                host_error: None,
                out_of_gas: false,
            },
        );
        store.limiter(|state| &mut state.limits);
        if let Err(err) = store.set_fuel(gas_limit) {
            return ExecutionOutcome::failure(SandboxError::Internal(err.to_string()), 0);
        }

        let result = self.run(&mut store, code, entry_point);
        let gas_used = match store.get_fuel() {
            Ok(remaining) => gas_limit.saturating_sub(remaining),
            Err(err) => {
                return ExecutionOutcome::failure(SandboxError::Internal(err.to_string()), gas_limit)
            }
        };
        tracing::trace!(request_id = %env.request_id, gas_used, ok = result.is_ok(), "executed oracle script");

        ExecutionOutcome { result, gas_used }
    }
}

struct HostState {
    config: WasmSandboxConfig,
    limits: StoreLimits,
    calldata: Vec<u8>,
    raw_reports: Vec<RawReport>,
    return_data: Option<Vec<u8>>,
    host_error: Option<SandboxError>,
    out_of_gas: bool,
}

fn host_failure(store: &Store<HostState>) -> Option<SandboxError> {
    let state = store.data();
    if let Some(err) = state.host_error.clone() {
        return Some(err);
    }
    state.out_of_gas.then_some(SandboxError::OutOfGas)
}

fn map_trap(store: &Store<HostState>, err: anyhow::Error) -> SandboxError {
    if let Some(failure) = host_failure(store) {
        return failure;
    }
    match err.downcast_ref::<Trap>() {
        Some(Trap::OutOfFuel) => SandboxError::OutOfGas,
        Some(trap) => SandboxError::Trap(trap.to_string()),
        None => SandboxError::Trap(err.to_string()),
    }
}

fn define_imports(linker: &mut Linker<HostState>) -> anyhow::Result<()> {
    linker.func_wrap(
        HOST_MODULE,
        "get_calldata_size",
        |mut caller: Caller<'_, HostState>| -> anyhow::Result<i64> {
            charge(&mut caller, 0)?;
            Ok(len_to_i64(caller.data().calldata.len()))
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "read_calldata",
        |mut caller: Caller<'_, HostState>, ptr: i32| -> anyhow::Result<()> {
            let calldata = caller.data().calldata.clone();
            charge(&mut caller, calldata.len())?;
            write_guest_memory(&mut caller, ptr, &calldata)
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "get_raw_report_count",
        |mut caller: Caller<'_, HostState>| -> anyhow::Result<i64> {
            charge(&mut caller, 0)?;
            Ok(len_to_i64(caller.data().raw_reports.len()))
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "get_raw_report_size",
        |mut caller: Caller<'_, HostState>, index: i64| -> anyhow::Result<i64> {
            charge(&mut caller, 0)?;
            let report = raw_report(&mut caller, index)?;
            Ok(len_to_i64(report.data.len()))
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "get_raw_report_exit_code",
        |mut caller: Caller<'_, HostState>, index: i64| -> anyhow::Result<i64> {
            charge(&mut caller, 0)?;
            let report = raw_report(&mut caller, index)?;
            Ok(i64::from(report.exit_code))
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "read_raw_report",
        |mut caller: Caller<'_, HostState>, index: i64, ptr: i32| -> anyhow::Result<()> {
            let report = raw_report(&mut caller, index)?;
            charge(&mut caller, report.data.len())?;
            write_guest_memory(&mut caller, ptr, &report.data)
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "set_return_data",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> anyhow::Result<()> {
            if caller.data().return_data.is_some() {
                return Err(violation(&mut caller, "return data already set"));
            }
            let len = usize::try_from(len)
                .map_err(|_| violation(&mut caller, "negative return data length"))?;
            if len > caller.data().config.max_return_data_size {
                return Err(violation(&mut caller, "return data too large"));
            }
            charge(&mut caller, len)?;
            let data = read_guest_memory(&mut caller, ptr, len)?;
            caller.data_mut().return_data = Some(data);
            Ok(())
        },
    )?;

    Ok(())
}

/// Charges a host call against the remaining fuel. Exhaustion drains the fuel and traps.
fn charge(caller: &mut Caller<'_, HostState>, bytes: usize) -> anyhow::Result<()> {
    let config = caller.data().config;
    let bytes = u64::try_from(bytes).unwrap_or(u64::MAX);
    let cost = config
        .host_call_base_gas
        .saturating_add(config.host_call_per_byte_gas.saturating_mul(bytes));
    let remaining = caller.get_fuel()?;
    if remaining < cost {
        caller.set_fuel(0)?;
        caller.data_mut().out_of_gas = true;
        return Err(Trap::OutOfFuel.into());
    }
    caller.set_fuel(remaining - cost)?;
    Ok(())
}

fn violation(caller: &mut Caller<'_, HostState>, reason: &str) -> anyhow::Error {
    caller.data_mut().host_error = Some(SandboxError::HostViolation(reason.to_string()));
    anyhow::anyhow!("host violation: {reason}")
}

fn raw_report(caller: &mut Caller<'_, HostState>, index: i64) -> anyhow::Result<RawReport> {
    let report = usize::try_from(index)
        .ok()
        .and_then(|index| caller.data().raw_reports.get(index).cloned());
    report.ok_or_else(|| violation(caller, "raw report index out of range"))
}

fn guest_memory(caller: &mut Caller<'_, HostState>) -> anyhow::Result<wasmtime::Memory> {
    match caller.get_export(MEMORY_EXPORT) {
        Some(Extern::Memory(memory)) => Ok(memory),
        _ => Err(violation(caller, "missing exported memory")),
    }
}

fn write_guest_memory(
    caller: &mut Caller<'_, HostState>,
    ptr: i32,
    data: &[u8],
) -> anyhow::Result<()> {
    let offset = usize::try_from(ptr).map_err(|_| violation(caller, "negative pointer"))?;
    let memory = guest_memory(caller)?;
    memory
        .write(&mut *caller, offset, data)
        .map_err(|_| violation(caller, "memory write out-of-bounds"))
}

fn read_guest_memory(
    caller: &mut Caller<'_, HostState>,
    ptr: i32,
    len: usize,
) -> anyhow::Result<Vec<u8>> {
    let offset = usize::try_from(ptr).map_err(|_| violation(caller, "negative pointer"))?;
    let memory = guest_memory(caller)?;
    let mut data = vec![0_u8; len];
    memory
        .read(&*caller, offset, &mut data)
        .map_err(|_| violation(caller, "memory read out-of-bounds"))?;
    Ok(data)
}

fn len_to_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}
