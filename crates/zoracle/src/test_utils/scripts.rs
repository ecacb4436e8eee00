//! WebAssembly oracle scripts for tests.

/// Returns the request calldata.
pub const ECHO_CALLDATA_WAT: &str = r#"(module
  (import "env" "get_calldata_size" (func $calldata_size (result i64)))
  (import "env" "read_calldata" (func $read_calldata (param i32)))
  (import "env" "set_return_data" (func $set_return_data (param i32 i32)))
  (memory (export "memory") 1)
  (func (export "execute")
    (call $read_calldata (i32.const 0))
    (call $set_return_data (i32.const 0) (i32.wrap_i64 (call $calldata_size)))))"#;

/// Returns the data of every raw report, concatenated in report order.
pub const CONCAT_REPORTS_WAT: &str = r#"(module
  (import "env" "get_raw_report_count" (func $report_count (result i64)))
  (import "env" "get_raw_report_size" (func $report_size (param i64) (result i64)))
  (import "env" "read_raw_report" (func $read_report (param i64 i32)))
  (import "env" "set_return_data" (func $set_return_data (param i32 i32)))
  (memory (export "memory") 1)
  (func (export "execute")
    (local $i i64) (local $n i64) (local $offset i32)
    (local.set $n (call $report_count))
    (block $done
      (loop $next
        (br_if $done (i64.ge_u (local.get $i) (local.get $n)))
        (call $read_report (local.get $i) (local.get $offset))
        (local.set $offset
          (i32.add (local.get $offset) (i32.wrap_i64 (call $report_size (local.get $i)))))
        (local.set $i (i64.add (local.get $i) (i64.const 1)))
        (br $next)))
    (call $set_return_data (i32.const 0) (local.get $offset))))"#;

/// Returns the exit code of the first raw report as a single byte.
pub const FIRST_EXIT_CODE_WAT: &str = r#"(module
  (import "env" "get_raw_report_exit_code" (func $exit_code (param i64) (result i64)))
  (import "env" "set_return_data" (func $set_return_data (param i32 i32)))
  (memory (export "memory") 1)
  (func (export "execute")
    (i64.store8 (i32.const 0) (call $exit_code (i64.const 0)))
    (call $set_return_data (i32.const 0) (i32.const 1))))"#;

/// Loops until it runs out of gas.
pub const INFINITE_LOOP_WAT: &str = r#"(module
  (memory (export "memory") 1)
  (func (export "execute") (loop $spin (br $spin))))"#;

/// Traps immediately.
pub const UNREACHABLE_WAT: &str = r#"(module
  (memory (export "memory") 1)
  (func (export "execute") unreachable))"#;

/// Sets the return data twice.
pub const DOUBLE_RETURN_WAT: &str = r#"(module
  (import "env" "set_return_data" (func $set_return_data (param i32 i32)))
  (memory (export "memory") 1)
  (func (export "execute")
    (call $set_return_data (i32.const 0) (i32.const 1))
    (call $set_return_data (i32.const 0) (i32.const 1))))"#;

/// Compiles a text format script to bytecode.
pub fn compile_wat(wat: &str) -> Vec<u8> {
    wat::parse_str(wat).unwrap()
}
