//! Runs a single data source through an executor, the way a reporter would.

mod cmd;

pub use cmd::*;
