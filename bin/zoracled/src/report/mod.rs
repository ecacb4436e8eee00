//! Collection of raw reports for a request's data sources.

mod cmd;
mod collect;

pub use cmd::*;
pub use collect::*;
