//! Offline end-block resolution over a JSON state fixture.

mod cmd;
mod fixture;

pub use cmd::*;
pub use fixture::*;
