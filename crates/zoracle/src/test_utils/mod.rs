//! Test utilities for oracle request resolution.

mod sandbox;
mod scripts;

pub use sandbox::*;
pub use scripts::*;
