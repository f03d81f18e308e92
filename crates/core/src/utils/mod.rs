//! Shared utilities.

mod dates;

pub use dates::*;
