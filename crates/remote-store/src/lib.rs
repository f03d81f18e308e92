//! REST client for the per-user habits document store.

mod client;
mod error;
mod types;

pub use client::*;
pub use error::*;
pub use types::*;
