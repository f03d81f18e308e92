//! Durable local cache: key/value contract and the habit cache adapter.

mod adapter;
mod local_cache;

pub use adapter::*;
pub use local_cache::*;
