//! SQLite-backed durable local cache.
//!
//! A single `kv` table provides the synchronous key→string storage the
//! engine persists into between process restarts.

mod errors;
mod kv;

pub use errors::*;
pub use kv::*;
