//! Habit state and synchronization engine.
//!
//! Local-first: all habit and completion state lives in memory and in a
//! durable local cache, and remains fully usable with no authenticated user.
//! Signing in triggers a one-shot reconciliation against the per-user remote
//! document (whole-state, last-writer-wins by timestamp); subsequent writes
//! are pushed through the sync coordinator's serialized writer.

pub mod cache;
pub mod errors;
pub mod habits;
pub mod sync;
pub mod utils;
