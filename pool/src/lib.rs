//! Per-client delta pool for the svframe replication protocol.
//!
//! A pool collects the deltas generated for one client, merges changes to the
//! same entity while they are still unsent, orders them for the frame
//! encoder and keeps sent deltas until the client acknowledges them.
//!
//! # Lifecycle
//!
//! 1. [`DeltaPool::insert_or_merge`] for every change.
//! 2. [`DeltaPool::rate`] before building a frame.
//! 3. [`DeltaPool::extract_next`] and [`DeltaPool::commit`] per written record.
//! 4. [`DeltaPool::acknowledge`] when the client confirms a set or a resend.

mod ack_timer;
mod config;
mod pool;
mod state;

pub use ack_timer::AckTimer;
pub use config::PoolConfig;
pub use pool::{DeltaHandle, DeltaPool, PoolEntry};
pub use state::{DeltaState, PriorityClass};
