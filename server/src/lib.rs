//! Server side of the svframe replication protocol.
//!
//! A [`FrameServer`] keeps one session per connected client. Every simulation
//! tick it pulls changed entities from the [`WorldSnapshot`], queues them in
//! each client's delta pool, and for every client that is due writes one
//! frame no larger than the client's byte budget.
//!
//! # Collaborators
//!
//! - [`Transport`] - send queue, delivery channels, bandwidth rating
//! - [`Clock`] - tick counter and wall time
//! - [`WorldSnapshot`] - authoritative entity changes as deltas
//!
//! # Design Principles
//!
//! - **Hard budget** - Only the first record of a frame may exceed the budget.
//! - **Backpressure is not an error** - A full send queue skips the client.
//! - **Single-threaded** - Sessions are independent and owned by the server.

mod bandwidth;
mod config;
mod encoder;
mod error;
mod scheduler;
mod server;
mod session;
mod transport;

pub use bandwidth::{BandwidthRating, FrameBudget, SendQueueMonitor};
pub use config::{InvalidDeltaPolicy, ServerConfig};
pub use encoder::{FrameOutcome, FrameStats};
pub use error::{ServerError, ServerResult};
pub use scheduler::FrameScheduler;
pub use server::{FrameServer, TickReport};
pub use session::{ClientId, ClientSession, SessionStats};
pub use transport::{Clock, Transport, WorldSnapshot, TIC_RATE};
