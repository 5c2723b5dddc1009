//! remote
//!
//! Remote operations: push, pull and clone through libgit2 transports.
//!
//! # Responsibilities
//!
//! - Credential negotiation as a priority-ordered attempt list
//! - Last-chance certificate/host-key confirmation, never cached
//! - Progress streaming into a host-supplied sink
//! - Cooperative cancellation, surfaced as a distinct non-error result
//!
//! # Invariants
//!
//! - A [`RemoteSession`](controller::RemoteSession) lives for exactly one
//!   call; nothing remote-related is held across host calls
//! - Cancellation is checked only at progress callback checkpoints

pub mod controller;
pub mod credentials;

pub use controller::{PullStrategy, RemoteOutcome, RemoteSession};
