//! Sccbridge - a Git adapter for a legacy poll-based source-control host
//!
//! Sccbridge reconciles the small fixed per-file vocabulary of a legacy
//! source-control host (controlled / checked-out / merged / deleted /
//! not-controlled) with Git's richer consistency model. The host polls;
//! the adapter recomputes every answer from live repository state and
//! never caches per-file flags across calls.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line harness (parses args, delegates to the library)
//! - [`status`] - Stateless derivation of host status flags from Git status
//! - [`stage`] - Atomic stage-then-commit transactions for batched files
//! - [`integrate`] - Fast-forward, merge, cherry-pick, revert and reset as
//!   variants of one state machine
//! - [`remote`] - Push/fetch/clone with credential, certificate and
//!   progress/cancellation mediation
//! - [`history`] - Per-file history and quick-diff queries
//! - [`core`] - Path translation, host status types, configuration
//! - [`context`] - Exclusive owner of one open repository per host project
//! - [`host`] - Collaborator interfaces and the host's closed return codes
//! - [`ui`] - Terminal implementations of the collaborator interfaces
//!
//! # Correctness Invariants
//!
//! 1. Status is a pure function of live repository state; nothing is cached
//!    between polls
//! 2. Per-path failures inside a batch never abort the remaining paths;
//!    only the commit step is all-or-nothing
//! 3. Conflicts are valid terminal states, never failures
//! 4. User cancellation is a distinct result, never conflated with an error

pub mod cli;
pub mod context;
pub mod core;
pub mod error;
pub mod history;
pub mod host;
pub mod integrate;
pub mod remote;
pub mod stage;
pub mod status;
pub mod ui;
