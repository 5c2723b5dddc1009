//! ui
//!
//! Terminal implementations of the host collaborator interfaces, used by
//! the `sccb` harness binary.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-gated printing
//! - [`progress`] - Progress sink, credential/certificate/signature prompts

pub mod output;
pub mod progress;
