//! core
//!
//! Domain types shared across the adapter.
//!
//! # Modules
//!
//! - [`types`] - The host status projection and related value types
//! - [`paths`] - Translation between host paths and repository paths
//! - [`config`] - Adapter configuration schema and loading
//!
//! # Design Principles
//!
//! - Everything here is ephemeral: recomputed per call, never cached
//! - No module here touches git2; repository access lives above core

pub mod config;
pub mod paths;
pub mod types;
