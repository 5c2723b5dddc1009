//! core::types
//!
//! The host's per-file status vocabulary.
//!
//! # Projection
//!
//! The host understands a small closed set of per-file states. Git's status
//! bitset is folded into this projection on every poll; the projection is a
//! pure function of the bitset and is never cached across calls.

use serde::Serialize;

/// The host's view of one file, projected from Git status flags.
///
/// Multiple flags may combine (a file is commonly `controlled` and
/// `checked_out` at the same time). Two states are exclusive:
/// a file that is not `controlled` carries no other flag, and `invalid`
/// marks a query error rather than a repository state.
///
/// # Example
///
/// ```
/// use sccbridge::core::types::HostStatus;
///
/// let st = HostStatus::controlled().with_checked_out();
/// assert!(st.controlled && st.checked_out);
/// assert!(!st.is_not_controlled());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HostStatus {
    /// The file is under source control (present in HEAD or the index).
    pub controlled: bool,
    /// The file differs from its committed copy ("checked out" to the host).
    pub checked_out: bool,
    /// The file has an unresolved merge conflict.
    pub merged: bool,
    /// The file is deleted in the working tree or the index.
    pub deleted: bool,
    /// The status query itself failed for this file.
    pub invalid: bool,
}

impl HostStatus {
    /// A file that is not under source control.
    pub fn not_controlled() -> Self {
        Self::default()
    }

    /// A file that is under source control with no pending changes.
    pub fn controlled() -> Self {
        Self {
            controlled: true,
            ..Self::default()
        }
    }

    /// A status-query error for this file. Not a repository state.
    pub fn invalid() -> Self {
        Self {
            invalid: true,
            ..Self::default()
        }
    }

    /// Add the "differs from committed copy" flag.
    pub fn with_checked_out(mut self) -> Self {
        self.checked_out = true;
        self
    }

    /// Add the merge-conflict flag.
    pub fn with_merged(mut self) -> Self {
        self.merged = true;
        self
    }

    /// Add the deleted flag.
    pub fn with_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// True when the file is neither controlled nor in error.
    pub fn is_not_controlled(&self) -> bool {
        !self.controlled && !self.invalid
    }
}

impl std::fmt::Display for HostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.invalid {
            return write!(f, "invalid");
        }
        if !self.controlled {
            return write!(f, "not-controlled");
        }
        let mut parts = vec!["controlled"];
        if self.checked_out {
            parts.push("checked-out");
        }
        if self.merged {
            parts.push("merged");
        }
        if self.deleted {
            parts.push("deleted");
        }
        write!(f, "{}", parts.join("+"))
    }
}
