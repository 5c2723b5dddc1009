//! host
//!
//! Interfaces at the boundary between the adapter and its embedding host.
//!
//! # Design
//!
//! The host supplies collaborators for anything interactive: progress
//! display, credential and certificate prompts, author identity resolution
//! and conflict presentation. The adapter consumes them through the traits
//! in this module and never renders anything itself.
//!
//! All collaborators are invoked synchronously from within the host's own
//! calling thread; cancellation is cooperative and polled only at the
//! defined callback checkpoints.

use crate::integrate::ConflictEntry;

/// The host's closed return vocabulary.
///
/// Every adapter operation maps its result onto exactly one of these five
/// codes. `Cancelled` is user-initiated and explicitly not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCode {
    /// Operation completed.
    Success,
    /// User cancelled; routine, not an error.
    Cancelled,
    /// The file is not under source control.
    NotUnderControl,
    /// Nonspecific failure; details go through the error channel.
    Error,
    /// The host asked for something the adapter does not do.
    Unsupported,
}

/// A display line in the host's progress surface.
///
/// The host renders a small fixed set of text lines; free-text status is
/// keyed by one of these rather than an arbitrary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLine {
    /// What the operation is currently doing.
    Status,
    /// Per-item detail (current object, ref being updated, ...).
    Detail,
}

/// Progress display and cooperative cancellation.
///
/// Owned by the single active remote session or checkout call; acquired at
/// call entry and released at call exit, never a global.
pub trait ProgressSink {
    /// Set the title of the progress surface.
    fn set_title(&self, text: &str);

    /// Set one of the fixed display lines.
    fn set_line(&self, line: ProgressLine, text: &str);

    /// Report a quantifiable (current, total) counter.
    fn set_progress(&self, current: usize, total: usize);

    /// Poll the cooperative cancellation flag.
    ///
    /// Checked between discrete progress ticks; a transfer cannot be
    /// interrupted mid-object-write.
    fn is_cancelled(&self) -> bool;
}

/// A progress sink that displays nothing and never cancels.
///
/// Fallback for hosts that provide no progress surface.
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn set_title(&self, _text: &str) {}
    fn set_line(&self, _line: ProgressLine, _text: &str) {}
    fn set_progress(&self, _current: usize, _total: usize) {}
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Plaintext username/password acquisition.
pub trait CredentialPrompt {
    /// Ask the user for a username and password for `url`.
    ///
    /// Returns `None` if the user cancelled the prompt.
    fn prompt_user_pass(&self, url: &str, suggested_user: Option<&str>)
        -> Option<(String, String)>;
}

/// The user's decision on an otherwise-invalid certificate or host key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateDecision {
    /// Proceed with the transfer.
    Accepted,
    /// Abort the transfer with a certificate error.
    Rejected,
}

/// Last-chance certificate/host-key confirmation.
///
/// Consulted once per connection; the decision is never cached across
/// calls, so every connection is re-validated.
pub trait CertificatePrompt {
    /// Ask the user whether to trust the presented certificate for `host`.
    fn prompt_certificate(&self, host: &str) -> CertificateDecision;
}

/// Author/committer identity resolution.
///
/// Consulted when the repository has no configured default identity.
pub trait SignatureResolver {
    /// Resolve or prompt for a (name, email) pair.
    ///
    /// Returns `None` if the user cancelled.
    fn resolve_or_prompt(&self) -> Option<(String, String)>;
}

/// Receives conflict lists for display. Purely informational.
pub trait ConflictPresenter {
    /// Present the conflicts of a merge-like operation to the user.
    fn present(&self, conflicts: &[ConflictEntry]);
}
