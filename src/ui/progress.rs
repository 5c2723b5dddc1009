//! ui::progress
//!
//! Terminal implementations of the host collaborator interfaces.
//!
//! # Design
//!
//! These are the harness-side collaborators: a line-oriented progress sink
//! and prompt implementations backed by stdin/stderr. A real host replaces
//! all of them with its own dialog surfaces.

use std::io::{BufRead, Write};

use crate::host::{
    CertificateDecision, CertificatePrompt, ConflictPresenter, CredentialPrompt, ProgressLine,
    ProgressSink, SignatureResolver,
};
use crate::integrate::ConflictEntry;
use crate::ui::output::{self, Verbosity};

/// Progress sink that writes status lines to stderr.
///
/// Counters are throttled to meaningful changes so a large transfer does
/// not flood the terminal.
pub struct TerminalProgress {
    verbosity: Verbosity,
    last_reported: std::cell::Cell<usize>,
}

impl TerminalProgress {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            last_reported: std::cell::Cell::new(usize::MAX),
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn set_title(&self, text: &str) {
        output::debug(format!("begin: {}", text), self.verbosity);
    }

    fn set_line(&self, _line: ProgressLine, text: &str) {
        output::debug(text, self.verbosity);
    }

    fn set_progress(&self, current: usize, total: usize) {
        if self.verbosity == Verbosity::Quiet || total == 0 {
            return;
        }
        let percent = current * 100 / total;
        if self.last_reported.get() != percent {
            self.last_reported.set(percent);
            eprint!("\r{:3}% ({}/{})", percent, current, total);
            if current == total {
                eprintln!();
            }
            let _ = std::io::stderr().flush();
        }
    }

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Credential prompt reading the username from stdin and the password
/// without echo.
pub struct TerminalCredentials;

impl CredentialPrompt for TerminalCredentials {
    fn prompt_user_pass(
        &self,
        url: &str,
        suggested_user: Option<&str>,
    ) -> Option<(String, String)> {
        eprintln!("authentication required for {}", url);
        let user = match suggested_user {
            Some(user) => user.to_string(),
            None => {
                eprint!("username: ");
                let _ = std::io::stderr().flush();
                let mut line = String::new();
                std::io::stdin().lock().read_line(&mut line).ok()?;
                let trimmed = line.trim().to_string();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed
            }
        };
        let pass = rpassword::prompt_password("password: ").ok()?;
        Some((user, pass))
    }
}

/// Certificate prompt asking for a y/N confirmation.
pub struct TerminalCertificates;

impl CertificatePrompt for TerminalCertificates {
    fn prompt_certificate(&self, host: &str) -> CertificateDecision {
        eprint!(
            "certificate for '{}' could not be verified; connect anyway? [y/N] ",
            host
        );
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return CertificateDecision::Rejected;
        }
        if line.trim().eq_ignore_ascii_case("y") {
            CertificateDecision::Accepted
        } else {
            CertificateDecision::Rejected
        }
    }
}

/// Signature prompt asking for name and email on stdin.
pub struct TerminalSignatures;

impl SignatureResolver for TerminalSignatures {
    fn resolve_or_prompt(&self) -> Option<(String, String)> {
        let mut stdin = std::io::stdin().lock();

        eprint!("author name: ");
        let _ = std::io::stderr().flush();
        let mut name = String::new();
        stdin.read_line(&mut name).ok()?;
        let name = name.trim().to_string();
        if name.is_empty() {
            return None;
        }

        eprint!("author email: ");
        let _ = std::io::stderr().flush();
        let mut email = String::new();
        stdin.read_line(&mut email).ok()?;
        let email = email.trim().to_string();
        if email.is_empty() {
            return None;
        }

        Some((name, email))
    }
}

/// Conflict presenter listing each conflicted path on stderr.
pub struct TerminalConflicts;

impl ConflictPresenter for TerminalConflicts {
    fn present(&self, conflicts: &[ConflictEntry]) {
        eprintln!("{} conflict(s):", conflicts.len());
        for entry in conflicts {
            let path = entry
                .ours
                .as_deref()
                .or(entry.theirs.as_deref())
                .or(entry.ancestor.as_deref())
                .unwrap_or("<unknown>");
            let kind = if entry.ancestor.is_none() {
                "added by both"
            } else {
                "content"
            };
            eprintln!("  {} ({})", path, kind);
        }
    }
}
