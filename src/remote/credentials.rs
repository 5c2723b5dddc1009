//! remote::credentials
//!
//! Priority-ordered credential negotiation.
//!
//! # Design
//!
//! The remote advertises the credential types it accepts; the plan walks a
//! fixed priority order and keeps only the applicable types:
//!
//! 1. plaintext username/password, through the host's prompt
//! 2. SSH key from an agent
//! 3. platform default / negotiate credentials
//! 4. username-only (SSH with externally managed keys)
//!
//! Each attempt either yields credentials (stop) or falls through to the
//! next type. An exhausted plan is an authentication failure; a cancelled
//! prompt is a user cancellation, reported through the distinguished
//! `GIT_EUSER` sentinel so it travels intact through the library call.

use crate::host::CredentialPrompt;

/// One credential type the plan may attempt, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStrategy {
    /// Plaintext username/password through the host prompt.
    UserPassPrompt,
    /// SSH key held by a running agent.
    SshAgent,
    /// Platform default / negotiate credentials.
    Default,
    /// Username only; the transport negotiates keys externally.
    UsernameOnly,
}

/// Build the attempt list for one request.
///
/// Keeps the fixed priority order, dropping types the remote did not
/// advertise and the prompt-backed type when no prompt collaborator is
/// available.
pub fn build_plan(
    allowed: git2::CredentialType,
    has_prompt: bool,
) -> Vec<CredentialStrategy> {
    let mut plan = Vec::new();
    if allowed.is_user_pass_plaintext() && has_prompt {
        plan.push(CredentialStrategy::UserPassPrompt);
    }
    if allowed.is_ssh_key() {
        plan.push(CredentialStrategy::SshAgent);
    }
    if allowed.is_default() {
        plan.push(CredentialStrategy::Default);
    }
    if allowed.is_username() {
        plan.push(CredentialStrategy::UsernameOnly);
    }
    plan
}

/// Run the plan for one credential request from the transport.
///
/// Invoked from inside the library's credential callback, so failures must
/// travel as `git2::Error`: a cancelled prompt becomes `GIT_EUSER` (the
/// cancellation sentinel) and exhaustion becomes an `Auth`-class error.
pub fn acquire(
    url: &str,
    username_from_url: Option<&str>,
    allowed: git2::CredentialType,
    prompt: Option<&dyn CredentialPrompt>,
) -> Result<git2::Cred, git2::Error> {
    let username = username_from_url.unwrap_or("git");
    let plan = build_plan(allowed, prompt.is_some());

    for strategy in &plan {
        match strategy {
            CredentialStrategy::UserPassPrompt => {
                let Some(prompt) = prompt else { continue };
                match prompt.prompt_user_pass(url, username_from_url) {
                    Some((user, pass)) => {
                        if let Ok(cred) = git2::Cred::userpass_plaintext(&user, &pass) {
                            return Ok(cred);
                        }
                    }
                    None => {
                        return Err(git2::Error::new(
                            git2::ErrorCode::User,
                            git2::ErrorClass::Callback,
                            "credential prompt cancelled",
                        ));
                    }
                }
            }
            CredentialStrategy::SshAgent => {
                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
            }
            CredentialStrategy::Default => {
                if let Ok(cred) = git2::Cred::default() {
                    return Ok(cred);
                }
            }
            CredentialStrategy::UsernameOnly => {
                if let Ok(cred) = git2::Cred::username(username) {
                    return Ok(cred);
                }
            }
        }
    }

    Err(git2::Error::new(
        git2::ErrorCode::Auth,
        git2::ErrorClass::Callback,
        "no applicable credential type succeeded",
    ))
}
