//! error
//!
//! Typed errors for all adapter operations.
//!
//! # Error Tiers
//!
//! The adapter distinguishes three tiers of failure:
//!
//! 1. **Expected divergences** (path outside the project, file absent from
//!    status, unborn HEAD) are handled locally by the modules that hit them
//!    and never surface here.
//! 2. **Operational errors** (everything in [`AdapterError`] except
//!    `Cancelled`) propagate to the host as its nonspecific error code with
//!    a human-readable message.
//! 3. **Cancellations** are a distinct variant so the host never logs or
//!    alarms on a routine user cancel.
//!
//! There is no "last error" side channel: every fallible call returns
//! `Result<T, AdapterError>`.

use std::path::PathBuf;

use thiserror::Error;

use crate::host::HostCode;

/// Errors from adapter operations.
///
/// Categorized so that higher layers can react to specific failures
/// (e.g. map `PathOutsideProject` onto the host's file-not-under-control
/// code) without string matching.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Path does not belong to the bound project.
    #[error("path is outside the project root: {path}")]
    PathOutsideProject {
        /// The offending host path
        path: String,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in the repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id or revision spec.
    #[error("invalid revision spec: {spec}")]
    InvalidSpec {
        /// The offending spec
        spec: String,
    },

    /// A ref or object that must not exist already does.
    #[error("already exists: {message}")]
    AlreadyExists {
        /// Description of the collision
        message: String,
    },

    /// A fast-forward was required but the target is not a descendant.
    #[error("not a fast-forward: {message}")]
    NonFastForward {
        /// Description of the divergence
        message: String,
    },

    /// Every applicable credential type was exhausted.
    #[error("authentication failed: {message}")]
    Auth {
        /// Description of the failed negotiation
        message: String,
    },

    /// Certificate or host key was rejected.
    #[error("certificate rejected: {message}")]
    Certificate {
        /// Description of the rejection
        message: String,
    },

    /// The user cancelled the operation. Not a failure.
    #[error("operation cancelled by user")]
    Cancelled,

    /// The host requested something the adapter does not implement.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// The operation name
        operation: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl AdapterError {
    /// Create an AdapterError from a git2::Error with richer context.
    ///
    /// `context` names the ref, oid or operation the error came from and
    /// is folded into the categorized variant.
    pub(crate) fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context.contains("HEAD") {
                    AdapterError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    AdapterError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => {
                AdapterError::InvalidSpec {
                    spec: context.to_string(),
                }
            }
            git2::ErrorCode::Exists => AdapterError::AlreadyExists {
                message: format!("{}: {}", context, err.message()),
            },
            git2::ErrorCode::NotFastForward => AdapterError::NonFastForward {
                message: format!("{}: {}", context, err.message()),
            },
            git2::ErrorCode::Auth => AdapterError::Auth {
                message: err.message().to_string(),
            },
            git2::ErrorCode::Certificate => AdapterError::Certificate {
                message: err.message().to_string(),
            },
            // Callback-initiated aborts surface as GIT_EUSER
            git2::ErrorCode::User => AdapterError::Cancelled,
            _ => AdapterError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Map this error onto the host's closed return vocabulary.
    ///
    /// The host understands exactly five codes; nothing else is ever
    /// invented ad hoc.
    pub fn host_code(&self) -> HostCode {
        match self {
            AdapterError::Cancelled => HostCode::Cancelled,
            AdapterError::PathOutsideProject { .. } => HostCode::NotUnderControl,
            AdapterError::Unsupported { .. } => HostCode::Unsupported,
            _ => HostCode::Error,
        }
    }
}

impl From<git2::Error> for AdapterError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => AdapterError::ObjectNotFound {
                oid: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => {
                AdapterError::InvalidSpec {
                    spec: err.message().to_string(),
                }
            }
            git2::ErrorCode::Auth => AdapterError::Auth {
                message: err.message().to_string(),
            },
            git2::ErrorCode::Certificate => AdapterError::Certificate {
                message: err.message().to_string(),
            },
            git2::ErrorCode::User => AdapterError::Cancelled,
            _ => AdapterError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod categorization {
        use super::*;

        #[test]
        fn not_found_on_ref_context_is_ref_not_found() {
            let err = git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Reference,
                "no such ref",
            );
            let mapped = AdapterError::from_git2(err, "refs/heads/main");
            assert!(matches!(mapped, AdapterError::RefNotFound { .. }));
        }

        #[test]
        fn not_found_on_oid_context_is_object_not_found() {
            let err = git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Odb,
                "no such object",
            );
            let mapped = AdapterError::from_git2(err, "abc123");
            assert!(matches!(mapped, AdapterError::ObjectNotFound { .. }));
        }

        #[test]
        fn user_code_is_cancellation() {
            let err = git2::Error::new(
                git2::ErrorCode::User,
                git2::ErrorClass::Callback,
                "aborted",
            );
            let mapped = AdapterError::from_git2(err, "push");
            assert!(matches!(mapped, AdapterError::Cancelled));
        }
    }

    mod host_codes {
        use super::*;

        #[test]
        fn cancellation_is_not_an_error_code() {
            assert_eq!(AdapterError::Cancelled.host_code(), HostCode::Cancelled);
        }

        #[test]
        fn outside_project_is_not_under_control() {
            let err = AdapterError::PathOutsideProject {
                path: r"D:\elsewhere\a.c".to_string(),
            };
            assert_eq!(err.host_code(), HostCode::NotUnderControl);
        }

        #[test]
        fn everything_else_is_nonspecific_error() {
            let err = AdapterError::Internal {
                message: "boom".to_string(),
            };
            assert_eq!(err.host_code(), HostCode::Error);
        }
    }
}
