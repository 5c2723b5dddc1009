//! status
//!
//! Stateless derivation of host status flags from live Git status.
//!
//! # Design
//!
//! The host polls. Every query runs a fresh status pass against the
//! repository and folds the raw flag bitset into the host's closed
//! vocabulary; nothing is cached between calls, so the derived status is a
//! pure function of repository state.
//!
//! # Mapping
//!
//! - `WT_NEW` (absent from the index) → not controlled
//! - `IGNORED` → not controlled
//! - any of `WT_MODIFIED`, `WT_TYPECHANGE`, `INDEX_MODIFIED`,
//!   `INDEX_TYPECHANGE` → adds checked-out
//! - `CONFLICTED` → adds merged
//! - `WT_DELETED` or `INDEX_DELETED` → adds deleted
//! - per-path lookup error → not controlled when "not found", invalid
//!   otherwise (with the message carried to the host's error channel)
//!
//! No host states beyond these are ever inferred.

use crate::context::RepositoryContext;
use crate::core::types::HostStatus;
use crate::error::AdapterError;

/// Whether a query names specific files or enumerates a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Report exactly the requested paths.
    File,
    /// Enumerate everything under the requested paths, including
    /// unmodified and unreadable entries.
    Directory,
}

/// The host batch command a populate pass feeds.
///
/// Decides which files "belong" in the returned enumeration: an add batch
/// wants files not yet controlled, every other command wants controlled
/// files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Checkout,
    Checkin,
    Add,
    Remove,
    Diff,
    History,
}

impl HostCommand {
    /// Whether `status` belongs in this command's enumeration.
    fn admits(&self, status: &HostStatus) -> bool {
        match self {
            HostCommand::Add => status.is_not_controlled(),
            _ => status.controlled || status.invalid,
        }
    }
}

/// One answered path in a status batch.
#[derive(Debug, Clone)]
pub struct StatusEntry {
    /// The path as the host supplied it.
    pub path: String,
    /// The derived host status.
    pub status: HostStatus,
    /// Error text for the host's error channel when `status` is invalid.
    pub error: Option<String>,
}

/// One row of a populate enumeration.
#[derive(Debug, Clone)]
pub struct PopulateEntry {
    /// Absolute host path.
    pub path: String,
    /// Whether the file is under source control.
    pub is_controlled: bool,
    /// The derived host status.
    pub status: HostStatus,
}

/// Fold a raw status bitset into the host vocabulary.
///
/// Deterministic and order-independent over the flags; this is the single
/// authoritative mapping table.
pub fn map_flags(s: git2::Status) -> HostStatus {
    if s.is_wt_new() || s.is_ignored() {
        return HostStatus::not_controlled();
    }

    let mut status = HostStatus::controlled();
    if s.is_wt_modified() || s.is_wt_typechange() || s.is_index_modified() || s.is_index_typechange()
    {
        status = status.with_checked_out();
    }
    if s.is_conflicted() {
        status = status.with_merged();
    }
    if s.is_wt_deleted() || s.is_index_deleted() {
        status = status.with_deleted();
    }
    status
}

/// Derive host status for a batch of paths.
///
/// File scope answers exactly the requested paths; directory scope folds
/// each path's whole subtree into one entry per enumerated file. Paths
/// outside the project are answered as not controlled rather than failing
/// the batch.
pub fn status_of(
    ctx: &RepositoryContext,
    paths: &[String],
    scope: Scope,
) -> Result<Vec<StatusEntry>, AdapterError> {
    match scope {
        Scope::File => Ok(paths.iter().map(|p| file_status(ctx, p)).collect()),
        Scope::Directory => {
            let mut entries = Vec::new();
            for path in paths {
                entries.extend(directory_status(ctx, path)?);
            }
            Ok(entries)
        }
    }
}

/// Status of one specific file.
fn file_status(ctx: &RepositoryContext, path: &str) -> StatusEntry {
    let Some(rel) = ctx.relative(path) else {
        return StatusEntry {
            path: path.to_string(),
            status: HostStatus::not_controlled(),
            error: None,
        };
    };

    match ctx.repo().status_file(std::path::Path::new(&rel)) {
        Ok(flags) => StatusEntry {
            path: path.to_string(),
            status: map_flags(flags),
            error: None,
        },
        Err(e) if e.code() == git2::ErrorCode::NotFound => StatusEntry {
            path: path.to_string(),
            status: HostStatus::not_controlled(),
            error: None,
        },
        Err(e) => StatusEntry {
            path: path.to_string(),
            status: HostStatus::invalid(),
            error: Some(e.message().to_string()),
        },
    }
}

/// Enumerate a directory subtree, one entry per file.
///
/// Unlike file scope this includes unmodified and unreadable entries: the
/// host needs the full enumeration to decide what belongs to the project,
/// notably during initial import.
fn directory_status(
    ctx: &RepositoryContext,
    path: &str,
) -> Result<Vec<StatusEntry>, AdapterError> {
    let rel = ctx.relative(path);
    if rel.is_none() && !same_as_workdir(ctx, path) {
        return Ok(Vec::new());
    }

    let mut opts = git2::StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_unmodified(true)
        .include_unreadable(true)
        .include_ignored(false);
    if let Some(rel) = &rel {
        opts.pathspec(rel.as_str());
    }

    let statuses = ctx
        .repo()
        .statuses(Some(&mut opts))
        .map_err(|e| AdapterError::from_git2(e, "status"))?;

    let mut entries = Vec::new();
    for entry in statuses.iter() {
        let Some(entry_path) = entry.path() else {
            continue; // non-UTF8 paths cannot round-trip to the host
        };
        entries.push(StatusEntry {
            path: ctx.absolute(entry_path),
            status: map_flags(entry.status()),
            error: None,
        });
    }
    Ok(entries)
}

/// Whether `path` names the working-tree root itself.
fn same_as_workdir(ctx: &RepositoryContext, path: &str) -> bool {
    use crate::core::paths::normalize_separators;
    let root = normalize_separators(&ctx.workdir_root().to_string_lossy());
    let p = normalize_separators(path);
    root.trim_end_matches('/') == p.trim_end_matches('/')
}

/// Enumerate the files a host batch command applies to.
///
/// Directories among `paths` are expanded to their subtree; plain files are
/// answered individually. Entries not admitted by `command` are dropped.
pub fn populate(
    ctx: &RepositoryContext,
    paths: &[String],
    command: HostCommand,
) -> Result<Vec<PopulateEntry>, AdapterError> {
    let mut out = Vec::new();

    for path in paths {
        let is_dir = std::path::Path::new(&crate::core::paths::normalize_separators(path)).is_dir();
        let scope = if is_dir { Scope::Directory } else { Scope::File };
        for entry in status_of(ctx, std::slice::from_ref(path), scope)? {
            if command.admits(&entry.status) {
                out.push(PopulateEntry {
                    path: entry.path,
                    is_controlled: entry.status.controlled,
                    status: entry.status,
                });
            }
        }
    }

    Ok(out)
}
