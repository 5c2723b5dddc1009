//! history
//!
//! Per-file history and quick-diff queries for the host's `history` and
//! `diff` batch commands.

use chrono::{DateTime, Utc};

use crate::context::RepositoryContext;
use crate::error::AdapterError;

/// One commit touching a file.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Commit id.
    pub oid: git2::Oid,
    /// First line of the commit message.
    pub summary: String,
    /// Author name.
    pub author_name: String,
    /// Author email.
    pub author_email: String,
    /// Author timestamp.
    pub author_time: DateTime<Utc>,
}

/// List the commits that changed one file, newest first.
///
/// Walks history from HEAD and keeps commits whose tree entry for the file
/// differs from their first parent's (or that introduce the file). An
/// unborn HEAD yields an empty history, not an error.
pub fn file_log(
    ctx: &RepositoryContext,
    absolute: &str,
    limit: usize,
) -> Result<Vec<HistoryEntry>, AdapterError> {
    let rel = ctx
        .relative(absolute)
        .ok_or_else(|| AdapterError::PathOutsideProject {
            path: absolute.to_string(),
        })?;
    let rel = std::path::PathBuf::from(rel);
    let repo = ctx.repo();

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| AdapterError::from_git2(e, "revwalk"))?;
    match revwalk.push_head() {
        Ok(()) => {}
        // Unborn HEAD: nothing committed yet.
        Err(e)
            if e.code() == git2::ErrorCode::UnbornBranch
                || e.code() == git2::ErrorCode::NotFound =>
        {
            return Ok(Vec::new())
        }
        Err(e) => return Err(AdapterError::from_git2(e, "HEAD")),
    }
    revwalk
        .set_sorting(git2::Sort::TIME)
        .map_err(|e| AdapterError::from_git2(e, "revwalk"))?;

    let mut entries = Vec::new();
    for oid in revwalk {
        if entries.len() >= limit {
            break;
        }
        let oid = oid.map_err(|e| AdapterError::from_git2(e, "revwalk"))?;
        let commit = repo
            .find_commit(oid)
            .map_err(|e| AdapterError::from_git2(e, &oid.to_string()))?;

        if !commit_touches(&commit, &rel)? {
            continue;
        }

        let author = commit.author();
        entries.push(HistoryEntry {
            oid,
            summary: commit.summary().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            author_time: DateTime::from_timestamp(author.when().seconds(), 0)
                .unwrap_or(DateTime::UNIX_EPOCH)
                .with_timezone(&Utc),
        });
    }

    Ok(entries)
}

/// Whether `commit` changed the file at `rel` relative to its first parent.
fn commit_touches(commit: &git2::Commit, rel: &std::path::Path) -> Result<bool, AdapterError> {
    let tree = commit
        .tree()
        .map_err(|e| AdapterError::from_git2(e, "tree"))?;
    let entry = tree.get_path(rel).ok().map(|e| e.id());

    match commit.parent(0) {
        Ok(parent) => {
            let parent_tree = parent
                .tree()
                .map_err(|e| AdapterError::from_git2(e, "tree"))?;
            let parent_entry = parent_tree.get_path(rel).ok().map(|e| e.id());
            Ok(entry != parent_entry)
        }
        // Root commit: the file was touched iff it exists here.
        Err(_) => Ok(entry.is_some()),
    }
}

/// Unified diff of one file's index and working-tree state against HEAD.
///
/// An unborn HEAD diffs against the empty tree, so freshly added files
/// still produce a patch.
pub fn diff_to_head(ctx: &RepositoryContext, absolute: &str) -> Result<String, AdapterError> {
    let rel = ctx
        .relative(absolute)
        .ok_or_else(|| AdapterError::PathOutsideProject {
            path: absolute.to_string(),
        })?;
    let repo = ctx.repo();

    let mut opts = git2::DiffOptions::new();
    opts.pathspec(rel.as_str());
    opts.include_untracked(true);

    let head_tree = repo.head().ok().and_then(|h| h.peel_to_tree().ok());

    let diff = repo
        .diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))
        .map_err(|e| AdapterError::from_git2(e, "diff"))?;

    let mut buf = Vec::new();
    diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
        match line.origin() {
            '+' | '-' | ' ' => buf.push(line.origin() as u8),
            _ => {}
        }
        buf.extend_from_slice(line.content());
        true
    })
    .map_err(|e| AdapterError::from_git2(e, "diff"))?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
