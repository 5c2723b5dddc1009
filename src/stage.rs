//! stage
//!
//! Staging and commit as one logical transaction.
//!
//! # Design
//!
//! A host checkin batch becomes "stage N files, then create one commit".
//! Per-path staging failures are recorded and do not abort the rest of the
//! batch; only the commit step is all-or-nothing. The staged index state is
//! written to disk before the commit object is created, so a failed commit
//! leaves the stage intact and is recoverable by re-invoking commit without
//! re-staging. This mirrors git's own add-then-commit separation.
//!
//! The index handle is scoped to one host call: it is finalized exactly
//! once, by commit or by drop, and never survives the call that opened it.

use thiserror::Error;

use crate::context::RepositoryContext;
use crate::error::AdapterError;
use crate::host::SignatureResolver;

/// What to do with a path in a staging batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    /// Stage the file's current content (add or update).
    Add,
    /// Stage the file's removal.
    Remove,
}

/// Per-path failures recorded during staging.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("path is outside the project root")]
    OutsideProject,

    #[error("{0}")]
    Git(String),
}

/// The fate of one path in a staging batch.
#[derive(Debug)]
pub struct StageOutcome {
    /// The path as the host supplied it.
    pub path: String,
    /// `Ok` when staged, the recorded failure otherwise.
    pub result: Result<(), StageError>,
}

/// An in-progress stage-then-commit transaction.
///
/// Opened by acquiring the repository's index, mutated path by path,
/// finalized exactly once by [`commit_staged`](Self::commit_staged) or
/// discarded on drop.
pub struct IndexTransaction<'ctx> {
    ctx: &'ctx RepositoryContext,
    index: git2::Index,
}

impl<'ctx> IndexTransaction<'ctx> {
    /// Acquire the repository index and open a transaction.
    pub fn begin(ctx: &'ctx RepositoryContext) -> Result<Self, AdapterError> {
        let index = ctx
            .repo()
            .index()
            .map_err(|e| AdapterError::from_git2(e, "index"))?;
        Ok(Self { ctx, index })
    }

    /// Stage a batch of host paths.
    ///
    /// Each path is staged independently: a failing path is recorded in its
    /// outcome and does not block the remaining paths. The index is written
    /// to disk after the batch so the stage persists even if no commit
    /// follows in this call.
    pub fn stage(
        &mut self,
        paths: &[String],
        action: StageAction,
    ) -> Result<Vec<StageOutcome>, AdapterError> {
        let mut outcomes = Vec::with_capacity(paths.len());

        for path in paths {
            let result = match self.ctx.pair(path) {
                None => Err(StageError::OutsideProject),
                Some(pair) => {
                    let rel = std::path::Path::new(&pair.relative);
                    let staged = match action {
                        StageAction::Add => self.index.add_path(rel),
                        StageAction::Remove => self.index.remove_path(rel),
                    };
                    staged.map_err(|e| StageError::Git(e.message().to_string()))
                }
            };
            outcomes.push(StageOutcome {
                path: path.clone(),
                result,
            });
        }

        self.index
            .write()
            .map_err(|e| AdapterError::from_git2(e, "index write"))?;

        Ok(outcomes)
    }

    /// Create one commit from the staged state and point HEAD at it.
    ///
    /// The message is prettified (comment lines stripped, trailing newline
    /// normalized), falling back to the raw text if prettification fails.
    /// An unresolvable HEAD is not an error: it marks an unborn branch and
    /// the commit gets zero parents. `parent_override` substitutes an
    /// explicit parent for the resolved HEAD (amend-style callers).
    ///
    /// # Errors
    ///
    /// - [`AdapterError::Cancelled`] if the signature prompt was cancelled
    /// - tree/commit write failures, which leave the staged state intact
    ///   for retry
    pub fn commit_staged(
        &mut self,
        message: &str,
        signatures: &dyn SignatureResolver,
        parent_override: Option<git2::Oid>,
    ) -> Result<git2::Oid, AdapterError> {
        let message = git2::message_prettify(message, git2::DEFAULT_COMMENT_CHAR)
            .unwrap_or_else(|_| message.to_string());

        // Unborn HEAD means a zero-parent commit, not a failure.
        let parent = match parent_override {
            Some(oid) => Some(
                self.ctx
                    .repo()
                    .find_commit(oid)
                    .map_err(|e| AdapterError::from_git2(e, &oid.to_string()))?,
            ),
            None => match self.ctx.repo().head() {
                Ok(head) => Some(
                    head.peel_to_commit()
                        .map_err(|e| AdapterError::from_git2(e, "HEAD"))?,
                ),
                Err(e)
                    if e.code() == git2::ErrorCode::UnbornBranch
                        || e.code() == git2::ErrorCode::NotFound =>
                {
                    None
                }
                Err(e) => return Err(AdapterError::from_git2(e, "HEAD")),
            },
        };

        // Persist the stage before creating the commit object so a commit
        // failure is recoverable without re-staging.
        self.index
            .write()
            .map_err(|e| AdapterError::from_git2(e, "index write"))?;
        let tree_id = self
            .index
            .write_tree()
            .map_err(|e| AdapterError::from_git2(e, "index tree"))?;
        let tree = self
            .ctx
            .repo()
            .find_tree(tree_id)
            .map_err(|e| AdapterError::from_git2(e, &tree_id.to_string()))?;

        let signature = self.resolve_signature(signatures)?;

        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = self
            .ctx
            .repo()
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                &message,
                &tree,
                &parents,
            )
            .map_err(|e| AdapterError::from_git2(e, "commit"))?;

        // This commit concludes any in-progress cherry-pick or revert;
        // clear the sequencer state so its message cannot leak into a
        // future unrelated commit.
        if self.ctx.repo().state() != git2::RepositoryState::Clean {
            crate::integrate::finish_sequence(self.ctx)?;
        }

        Ok(oid)
    }

    /// Use the repository's configured identity, or delegate to the
    /// signature resolver when none is configured.
    fn resolve_signature(
        &self,
        signatures: &dyn SignatureResolver,
    ) -> Result<git2::Signature<'static>, AdapterError> {
        if let Ok(sig) = self.ctx.repo().signature() {
            return Ok(sig);
        }
        let (name, email) = signatures.resolve_or_prompt().ok_or(AdapterError::Cancelled)?;
        git2::Signature::now(&name, &email).map_err(|e| AdapterError::from_git2(e, "signature"))
    }
}
