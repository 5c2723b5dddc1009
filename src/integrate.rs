//! integrate
//!
//! Ref integration: fast-forward, three-way merge, cherry-pick, revert and
//! reset as variants of one state machine.
//!
//! # Design
//!
//! All variants share checkout-strategy and conflict-reporting logic. The
//! selection input is an [`IntegrationOp`]; the terminal states are the
//! arms of [`IntegrationResult`]. Conflicts are a *valid* terminal state
//! that the caller must explicitly continue or abandon, never a failure;
//! repository-library errors are terminal failures and are not retried.
//!
//! Merge never auto-commits. Cherry-pick and revert leave their changes in
//! the index and working tree for a follow-up commit through the staging
//! transaction; [`finish_sequence`] clears any sequencer state afterwards
//! so no merge-message leaks into a future unrelated commit.

use crate::context::RepositoryContext;
use crate::error::AdapterError;

/// How a reset moves HEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Move HEAD and force the working tree and index to match.
    Hard,
    /// Move HEAD only; index and working tree are left untouched.
    Soft,
}

/// One unresolved conflict, as a triple of index-entry paths.
///
/// An absent ancestor means the conflict has no common ancestor (the
/// added-by-both case).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictEntry {
    /// Common-ancestor side, if any.
    pub ancestor: Option<String>,
    /// Our side of the conflict.
    pub ours: Option<String>,
    /// Their side of the conflict.
    pub theirs: Option<String>,
}

/// Terminal states of an integration.
///
/// Failures travel as `Err(AdapterError)` on the operation itself; every
/// arm here is a successfully reached terminal state, including
/// `MergedWithConflicts`.
#[derive(Debug)]
pub enum IntegrationResult {
    /// The branch ref was moved to a descendant commit.
    FastForwarded(git2::Oid),
    /// A merge completed without conflicts; mid-merge state awaits an
    /// explicit commit by the caller.
    Merged(git2::Oid),
    /// The merge stopped on conflicts; the repository stays mid-merge
    /// until the caller resolves and commits, or aborts.
    MergedWithConflicts(Vec<ConflictEntry>),
    /// A commit's changes were applied and await a follow-up commit.
    CherryPicked(git2::Oid),
    /// A commit's changes were reverse-applied and await a follow-up
    /// commit.
    Reverted(git2::Oid),
    /// HEAD was moved to the target.
    ResetTo(git2::Oid, ResetMode),
}

/// Operation selection for [`integrate`].
#[derive(Debug, Clone)]
pub enum IntegrationOp {
    /// Move `branch` to descendant `target`, creating it if HEAD is unborn.
    FastForward {
        branch: String,
        target: git2::Oid,
    },
    /// Three-way merge of `theirs` into HEAD.
    Merge {
        theirs: git2::Oid,
        /// Fail instead of merging when a true merge would be required.
        fastforward_only: bool,
    },
    /// Apply one commit's changes onto HEAD.
    CherryPick { commit: git2::Oid },
    /// Reverse-apply one commit's changes onto HEAD.
    Revert { commit: git2::Oid },
    /// Move HEAD to `target`.
    Reset {
        target: git2::Oid,
        mode: ResetMode,
    },
}

/// Run one integration to its terminal state.
pub fn integrate(
    ctx: &RepositoryContext,
    op: IntegrationOp,
) -> Result<IntegrationResult, AdapterError> {
    match op {
        IntegrationOp::FastForward { branch, target } => fast_forward(ctx, &branch, target),
        IntegrationOp::Merge {
            theirs,
            fastforward_only,
        } => merge(ctx, theirs, fastforward_only),
        IntegrationOp::CherryPick { commit } => cherry_pick(ctx, commit),
        IntegrationOp::Revert { commit } => revert(ctx, commit),
        IntegrationOp::Reset { target, mode } => reset(ctx, target, mode),
    }
}

/// Checkout options that refuse to clobber local changes.
fn safe_checkout() -> git2::build::CheckoutBuilder<'static> {
    let mut opts = git2::build::CheckoutBuilder::new();
    opts.safe();
    opts
}

/// Checkout options that force diff3-style conflict markers into the tree.
fn conflict_checkout() -> git2::build::CheckoutBuilder<'static> {
    let mut opts = git2::build::CheckoutBuilder::new();
    opts.force().allow_conflicts(true).conflict_style_diff3(true);
    opts
}

/// Move (or create) a branch ref at a descendant commit.
///
/// The checkout happens strictly before the reference update, so a
/// checkout failure never leaves the ref pointing somewhere the working
/// tree does not reflect. If HEAD is unborn the branch is created directly
/// at the target.
pub fn fast_forward(
    ctx: &RepositoryContext,
    branch: &str,
    target: git2::Oid,
) -> Result<IntegrationResult, AdapterError> {
    let repo = ctx.repo();
    let refname = format!("refs/heads/{}", branch);

    let target_object = repo
        .find_object(target, None)
        .map_err(|e| AdapterError::from_git2(e, &target.to_string()))?;

    repo.checkout_tree(&target_object, Some(&mut safe_checkout()))
        .map_err(|e| AdapterError::from_git2(e, "checkout"))?;

    match repo.find_reference(&refname) {
        Ok(mut reference) => {
            reference
                .set_target(target, "fast-forward")
                .map_err(|e| AdapterError::from_git2(e, &refname))?;
        }
        Err(e) if e.code() == git2::ErrorCode::NotFound => {
            // Unborn branch: fabricate the ref directly at the target.
            repo.reference(&refname, target, true, "fast-forward (create)")
                .map_err(|e| AdapterError::from_git2(e, &refname))?;
        }
        Err(e) => return Err(AdapterError::from_git2(e, &refname)),
    }

    repo.set_head(&refname)
        .map_err(|e| AdapterError::from_git2(e, &refname))?;

    Ok(IntegrationResult::FastForwarded(target))
}

/// Three-way merge of `theirs` into HEAD.
///
/// Runs merge analysis first: an up-to-date target is a no-op, a
/// fast-forwardable target is delegated to [`fast_forward`], and a true
/// merge with `fastforward_only` set is a failure rather than a silent
/// downgrade. On success the merge is left uncommitted for the caller.
pub fn merge(
    ctx: &RepositoryContext,
    theirs: git2::Oid,
    fastforward_only: bool,
) -> Result<IntegrationResult, AdapterError> {
    let repo = ctx.repo();
    let annotated = repo
        .find_annotated_commit(theirs)
        .map_err(|e| AdapterError::from_git2(e, &theirs.to_string()))?;

    let (analysis, _preference) = repo
        .merge_analysis(&[&annotated])
        .map_err(|e| AdapterError::from_git2(e, "merge analysis"))?;

    if analysis.is_up_to_date() {
        let head = repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| AdapterError::from_git2(e, "HEAD"))?;
        return Ok(IntegrationResult::Merged(head.id()));
    }

    if analysis.is_fast_forward() || analysis.is_unborn() {
        let branch = current_branch_name(ctx)?;
        return fast_forward(ctx, &branch, theirs);
    }

    if fastforward_only {
        return Err(AdapterError::NonFastForward {
            message: "a true merge is required but fast-forward-only was requested".to_string(),
        });
    }

    let mut merge_opts = git2::MergeOptions::new();
    merge_opts.diff3_style(true);

    repo.merge(
        &[&annotated],
        Some(&mut merge_opts),
        Some(&mut conflict_checkout()),
    )
    .map_err(|e| AdapterError::from_git2(e, "merge"))?;

    let conflicts = collect_conflicts(ctx)?;
    if conflicts.is_empty() {
        Ok(IntegrationResult::Merged(theirs))
    } else {
        Ok(IntegrationResult::MergedWithConflicts(conflicts))
    }
}

/// Apply one commit's changes against HEAD into the index and worktree.
///
/// The follow-up commit is the caller's job (through the staging
/// transaction); [`finish_sequence`] must run once it completes or is
/// abandoned.
pub fn cherry_pick(
    ctx: &RepositoryContext,
    commit: git2::Oid,
) -> Result<IntegrationResult, AdapterError> {
    let repo = ctx.repo();
    let commit_obj = repo
        .find_commit(commit)
        .map_err(|e| AdapterError::from_git2(e, &commit.to_string()))?;

    let mut opts = git2::CherrypickOptions::new();
    opts.checkout_builder(conflict_checkout());

    repo.cherrypick(&commit_obj, Some(&mut opts))
        .map_err(|e| AdapterError::from_git2(e, "cherry-pick"))?;

    let conflicts = collect_conflicts(ctx)?;
    if conflicts.is_empty() {
        Ok(IntegrationResult::CherryPicked(commit))
    } else {
        Ok(IntegrationResult::MergedWithConflicts(conflicts))
    }
}

/// Reverse-apply one commit's changes against HEAD.
pub fn revert(
    ctx: &RepositoryContext,
    commit: git2::Oid,
) -> Result<IntegrationResult, AdapterError> {
    let repo = ctx.repo();
    let commit_obj = repo
        .find_commit(commit)
        .map_err(|e| AdapterError::from_git2(e, &commit.to_string()))?;

    let mut opts = git2::RevertOptions::new();
    opts.checkout_builder(conflict_checkout());

    repo.revert(&commit_obj, Some(&mut opts))
        .map_err(|e| AdapterError::from_git2(e, "revert"))?;

    let conflicts = collect_conflicts(ctx)?;
    if conflicts.is_empty() {
        Ok(IntegrationResult::Reverted(commit))
    } else {
        Ok(IntegrationResult::MergedWithConflicts(conflicts))
    }
}

/// Clear sequencer state after a cherry-pick or revert concludes.
///
/// The staging transaction runs this automatically when its commit
/// finishes a sequence; call it directly when the sequence is abandoned
/// without a commit, so no leftover merge message leaks into a future
/// unrelated commit.
pub fn finish_sequence(ctx: &RepositoryContext) -> Result<(), AdapterError> {
    ctx.repo()
        .cleanup_state()
        .map_err(|e| AdapterError::from_git2(e, "state cleanup"))
}

/// Move HEAD to `target`.
///
/// Hard resets force the working tree and index to the target; soft resets
/// move HEAD only and perform no checkout at all.
pub fn reset(
    ctx: &RepositoryContext,
    target: git2::Oid,
    mode: ResetMode,
) -> Result<IntegrationResult, AdapterError> {
    let repo = ctx.repo();
    let object = repo
        .find_object(target, None)
        .map_err(|e| AdapterError::from_git2(e, &target.to_string()))?;

    match mode {
        ResetMode::Hard => {
            let mut checkout = git2::build::CheckoutBuilder::new();
            checkout.force();
            repo.reset(&object, git2::ResetType::Hard, Some(&mut checkout))
                .map_err(|e| AdapterError::from_git2(e, "reset"))?;
        }
        ResetMode::Soft => {
            repo.reset(&object, git2::ResetType::Soft, None)
                .map_err(|e| AdapterError::from_git2(e, "reset"))?;
        }
    }

    Ok(IntegrationResult::ResetTo(target, mode))
}

/// Collect the index's conflict entries as path triples.
pub fn collect_conflicts(
    ctx: &RepositoryContext,
) -> Result<Vec<ConflictEntry>, AdapterError> {
    let index = ctx
        .repo()
        .index()
        .map_err(|e| AdapterError::from_git2(e, "index"))?;

    if !index.has_conflicts() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    let conflicts = index
        .conflicts()
        .map_err(|e| AdapterError::from_git2(e, "conflicts"))?;
    for conflict in conflicts {
        let conflict = conflict.map_err(|e| AdapterError::from_git2(e, "conflicts"))?;
        entries.push(ConflictEntry {
            ancestor: conflict.ancestor.as_ref().map(entry_path),
            ours: conflict.our.as_ref().map(entry_path),
            theirs: conflict.their.as_ref().map(entry_path),
        });
    }
    Ok(entries)
}

fn entry_path(entry: &git2::IndexEntry) -> String {
    String::from_utf8_lossy(&entry.path).into_owned()
}

/// The branch HEAD points at, or "master"-equivalent fallback for an
/// unborn symbolic HEAD.
fn current_branch_name(ctx: &RepositoryContext) -> Result<String, AdapterError> {
    let repo = ctx.repo();
    match repo.head() {
        Ok(head) => head
            .shorthand()
            .map(str::to_string)
            .ok_or_else(|| AdapterError::Internal {
                message: "HEAD is not a named branch".to_string(),
            }),
        Err(e)
            if e.code() == git2::ErrorCode::UnbornBranch
                || e.code() == git2::ErrorCode::NotFound =>
        {
            // Unborn HEAD still names its intended branch symbolically.
            let reference = repo
                .find_reference("HEAD")
                .map_err(|err| AdapterError::from_git2(err, "HEAD"))?;
            let target = reference
                .symbolic_target()
                .ok_or_else(|| AdapterError::Internal {
                    message: "unborn HEAD has no symbolic target".to_string(),
                })?;
            Ok(target.trim_start_matches("refs/heads/").to_string())
        }
        Err(e) => Err(AdapterError::from_git2(e, "HEAD")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_entry_without_ancestor_is_added_by_both() {
        let entry = ConflictEntry {
            ancestor: None,
            ours: Some("a.txt".to_string()),
            theirs: Some("a.txt".to_string()),
        };
        assert!(entry.ancestor.is_none());
        assert_eq!(entry.ours, entry.theirs);
    }

    #[test]
    fn reset_modes_are_distinct() {
        assert_ne!(ResetMode::Hard, ResetMode::Soft);
    }
}
