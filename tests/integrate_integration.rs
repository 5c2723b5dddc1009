//! Integration tests for ref integration.
//!
//! These tests use real git repositories created via tempfile and the git
//! CLI to verify fast-forward, merge, cherry-pick, revert and reset
//! against actual repository state.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use sccbridge::context::RepositoryContext;
use sccbridge::error::AdapterError;
use sccbridge::host::SignatureResolver;
use sccbridge::integrate::{self, IntegrationOp, IntegrationResult, ResetMode};
use sccbridge::stage::IndexTransaction;

/// Resolver with a fixed identity, standing in for the host prompt.
struct FixedSignature;

impl SignatureResolver for FixedSignature {
    fn resolve_or_prompt(&self) -> Option<(String, String)> {
        Some(("Test User".to_string(), "test@example.com".to_string()))
    }
}

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository with an initial commit.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);

        std::fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-m", "Initial commit"]);

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn ctx(&self) -> RepositoryContext {
        RepositoryContext::open(self.path()).expect("failed to open test repo")
    }

    /// Create a file and commit it, returning the new commit id.
    fn commit_file(&self, path: &str, content: &str, message: &str) -> git2::Oid {
        std::fs::write(self.dir.path().join(path), content).unwrap();
        run_git(self.path(), &["add", path]);
        run_git(self.path(), &["commit", "-m", message]);
        self.head_oid()
    }

    fn create_branch(&self, name: &str) {
        run_git(self.path(), &["branch", name]);
    }

    fn checkout(&self, name: &str) {
        run_git(self.path(), &["checkout", name]);
    }

    fn head_oid(&self) -> git2::Oid {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(self.path())
            .output()
            .expect("git rev-parse failed");
        git2::Oid::from_str(String::from_utf8(output.stdout).unwrap().trim()).unwrap()
    }

    /// Number of parents of the current HEAD commit.
    fn head_parent_count(&self) -> usize {
        let repo = git2::Repository::open(self.path()).unwrap();
        let count = repo
            .head()
            .unwrap()
            .peel_to_commit()
            .unwrap()
            .parent_count();
        count
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

mod fast_forward {
    use super::*;

    #[test]
    fn moves_ref_and_tree_without_merge_commit() {
        let repo = TestRepo::new();
        let base = repo.head_oid();
        repo.create_branch("feature");
        repo.checkout("feature");
        let tip = repo.commit_file("feature.txt", "feature\n", "Add feature");
        repo.checkout("main");
        assert_eq!(repo.head_oid(), base);

        let ctx = repo.ctx();
        let result = integrate::integrate(
            &ctx,
            IntegrationOp::FastForward {
                branch: "main".to_string(),
                target: tip,
            },
        )
        .unwrap();

        assert!(matches!(result, IntegrationResult::FastForwarded(oid) if oid == tip));
        assert_eq!(repo.head_oid(), tip);
        // A fast-forward never manufactures a merge commit.
        assert_eq!(repo.head_parent_count(), 1);
        assert!(repo.path().join("feature.txt").exists());
    }

    #[test]
    fn merge_of_descendant_delegates_to_fast_forward() {
        let repo = TestRepo::new();
        repo.create_branch("feature");
        repo.checkout("feature");
        let tip = repo.commit_file("feature.txt", "feature\n", "Add feature");
        repo.checkout("main");

        let ctx = repo.ctx();
        let result = integrate::integrate(
            &ctx,
            IntegrationOp::Merge {
                theirs: tip,
                fastforward_only: false,
            },
        )
        .unwrap();

        assert!(matches!(result, IntegrationResult::FastForwarded(oid) if oid == tip));
    }
}

mod merge {
    use super::*;

    /// Two branches editing disjoint files merge cleanly and stay
    /// uncommitted for the caller to conclude.
    #[test]
    fn clean_merge_stops_before_committing() {
        let repo = TestRepo::new();
        repo.create_branch("feature");
        let _ours = repo.commit_file("ours.txt", "ours\n", "Ours");
        repo.checkout("feature");
        let theirs = repo.commit_file("theirs.txt", "theirs\n", "Theirs");
        repo.checkout("main");
        let main_head = repo.head_oid();

        let ctx = repo.ctx();
        let result = integrate::integrate(
            &ctx,
            IntegrationOp::Merge {
                theirs,
                fastforward_only: false,
            },
        )
        .unwrap();

        assert!(matches!(result, IntegrationResult::Merged(_)));
        // Mid-merge: both sides present in the tree, HEAD unmoved.
        assert!(repo.path().join("ours.txt").exists());
        assert!(repo.path().join("theirs.txt").exists());
        assert_eq!(repo.head_oid(), main_head);
    }

    #[test]
    fn conflicting_merge_reports_entries_and_stays_mid_merge() {
        let repo = TestRepo::new();
        repo.commit_file("shared.txt", "base\n", "Base");
        repo.create_branch("feature");
        repo.commit_file("shared.txt", "ours\n", "Ours");
        repo.checkout("feature");
        let theirs = repo.commit_file("shared.txt", "theirs\n", "Theirs");
        repo.checkout("main");

        let ctx = repo.ctx();
        let result = integrate::integrate(
            &ctx,
            IntegrationOp::Merge {
                theirs,
                fastforward_only: false,
            },
        )
        .unwrap();

        let IntegrationResult::MergedWithConflicts(conflicts) = result else {
            panic!("expected conflicts, got {:?}", result);
        };
        assert_eq!(conflicts.len(), 1);
        let entry = &conflicts[0];
        assert_eq!(entry.ours.as_deref(), Some("shared.txt"));
        assert_eq!(entry.theirs.as_deref(), Some("shared.txt"));
        assert!(entry.ancestor.is_some());

        // The conflicted file carries markers for manual resolution.
        let content = std::fs::read_to_string(repo.path().join("shared.txt")).unwrap();
        assert!(content.contains("<<<<<<<"));
        assert!(content.contains(">>>>>>>"));

        // The repository is a valid mid-merge state, not a failure.
        assert!(ctx.repo().index().unwrap().has_conflicts());
    }

    #[test]
    fn fastforward_only_refuses_true_merge() {
        let repo = TestRepo::new();
        repo.create_branch("feature");
        repo.commit_file("ours.txt", "ours\n", "Ours");
        repo.checkout("feature");
        let theirs = repo.commit_file("theirs.txt", "theirs\n", "Theirs");
        repo.checkout("main");

        let ctx = repo.ctx();
        let result = integrate::integrate(
            &ctx,
            IntegrationOp::Merge {
                theirs,
                fastforward_only: true,
            },
        );

        assert!(matches!(result, Err(AdapterError::NonFastForward { .. })));
    }

    #[test]
    fn merging_an_ancestor_is_a_no_op() {
        let repo = TestRepo::new();
        let old = repo.head_oid();
        let head = repo.commit_file("new.txt", "new\n", "New");

        let ctx = repo.ctx();
        let result = integrate::integrate(
            &ctx,
            IntegrationOp::Merge {
                theirs: old,
                fastforward_only: false,
            },
        )
        .unwrap();

        assert!(matches!(result, IntegrationResult::Merged(oid) if oid == head));
        assert_eq!(repo.head_oid(), head);
    }
}

mod sequence {
    use super::*;

    #[test]
    fn cherry_pick_applies_change_and_awaits_commit() {
        let repo = TestRepo::new();
        repo.create_branch("feature");
        repo.checkout("feature");
        let picked = repo.commit_file("picked.txt", "picked\n", "Picked change");
        repo.checkout("main");
        let main_head = repo.head_oid();
        assert!(!repo.path().join("picked.txt").exists());

        let ctx = repo.ctx();
        let result =
            integrate::integrate(&ctx, IntegrationOp::CherryPick { commit: picked }).unwrap();

        assert!(matches!(result, IntegrationResult::CherryPicked(oid) if oid == picked));
        assert!(repo.path().join("picked.txt").exists());
        assert_eq!(repo.head_oid(), main_head);

        integrate::finish_sequence(&ctx).unwrap();
        assert_ne!(ctx.repo().state(), git2::RepositoryState::CherryPick);
    }

    #[test]
    fn revert_reverse_applies_a_commit() {
        let repo = TestRepo::new();
        let bad = repo.commit_file("bad.txt", "bad\n", "Bad change");
        assert!(repo.path().join("bad.txt").exists());

        let ctx = repo.ctx();
        let result = integrate::integrate(&ctx, IntegrationOp::Revert { commit: bad }).unwrap();

        assert!(matches!(result, IntegrationResult::Reverted(oid) if oid == bad));
        assert!(!repo.path().join("bad.txt").exists());

        integrate::finish_sequence(&ctx).unwrap();
    }

    /// The follow-up commit itself must conclude the sequence: after
    /// committing a revert the repository is back in a clean state and the
    /// sequencer message cannot leak into a later unrelated commit.
    #[test]
    fn follow_up_commit_clears_sequencer_state() {
        let repo = TestRepo::new();
        let bad = repo.commit_file("bad.txt", "bad\n", "Bad change");

        let ctx = repo.ctx();
        integrate::integrate(&ctx, IntegrationOp::Revert { commit: bad }).unwrap();
        assert_eq!(ctx.repo().state(), git2::RepositoryState::Revert);

        // The revert already staged its changes; commit them directly.
        let mut txn = IndexTransaction::begin(&ctx).unwrap();
        let oid = txn
            .commit_staged("Undo bad change", &FixedSignature, None)
            .unwrap();
        drop(txn);

        assert_eq!(ctx.repo().state(), git2::RepositoryState::Clean);
        let commit = ctx.repo().find_commit(oid).unwrap();
        assert_eq!(commit.message().unwrap().trim_end(), "Undo bad change");
        assert!(!repo.path().join("bad.txt").exists());
    }

    #[test]
    fn committed_cherry_pick_leaves_a_clean_state() {
        let repo = TestRepo::new();
        repo.create_branch("feature");
        repo.checkout("feature");
        let picked = repo.commit_file("picked.txt", "picked\n", "Picked change");
        repo.checkout("main");

        let ctx = repo.ctx();
        integrate::integrate(&ctx, IntegrationOp::CherryPick { commit: picked }).unwrap();
        assert_eq!(ctx.repo().state(), git2::RepositoryState::CherryPick);

        let mut txn = IndexTransaction::begin(&ctx).unwrap();
        txn.commit_staged("Picked change", &FixedSignature, None)
            .unwrap();
        drop(txn);

        assert_eq!(ctx.repo().state(), git2::RepositoryState::Clean);
    }
}

mod reset {
    use super::*;

    #[test]
    fn hard_reset_restores_tree_and_discards_local_edits() {
        let repo = TestRepo::new();
        let old = repo.head_oid();
        repo.commit_file("later.txt", "later\n", "Later");
        std::fs::write(repo.path().join("README.md"), "dirty\n").unwrap();

        let ctx = repo.ctx();
        let result = integrate::integrate(
            &ctx,
            IntegrationOp::Reset {
                target: old,
                mode: ResetMode::Hard,
            },
        )
        .unwrap();

        assert!(matches!(result, IntegrationResult::ResetTo(oid, ResetMode::Hard) if oid == old));
        assert_eq!(repo.head_oid(), old);
        assert!(!repo.path().join("later.txt").exists());
        let readme = std::fs::read_to_string(repo.path().join("README.md")).unwrap();
        assert_eq!(readme, "# Test Repo\n");
    }

    #[test]
    fn soft_reset_moves_head_but_leaves_the_tree() {
        let repo = TestRepo::new();
        let old = repo.head_oid();
        repo.commit_file("later.txt", "later\n", "Later");

        let ctx = repo.ctx();
        let result = integrate::integrate(
            &ctx,
            IntegrationOp::Reset {
                target: old,
                mode: ResetMode::Soft,
            },
        )
        .unwrap();

        assert!(matches!(result, IntegrationResult::ResetTo(_, ResetMode::Soft)));
        assert_eq!(repo.head_oid(), old);
        // The working tree keeps the newer content.
        assert!(repo.path().join("later.txt").exists());
    }
}
