//! remote::controller
//!
//! One-call remote sessions: push, pull and clone.
//!
//! # Design
//!
//! A [`RemoteSession`] borrows the host collaborators for the duration of
//! exactly one operation and is destroyed at the end of the call; nothing
//! is cached across calls, including accepted certificates.
//!
//! Cancellation is cooperative: the cancellation flag is polled at the
//! transfer-progress, sideband and push-negotiation checkpoints, and an
//! abort there surfaces the distinguished `GIT_EUSER` sentinel, which the
//! session maps to [`RemoteOutcome::Cancelled`] - a non-error, non-success
//! result distinct from a hard failure. Pushes are aborted during
//! negotiation, before any ref update reaches the remote.

use std::path::Path;

use crate::context::RepositoryContext;
use crate::error::AdapterError;
use crate::host::{
    CertificateDecision, CertificatePrompt, CredentialPrompt, ProgressLine, ProgressSink,
};
use crate::integrate::{self, IntegrationResult};
use crate::remote::credentials;

/// What a pull should do after fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStrategy {
    /// Fetch only; leave the working tree alone.
    FetchOnly,
    /// Fetch, then integrate the fetched tip into HEAD.
    FetchAndMergeToHead,
}

/// Terminal state of a remote operation.
#[derive(Debug)]
pub enum RemoteOutcome {
    /// The transfer ran to completion.
    Completed,
    /// The transfer completed and the fetched tip was integrated.
    Integrated(IntegrationResult),
    /// The user cancelled mid-transfer. Not an error.
    Cancelled,
}

/// Host collaborators scoped to one remote call.
pub struct RemoteSession<'call> {
    progress: &'call dyn ProgressSink,
    credentials: Option<&'call dyn CredentialPrompt>,
    certificates: Option<&'call dyn CertificatePrompt>,
}

impl<'call> RemoteSession<'call> {
    /// Bind the collaborators for one operation.
    pub fn new(
        progress: &'call dyn ProgressSink,
        credentials: Option<&'call dyn CredentialPrompt>,
        certificates: Option<&'call dyn CertificatePrompt>,
    ) -> Self {
        Self {
            progress,
            credentials,
            certificates,
        }
    }

    /// Wire the session's collaborators into library callbacks.
    fn callbacks(&self) -> git2::RemoteCallbacks<'call> {
        let mut callbacks = git2::RemoteCallbacks::new();

        let credential_prompt = self.credentials;
        callbacks.credentials(move |url, username_from_url, allowed| {
            credentials::acquire(url, username_from_url, allowed, credential_prompt)
        });

        let certificate_prompt = self.certificates;
        callbacks.certificate_check(move |_cert, host| {
            // Without a prompt the library's own validation stands; with
            // one, the user decision is final for this connection only.
            match certificate_prompt {
                None => Ok(git2::CertificateCheckStatus::CertificatePassthrough),
                Some(prompt) => match prompt.prompt_certificate(host) {
                    CertificateDecision::Accepted => {
                        Ok(git2::CertificateCheckStatus::CertificateOk)
                    }
                    CertificateDecision::Rejected => Err(git2::Error::new(
                        git2::ErrorCode::Certificate,
                        git2::ErrorClass::Callback,
                        "certificate rejected by user",
                    )),
                },
            }
        });

        let sink = self.progress;
        callbacks.transfer_progress(move |stats| {
            sink.set_line(ProgressLine::Status, "receiving objects");
            sink.set_progress(stats.received_objects(), stats.total_objects());
            !sink.is_cancelled()
        });

        let sink = self.progress;
        callbacks.sideband_progress(move |data| {
            if let Ok(text) = std::str::from_utf8(data) {
                sink.set_line(ProgressLine::Detail, text.trim_end());
            }
            !sink.is_cancelled()
        });

        let sink = self.progress;
        callbacks.push_transfer_progress(move |current, total, _bytes| {
            sink.set_line(ProgressLine::Status, "writing objects");
            sink.set_progress(current, total);
        });

        // The push byte counter above cannot abort; negotiation is the last
        // checkpoint before any ref update reaches the remote.
        let sink = self.progress;
        callbacks.push_negotiation(move |_updates| {
            if sink.is_cancelled() {
                Err(git2::Error::new(
                    git2::ErrorCode::User,
                    git2::ErrorClass::Callback,
                    "push cancelled",
                ))
            } else {
                Ok(())
            }
        });

        callbacks
    }

    /// Push one branch to a remote.
    ///
    /// The refspec pushes `refs/heads/<branch>` to its same-named remote
    /// ref. Cancellation before the library confirms completion leaves the
    /// remote ref untouched.
    pub fn push(
        &self,
        ctx: &RepositoryContext,
        remote_name: &str,
        branch: &str,
    ) -> Result<RemoteOutcome, AdapterError> {
        self.progress.set_title("push");
        let mut remote = ctx
            .repo()
            .find_remote(remote_name)
            .map_err(|e| AdapterError::from_git2(e, remote_name))?;

        let mut options = git2::PushOptions::new();
        options.remote_callbacks(self.callbacks());

        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        match remote.push(&[refspec.as_str()], Some(&mut options)) {
            Ok(()) => Ok(RemoteOutcome::Completed),
            Err(e) if e.code() == git2::ErrorCode::User => Ok(RemoteOutcome::Cancelled),
            Err(e) => Err(AdapterError::from_git2(e, "push")),
        }
    }

    /// Fetch from a remote, optionally integrating the fetched tip.
    ///
    /// With [`PullStrategy::FetchAndMergeToHead`] the fetched tip from
    /// `FETCH_HEAD` is handed to the integration engine, which decides
    /// between fast-forward and true merge; `fastforward_only` makes a
    /// required true merge a failure instead of a downgrade.
    pub fn pull(
        &self,
        ctx: &RepositoryContext,
        remote_name: &str,
        strategy: PullStrategy,
        fastforward_only: bool,
    ) -> Result<RemoteOutcome, AdapterError> {
        self.progress.set_title("pull");
        let mut remote = ctx
            .repo()
            .find_remote(remote_name)
            .map_err(|e| AdapterError::from_git2(e, remote_name))?;

        let mut options = git2::FetchOptions::new();
        options.remote_callbacks(self.callbacks());

        let refspecs: [&str; 0] = [];
        match remote.fetch(&refspecs, Some(&mut options), None) {
            Ok(()) => {}
            Err(e) if e.code() == git2::ErrorCode::User => return Ok(RemoteOutcome::Cancelled),
            Err(e) => return Err(AdapterError::from_git2(e, "fetch")),
        }

        match strategy {
            PullStrategy::FetchOnly => Ok(RemoteOutcome::Completed),
            PullStrategy::FetchAndMergeToHead => {
                let fetch_head = ctx
                    .repo()
                    .find_reference("FETCH_HEAD")
                    .map_err(|e| AdapterError::from_git2(e, "FETCH_HEAD"))?;
                let theirs = fetch_head
                    .peel_to_commit()
                    .map_err(|e| AdapterError::from_git2(e, "FETCH_HEAD"))?
                    .id();

                let result = integrate::merge(ctx, theirs, fastforward_only)?;
                Ok(RemoteOutcome::Integrated(result))
            }
        }
    }

    /// Clone a repository into `destination`.
    ///
    /// `branch` selects the initial checkout; the remote's default branch
    /// is used when absent.
    pub fn clone(
        &self,
        url: &str,
        destination: &Path,
        branch: Option<&str>,
    ) -> Result<RemoteOutcome, AdapterError> {
        self.progress.set_title("clone");
        self.progress.set_line(ProgressLine::Detail, url);

        let mut options = git2::FetchOptions::new();
        options.remote_callbacks(self.callbacks());

        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(options);
        if let Some(branch) = branch {
            builder.branch(branch);
        }

        match builder.clone(url, destination) {
            Ok(_repo) => Ok(RemoteOutcome::Completed),
            Err(e) if e.code() == git2::ErrorCode::User => Ok(RemoteOutcome::Cancelled),
            Err(e) => Err(AdapterError::from_git2(e, "clone")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SilentProgress;
    use std::cell::Cell;

    /// Sink that flips to cancelled after a number of ticks.
    struct CancelAfter {
        remaining: Cell<i32>,
    }

    impl ProgressSink for CancelAfter {
        fn set_title(&self, _: &str) {}
        fn set_line(&self, _: ProgressLine, _: &str) {}
        fn set_progress(&self, _: usize, _: usize) {
            self.remaining.set(self.remaining.get() - 1);
        }
        fn is_cancelled(&self) -> bool {
            self.remaining.get() <= 0
        }
    }

    fn seeded_repo() -> (tempfile::TempDir, RepositoryContext) {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();

            std::fs::write(dir.path().join("a.txt"), "a\n").unwrap();
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("a.txt")).unwrap();
            index.write().unwrap();
            let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
            let sig = repo.signature().unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
                .unwrap();
        }
        drop(repo);
        let ctx = RepositoryContext::open(dir.path()).unwrap();
        (dir, ctx)
    }

    #[test]
    fn clone_from_local_path_completes() {
        let (src, _ctx) = seeded_repo();
        let dst = tempfile::TempDir::new().unwrap();
        let dst_path = dst.path().join("clone");

        let sink = SilentProgress;
        let session = RemoteSession::new(&sink, None, None);
        let outcome = session
            .clone(src.path().to_str().unwrap(), &dst_path, None)
            .unwrap();
        assert!(matches!(outcome, RemoteOutcome::Completed));
        assert!(dst_path.join(".git").exists());
        assert!(dst_path.join("a.txt").exists());
    }

    #[test]
    fn fetch_only_pull_leaves_worktree_alone() {
        let (src, _src_ctx) = seeded_repo();
        let dst = tempfile::TempDir::new().unwrap();
        let dst_path = dst.path().join("clone");

        let sink = SilentProgress;
        let session = RemoteSession::new(&sink, None, None);
        session
            .clone(src.path().to_str().unwrap(), &dst_path, None)
            .unwrap();

        // New upstream commit
        {
            let repo = git2::Repository::open(src.path()).unwrap();
            std::fs::write(src.path().join("b.txt"), "b\n").unwrap();
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("b.txt")).unwrap();
            index.write().unwrap();
            let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
            let sig = repo.signature().unwrap();
            let parent = repo.head().unwrap().peel_to_commit().unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "second", &tree, &[&parent])
                .unwrap();
        }

        let ctx = RepositoryContext::open(&dst_path).unwrap();
        let outcome = session
            .pull(&ctx, "origin", PullStrategy::FetchOnly, false)
            .unwrap();
        assert!(matches!(outcome, RemoteOutcome::Completed));
        assert!(!dst_path.join("b.txt").exists());
    }

    #[test]
    fn pull_with_merge_fast_forwards() {
        let (src, _src_ctx) = seeded_repo();
        let dst = tempfile::TempDir::new().unwrap();
        let dst_path = dst.path().join("clone");

        let sink = SilentProgress;
        let session = RemoteSession::new(&sink, None, None);
        session
            .clone(src.path().to_str().unwrap(), &dst_path, None)
            .unwrap();

        {
            let repo = git2::Repository::open(src.path()).unwrap();
            std::fs::write(src.path().join("b.txt"), "b\n").unwrap();
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("b.txt")).unwrap();
            index.write().unwrap();
            let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
            let sig = repo.signature().unwrap();
            let parent = repo.head().unwrap().peel_to_commit().unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "second", &tree, &[&parent])
                .unwrap();
        }

        let ctx = RepositoryContext::open(&dst_path).unwrap();
        let outcome = session
            .pull(&ctx, "origin", PullStrategy::FetchAndMergeToHead, false)
            .unwrap();
        match outcome {
            RemoteOutcome::Integrated(IntegrationResult::FastForwarded(_)) => {}
            other => panic!("expected fast-forward integration, got {:?}", other),
        }
        assert!(dst_path.join("b.txt").exists());
    }

    fn bare_remote(ctx: &RepositoryContext) -> (tempfile::TempDir, String) {
        let dir = tempfile::TempDir::new().unwrap();
        git2::Repository::init_bare(dir.path()).unwrap();
        ctx.repo()
            .remote("origin", dir.path().to_str().unwrap())
            .unwrap();
        let branch = ctx
            .repo()
            .head()
            .unwrap()
            .shorthand()
            .unwrap()
            .to_string();
        (dir, branch)
    }

    #[test]
    fn push_to_local_remote_completes() {
        let (_src, ctx) = seeded_repo();
        let (remote_dir, branch) = bare_remote(&ctx);

        let sink = SilentProgress;
        let session = RemoteSession::new(&sink, None, None);
        let outcome = session.push(&ctx, "origin", &branch).unwrap();
        assert!(matches!(outcome, RemoteOutcome::Completed));

        let remote = git2::Repository::open_bare(remote_dir.path()).unwrap();
        let pushed = remote
            .find_reference(&format!("refs/heads/{}", branch))
            .unwrap();
        assert_eq!(
            pushed.target().unwrap(),
            ctx.repo().head().unwrap().target().unwrap()
        );
    }

    #[test]
    fn cancelled_push_leaves_the_remote_ref_untouched() {
        let (_src, ctx) = seeded_repo();
        let (remote_dir, branch) = bare_remote(&ctx);

        // Cancelled before negotiation completes.
        let sink = CancelAfter {
            remaining: Cell::new(0),
        };
        let session = RemoteSession::new(&sink, None, None);
        let outcome = session.push(&ctx, "origin", &branch).unwrap();
        assert!(matches!(outcome, RemoteOutcome::Cancelled));

        let remote = git2::Repository::open_bare(remote_dir.path()).unwrap();
        assert!(remote
            .find_reference(&format!("refs/heads/{}", branch))
            .is_err());
    }

    #[test]
    fn cancelled_fetch_is_not_an_error() {
        let (src, _src_ctx) = seeded_repo();
        let dst = tempfile::TempDir::new().unwrap();
        let dst_path = dst.path().join("clone");

        let silent = SilentProgress;
        let session = RemoteSession::new(&silent, None, None);
        session
            .clone(src.path().to_str().unwrap(), &dst_path, None)
            .unwrap();

        // Give the fetch something to transfer so the progress callback fires.
        {
            let repo = git2::Repository::open(src.path()).unwrap();
            std::fs::write(src.path().join("b.txt"), "b\n").unwrap();
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("b.txt")).unwrap();
            index.write().unwrap();
            let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
            let sig = repo.signature().unwrap();
            let parent = repo.head().unwrap().peel_to_commit().unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "second", &tree, &[&parent])
                .unwrap();
        }

        // Cancelled at the first progress tick.
        let sink = CancelAfter {
            remaining: Cell::new(0),
        };
        let session = RemoteSession::new(&sink, None, None);
        let ctx = RepositoryContext::open(&dst_path).unwrap();
        let outcome = session
            .pull(&ctx, "origin", PullStrategy::FetchOnly, false)
            .unwrap();
        assert!(matches!(outcome, RemoteOutcome::Cancelled));
    }
}
