//! context
//!
//! The repository binding for one open host project.
//!
//! # Lifecycle
//!
//! A [`RepositoryContext`] is created when the host opens a project and
//! torn down when the last close arrives. The host may reopen a project
//! without a matching close, so the context carries an explicit reference
//! count; teardown happens only at zero, never through destructor ordering.
//!
//! # Concurrency
//!
//! The host's calling contract is single-threaded and re-entrant-unsafe
//! across calls; the context takes no locks and uses a plain [`Cell`] for
//! the count.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use crate::core::paths;
use crate::error::AdapterError;

/// Exclusive owner of one open repository handle.
///
/// The repository root may differ from the project root when the project
/// is a subdirectory of the working tree; path translation always uses the
/// project root for inbound paths and the workdir root for outbound ones.
pub struct RepositoryContext {
    repo: git2::Repository,
    project_root: String,
    workdir_root: PathBuf,
    refs: Cell<u32>,
}

impl std::fmt::Debug for RepositoryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryContext")
            .field("project_root", &self.project_root)
            .field("workdir_root", &self.workdir_root)
            .field("refs", &self.refs.get())
            .finish()
    }
}

impl RepositoryContext {
    /// Open the repository containing `project_root`.
    ///
    /// Uses repository discovery, so the project may live anywhere inside
    /// the working tree. The returned context starts with one reference.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::NotARepo`] if no repository is found
    /// - [`AdapterError::BareRepo`] if the repository has no working tree
    pub fn open(project_root: &Path) -> Result<Self, AdapterError> {
        let repo = git2::Repository::discover(project_root).map_err(|_| AdapterError::NotARepo {
            path: project_root.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(AdapterError::BareRepo);
        }
        let workdir_root = repo
            .workdir()
            .ok_or(AdapterError::BareRepo)?
            .to_path_buf();

        Ok(Self {
            repo,
            project_root: project_root.to_string_lossy().into_owned(),
            workdir_root,
            refs: Cell::new(1),
        })
    }

    /// The underlying repository handle.
    pub fn repo(&self) -> &git2::Repository {
        &self.repo
    }

    /// Absolute project root as supplied by the host.
    pub fn project_root(&self) -> &str {
        &self.project_root
    }

    /// Absolute working-directory root of the repository.
    pub fn workdir_root(&self) -> &Path {
        &self.workdir_root
    }

    /// Path to the `.git` directory.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Translate a host absolute path into a repository-relative path.
    ///
    /// Relative to the *workdir* root, which is what the repository library
    /// expects; `None` when the path is outside the working tree.
    pub fn relative(&self, absolute: &str) -> Option<String> {
        paths::to_relative(&self.workdir_root.to_string_lossy(), absolute)
    }

    /// Translate a repository-relative path back into a host absolute path.
    pub fn absolute(&self, relative: &str) -> String {
        paths::to_absolute(&self.workdir_root.to_string_lossy(), relative)
    }

    /// Both halves of the translation for one host path, `None` when the
    /// path is outside the working tree.
    pub fn pair(&self, absolute: &str) -> Option<paths::PathPair> {
        paths::PathPair::new(&self.workdir_root.to_string_lossy(), absolute)
    }

    /// Record a reopen-without-close from the host.
    pub fn retain(&self) {
        self.refs.set(self.refs.get() + 1);
    }

    /// Record a close from the host.
    ///
    /// Returns `true` when this was the last reference and the caller must
    /// drop the context.
    pub fn release(&self) -> bool {
        let n = self.refs.get().saturating_sub(1);
        self.refs.set(n);
        n == 0
    }

    /// Current reference count.
    pub fn ref_count(&self) -> u32 {
        self.refs.get()
    }
}
