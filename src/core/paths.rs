//! core::paths
//!
//! Translation between host-supplied absolute paths and repository-relative
//! paths.
//!
//! # Design
//!
//! The host hands the adapter absolute paths in its own separator
//! convention (backslashes on Windows hosts); the repository library wants
//! repository-relative, forward-slash paths. Translation is applied exactly
//! once at each boundary crossing, and normalization is idempotent so an
//! accidental double translation is a no-op.
//!
//! Paths are handled as UTF-8 strings throughout; wide host paths survive
//! without lossy truncation to any 8-bit encoding.
//!
//! Nothing here is persisted: a [`PathPair`] is recomputed per call.

/// An absolute host path and its repository-relative counterpart.
///
/// The relative path is always a strict suffix of the absolute path once
/// the project root prefix is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    /// Absolute path in the host's separator convention.
    pub absolute: String,
    /// Repository-relative path with POSIX separators.
    pub relative: String,
}

impl PathPair {
    /// Build the pair for `absolute` under `project_root`, or `None` when
    /// the path does not belong to the project.
    pub fn new(project_root: &str, absolute: &str) -> Option<Self> {
        let relative = to_relative(project_root, absolute)?;
        Some(Self {
            absolute: absolute.to_string(),
            relative,
        })
    }
}

/// Replace backslash separators with forward slashes.
///
/// Idempotent: normalizing an already-normalized path changes nothing.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Translate an absolute host path into a repository-relative path.
///
/// Computes the common prefix of `project_root` and `absolute` on component
/// boundaries. Returns `None` when the path is not under the root, or when
/// the remainder is empty (the path *is* the root) - callers skip such
/// entries rather than failing the whole batch.
///
/// # Example
///
/// ```
/// use sccbridge::core::paths::to_relative;
///
/// assert_eq!(
///     to_relative(r"C:\proj", r"C:\proj\src\a.c"),
///     Some("src/a.c".to_string())
/// );
/// assert_eq!(to_relative(r"C:\proj", r"C:\other\a.c"), None);
/// assert_eq!(to_relative(r"C:\proj", r"C:\proj"), None);
/// ```
pub fn to_relative(project_root: &str, absolute: &str) -> Option<String> {
    let root = normalize_separators(project_root);
    let abs = normalize_separators(absolute);

    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return None;
    }

    let rest = abs.strip_prefix(root)?;
    // Reject sibling directories sharing a name prefix (C:/proj vs C:/proj2)
    let rest = rest.strip_prefix('/')?;
    let rest = rest.trim_start_matches('/');
    if rest.is_empty() {
        return None;
    }

    Some(rest.to_string())
}

/// Translate a repository-relative path back into an absolute host path.
///
/// The separator convention of `workdir_root` decides the convention of the
/// result: a backslash anywhere in the root produces a backslash-separated
/// path, otherwise forward slashes are kept.
///
/// # Example
///
/// ```
/// use sccbridge::core::paths::to_absolute;
///
/// assert_eq!(to_absolute(r"C:\proj", "src/a.c"), r"C:\proj\src\a.c");
/// assert_eq!(to_absolute("/home/u/proj", "src/a.c"), "/home/u/proj/src/a.c");
/// ```
pub fn to_absolute(workdir_root: &str, relative: &str) -> String {
    let host_style_backslash = workdir_root.contains('\\');
    let root = normalize_separators(workdir_root);
    let root = root.trim_end_matches('/');
    let rel = normalize_separators(relative);
    let rel = rel.trim_start_matches('/');

    let joined = format!("{}/{}", root, rel);
    if host_style_backslash {
        joined.replace('/', "\\")
    } else {
        joined
    }
}
