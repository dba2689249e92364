use std::path::{Path, PathBuf};

use crate::error::GmError;

/// How [`FsTempPort::canonicalize_ex`] should treat a path that does not
/// fully exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalizeMode {
    /// Resolve `.`/`..` and symlinks lexically without touching the
    /// filesystem.
    Logical,
    /// Resolve against the real filesystem; every component must already
    /// exist. Fails with [`GmError::FileNotFound`] on a missing path.
    PhysicalExisting,
    /// Resolve against the real filesystem; the final component is allowed
    /// not to exist yet (its parent must).
    PhysicalCreateOk,
}

/// Abstract interface onto scratch-directory management used by the cache
/// rebuilder to stage a tree before it is committed.
///
/// Per the design notes, implementations must return **owned** paths from
/// every call -- unlike the C original, which reused internal storage
/// across calls and required callers to copy the path defensively, nothing
/// here aliases the port's own state.
pub trait FsTempPort {
    /// Resolve (optionally creating) the base directory scratch work lives
    /// under.
    fn base_dir(&self, base: &str, ensure: bool) -> Result<PathBuf, GmError>;

    /// Create a fresh, uniquely named temporary directory for one rebuild,
    /// scoped to a repository identity and a named component (e.g.
    /// `"cache"`). `suffix_random` requests a random disambiguating suffix;
    /// concurrent rebuilds of the same repository never share a directory.
    fn make_temp_dir(
        &self,
        repo_id: u128,
        component: &str,
        suffix_random: bool,
    ) -> Result<PathBuf, GmError>;

    /// Remove a directory tree. Best-effort from the caller's point of view
    /// (rebuild logs but does not surface a failure here), but the port
    /// itself still reports success/failure accurately.
    fn remove_tree(&self, path: &Path) -> Result<(), GmError>;

    /// Join path components underneath `base`, rejecting any component that
    /// would escape it (e.g. via `..`).
    fn path_join_under_base(&self, base: &Path, parts: &[&str]) -> Result<PathBuf, GmError>;

    /// Canonicalize `path` under the given mode.
    fn canonicalize_ex(&self, path: &Path, mode: CanonicalizeMode) -> Result<PathBuf, GmError>;
}
