use gm_oid::ObjectId;

use crate::error::GmError;

/// Which on-disk location a caller is asking the repository port to resolve.
///
/// Mirrors the handful of paths `git-repository::discover` distinguishes
/// between the work tree and the `.git` common directory; the journal/cache
/// layers only ever need the common directory (refs and objects live
/// there even under a linked worktree).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoPathKind {
    WorkTree,
    CommonDir,
}

/// The result of resolving a reference: either it has no target (an absent
/// ref is not an error at this layer, callers decide what that means), or it
/// points at a commit with a known commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReferenceTip {
    pub has_target: bool,
    pub oid: ObjectId,
    pub commit_time: u64,
}

impl ReferenceTip {
    pub const ABSENT: Self = Self {
        has_target: false,
        oid: ObjectId::ZERO,
        commit_time: 0,
    };
}

/// What a caller wants done with one commit while walking a ref's history.
///
/// Replaces the C callback's "non-zero return halts" convention with an
/// explicit enum; a visitor closure returns this instead of an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    Continue,
    Halt,
}

/// Everything needed to create a new commit: the tree it records, a short
/// human message, and its parent chain.
pub struct NewCommit<'a> {
    pub tree: ObjectId,
    pub message: &'a str,
    pub parents: &'a [ObjectId],
}

/// A compare-and-set reference update request.
///
/// `expected_old` mirrors git's "old value must match or the update is
/// rejected" semantics; `None` means "ref must not currently exist" (a
/// create). `force` bypasses the fast-forward check but still honors
/// `expected_old` when present.
pub struct ReferenceUpdate<'a> {
    pub ref_name: &'a str,
    pub target: ObjectId,
    pub expected_old: Option<ObjectId>,
    pub log_message: &'a str,
    pub force: bool,
}

/// A byte blob read from a commit, together with the means to release any
/// backing resource the port allocated for it.
///
/// The C original returns an owned buffer plus an explicit disposer
/// function; in Rust this collapses to returning an owned `Vec<u8>`
/// directly, so no separate disposer type is needed -- `Drop` on the `Vec`
/// does the job the disposer callback used to.
pub type OwnedBlob = Vec<u8>;

/// Abstract interface onto the version-control substrate (refs, commits,
/// trees, blobs) that the journal and cache are built from.
///
/// This is never implemented by this crate family: per the specification's
/// scope, the core depends on the *shape* of a repository backend, not a
/// concrete one. `gm-testkit::FakeRepository` is the only implementation
/// used by this workspace's own tests; a real implementation would adapt an
/// on-disk store (e.g. one built the way `git-repository` builds one) to
/// this trait.
pub trait RepositoryPort {
    /// Absolute path to the work tree or the common `.git` directory.
    fn repository_path(&self, kind: RepoPathKind) -> Result<std::path::PathBuf, GmError>;

    /// The branch name `HEAD` currently points at. Fails with
    /// [`GmError::InvalidState`] when `HEAD` is detached or missing.
    fn head_branch(&self) -> Result<String, GmError>;

    /// Build a tree object from the contents of a directory on disk,
    /// recursively, returning the resulting tree's OID.
    fn build_tree_from_directory(&self, path: &std::path::Path) -> Result<ObjectId, GmError>;

    /// Resolve a reference by its full name (e.g.
    /// `refs/gitmind/edges/main`). An absent reference is not an error:
    /// `Ok(ReferenceTip::ABSENT)` is returned.
    fn reference_tip(&self, ref_name: &str) -> Result<ReferenceTip, GmError>;

    /// Resolve a glob pattern (e.g. `refs/gitmind/cache/main/*`) to the
    /// single match with the largest commit time. An absent match is not an
    /// error: `Ok(ReferenceTip::ABSENT)` is returned.
    fn reference_glob_latest(&self, pattern: &str) -> Result<ReferenceTip, GmError>;

    /// Read a blob stored at `path` inside a commit's tree.
    fn commit_read_blob(&self, commit: ObjectId, path: &str) -> Result<OwnedBlob, GmError>;

    /// Read a commit's message.
    fn commit_read_message(&self, commit: ObjectId) -> Result<String, GmError>;

    /// Walk the commit chain reachable from `ref_name` in
    /// reverse-chronological order, invoking `visitor` once per commit.
    /// Stops as soon as the visitor returns [`VisitControl::Halt`].
    fn walk_commits(
        &self,
        ref_name: &str,
        visitor: &mut dyn FnMut(ObjectId) -> Result<VisitControl, GmError>,
    ) -> Result<(), GmError>;

    /// Recursive byte size of a commit's tree (blobs plus subtree objects).
    fn commit_tree_size(&self, commit: ObjectId) -> Result<u64, GmError>;

    /// Create a new commit object, returning its OID. Does not update any
    /// reference.
    fn commit_create(&self, commit: NewCommit<'_>) -> Result<ObjectId, GmError>;

    /// Apply a compare-and-set reference update. Fails with
    /// [`GmError::AlreadyExists`] when `expected_old` does not match the
    /// reference's current value and `force` is `false`.
    fn reference_update(&self, update: ReferenceUpdate<'_>) -> Result<(), GmError>;

    /// Resolve the OID of the blob at `path` in the tree of the current
    /// `HEAD` commit.
    fn resolve_blob_at_head(&self, path: &str) -> Result<ObjectId, GmError>;

    /// Resolve the OID of the blob at `path` in the tree of `commit`.
    fn resolve_blob_at_commit(
        &self,
        commit: ObjectId,
        path: &str,
    ) -> Result<ObjectId, GmError>;

    /// Number of parents `commit` has.
    fn commit_parent_count(&self, commit: ObjectId) -> Result<usize, GmError>;
}
