use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use gm_oid::ObjectId;
use gm_ports::{
    GmError, NewCommit, OwnedBlob, ReferenceTip, ReferenceUpdate, RepoPathKind, RepositoryPort,
    VisitControl,
};

#[derive(Clone)]
struct FakeCommit {
    tree: ObjectId,
    message: String,
    parents: Vec<ObjectId>,
    time: u64,
}

#[derive(Default)]
struct Inner {
    head_branch: String,
    refs: HashMap<String, ObjectId>,
    commits: HashMap<ObjectId, FakeCommit>,
    trees: HashMap<ObjectId, HashMap<String, Vec<u8>>>,
    next_seed: u64,
    clock: u64,
}

/// An in-memory [`RepositoryPort`]: refs, commits, and trees live in plain
/// `HashMap`s, with `build_tree_from_directory` the one operation that
/// actually touches a filesystem (it reads whatever `FakeFsTemp` staged).
///
/// Grounded on `core/tests/backends/test_backend.c`'s in-memory repository
/// double; object ids here are assigned by a monotonic counter rather than
/// content hashing, since the core never relies on OID *stability* across
/// unrelated writes, only on byte-wise equality within a single test.
///
/// `repository_path` must resolve to something that actually exists on
/// disk -- `canonical_repo_id` canonicalizes it physically -- so this holds
/// a real, empty temporary directory standing in for the common `.git` dir.
pub struct FakeRepository {
    common_dir: tempfile::TempDir,
    inner: RefCell<Inner>,
}

impl FakeRepository {
    pub fn new(head_branch: impl Into<String>) -> Self {
        Self {
            common_dir: tempfile::tempdir().expect("create fake common dir"),
            inner: RefCell::new(Inner {
                head_branch: head_branch.into(),
                clock: 1,
                ..Default::default()
            }),
        }
    }

    /// Directly set a reference's target, bypassing compare-and-set --
    /// test setup only, mirroring how a real backend would be seeded by a
    /// fixture repository.
    pub fn set_ref(&self, name: &str, target: ObjectId) {
        self.inner.borrow_mut().refs.insert(name.to_string(), target);
    }

    pub fn set_head_branch(&self, branch: impl Into<String>) {
        self.inner.borrow_mut().head_branch = branch.into();
    }

    /// Commit time recorded for `commit`, for assertions that need to
    /// compare staleness windows.
    pub fn commit_time(&self, commit: ObjectId) -> Option<u64> {
        self.inner.borrow().commits.get(&commit).map(|c| c.time)
    }

    fn next_oid(inner: &mut Inner) -> ObjectId {
        inner.next_seed = inner.next_seed.wrapping_add(1);
        let seed = inner.next_seed;
        let mut bytes = [0u8; gm_oid::OID_SIZE];
        bytes[..8].copy_from_slice(&seed.to_be_bytes());
        ObjectId::from_array(bytes)
    }

    fn tick(inner: &mut Inner) -> u64 {
        inner.clock += 1;
        inner.clock
    }
}

impl Default for FakeRepository {
    fn default() -> Self {
        Self::new("main")
    }
}

impl RepositoryPort for FakeRepository {
    fn repository_path(&self, _kind: RepoPathKind) -> Result<PathBuf, GmError> {
        Ok(self.common_dir.path().to_path_buf())
    }

    fn head_branch(&self) -> Result<String, GmError> {
        let inner = self.inner.borrow();
        if inner.head_branch.is_empty() {
            return Err(GmError::InvalidState("HEAD is detached".into()));
        }
        Ok(inner.head_branch.clone())
    }

    fn build_tree_from_directory(&self, path: &Path) -> Result<ObjectId, GmError> {
        let mut entries = HashMap::new();
        collect_dir(path, path, &mut entries)?;
        let mut inner = self.inner.borrow_mut();
        let oid = Self::next_oid(&mut inner);
        inner.trees.insert(oid, entries);
        Ok(oid)
    }

    fn reference_tip(&self, ref_name: &str) -> Result<ReferenceTip, GmError> {
        let inner = self.inner.borrow();
        match inner.refs.get(ref_name) {
            Some(&oid) => Ok(ReferenceTip {
                has_target: true,
                oid,
                commit_time: inner.commits.get(&oid).map(|c| c.time).unwrap_or(0),
            }),
            None => Ok(ReferenceTip::ABSENT),
        }
    }

    fn reference_glob_latest(&self, pattern: &str) -> Result<ReferenceTip, GmError> {
        let prefix = pattern.trim_end_matches('*');
        let inner = self.inner.borrow();
        Ok(inner
            .refs
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(_, &oid)| ReferenceTip {
                has_target: true,
                oid,
                commit_time: inner.commits.get(&oid).map(|c| c.time).unwrap_or(0),
            })
            .max_by_key(|tip| tip.commit_time)
            .unwrap_or(ReferenceTip::ABSENT))
    }

    fn commit_read_blob(&self, commit: ObjectId, path: &str) -> Result<OwnedBlob, GmError> {
        let inner = self.inner.borrow();
        let c = inner
            .commits
            .get(&commit)
            .ok_or_else(|| GmError::NotFound(format!("commit {commit}")))?;
        let tree = inner
            .trees
            .get(&c.tree)
            .ok_or_else(|| GmError::NotFound(format!("tree {}", c.tree)))?;
        tree.get(path)
            .cloned()
            .ok_or_else(|| GmError::NotFound(format!("blob {path} in commit {commit}")))
    }

    fn commit_read_message(&self, commit: ObjectId) -> Result<String, GmError> {
        let inner = self.inner.borrow();
        inner
            .commits
            .get(&commit)
            .map(|c| c.message.clone())
            .ok_or_else(|| GmError::NotFound(format!("commit {commit}")))
    }

    fn walk_commits(
        &self,
        ref_name: &str,
        visitor: &mut dyn FnMut(ObjectId) -> Result<VisitControl, GmError>,
    ) -> Result<(), GmError> {
        let start = {
            let inner = self.inner.borrow();
            inner.refs.get(ref_name).copied()
        };
        let Some(mut current) = start else {
            return Ok(());
        };
        loop {
            if visitor(current)? == VisitControl::Halt {
                return Ok(());
            }
            let parent = {
                let inner = self.inner.borrow();
                inner
                    .commits
                    .get(&current)
                    .and_then(|c| c.parents.first().copied())
            };
            match parent {
                Some(p) => current = p,
                None => return Ok(()),
            }
        }
    }

    fn commit_tree_size(&self, commit: ObjectId) -> Result<u64, GmError> {
        let inner = self.inner.borrow();
        let c = inner
            .commits
            .get(&commit)
            .ok_or_else(|| GmError::NotFound(format!("commit {commit}")))?;
        let tree = inner
            .trees
            .get(&c.tree)
            .ok_or_else(|| GmError::NotFound(format!("tree {}", c.tree)))?;
        Ok(tree.values().map(|v| v.len() as u64).sum())
    }

    fn commit_create(&self, commit: NewCommit<'_>) -> Result<ObjectId, GmError> {
        let mut inner = self.inner.borrow_mut();
        let time = Self::tick(&mut inner);
        let oid = Self::next_oid(&mut inner);
        inner.commits.insert(
            oid,
            FakeCommit {
                tree: commit.tree,
                message: commit.message.to_string(),
                parents: commit.parents.to_vec(),
                time,
            },
        );
        Ok(oid)
    }

    fn reference_update(&self, update: ReferenceUpdate<'_>) -> Result<(), GmError> {
        let mut inner = self.inner.borrow_mut();
        let current = inner.refs.get(update.ref_name).copied();
        if !update.force {
            match (update.expected_old, current) {
                (None, None) => {}
                (None, Some(_)) => {
                    return Err(GmError::AlreadyExists(format!(
                        "{} already exists",
                        update.ref_name
                    )))
                }
                (Some(expected), Some(actual)) if expected == actual => {}
                _ => {
                    return Err(GmError::AlreadyExists(format!(
                        "{} is not a fast-forward",
                        update.ref_name
                    )))
                }
            }
        }
        inner
            .refs
            .insert(update.ref_name.to_string(), update.target);
        Ok(())
    }

    fn resolve_blob_at_head(&self, path: &str) -> Result<ObjectId, GmError> {
        let branch = self.head_branch()?;
        let ref_name = format!("refs/heads/{branch}");
        let tip = self.reference_tip(&ref_name)?;
        if !tip.has_target {
            return Err(GmError::NotFound(format!("HEAD ({ref_name})")));
        }
        self.resolve_blob_at_commit(tip.oid, path)
    }

    fn resolve_blob_at_commit(&self, commit: ObjectId, path: &str) -> Result<ObjectId, GmError> {
        let inner = self.inner.borrow();
        let tree_oid = inner
            .commits
            .get(&commit)
            .ok_or_else(|| GmError::NotFound(format!("commit {commit}")))?
            .tree;
        let bytes = inner
            .trees
            .get(&tree_oid)
            .and_then(|t| t.get(path))
            .ok_or_else(|| GmError::NotFound(format!("blob {path}")))?;
        Ok(content_oid(bytes))
    }

    fn commit_parent_count(&self, commit: ObjectId) -> Result<usize, GmError> {
        let inner = self.inner.borrow();
        inner
            .commits
            .get(&commit)
            .map(|c| c.parents.len())
            .ok_or_else(|| GmError::NotFound(format!("commit {commit}")))
    }
}

fn collect_dir(
    root: &Path,
    dir: &Path,
    out: &mut HashMap<String, Vec<u8>>,
) -> Result<(), GmError> {
    for entry in fs::read_dir(dir).map_err(GmError::from)? {
        let entry = entry.map_err(GmError::from)?;
        let path = entry.path();
        if path.is_dir() {
            collect_dir(root, &path, out)?;
        } else {
            let rel = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            out.insert(rel, fs::read(&path).map_err(GmError::from)?);
        }
    }
    Ok(())
}

/// Deterministic content-derived OID used only for blob *lookups*
/// (`resolve_blob_at_commit`) where two calls on the same bytes should
/// agree, unlike newly created objects which are always distinct.
fn content_oid(data: &[u8]) -> ObjectId {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in data {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    let mut bytes = [0u8; gm_oid::OID_SIZE];
    for (i, byte) in bytes.iter_mut().enumerate() {
        let mixed = hash.wrapping_add(i as u64).wrapping_mul(0x2545_F491_4F6C_DD1D);
        *byte = (mixed >> 56) as u8;
    }
    ObjectId::from_array(bytes)
}
