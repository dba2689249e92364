use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use gm_ports::{CanonicalizeMode, FsTempPort, GmError};

/// An [`FsTempPort`] backed by a real, process-unique temporary directory
/// (via the `tempfile` crate, the way `git-utils::tempfile::TempFile` is).
/// Every call returns an owned path; nothing aliases the port's own
/// storage, per the design notes' "remove the footgun entirely" guidance.
pub struct FakeFsTemp {
    root: tempfile::TempDir,
    counter: AtomicU64,
}

impl FakeFsTemp {
    pub fn new() -> Result<Self, GmError> {
        let root = tempfile::tempdir().map_err(GmError::from)?;
        Ok(Self {
            root,
            counter: AtomicU64::new(0),
        })
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }
}

impl FsTempPort for FakeFsTemp {
    fn base_dir(&self, base: &str, ensure: bool) -> Result<PathBuf, GmError> {
        let path = self.root.path().join(base);
        if ensure {
            fs::create_dir_all(&path).map_err(GmError::from)?;
        }
        Ok(path)
    }

    fn make_temp_dir(
        &self,
        repo_id: u128,
        component: &str,
        suffix_random: bool,
    ) -> Result<PathBuf, GmError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let name = if suffix_random {
            format!("{repo_id:032x}-{component}-{n:x}")
        } else {
            format!("{repo_id:032x}-{component}")
        };
        let path = self.root.path().join(name);
        fs::create_dir_all(&path).map_err(GmError::from)?;
        Ok(path)
    }

    fn remove_tree(&self, path: &Path) -> Result<(), GmError> {
        if path.exists() {
            fs::remove_dir_all(path).map_err(GmError::from)?;
        }
        Ok(())
    }

    fn path_join_under_base(&self, base: &Path, parts: &[&str]) -> Result<PathBuf, GmError> {
        let mut path = base.to_path_buf();
        for part in parts {
            if part.is_empty() || *part == ".." || part.contains('/') || part.contains('\\') {
                return Err(GmError::InvalidPath(format!(
                    "path component {part:?} would escape base"
                )));
            }
            path.push(part);
        }
        Ok(path)
    }

    fn canonicalize_ex(&self, path: &Path, mode: CanonicalizeMode) -> Result<PathBuf, GmError> {
        match mode {
            CanonicalizeMode::Logical => Ok(lexical_normalize(path)),
            CanonicalizeMode::PhysicalExisting => fs::canonicalize(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GmError::FileNotFound(path.display().to_string())
                } else {
                    GmError::from(e)
                }
            }),
            CanonicalizeMode::PhysicalCreateOk => {
                let parent = path.parent().unwrap_or_else(|| Path::new("."));
                let canon_parent = fs::canonicalize(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        GmError::FileNotFound(parent.display().to_string())
                    } else {
                        GmError::from(e)
                    }
                })?;
                match path.file_name() {
                    Some(name) => Ok(canon_parent.join(name)),
                    None => Ok(canon_parent),
                }
            }
        }
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = Vec::new();
    for component in path.components() {
        use std::path::Component;
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out.into_iter().collect()
}
