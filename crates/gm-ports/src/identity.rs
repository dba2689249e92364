use crate::crypto::CryptoPort;
use crate::error::{GmError, ResultExt};
use crate::fs_temp::{CanonicalizeMode, FsTempPort};
use crate::repository::{RepoPathKind, RepositoryPort};

/// Compute a stable 128-bit identity for a repository: canonicalize its
/// common directory (physical, must already exist) and take the leading 16
/// bytes of its SHA-256 digest.
///
/// Used by the cache rebuilder to scope temp-workspace names to "this
/// repository" (so two repositories sharing a temp base never collide) and
/// by the journal writer for the same reason when staging a commit's
/// payload blob. Per the data model this identity is not part of any
/// persisted record -- it only disambiguates scratch directories.
pub fn canonical_repo_id(
    repo: &dyn RepositoryPort,
    fs_temp: &dyn FsTempPort,
    crypto: &dyn CryptoPort,
) -> Result<u128, GmError> {
    let path = repo
        .repository_path(RepoPathKind::CommonDir)
        .context("resolve repository path")?;
    let canonical = fs_temp
        .canonicalize_ex(&path, CanonicalizeMode::PhysicalExisting)
        .context("canonicalize repository path")?;
    let digest = crypto
        .sha256(canonical.to_string_lossy().as_bytes())
        .context("hash repository path")?;
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Ok(u128::from_be_bytes(bytes))
}
