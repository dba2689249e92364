use gm_ports::CryptoPort;

use crate::config::{HashAlgo, RepoTagMode, TelemetryConfig};

/// How to identify "this repository" when building a `repo=` tag.
pub enum RepoIdentity<'a> {
    /// The repository's canonicalized filesystem path, used verbatim under
    /// [`RepoTagMode::Plain`] or hashed under [`RepoTagMode::Hash`].
    Path(&'a str),
    /// A repo-id already derived elsewhere (e.g. from a canonical path via
    /// [`CryptoPort::sha256`]), used only under [`RepoTagMode::Hash`].
    Id(u128),
}

/// Build the metric tags for one call, honoring [`TelemetryConfig`]'s
/// toggles: `branch`/`mode` tags when enabled and present, a `repo` tag per
/// [`RepoTagMode`], then up to [`crate::config::MAX_EXTRA_TAGS`] validated
/// extras already captured on the config.
pub fn build_tags(
    cfg: &TelemetryConfig,
    branch: Option<&str>,
    mode: Option<&str>,
    repo: Option<RepoIdentity<'_>>,
    crypto: &dyn CryptoPort,
) -> Vec<(String, String)> {
    let mut tags = Vec::new();

    if cfg.tag_branch {
        if let Some(branch) = branch {
            tags.push(("branch".to_string(), branch.to_string()));
        }
    }
    if cfg.tag_mode {
        if let Some(mode) = mode {
            tags.push(("mode".to_string(), mode.to_string()));
        }
    }
    if cfg.repo_tag != RepoTagMode::Off {
        if let Some(identity) = repo {
            if let Some(value) = render_repo_tag(cfg, &identity, crypto) {
                tags.push(("repo".to_string(), value));
            }
        }
    }
    for (k, v) in &cfg.extras {
        tags.push((k.clone(), v.clone()));
    }

    tags
}

fn render_repo_tag(
    cfg: &TelemetryConfig,
    identity: &RepoIdentity<'_>,
    crypto: &dyn CryptoPort,
) -> Option<String> {
    match cfg.repo_tag {
        RepoTagMode::Off => None,
        RepoTagMode::Plain => match identity {
            RepoIdentity::Path(p) => Some(p.to_string()),
            RepoIdentity::Id(id) => Some(format!("{id:032x}")),
        },
        RepoTagMode::Hash => {
            let bytes = identity_bytes(identity);
            Some(match cfg.repo_hash_algo {
                HashAlgo::Fnv => fnv1a64_hex12(&bytes),
                HashAlgo::Sha256 => sha256_hex12(&bytes, crypto),
            })
        }
    }
}

fn identity_bytes(identity: &RepoIdentity<'_>) -> Vec<u8> {
    match identity {
        RepoIdentity::Path(p) => p.as_bytes().to_vec(),
        RepoIdentity::Id(id) => format!("{id:032x}").into_bytes(),
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a64_hex12(data: &[u8]) -> String {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in data {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    // 12 of the 16 hex nibbles, most-significant first -- matches the
    // original's `fnv1a64_hex12`, which walks nibbles from the top down.
    format!("{hash:016x}")[..12].to_string()
}

fn sha256_hex12(data: &[u8], crypto: &dyn CryptoPort) -> String {
    match crypto.sha256(data) {
        Ok(digest) => digest[..6].iter().map(|b| format!("{b:02x}")).collect(),
        Err(_) => String::new(),
    }
}
