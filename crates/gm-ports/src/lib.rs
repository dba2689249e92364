//! Outbound port traits the core depends on, and the closed error taxonomy
//! every layer propagates through.
//!
//! Nothing in this crate touches a real filesystem, object database, or
//! network: every trait here is implemented either by an external
//! collaborator (a CLI binary, eventually) or by `gm-testkit`'s in-memory
//! fakes. That split is the one the specification draws in its §1 "out of
//! scope" list and its §6 "external interfaces" table.

mod crypto;
mod env;
mod error;
mod fs_temp;
mod identity;
mod repository;
mod telemetry;
mod ulid;

pub use crypto::{CryptoPort, Sha256Stream, SHA256_SIZE};
pub use env::{EnvPort, SystemEnv};
pub use error::{GmError, ResultExt};
pub use fs_temp::{CanonicalizeMode, FsTempPort};
pub use identity::canonical_repo_id;
pub use repository::{
    NewCommit, OwnedBlob, ReferenceTip, ReferenceUpdate, RepoPathKind, RepositoryPort,
    VisitControl,
};
pub use telemetry::{Diagnostics, Kv, LogLevel, Logger, Metrics, NullTelemetry, TelemetryPorts};
pub use ulid::{Ulid, ULID_SIZE};
