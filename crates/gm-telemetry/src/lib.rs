//! Environment-driven telemetry configuration and rendering.
//!
//! This crate owns the two ambient concerns the specification's §6 table
//! assigns to the environment: parsing `GITMIND_*` variables into a
//! [`TelemetryConfig`], and rendering a structured log record to text or
//! JSON the way a human or a log aggregator would read it. It does not
//! implement [`gm_ports::Logger`]/[`Metrics`]/[`Diagnostics`] itself --
//! those remain external collaborators (or `gm-testkit`'s fakes in this
//! workspace's own tests) -- it only supplies the configuration and
//! formatting logic they are built on top of.

mod config;
mod format;
mod tags;

pub use config::{HashAlgo, LogFormat, RepoTagMode, TelemetryConfig};
pub use format::render_log_line;
pub use tags::{build_tags, RepoIdentity};
