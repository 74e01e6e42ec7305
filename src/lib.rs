//! gcpctl: Google Cloud resource updates from the command line
//!
//! Every update-style command runs the same read-modify-write protocol
//! ([`resource::ResourceUpdater`]): fetch the resource, edit a copy according
//! to a per-kind mutation policy, and write the copy back when it changed.

pub mod commands;
pub mod compute;
pub mod config;
pub mod dataflow;
pub mod dataproc;
pub mod error;
pub mod gcp;
pub mod iam;
pub mod resource;

/// Version injected at compile time via GCPCTL_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("GCPCTL_VERSION") {
    Some(v) => v,
    None => "dev",
};
