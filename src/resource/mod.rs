//! Resource update layer
//!
//! This module provides the generic read-modify-write machinery shared by every
//! update-style command. Resource kinds plug in a client and a mutation policy;
//! the protocol itself lives here once.
//!
//! # Architecture
//!
//! - [`reference`] - Fully-qualified resource references and their resolution
//! - [`field`] - Tri-state field updates (unchanged / clear / set)
//! - [`updater`] - The fetch, copy, mutate, write-back protocol
//! - [`retry`] - Bounded retry driven by an HTTP status predicate
//!
//! # Example
//!
//! ```ignore
//! use crate::resource::{ReferenceResolver, ResourceUpdater};
//!
//! async fn run(client: &BackendServiceClient<'_>, policy: &UpdateBackendPolicy) -> anyhow::Result<()> {
//!     let reference = ReferenceResolver::new("my-project").resolve_global("backendServices", "web")?;
//!     let outcome = ResourceUpdater::new(client).update(&reference, policy).await?;
//!     Ok(())
//! }
//! ```

pub mod field;
pub mod reference;
pub mod retry;
pub mod updater;

pub use field::FieldUpdate;
pub use reference::{ReferenceResolver, ResourceReference, Scope, ScopeHints, ScopeKinds};
pub use retry::{on_status, retry_on, RetryPolicy};
pub use updater::{MutationPolicy, ResourceClient, ResourceUpdater, UpdateOutcome};
