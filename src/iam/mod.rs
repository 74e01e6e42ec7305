//! IAM policies of service accounts
//!
//! Removing a binding is a read-modify-write of the whole policy. Concurrent
//! writers are detected by the policy etag, so callers wrap the update in
//! [`crate::resource::retry_on`] retrying on 409.

pub mod client;
pub mod policy;

pub use client::{service_account_reference, ServiceAccountPolicyClient};
pub use policy::{Binding, Policy, RemoveBinding};
