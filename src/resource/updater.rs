//! Read-modify-write updates of remote resources.
//!
//! [`ResourceUpdater::update`] fetches the current state of a resource, lets a
//! [`MutationPolicy`] edit a deep copy of it, and writes the copy back through
//! a [`ResourceClient`] when it differs from what was read.

use super::reference::ResourceReference;
use crate::error::UpdateError;
use async_trait::async_trait;

/// Get/Update RPCs for one resource kind
#[async_trait]
pub trait ResourceClient: Send + Sync {
    type Resource: Clone + PartialEq + Send + Sync;

    async fn get(&self, reference: &ResourceReference) -> anyhow::Result<Self::Resource>;

    /// Submit `resource` as the new desired state and return the stored result
    async fn update(
        &self,
        reference: &ResourceReference,
        resource: &Self::Resource,
    ) -> anyhow::Result<Self::Resource>;
}

/// Describes how a request changes a resource of kind `R`
pub trait MutationPolicy<R> {
    /// True when no recognized option was supplied
    fn is_empty(&self) -> bool;

    /// Checks that need no remote state; run before any network call
    fn precheck(&self) -> Result<(), UpdateError> {
        Ok(())
    }

    /// Edit `replacement`, a deep copy of `original`
    fn apply(&self, original: &R, replacement: &mut R) -> Result<(), UpdateError>;
}

/// Result of a successful update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome<R> {
    /// The write-back happened; holds what the server returned
    Updated(R),
    /// The policy produced no difference, so nothing was written
    Unchanged(R),
}

impl<R> UpdateOutcome<R> {
    pub fn resource(&self) -> &R {
        match self {
            UpdateOutcome::Updated(r) | UpdateOutcome::Unchanged(r) => r,
        }
    }

    pub fn into_resource(self) -> R {
        match self {
            UpdateOutcome::Updated(r) | UpdateOutcome::Unchanged(r) => r,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated(_))
    }
}

/// Runs the fetch / copy / mutate / write-back protocol over a client
pub struct ResourceUpdater<'a, C> {
    client: &'a C,
}

impl<'a, C: ResourceClient> ResourceUpdater<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Update the resource at `reference` as described by `policy`.
    ///
    /// Fails with [`UpdateError::NoFieldsSpecified`] before any I/O when the
    /// policy is empty. Remote failures are returned as
    /// [`UpdateError::RemoteCallFailed`] without retrying.
    pub async fn update<P>(
        &self,
        reference: &ResourceReference,
        policy: &P,
    ) -> Result<UpdateOutcome<C::Resource>, UpdateError>
    where
        P: MutationPolicy<C::Resource> + ?Sized,
    {
        if policy.is_empty() {
            return Err(UpdateError::NoFieldsSpecified);
        }
        policy.precheck()?;

        let original = self
            .client
            .get(reference)
            .await
            .map_err(UpdateError::RemoteCallFailed)?;

        let mut replacement = original.clone();
        policy.apply(&original, &mut replacement)?;

        if replacement == original {
            tracing::info!(
                "No change requested; skipping update for [{}]",
                reference.name()
            );
            return Ok(UpdateOutcome::Unchanged(original));
        }

        tracing::info!("Writing back [{}]", reference);
        let updated = self
            .client
            .update(reference, &replacement)
            .await
            .map_err(UpdateError::RemoteCallFailed)?;

        Ok(UpdateOutcome::Updated(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Scope;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Widget {
        label: Option<String>,
        size: Option<i64>,
    }

    /// In-memory client recording how often each RPC ran
    struct MemoryClient {
        stored: Mutex<Widget>,
        submitted: Mutex<Vec<Widget>>,
        gets: AtomicUsize,
        updates: AtomicUsize,
        fail_get: bool,
    }

    impl MemoryClient {
        fn new(widget: Widget) -> Self {
            Self {
                stored: Mutex::new(widget),
                submitted: Mutex::new(Vec::new()),
                gets: AtomicUsize::new(0),
                updates: AtomicUsize::new(0),
                fail_get: false,
            }
        }

        fn calls(&self) -> (usize, usize) {
            (
                self.gets.load(Ordering::SeqCst),
                self.updates.load(Ordering::SeqCst),
            )
        }
    }

    #[async_trait]
    impl ResourceClient for MemoryClient {
        type Resource = Widget;

        async fn get(&self, _reference: &ResourceReference) -> anyhow::Result<Widget> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if self.fail_get {
                anyhow::bail!("connection refused");
            }
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn update(
            &self,
            _reference: &ResourceReference,
            resource: &Widget,
        ) -> anyhow::Result<Widget> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.submitted.lock().unwrap().push(resource.clone());
            *self.stored.lock().unwrap() = resource.clone();
            Ok(resource.clone())
        }
    }

    struct Resize {
        size: Option<i64>,
    }

    impl MutationPolicy<Widget> for Resize {
        fn is_empty(&self) -> bool {
            self.size.is_none()
        }

        fn precheck(&self) -> Result<(), UpdateError> {
            match self.size {
                Some(size) if size < 0 => Err(UpdateError::invalid_value(
                    "--size",
                    "must be non-negative",
                )),
                _ => Ok(()),
            }
        }

        fn apply(&self, original: &Widget, replacement: &mut Widget) -> Result<(), UpdateError> {
            // Shrinking below the original clears the label
            if let Some(size) = self.size {
                if original.size.is_some_and(|s| size < s) {
                    replacement.label = None;
                }
                replacement.size = Some(size);
            }
            Ok(())
        }
    }

    fn reference() -> ResourceReference {
        ResourceReference::new("p", Scope::Global, "widgets", "w")
    }

    fn widget() -> Widget {
        Widget {
            label: Some("blue".to_string()),
            size: Some(10),
        }
    }

    #[tokio::test]
    async fn test_empty_request_makes_no_calls() {
        let client = MemoryClient::new(widget());
        let result = ResourceUpdater::new(&client)
            .update(&reference(), &Resize { size: None })
            .await;

        assert!(matches!(result, Err(UpdateError::NoFieldsSpecified)));
        assert_eq!(client.calls(), (0, 0));
    }

    #[tokio::test]
    async fn test_precheck_runs_before_fetch() {
        let client = MemoryClient::new(widget());
        let result = ResourceUpdater::new(&client)
            .update(&reference(), &Resize { size: Some(-1) })
            .await;

        assert!(matches!(result, Err(UpdateError::InvalidValue { .. })));
        assert_eq!(client.calls(), (0, 0));
    }

    #[tokio::test]
    async fn test_update_writes_mutated_copy() {
        let client = MemoryClient::new(widget());
        let outcome = ResourceUpdater::new(&client)
            .update(&reference(), &Resize { size: Some(4) })
            .await
            .unwrap();

        assert!(outcome.is_updated());
        assert_eq!(
            outcome.resource(),
            &Widget {
                label: None,
                size: Some(4)
            }
        );
        assert_eq!(client.calls(), (1, 1));
    }

    #[tokio::test]
    async fn test_unchanged_resource_is_not_written() {
        let client = MemoryClient::new(widget());
        let outcome = ResourceUpdater::new(&client)
            .update(&reference(), &Resize { size: Some(10) })
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Unchanged(widget()));
        assert_eq!(client.calls(), (1, 0));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_remote_and_skips_write() {
        let mut client = MemoryClient::new(widget());
        client.fail_get = true;

        let err = ResourceUpdater::new(&client)
            .update(&reference(), &Resize { size: Some(4) })
            .await
            .unwrap_err();

        assert!(err.is_remote());
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(client.calls(), (1, 0));
    }

    #[tokio::test]
    async fn test_growing_keeps_label() {
        let client = MemoryClient::new(widget());
        let updater = ResourceUpdater::new(&client);

        updater
            .update(&reference(), &Resize { size: Some(12) })
            .await
            .unwrap();
        let submitted = client.submitted.lock().unwrap().clone();
        assert_eq!(submitted[0].label.as_deref(), Some("blue"));
        assert_eq!(submitted[0].size, Some(12));
    }
}
