//! Compute Engine backend services
//!
//! - [`types`] - Typed `BackendService` and `Backend` resources
//! - [`channel`] - Per-channel capability tables
//! - [`update_service`] - Policy for `backend-services update`
//! - [`update_backend`] - Policy for `backend-services update-backend`
//! - [`client`] - Get/Update RPCs, waiting on the returned operation

pub mod channel;
pub mod client;
pub mod types;
pub mod update_backend;
pub mod update_service;

pub use channel::{Channel, ChannelCapabilities, UpdateOption};
pub use client::BackendServiceClient;
pub use types::{Backend, BackendField, BackendService, BalancingMode};
pub use update_backend::{BackendMutation, CapacityLimit, UpdateBackendPolicy};
pub use update_service::{BackendServiceMutation, UpdateServicePolicy};
