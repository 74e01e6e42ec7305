//! GCP API interaction module
//!
//! This module provides the core functionality for interacting with Google Cloud Platform
//! APIs: authentication, the HTTP client, and Compute operation polling.
//!
//! # Module Structure
//!
//! - [`auth`] - GCP authentication and gcloud default discovery
//! - [`client`] - Main GCP client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`operations`] - Waiting on Compute Engine operations
//!
//! # Example
//!
//! ```ignore
//! use crate::gcp::client::{Endpoints, GcpClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new("my-project", Endpoints::default()).await?;
//!     let service = client
//!         .get(&client.compute_url("v1", "global/backendServices/web"))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod operations;
