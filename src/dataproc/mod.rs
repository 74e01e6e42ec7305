//! Dataproc job submission
//!
//! Submitting checks that the target cluster exists, then posts a job with a
//! caller-chosen or generated id. Waiting for the job to finish is left to the
//! caller.

pub mod client;
pub mod types;

pub use client::DataprocClient;
pub use types::{Cluster, Job, JobDriver, JobReference, PySparkJob, SparkJob};
