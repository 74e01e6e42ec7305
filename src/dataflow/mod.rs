//! Dataflow job control and inspection

pub mod client;
pub mod types;

pub use client::DataflowClient;
pub use types::{
    Importance, Job, JobMessage, JobMetrics, JobView, MessageFilter, RequestedState,
};
