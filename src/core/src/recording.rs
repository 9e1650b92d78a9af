//! Cloud-recording proxy
//!
//! Components:
//! - `types`: inbound request bodies and the remote response wrapper.
//! - `payload`: outbound bodies and paths with the fixed recording parameters.
//! - `client`: the `RecordingApi` trait and its reqwest implementation.
//! - `proxy`: request translation, logging and retries.

pub mod client;
pub mod payload;
pub mod proxy;
pub mod types;

#[cfg(test)]
pub mod stub;

pub use client::{HttpRecordingApi, RecordingApi};
pub use proxy::{RecordingProxy, RetryPolicy};
pub use types::*;
