//! Intake module
//!
//! HTTP client for the hosted form-processing endpoint.

mod client;

use std::future::Future;

use serde_json::Value;

pub use client::{IntakeClient, IntakeError};

/// Something that accepts a contact-form payload.
pub trait FormIntake: Send + Sync {
    fn submit(&self, payload: &Value) -> impl Future<Output = Result<(), IntakeError>> + Send;
}
