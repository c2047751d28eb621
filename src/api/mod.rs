//! Client side of the activation key service.
//!
//! - `KeyService`  → the operations the console depends on
//! - `http`        → reqwest implementation of `KeyService`
//! - `responses`   → wire envelopes returned by the service

pub mod http;
pub mod responses;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::ConsoleResult;
use crate::models::{ActivationRecord, AppName, CustomerStats, GeneratedKey, Health, ServiceInfo, Verification};

pub use http::HttpKeyService;
pub use responses::Ack;

/// Payload for `POST /generate-key`.
///
/// Leaving `validity_days` unset requests a key that never expires; the field
/// is then omitted from the JSON body entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateKeyRequest {
    pub system_id: String,
    pub app_name: AppName,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_mobile: Option<String>,
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_days: Option<u32>,
}

/// Payload for `POST /verify-key`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyKeyRequest {
    pub system_id: String,
    pub activation_key: String,
    pub app_name: AppName,
}

/// Form body for `POST /deactivate-key`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DeactivateForm<'a> {
    pub activation_key: &'a str,
}

/// Operations offered by the activation key service.
///
/// Key derivation, expiry computation and storage all happen behind this
/// interface.
#[async_trait]
pub trait KeyService: Send + Sync {
    /// Issue a new key.
    async fn generate(&self, request: &GenerateKeyRequest) -> ConsoleResult<GeneratedKey>;

    /// Check a key against a system id and application.
    async fn verify(&self, request: &VerifyKeyRequest) -> ConsoleResult<Verification>;

    /// Every activation record the service knows about.
    async fn list_all(&self) -> ConsoleResult<Vec<ActivationRecord>>;

    /// Mark a key inactive.
    async fn deactivate(&self, activation_key: &str) -> ConsoleResult<Ack>;

    /// Statistics for one customer, or `None` if the service has no keys for them.
    async fn customer_stats(&self, email: &str) -> ConsoleResult<Option<CustomerStats>>;

    async fn health(&self) -> ConsoleResult<Health>;

    async fn service_info(&self) -> ConsoleResult<ServiceInfo>;
}
