//! Response envelopes of the activation key service.
//!
//! The service wraps most payloads in `{"success": true, ...}`. These types
//! match that JSON so it can be unwrapped into the crate's models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{null_as_default, ActivationRecord, AppName, CustomerInfo, CustomerStats, KeyCounts};

/// Acknowledgement of a state-changing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

/// Server response for `GET /get-all-keys`.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub(crate) struct ServerListResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub activations: Vec<ActivationRecord>,
    #[serde(default)]
    pub count: usize,
}

/// Server response for `POST /deactivate-key`.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub(crate) struct ServerDeactivateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl From<ServerDeactivateResponse> for Ack {
    fn from(resp: ServerDeactivateResponse) -> Self {
        Self {
            message: resp.message,
        }
    }
}

/// Server response for `GET /customer-stats/{email}`.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub(crate) struct ServerStatsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub customer_email: String,
    pub stats: ServerStatsBody,
}

/// The `stats` object; either the aggregates or `{"error": "..."}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ServerStatsBody {
    pub error: Option<String>,
    pub total_keys: u32,
    pub active_keys: u32,
    pub expired_keys: u32,
    pub deactivated_keys: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub apps: BTreeMap<AppName, KeyCounts>,
    #[serde(deserialize_with = "null_as_default")]
    pub customer_info: CustomerInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub activations: Vec<ActivationRecord>,
}

impl ServerStatsBody {
    /// Convert into `CustomerStats`, or `None` when the customer is unknown.
    pub fn into_stats(self) -> Option<CustomerStats> {
        if self.error.is_some() || self.total_keys == 0 {
            return None;
        }

        let mut activations = self.activations;
        // Records without a creation time sort first.
        activations.sort_by_key(|record| record.created_at);

        Some(CustomerStats {
            customer: (!self.customer_info.is_empty()).then_some(self.customer_info),
            totals: KeyCounts {
                total: self.total_keys,
                active: self.active_keys,
                expired: self.expired_keys,
                deactivated: self.deactivated_keys,
            },
            apps: self.apps,
            activations,
        })
    }
}

/// Error body produced by the service for non-2xx answers.
///
/// `detail` is a string for application errors and a list of objects for
/// request validation failures.
#[derive(Debug, Deserialize)]
pub(crate) struct ServerErrorResponse {
    pub detail: serde_json::Value,
}

impl ServerErrorResponse {
    pub fn detail_text(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.get("msg")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| item.to_string())
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}
