use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use super::responses::{
    Ack, ServerDeactivateResponse, ServerErrorResponse, ServerListResponse, ServerStatsResponse,
};
use super::{DeactivateForm, GenerateKeyRequest, KeyService, VerifyKeyRequest};
use crate::config::ConsoleConfig;
use crate::errors::{ConsoleError, ConsoleResult};
use crate::models::{ActivationRecord, CustomerStats, GeneratedKey, Health, ServiceInfo, Verification};

/// Header carrying the per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `KeyService` backed by the service's REST API.
#[derive(Debug, Clone)]
pub struct HttpKeyService {
    client: Client,
    base_url: Url,
}

impl HttpKeyService {
    /// Build a client for the service at `base_url`.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> ConsoleResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ConsoleError::Config(format!("invalid api url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ConsoleError::Config(format!(
                "api url '{base_url}' cannot carry a path"
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn from_config(config: &ConsoleConfig) -> ConsoleResult<Self> {
        Self::new(&config.api.url, config.http.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    /// Send a request and decode a 2xx JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &'static str,
    ) -> ConsoleResult<T> {
        let request_id = Uuid::new_v4();
        let span = info_span!("key_service", endpoint, request_id = %request_id);

        async move {
            let resp = request
                .header(REQUEST_ID_HEADER, request_id.to_string())
                .send()
                .await?;

            let status = resp.status();
            let body = resp.bytes().await?;
            debug!(status = status.as_u16(), bytes = body.len(), "Response received");

            if !status.is_success() {
                let detail = serde_json::from_slice::<ServerErrorResponse>(&body)
                    .map(|e| e.detail_text())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_string());
                return Err(ConsoleError::Server {
                    status: status.as_u16(),
                    detail,
                });
            }

            serde_json::from_slice(&body)
                .map_err(|e| ConsoleError::Decode(format!("{endpoint}: {e}")))
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl KeyService for HttpKeyService {
    async fn generate(&self, request: &GenerateKeyRequest) -> ConsoleResult<GeneratedKey> {
        let req = self
            .client
            .post(self.endpoint(&["generate-key"]))
            .json(request);
        self.send(req, "generate-key").await
    }

    async fn verify(&self, request: &VerifyKeyRequest) -> ConsoleResult<Verification> {
        let req = self.client.post(self.endpoint(&["verify-key"])).json(request);
        self.send(req, "verify-key").await
    }

    async fn list_all(&self) -> ConsoleResult<Vec<ActivationRecord>> {
        let req = self.client.get(self.endpoint(&["get-all-keys"]));
        let resp: ServerListResponse = self.send(req, "get-all-keys").await?;
        Ok(resp.activations)
    }

    async fn deactivate(&self, activation_key: &str) -> ConsoleResult<Ack> {
        let req = self
            .client
            .post(self.endpoint(&["deactivate-key"]))
            .form(&DeactivateForm { activation_key });
        let resp: ServerDeactivateResponse = self.send(req, "deactivate-key").await?;
        Ok(resp.into())
    }

    async fn customer_stats(&self, email: &str) -> ConsoleResult<Option<CustomerStats>> {
        let req = self.client.get(self.endpoint(&["customer-stats", email]));
        let resp: ServerStatsResponse = self.send(req, "customer-stats").await?;
        Ok(resp.stats.into_stats())
    }

    async fn health(&self) -> ConsoleResult<Health> {
        let req = self.client.get(self.endpoint(&["health"]));
        self.send(req, "health").await
    }

    async fn service_info(&self) -> ConsoleResult<ServiceInfo> {
        let req = self.client.get(self.endpoint(&[]));
        self.send(req, "root").await
    }
}
