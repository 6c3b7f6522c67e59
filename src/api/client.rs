use super::messages::{
    AuditRequest, AuditResponse, CipherDescriptor, ErrorBody, HealthResponse,
};
use super::AuditBackend;
use crate::config::ClientConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// HTTP client for the audit backend. Cheap to clone; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::with_base_url(&config.base_url)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, TransportError> {
        let base_url = base_url.trim_end_matches('/');
        // Built without a TLS backend.
        if !base_url.starts_with("http://") {
            return Err(TransportError::Setup(format!(
                "base url must start with http://, got '{base_url}'"
            )));
        }
        let client = Client::builder()
            .build()
            .map_err(|err| TransportError::Setup(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_ciphers(&self) -> Result<Vec<CipherDescriptor>, TransportError> {
        debug!(url = %self.url("/ciphers"), "listing ciphers");
        let response = self
            .client
            .get(self.url("/ciphers"))
            .send()
            .await
            .map_err(TransportError::Network)?;
        decode(response).await
    }

    pub async fn submit_audit(
        &self,
        cipher_id: &str,
        custom_source: &str,
        rounds: u32,
    ) -> Result<AuditResponse, TransportError> {
        let request = AuditRequest::new(cipher_id, custom_source, rounds);
        self.post_audit(&request).await
    }

    pub async fn post_audit(&self, request: &AuditRequest) -> Result<AuditResponse, TransportError> {
        debug!(
            cipher = %request.cipher_id,
            rounds = request.rounds,
            custom = request.custom_code.is_some(),
            "submitting audit"
        );
        let response = self
            .client
            .post(self.url("/audit"))
            .json(request)
            .send()
            .await
            .map_err(TransportError::Network)?;
        decode(response).await
    }

    /// Returns the greeting served at the backend root.
    pub async fn health(&self) -> Result<String, TransportError> {
        let response = self
            .client
            .get(self.url("/"))
            .send()
            .await
            .map_err(TransportError::Network)?;
        let health: HealthResponse = decode(response).await?;
        Ok(health.message)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    if !status.is_success() {
        // An unreadable body just means there is no detail to show.
        let body = response.text().await.unwrap_or_default();
        let detail = ErrorBody::parse(&body);
        warn!(status = status.as_u16(), detail = ?detail, "backend rejected request");
        return Err(TransportError::Status {
            status: status.as_u16(),
            detail,
        });
    }
    response.json::<T>().await.map_err(TransportError::Decode)
}

#[async_trait]
impl AuditBackend for ApiClient {
    async fn list_ciphers(&self) -> Result<Vec<CipherDescriptor>, TransportError> {
        ApiClient::list_ciphers(self).await
    }

    async fn submit_audit(&self, request: &AuditRequest) -> Result<AuditResponse, TransportError> {
        self.post_audit(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = ApiClient::with_base_url("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/ciphers"), "http://localhost:8000/ciphers");
    }

    #[test]
    fn base_url_requires_http_scheme() {
        let err = ApiClient::with_base_url("localhost:8000").unwrap_err();
        assert!(matches!(err, TransportError::Setup(_)));
    }

    #[test]
    fn https_is_rejected_up_front() {
        let err = ApiClient::with_base_url("https://audit.example.org").unwrap_err();
        assert!(matches!(err, TransportError::Setup(_)));
        assert!(err.to_string().contains("http://"), "{err}");
    }
}
