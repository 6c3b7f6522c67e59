pub mod client;
pub mod messages;

use crate::error::TransportError;
use async_trait::async_trait;

pub use client::ApiClient;
pub use messages::{AuditRequest, AuditResponse, CipherDescriptor, CUSTOM_CIPHER_ID};

/// The two backend calls the session needs.
#[async_trait]
pub trait AuditBackend: Send + Sync {
    async fn list_ciphers(&self) -> Result<Vec<CipherDescriptor>, TransportError>;

    async fn submit_audit(&self, request: &AuditRequest) -> Result<AuditResponse, TransportError>;
}
