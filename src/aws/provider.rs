//! Provider boundary
//!
//! The describe calls the resource engine needs from EC2, behind a trait so
//! the backend (AWS CLI, inventory endpoint, test double) is injected by the
//! caller.

use super::model::{Instance, SecurityGroup};
use async_trait::async_trait;
use thiserror::Error;

/// Failure of the provider call itself (transport, auth, decoding)
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("API request failed: {status}")]
    Status { status: u16 },
    #[error("failed to parse provider response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid provider endpoint: {0}")]
    Endpoint(String),
}

/// EC2 describe operations
///
/// An empty vector from the `describe_*` calls means nothing matched the
/// identifiers; it is not an error.
#[async_trait]
pub trait Ec2Provider: Send + Sync {
    /// Describe instances filtered by identifier
    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<Instance>, ProviderError>;

    /// Describe every instance visible to the caller
    async fn list_instances(&self) -> Result<Vec<Instance>, ProviderError>;

    /// Describe security groups filtered by identifier
    async fn describe_security_groups(
        &self,
        ids: &[String],
    ) -> Result<Vec<SecurityGroup>, ProviderError>;

    /// Describe every security group visible to the caller
    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, ProviderError>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}
