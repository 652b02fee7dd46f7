//! Inventory endpoint backend
//!
//! Reads describe-shaped JSON from an HTTP inventory service that mirrors
//! `DescribeInstances` / `DescribeSecurityGroups` output.

use super::model::{
    DescribeInstancesOutput, DescribeSecurityGroupsOutput, Instance, SecurityGroup,
};
use super::provider::{Ec2Provider, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and drops non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let kept: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", kept, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Provider backed by an inventory HTTP endpoint
#[derive(Clone)]
pub struct HttpProvider {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpProvider {
    /// Create a provider rooted at `endpoint`
    pub fn new(endpoint: &str, token: Option<&str>) -> Result<Self, ProviderError> {
        let mut base =
            Url::parse(endpoint).map_err(|e| ProviderError::Endpoint(format!("{endpoint}: {e}")))?;

        // Join relative paths under the endpoint rather than replacing its last segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(concat!("awscheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ProviderError::Transport {
                url: endpoint.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base,
            token: token.map(str::to_string),
        })
    }

    /// Build the collection URL with identifier filters
    fn collection_url(
        &self,
        collection: &str,
        param: &str,
        ids: &[String],
    ) -> Result<Url, ProviderError> {
        let mut url = self
            .base
            .join(collection)
            .map_err(|e| ProviderError::Endpoint(format!("{collection}: {e}")))?;

        if !ids.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for id in ids {
                pairs.append_pair(param, id);
            }
        }

        Ok(url)
    }

    /// GET a collection and decode it
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ProviderError> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| ProviderError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ProviderError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Ec2Provider for HttpProvider {
    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<Instance>, ProviderError> {
        let url = self.collection_url("instances", "InstanceId", ids)?;
        let output: DescribeInstancesOutput = self.get(url).await?;
        Ok(output.into_instances())
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, ProviderError> {
        self.describe_instances(&[]).await
    }

    async fn describe_security_groups(
        &self,
        ids: &[String],
    ) -> Result<Vec<SecurityGroup>, ProviderError> {
        let url = self.collection_url("security-groups", "GroupId", ids)?;
        let output: DescribeSecurityGroupsOutput = self.get(url).await?;
        Ok(output.security_groups)
    }

    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, ProviderError> {
        self.describe_security_groups(&[]).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Format a provider error for display
pub fn format_provider_error(error: &ProviderError) -> String {
    match error {
        ProviderError::Status { status: 401 } => {
            "Authentication failed. Check the endpoint token.".to_string()
        }
        ProviderError::Status { status: 403 } => {
            "Permission denied. Check your IAM permissions.".to_string()
        }
        ProviderError::Status { status: 404 } => "Inventory endpoint not found.".to_string(),
        ProviderError::Status { status: 429 } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        ProviderError::Status { status } if *status >= 500 => {
            "Provider temporarily unavailable. Please try again.".to_string()
        }
        other => {
            let text = other.to_string();
            let sanitized: String = text
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(160)
                .collect();
            if sanitized.len() < text.len() {
                format!("{}...", sanitized)
            } else {
                sanitized
            }
        }
    }
}
