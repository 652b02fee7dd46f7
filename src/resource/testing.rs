//! In-memory provider for unit tests

use crate::aws::model::{Instance, SecurityGroup};
use crate::aws::provider::{Ec2Provider, ProviderError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) struct StaticProvider {
    instances: Vec<Instance>,
    groups: Vec<SecurityGroup>,
    fail: bool,
    ignore_filters: bool,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub(crate) fn new(instances: Vec<Instance>, groups: Vec<SecurityGroup>) -> Self {
        Self {
            instances,
            groups,
            fail: false,
            ignore_filters: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with a provider error
    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Filtered calls return the whole inventory
    pub(crate) fn ignoring_filters(mut self) -> Self {
        self.ignore_filters = true;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Status { status: 503 });
        }
        Ok(())
    }
}

#[async_trait]
impl Ec2Provider for StaticProvider {
    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<Instance>, ProviderError> {
        self.record()?;
        Ok(self
            .instances
            .iter()
            .filter(|i| {
                self.ignore_filters
                    || ids.is_empty()
                    || i.instance_id.as_ref().is_some_and(|id| ids.contains(id))
            })
            .cloned()
            .collect())
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, ProviderError> {
        self.describe_instances(&[]).await
    }

    async fn describe_security_groups(
        &self,
        ids: &[String],
    ) -> Result<Vec<SecurityGroup>, ProviderError> {
        self.record()?;
        Ok(self
            .groups
            .iter()
            .filter(|g| {
                self.ignore_filters
                    || ids.is_empty()
                    || g.group_id.as_ref().is_some_and(|id| ids.contains(id))
            })
            .cloned()
            .collect())
    }

    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, ProviderError> {
        self.describe_security_groups(&[]).await
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
