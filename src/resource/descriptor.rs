//! Resource descriptors
//!
//! A descriptor owns one fetched resource description together with the tag
//! index derived from it. Both are replaced as a pair on every successful
//! describe, and left untouched when a describe fails.

use super::fields::{FieldTable, ResolveError};
use super::instance::InstanceKind;
use super::kind::ResourceKind;
use super::security_group::SecurityGroupKind;
use super::tags::TagIndex;
use crate::aws::model::Tag;
use crate::aws::provider::{Ec2Provider, ProviderError};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// How a test locates its resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    ById(String),
    ByName(String),
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::ById(id) => write!(f, "id `{}`", id),
            Query::ByName(name) => write!(f, "name `{}`", name),
        }
    }
}

/// Why a describe call failed
#[derive(Debug, Error)]
pub enum DescribeError {
    #[error("no {kind} found with {query}")]
    NotFound { kind: ResourceKind, query: Query },
    #[error("{} {kind} resources share the name `{name}`: {}", .ids.len(), .ids.join(", "))]
    AmbiguousMatch {
        kind: ResourceKind,
        name: String,
        ids: Vec<String>,
    },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Static description of one resource kind
pub trait KindDef: Send + Sync + 'static {
    type Description: Send + Sync + 'static;

    const KIND: ResourceKind;
    /// Take the display name from the `Name` tag after a describe
    const BACKFILL_NAME: bool;

    /// Accessor table for field assertions
    fn fields() -> &'static FieldTable<Self::Description>;

    fn id(description: &Self::Description) -> Option<&str>;

    fn tags(description: &Self::Description) -> &[Tag];

    /// One provider query filtered by identifier
    fn fetch_by_id<'a>(
        provider: &'a dyn Ec2Provider,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Self::Description>, ProviderError>>;

    /// One unfiltered provider query
    fn fetch_all<'a>(
        provider: &'a dyn Ec2Provider,
    ) -> BoxFuture<'a, Result<Vec<Self::Description>, ProviderError>>;
}

/// The description and its tag index, always replaced together
#[derive(Debug, Clone)]
struct Snapshot<D> {
    description: D,
    tags: TagIndex,
}

/// Capabilities the validator and runner need from any resource kind
#[async_trait]
pub trait ResourceDescriptor: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Human name: the requested name, or the `Name` tag once back-filled
    fn display_name(&self) -> Option<&str>;

    fn resource_id(&self) -> Option<&str>;

    fn is_described(&self) -> bool;

    /// Resolve a field path against the current description
    fn resolve_field(&self, path: &str) -> Result<String, ResolveError>;

    /// Tag value, empty when missing or not yet described
    fn tag(&self, key: &str) -> String;

    async fn describe_by_id(
        &mut self,
        provider: &dyn Ec2Provider,
        id: &str,
    ) -> Result<(), DescribeError>;

    async fn describe_by_name(
        &mut self,
        provider: &dyn Ec2Provider,
        name: &str,
    ) -> Result<(), DescribeError>;

    /// Describe using whichever mode `query` selects
    async fn describe(
        &mut self,
        provider: &dyn Ec2Provider,
        query: &Query,
    ) -> Result<(), DescribeError> {
        match query {
            Query::ById(id) => self.describe_by_id(provider, id).await,
            Query::ByName(name) => self.describe_by_name(provider, name).await,
        }
    }
}

/// Descriptor for resource kind `K`
pub struct Descriptor<K: KindDef> {
    name: Option<String>,
    resource_id: Option<String>,
    snapshot: Option<Snapshot<K::Description>>,
    _kind: PhantomData<K>,
}

pub type InstanceDescriptor = Descriptor<InstanceKind>;
pub type SecurityGroupDescriptor = Descriptor<SecurityGroupKind>;

impl<K: KindDef> Default for Descriptor<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KindDef> Descriptor<K> {
    pub fn new() -> Self {
        Self {
            name: None,
            resource_id: None,
            snapshot: None,
            _kind: PhantomData,
        }
    }

    /// Build a descriptor around an already fetched description
    pub fn from_description(description: K::Description) -> Self {
        let tags = TagIndex::build(K::tags(&description));
        let mut descriptor = Self::new();
        descriptor.store(description, tags, None);
        descriptor
    }

    pub fn description(&self) -> Option<&K::Description> {
        self.snapshot.as_ref().map(|s| &s.description)
    }

    pub fn tags(&self) -> Option<&TagIndex> {
        self.snapshot.as_ref().map(|s| &s.tags)
    }

    /// Replace the snapshot; the display name always follows the new resource
    fn store(
        &mut self,
        description: K::Description,
        tags: TagIndex,
        requested: Option<&str>,
    ) {
        self.resource_id = K::id(&description).map(str::to_string);

        self.name = match tags.name() {
            Some(name) if K::BACKFILL_NAME => Some(name.to_string()),
            _ => requested.map(str::to_string),
        };

        self.snapshot = Some(Snapshot { description, tags });
    }
}

#[async_trait]
impl<K: KindDef> ResourceDescriptor for Descriptor<K> {
    fn kind(&self) -> ResourceKind {
        K::KIND
    }

    fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    fn is_described(&self) -> bool {
        self.snapshot.is_some()
    }

    fn resolve_field(&self, path: &str) -> Result<String, ResolveError> {
        let snapshot = self.snapshot.as_ref().ok_or(ResolveError::NotDescribed)?;
        K::fields().resolve(&snapshot.description, path)
    }

    fn tag(&self, key: &str) -> String {
        self.snapshot
            .as_ref()
            .map(|s| s.tags.lookup(key))
            .unwrap_or_default()
    }

    async fn describe_by_id(
        &mut self,
        provider: &dyn Ec2Provider,
        id: &str,
    ) -> Result<(), DescribeError> {
        tracing::info!("Describing {} by id {} via {}", K::KIND, id, provider.name());

        let mut found = K::fetch_by_id(provider, id).await?;
        tracing::debug!("Provider returned {} {} resources", found.len(), K::KIND);

        let targeted = found.len() == 1 && K::id(&found[0]) == Some(id);
        if !targeted {
            return Err(DescribeError::NotFound {
                kind: K::KIND,
                query: Query::ById(id.to_string()),
            });
        }

        let description = found.remove(0);
        let tags = TagIndex::build(K::tags(&description));
        self.store(description, tags, None);

        Ok(())
    }

    async fn describe_by_name(
        &mut self,
        provider: &dyn Ec2Provider,
        name: &str,
    ) -> Result<(), DescribeError> {
        tracing::info!(
            "Describing {} by name {} via {}",
            K::KIND,
            name,
            provider.name()
        );

        let candidates = K::fetch_all(provider).await?;
        tracing::debug!("Scanning {} {} resources", candidates.len(), K::KIND);

        let mut matches: Vec<(K::Description, TagIndex)> = candidates
            .into_iter()
            .filter_map(|description| {
                let tags = TagIndex::build(K::tags(&description));
                (tags.name() == Some(name)).then_some((description, tags))
            })
            .collect();

        match matches.len() {
            0 => Err(DescribeError::NotFound {
                kind: K::KIND,
                query: Query::ByName(name.to_string()),
            }),
            1 => {
                if let Some((description, tags)) = matches.pop() {
                    self.store(description, tags, Some(name));
                }
                Ok(())
            }
            _ => Err(DescribeError::AmbiguousMatch {
                kind: K::KIND,
                name: name.to_string(),
                ids: matches
                    .iter()
                    .map(|(description, _)| K::id(description).unwrap_or("-").to_string())
                    .collect(),
            }),
        }
    }
}

/// Create an empty descriptor for `kind`
pub fn new_descriptor(kind: ResourceKind) -> Box<dyn ResourceDescriptor> {
    match kind {
        ResourceKind::Instance => Box::new(InstanceDescriptor::new()),
        ResourceKind::SecurityGroup => Box::new(SecurityGroupDescriptor::new()),
    }
}

/// Field paths recognised for `kind`
pub fn field_paths(kind: ResourceKind) -> Vec<&'static str> {
    match kind {
        ResourceKind::Instance => InstanceKind::fields().paths(),
        ResourceKind::SecurityGroup => SecurityGroupKind::fields().paths(),
    }
}
