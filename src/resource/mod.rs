//! Resource abstraction layer
//!
//! Turns provider descriptions into something assertions can be checked
//! against: a field resolver per resource kind, a tag index, and the
//! descriptor that fetches and holds both.
//!
//! # Architecture
//!
//! - [`fields`] - Dotted field-path parsing and the per-kind accessor tables
//! - [`tags`] - Flat tag key/value index
//! - [`descriptor`] - Describe-by-id / describe-by-name and the
//!   [`ResourceDescriptor`] trait the validator works against
//! - [`instance`], [`security_group`] - The supported resource kinds
//!
//! # Example
//!
//! ```ignore
//! use awscheck::resource::{new_descriptor, Query, ResourceKind};
//!
//! async fn instance_type(provider: &dyn Ec2Provider) -> anyhow::Result<String> {
//!     let mut descriptor = new_descriptor(ResourceKind::Instance);
//!     descriptor.describe(provider, &Query::ByName("web-01".into())).await?;
//!     Ok(descriptor.resolve_field("InstanceType")?)
//! }
//! ```

pub mod descriptor;
pub mod fields;
pub mod instance;
mod kind;
pub mod security_group;
pub mod tags;

#[cfg(test)]
pub(crate) mod testing;

pub use descriptor::{
    field_paths, new_descriptor, DescribeError, Descriptor, InstanceDescriptor, KindDef, Query,
    ResourceDescriptor, SecurityGroupDescriptor,
};
pub use fields::{Attr, FieldPath, FieldTable, ResolveError};
pub use kind::ResourceKind;
pub use tags::{TagIndex, NAME_TAG};
