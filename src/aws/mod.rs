//! AWS provider module
//!
//! Everything that talks to (or stands in for) the EC2 API.
//!
//! # Module Structure
//!
//! - [`model`] - Typed `DescribeInstances` / `DescribeSecurityGroups` shapes
//! - [`provider`] - The [`Ec2Provider`] trait and [`ProviderError`]
//! - [`cli`] - Backend that shells out to the `aws` CLI
//! - [`http`] - Backend that reads an inventory HTTP endpoint
//! - [`profile`] - Region and profile discovery
//!
//! # Example
//!
//! ```ignore
//! use awscheck::aws::{AwsCliProvider, Ec2Provider};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let provider = AwsCliProvider::new(Some("us-east-1"), None);
//!     let instances = provider.list_instances().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod http;
pub mod model;
pub mod profile;
pub mod provider;

pub use cli::AwsCliProvider;
pub use http::{format_provider_error, HttpProvider};
pub use provider::{Ec2Provider, ProviderError};
