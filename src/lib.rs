//! Declarative verifier for live EC2 resource state.
//!
//! A suite names resources (instances and security groups, found by id or by
//! `Name` tag) together with the field and tag values they must carry. The
//! runner describes each resource through an [`aws::Ec2Provider`] and reports
//! one [`validation::ValidationResult`] per assertion.

pub mod aws;
pub mod config;
pub mod report;
pub mod resource;
pub mod suite;
pub mod validation;
