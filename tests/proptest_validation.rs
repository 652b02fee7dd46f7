//! Property-based tests using proptest
//!
//! These tests check tag indexing, result counts, and resolver determinism
//! over randomized resources and assertion sets.

use async_trait::async_trait;
use awscheck::aws::model::{Instance, InstanceNetworkInterface, Placement, SecurityGroup, Tag};
use awscheck::aws::{Ec2Provider, ProviderError};
use awscheck::resource::{
    new_descriptor, InstanceDescriptor, Query, ResourceDescriptor, ResourceKind, TagIndex,
};
use awscheck::validation::{validate_fields, validate_tags, Assertions};
use proptest::prelude::*;
use std::collections::HashMap;

/// Provider answering from a fixed instance list
struct FixedProvider {
    instances: Vec<Instance>,
}

#[async_trait]
impl Ec2Provider for FixedProvider {
    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<Instance>, ProviderError> {
        Ok(self
            .instances
            .iter()
            .filter(|i| ids.is_empty() || i.instance_id.as_ref().is_some_and(|id| ids.contains(id)))
            .cloned()
            .collect())
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, ProviderError> {
        Ok(self.instances.clone())
    }

    async fn describe_security_groups(
        &self,
        _ids: &[String],
    ) -> Result<Vec<SecurityGroup>, ProviderError> {
        Ok(Vec::new())
    }

    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, ProviderError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Small key space so duplicates are common
fn arb_tags() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(
        (
            prop_oneof!["Name", "Environment", "Team", "Owner"],
            "[a-z0-9-]{0,12}",
        ),
        0..20,
    )
}

fn arb_instance() -> impl Strategy<Value = Instance> {
    (
        "i-[0-9a-f]{8}",
        prop_oneof!["t3.micro", "t3.large", "m5.xlarge", "c6g.medium"],
        prop::option::of("[a-z]{2}-[a-z]+-[1-3][a-c]"),
        prop::collection::vec("10\\.0\\.[0-9]{1,3}\\.[0-9]{1,3}", 0..4),
        arb_tags(),
    )
        .prop_map(|(id, instance_type, zone, ips, tags)| Instance {
            instance_id: Some(id),
            instance_type: Some(instance_type.to_string()),
            placement: zone.map(|z| Placement {
                availability_zone: Some(z),
                ..Default::default()
            }),
            network_interfaces: Some(
                ips.into_iter()
                    .map(|ip| InstanceNetworkInterface {
                        private_ip_address: Some(ip),
                        ..Default::default()
                    })
                    .collect(),
            ),
            tags: Some(tags.iter().map(|(k, v)| Tag::new(k, v)).collect()),
            ..Default::default()
        })
}

/// Mix of valid, absent, indexed, and unknown paths
fn arb_assertions() -> impl Strategy<Value = Assertions> {
    prop::collection::vec(
        (
            prop_oneof![
                Just("InstanceType".to_string()),
                Just("InstanceId".to_string()),
                Just("Placement.AvailabilityZone".to_string()),
                Just("Placement".to_string()),
                Just("NetworkInterfaces.PrivateIpAddress".to_string()),
                (0usize..6).prop_map(|i| format!("NetworkInterfaces.{i}.PrivateIpAddress")),
                "[A-Z][a-zA-Z]{0,10}(\\.[A-Z][a-zA-Z]{0,6}){0,2}",
            ],
            "[a-z0-9.-]{0,10}",
        ),
        0..12,
    )
    .prop_map(|pairs| pairs.into_iter().collect())
}

proptest! {
    /// The last value written for a key wins
    #[test]
    fn tag_index_last_writer_wins(pairs in arb_tags()) {
        let tags: Vec<Tag> = pairs.iter().map(|(k, v)| Tag::new(k, v)).collect();
        let index = TagIndex::build(&tags);

        let mut expected = HashMap::new();
        for (k, v) in &pairs {
            expected.insert(k.clone(), v.clone());
        }

        prop_assert_eq!(index.len(), expected.len());
        for (k, v) in &expected {
            prop_assert_eq!(&index.lookup(k), v);
        }
        prop_assert_eq!(index.lookup("NeverSet"), "");
    }

    /// One result per assertion, whatever the paths look like
    #[test]
    fn one_result_per_assertion(
        instance in arb_instance(),
        fields in arb_assertions(),
        tags in arb_assertions(),
    ) {
        let descriptor = InstanceDescriptor::from_description(instance);

        let field_results = validate_fields(&descriptor, &fields);
        let tag_results = validate_tags(&descriptor, &tags);

        prop_assert_eq!(field_results.len(), fields.len());
        prop_assert_eq!(tag_results.len(), tags.len());
        for result in field_results.iter().chain(&tag_results) {
            let expected_match = result.error.is_none() && result.actual == result.expected;
            prop_assert_eq!(result.matched, expected_match);
            if result.error.is_some() {
                prop_assert_eq!(&result.actual, "");
            }
        }
    }

    /// Validating fields twice yields the same outcomes
    #[test]
    fn field_validation_is_idempotent(instance in arb_instance(), fields in arb_assertions()) {
        let descriptor = InstanceDescriptor::from_description(instance);

        let first = validate_fields(&descriptor, &fields);
        let second = validate_fields(&descriptor, &fields);

        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            prop_assert_eq!(&a.name, &b.name);
            prop_assert_eq!(&a.actual, &b.actual);
            prop_assert_eq!(a.matched, b.matched);
            prop_assert_eq!(&a.error, &b.error);
        }
    }

    /// Validating tags twice yields the same outcomes
    #[test]
    fn tag_validation_is_idempotent(instance in arb_instance(), tags in arb_assertions()) {
        let descriptor = InstanceDescriptor::from_description(instance);

        let first = validate_tags(&descriptor, &tags);
        let second = validate_tags(&descriptor, &tags);

        prop_assert_eq!(first.len(), second.len());
        prop_assert_eq!(first.len(), tags.len());
        for (a, b) in first.iter().zip(&second) {
            prop_assert_eq!(&a.name, &b.name);
            prop_assert_eq!(&a.actual, &b.actual);
            prop_assert_eq!(a.matched, b.matched);
            prop_assert_eq!(&a.error, &b.error);
        }
    }

    /// Out-of-range list indices resolve to empty text, never an error
    #[test]
    fn out_of_range_index_is_empty(instance in arb_instance(), extra in 0usize..10) {
        let count = instance.network_interfaces.as_ref().map_or(0, Vec::len);
        let descriptor = InstanceDescriptor::from_description(instance);

        let path = format!("NetworkInterfaces.{}.PrivateIpAddress", count + extra);
        prop_assert_eq!(descriptor.resolve_field(&path), Ok(String::new()));
    }

    /// Describing by id or by name yields the same resolved values
    #[test]
    fn describe_modes_agree(instance in arb_instance(), fields in arb_assertions()) {
        let id = instance.instance_id.clone().unwrap_or_default();
        let name = TagIndex::build(instance.tags.as_deref().unwrap_or_default())
            .name()
            .map(str::to_string);
        let provider = FixedProvider { instances: vec![instance] };

        let mut by_id = new_descriptor(ResourceKind::Instance);
        tokio_test::block_on(by_id.describe(&provider, &Query::ById(id))).unwrap();

        if let Some(name) = name {
            let mut by_name = new_descriptor(ResourceKind::Instance);
            tokio_test::block_on(by_name.describe(&provider, &Query::ByName(name))).unwrap();

            for path in fields.keys() {
                prop_assert_eq!(by_id.resolve_field(path), by_name.resolve_field(path));
            }
            prop_assert_eq!(by_id.display_name(), by_name.display_name());
        }
    }
}
