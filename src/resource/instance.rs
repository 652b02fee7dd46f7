//! EC2 instance kind

use super::descriptor::KindDef;
use super::fields::{Attr, FieldTable};
use super::kind::ResourceKind;
use crate::aws::model::{
    BlockDeviceMapping, CpuOptions, EbsInstanceBlockDevice, GroupIdentifier, IamInstanceProfile,
    Instance, InstanceNetworkInterface, InstanceState, MetadataOptions, Monitoring,
    NetworkInterfaceAssociation, NetworkInterfacePrivateIp, Placement, Tag,
};
use crate::aws::provider::{Ec2Provider, ProviderError};
use futures::future::BoxFuture;
use std::sync::OnceLock;

static INSTANCE_FIELDS: OnceLock<FieldTable<Instance>> = OnceLock::new();

/// Marker for the instance kind
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceKind;

impl KindDef for InstanceKind {
    type Description = Instance;

    const KIND: ResourceKind = ResourceKind::Instance;
    const BACKFILL_NAME: bool = true;

    fn fields() -> &'static FieldTable<Instance> {
        INSTANCE_FIELDS.get_or_init(instance_table)
    }

    fn id(description: &Instance) -> Option<&str> {
        description.instance_id.as_deref()
    }

    fn tags(description: &Instance) -> &[Tag] {
        description.tags.as_deref().unwrap_or_default()
    }

    fn fetch_by_id<'a>(
        provider: &'a dyn Ec2Provider,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Instance>, ProviderError>> {
        Box::pin(async move {
            let ids = [id.to_string()];
            provider.describe_instances(&ids).await
        })
    }

    fn fetch_all<'a>(
        provider: &'a dyn Ec2Provider,
    ) -> BoxFuture<'a, Result<Vec<Instance>, ProviderError>> {
        provider.list_instances()
    }
}

fn instance_table() -> FieldTable<Instance> {
    FieldTable::<Instance>::new()
        .scalar("InstanceId", |i| Attr::text(&i.instance_id))
        .scalar("InstanceType", |i| Attr::text(&i.instance_type))
        .scalar("ImageId", |i| Attr::text(&i.image_id))
        .scalar("KeyName", |i| Attr::text(&i.key_name))
        .scalar("LaunchTime", |i| Attr::text(&i.launch_time))
        .scalar("Architecture", |i| Attr::text(&i.architecture))
        .scalar("Platform", |i| Attr::text(&i.platform))
        .scalar("PlatformDetails", |i| Attr::text(&i.platform_details))
        .scalar("Hypervisor", |i| Attr::text(&i.hypervisor))
        .scalar("VirtualizationType", |i| Attr::text(&i.virtualization_type))
        .scalar("PrivateIpAddress", |i| Attr::text(&i.private_ip_address))
        .scalar("PublicIpAddress", |i| Attr::text(&i.public_ip_address))
        .scalar("PrivateDnsName", |i| Attr::text(&i.private_dns_name))
        .scalar("PublicDnsName", |i| Attr::text(&i.public_dns_name))
        .scalar("SubnetId", |i| Attr::text(&i.subnet_id))
        .scalar("VpcId", |i| Attr::text(&i.vpc_id))
        .scalar("RootDeviceName", |i| Attr::text(&i.root_device_name))
        .scalar("RootDeviceType", |i| Attr::text(&i.root_device_type))
        .scalar("AmiLaunchIndex", |i| Attr::display(i.ami_launch_index))
        .scalar("EbsOptimized", |i| Attr::display(i.ebs_optimized))
        .scalar("EnaSupport", |i| Attr::display(i.ena_support))
        .scalar("SourceDestCheck", |i| Attr::display(i.source_dest_check))
        .scalar("StateTransitionReason", |i| {
            Attr::text(&i.state_transition_reason)
        })
        .nested("State", |i| i.state.as_ref(), state_table())
        .nested("Placement", |i| i.placement.as_ref(), placement_table())
        .nested("Monitoring", |i| i.monitoring.as_ref(), monitoring_table())
        .nested(
            "IamInstanceProfile",
            |i| i.iam_instance_profile.as_ref(),
            iam_profile_table(),
        )
        .nested(
            "MetadataOptions",
            |i| i.metadata_options.as_ref(),
            metadata_options_table(),
        )
        .nested("CpuOptions", |i| i.cpu_options.as_ref(), cpu_options_table())
        .list(
            "SecurityGroups",
            |i| i.security_groups.as_deref(),
            group_identifier_table(),
        )
        .list(
            "NetworkInterfaces",
            |i| i.network_interfaces.as_deref(),
            network_interface_table(),
        )
        .list(
            "BlockDeviceMappings",
            |i| i.block_device_mappings.as_deref(),
            block_device_table(),
        )
        .list("Tags", |i| i.tags.as_deref(), tag_table())
}

fn state_table() -> FieldTable<InstanceState> {
    FieldTable::<InstanceState>::new()
        .scalar("Code", |s| Attr::display(s.code))
        .scalar("Name", |s| Attr::text(&s.name))
}

fn placement_table() -> FieldTable<Placement> {
    FieldTable::<Placement>::new()
        .scalar("AvailabilityZone", |p| Attr::text(&p.availability_zone))
        .scalar("GroupName", |p| Attr::text(&p.group_name))
        .scalar("Tenancy", |p| Attr::text(&p.tenancy))
}

fn monitoring_table() -> FieldTable<Monitoring> {
    FieldTable::<Monitoring>::new().scalar("State", |m| Attr::text(&m.state))
}

fn iam_profile_table() -> FieldTable<IamInstanceProfile> {
    FieldTable::<IamInstanceProfile>::new()
        .scalar("Arn", |p| Attr::text(&p.arn))
        .scalar("Id", |p| Attr::text(&p.id))
}

fn metadata_options_table() -> FieldTable<MetadataOptions> {
    FieldTable::<MetadataOptions>::new()
        .scalar("State", |m| Attr::text(&m.state))
        .scalar("HttpTokens", |m| Attr::text(&m.http_tokens))
        .scalar("HttpEndpoint", |m| Attr::text(&m.http_endpoint))
        .scalar("HttpPutResponseHopLimit", |m| {
            Attr::display(m.http_put_response_hop_limit)
        })
        .scalar("InstanceMetadataTags", |m| Attr::text(&m.instance_metadata_tags))
}

fn cpu_options_table() -> FieldTable<CpuOptions> {
    FieldTable::<CpuOptions>::new()
        .scalar("CoreCount", |c| Attr::display(c.core_count))
        .scalar("ThreadsPerCore", |c| Attr::display(c.threads_per_core))
}

fn group_identifier_table() -> FieldTable<GroupIdentifier> {
    FieldTable::<GroupIdentifier>::new()
        .scalar("GroupId", |g| Attr::text(&g.group_id))
        .scalar("GroupName", |g| Attr::text(&g.group_name))
}

fn network_interface_table() -> FieldTable<InstanceNetworkInterface> {
    FieldTable::<InstanceNetworkInterface>::new()
        .scalar("NetworkInterfaceId", |n| Attr::text(&n.network_interface_id))
        .scalar("Description", |n| Attr::text(&n.description))
        .scalar("InterfaceType", |n| Attr::text(&n.interface_type))
        .scalar("MacAddress", |n| Attr::text(&n.mac_address))
        .scalar("OwnerId", |n| Attr::text(&n.owner_id))
        .scalar("PrivateDnsName", |n| Attr::text(&n.private_dns_name))
        .scalar("PrivateIpAddress", |n| Attr::text(&n.private_ip_address))
        .scalar("SourceDestCheck", |n| Attr::display(n.source_dest_check))
        .scalar("Status", |n| Attr::text(&n.status))
        .scalar("SubnetId", |n| Attr::text(&n.subnet_id))
        .scalar("VpcId", |n| Attr::text(&n.vpc_id))
        .nested(
            "Association",
            |n| n.association.as_ref(),
            association_table(),
        )
        .list("Groups", |n| n.groups.as_deref(), group_identifier_table())
        .list(
            "PrivateIpAddresses",
            |n| n.private_ip_addresses.as_deref(),
            private_ip_table(),
        )
}

fn association_table() -> FieldTable<NetworkInterfaceAssociation> {
    FieldTable::<NetworkInterfaceAssociation>::new()
        .scalar("IpOwnerId", |a| Attr::text(&a.ip_owner_id))
        .scalar("PublicDnsName", |a| Attr::text(&a.public_dns_name))
        .scalar("PublicIp", |a| Attr::text(&a.public_ip))
}

fn private_ip_table() -> FieldTable<NetworkInterfacePrivateIp> {
    FieldTable::<NetworkInterfacePrivateIp>::new()
        .scalar("Primary", |p| Attr::display(p.primary))
        .scalar("PrivateDnsName", |p| Attr::text(&p.private_dns_name))
        .scalar("PrivateIpAddress", |p| Attr::text(&p.private_ip_address))
}

fn block_device_table() -> FieldTable<BlockDeviceMapping> {
    FieldTable::<BlockDeviceMapping>::new()
        .scalar("DeviceName", |b| Attr::text(&b.device_name))
        .nested("Ebs", |b| b.ebs.as_ref(), ebs_table())
}

fn ebs_table() -> FieldTable<EbsInstanceBlockDevice> {
    FieldTable::<EbsInstanceBlockDevice>::new()
        .scalar("AttachTime", |e| Attr::text(&e.attach_time))
        .scalar("DeleteOnTermination", |e| Attr::display(e.delete_on_termination))
        .scalar("Status", |e| Attr::text(&e.status))
        .scalar("VolumeId", |e| Attr::text(&e.volume_id))
}

pub(crate) fn tag_table() -> FieldTable<Tag> {
    FieldTable::<Tag>::new()
        .scalar("Key", |t| Attr::text(&t.key))
        .scalar("Value", |t| Attr::text(&t.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::fields::ResolveError;

    fn sample_instance() -> Instance {
        serde_json::from_value(serde_json::json!({
            "InstanceId": "i-0abc",
            "InstanceType": "t3.micro",
            "EbsOptimized": false,
            "State": {"Code": 16, "Name": "running"},
            "Placement": {"AvailabilityZone": "us-east-1a", "Tenancy": "default"},
            "MetadataOptions": {"HttpTokens": "required", "HttpPutResponseHopLimit": 2},
            "SecurityGroups": [
                {"GroupId": "sg-1", "GroupName": "web"},
                {"GroupId": "sg-2", "GroupName": "ssh"}
            ],
            "NetworkInterfaces": [{
                "NetworkInterfaceId": "eni-1",
                "PrivateIpAddress": "10.0.0.12",
                "Association": {"PublicIp": "54.1.2.3"},
                "PrivateIpAddresses": [
                    {"Primary": true, "PrivateIpAddress": "10.0.0.12"},
                    {"Primary": false, "PrivateIpAddress": "10.0.0.13"}
                ]
            }],
            "Tags": [{"Key": "Name", "Value": "web-01"}]
        }))
        .unwrap()
    }

    fn resolve(path: &str) -> Result<String, ResolveError> {
        InstanceKind::fields().resolve(&sample_instance(), path)
    }

    #[test]
    fn test_top_level_fields() {
        assert_eq!(resolve("InstanceType").unwrap(), "t3.micro");
        assert_eq!(resolve("EbsOptimized").unwrap(), "false");
        assert_eq!(resolve("KeyName").unwrap(), "");
    }

    #[test]
    fn test_nested_fields() {
        assert_eq!(resolve("State.Name").unwrap(), "running");
        assert_eq!(resolve("State.Code").unwrap(), "16");
        assert_eq!(resolve("Placement.AvailabilityZone").unwrap(), "us-east-1a");
        assert_eq!(resolve("MetadataOptions.HttpPutResponseHopLimit").unwrap(), "2");
        assert_eq!(resolve("IamInstanceProfile.Arn").unwrap(), "");
    }

    #[test]
    fn test_list_fields() {
        assert_eq!(resolve("SecurityGroups.1.GroupName").unwrap(), "ssh");
        assert_eq!(resolve("SecurityGroups.GroupId").unwrap(), "sg-1");
        assert_eq!(
            resolve("NetworkInterfaces.Association.PublicIp").unwrap(),
            "54.1.2.3"
        );
        assert_eq!(
            resolve("NetworkInterfaces.0.PrivateIpAddresses.1.PrivateIpAddress").unwrap(),
            "10.0.0.13"
        );
        assert_eq!(resolve("Tags.Key").unwrap(), "Name");
    }

    #[test]
    fn test_absent_network_interfaces_resolve_empty() {
        let instance = Instance {
            instance_type: Some("t3.micro".to_string()),
            ..Default::default()
        };
        assert_eq!(
            InstanceKind::fields()
                .resolve(&instance, "NetworkInterfaces.PrivateIpAddress")
                .unwrap(),
            ""
        );
    }

    #[test]
    fn test_unknown_and_container_paths() {
        assert!(matches!(
            resolve("Bogus"),
            Err(ResolveError::UnknownField { .. })
        ));
        assert!(matches!(
            resolve("Placement"),
            Err(ResolveError::NotScalar { .. })
        ));
        assert!(matches!(
            resolve("BlockDeviceMappings.Ebs"),
            Err(ResolveError::NotScalar { .. })
        ));
    }

    #[test]
    fn test_kind_helpers() {
        let instance = sample_instance();
        assert_eq!(InstanceKind::id(&instance), Some("i-0abc"));
        assert_eq!(InstanceKind::tags(&instance).len(), 1);
        assert!(InstanceKind::tags(&Instance::default()).is_empty());
    }
}
