//! EC2 security group kind

use super::descriptor::KindDef;
use super::fields::{Attr, FieldTable};
use super::instance::tag_table;
use super::kind::ResourceKind;
use crate::aws::model::{
    IpPermission, IpRange, Ipv6Range, PrefixListId, SecurityGroup, Tag, UserIdGroupPair,
};
use crate::aws::provider::{Ec2Provider, ProviderError};
use futures::future::BoxFuture;
use std::sync::OnceLock;

static SECURITY_GROUP_FIELDS: OnceLock<FieldTable<SecurityGroup>> = OnceLock::new();

/// Marker for the security group kind
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityGroupKind;

impl KindDef for SecurityGroupKind {
    type Description = SecurityGroup;

    const KIND: ResourceKind = ResourceKind::SecurityGroup;
    const BACKFILL_NAME: bool = false;

    fn fields() -> &'static FieldTable<SecurityGroup> {
        SECURITY_GROUP_FIELDS.get_or_init(security_group_table)
    }

    fn id(description: &SecurityGroup) -> Option<&str> {
        description.group_id.as_deref()
    }

    fn tags(description: &SecurityGroup) -> &[Tag] {
        description.tags.as_deref().unwrap_or_default()
    }

    fn fetch_by_id<'a>(
        provider: &'a dyn Ec2Provider,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<SecurityGroup>, ProviderError>> {
        Box::pin(async move {
            let ids = [id.to_string()];
            provider.describe_security_groups(&ids).await
        })
    }

    fn fetch_all<'a>(
        provider: &'a dyn Ec2Provider,
    ) -> BoxFuture<'a, Result<Vec<SecurityGroup>, ProviderError>> {
        provider.list_security_groups()
    }
}

fn security_group_table() -> FieldTable<SecurityGroup> {
    FieldTable::<SecurityGroup>::new()
        .scalar("GroupId", |g| Attr::text(&g.group_id))
        .scalar("GroupName", |g| Attr::text(&g.group_name))
        .scalar("Description", |g| Attr::text(&g.description))
        .scalar("OwnerId", |g| Attr::text(&g.owner_id))
        .scalar("VpcId", |g| Attr::text(&g.vpc_id))
        .list(
            "IpPermissions",
            |g| g.ip_permissions.as_deref(),
            permission_table(),
        )
        .list(
            "IpPermissionsEgress",
            |g| g.ip_permissions_egress.as_deref(),
            permission_table(),
        )
        .list("Tags", |g| g.tags.as_deref(), tag_table())
}

fn permission_table() -> FieldTable<IpPermission> {
    FieldTable::<IpPermission>::new()
        .scalar("IpProtocol", |p| Attr::text(&p.ip_protocol))
        .scalar("FromPort", |p| Attr::display(p.from_port))
        .scalar("ToPort", |p| Attr::display(p.to_port))
        .list("IpRanges", |p| p.ip_ranges.as_deref(), ip_range_table())
        .list("Ipv6Ranges", |p| p.ipv6_ranges.as_deref(), ipv6_range_table())
        .list(
            "PrefixListIds",
            |p| p.prefix_list_ids.as_deref(),
            prefix_list_table(),
        )
        .list(
            "UserIdGroupPairs",
            |p| p.user_id_group_pairs.as_deref(),
            group_pair_table(),
        )
}

fn ip_range_table() -> FieldTable<IpRange> {
    FieldTable::<IpRange>::new()
        .scalar("CidrIp", |r| Attr::text(&r.cidr_ip))
        .scalar("Description", |r| Attr::text(&r.description))
}

fn ipv6_range_table() -> FieldTable<Ipv6Range> {
    FieldTable::<Ipv6Range>::new()
        .scalar("CidrIpv6", |r| Attr::text(&r.cidr_ipv6))
        .scalar("Description", |r| Attr::text(&r.description))
}

fn prefix_list_table() -> FieldTable<PrefixListId> {
    FieldTable::<PrefixListId>::new()
        .scalar("PrefixListId", |p| Attr::text(&p.prefix_list_id))
        .scalar("Description", |p| Attr::text(&p.description))
}

fn group_pair_table() -> FieldTable<UserIdGroupPair> {
    FieldTable::<UserIdGroupPair>::new()
        .scalar("GroupId", |p| Attr::text(&p.group_id))
        .scalar("GroupName", |p| Attr::text(&p.group_name))
        .scalar("UserId", |p| Attr::text(&p.user_id))
        .scalar("VpcId", |p| Attr::text(&p.vpc_id))
        .scalar("Description", |p| Attr::text(&p.description))
}
