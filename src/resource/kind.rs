//! Resource kinds known to the verifier

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Instance,
    SecurityGroup,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Instance, ResourceKind::SecurityGroup];

    /// Label used in result kinds (`instance-field`, `security-group-tag`)
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Instance => "instance",
            ResourceKind::SecurityGroup => "security-group",
        }
    }

    /// Type tag used in test-suite files
    pub fn type_tag(&self) -> &'static str {
        match self {
            ResourceKind::Instance => "ec2",
            ResourceKind::SecurityGroup => "security_group",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ec2" | "instance" => Ok(ResourceKind::Instance),
            "security_group" | "security-group" | "sg" => Ok(ResourceKind::SecurityGroup),
            other => Err(format!(
                "unknown resource type `{}` (expected `ec2` or `security_group`)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_tags() {
        assert_eq!("ec2".parse::<ResourceKind>(), Ok(ResourceKind::Instance));
        assert_eq!("EC2".parse::<ResourceKind>(), Ok(ResourceKind::Instance));
        assert_eq!(
            "security_group".parse::<ResourceKind>(),
            Ok(ResourceKind::SecurityGroup)
        );
        assert!("s3".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_labels_round_trip_type_tags() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.type_tag().parse::<ResourceKind>(), Ok(kind));
        }
        assert_eq!(ResourceKind::SecurityGroup.to_string(), "security-group");
    }

    #[test]
    fn test_serialize_as_label() {
        assert_eq!(
            serde_json::to_string(&ResourceKind::SecurityGroup).unwrap(),
            "\"security-group\""
        );
    }
}
