//! Assertion validation
//!
//! Compares expected field and tag values against a described resource.
//! Every assertion yields exactly one [`ValidationResult`]; a field path
//! that cannot be resolved fails that one result and never the batch.

use crate::resource::{ResourceDescriptor, ResourceKind};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Expected values keyed by field path or tag key
pub type Assertions = IndexMap<String, String>;

/// What an assertion inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Field,
    Tag,
}

/// Resource kind and target, rendered as `instance-field`, `security-group-tag`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultKind {
    pub resource: ResourceKind,
    pub target: Target,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self.target {
            Target::Field => "field",
            Target::Tag => "tag",
        };
        write!(f, "{}-{}", self.resource.label(), target)
    }
}

impl Serialize for ResultKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of one assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub id: Uuid,
    pub kind: ResultKind,
    pub name: String,
    pub expected: String,
    pub actual: String,
    pub matched: bool,
    /// Why the field could not be resolved; `actual` is empty in that case
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    fn new(
        kind: ResultKind,
        name: &str,
        expected: &str,
        actual: String,
        error: Option<String>,
    ) -> Self {
        let matched = error.is_none() && actual == expected;
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.to_string(),
            expected: expected.to_string(),
            actual,
            matched,
            error,
        }
    }
}

/// Check field assertions against the descriptor's description
pub fn validate_fields(
    descriptor: &dyn ResourceDescriptor,
    assertions: &Assertions,
) -> Vec<ValidationResult> {
    let kind = ResultKind {
        resource: descriptor.kind(),
        target: Target::Field,
    };

    assertions
        .iter()
        .map(|(path, expected)| match descriptor.resolve_field(path) {
            Ok(actual) => ValidationResult::new(kind, path, expected, actual, None),
            Err(err) => {
                tracing::warn!("Cannot resolve {} on {}: {}", path, kind.resource, err);
                ValidationResult::new(kind, path, expected, String::new(), Some(err.to_string()))
            }
        })
        .collect()
}

/// Check tag assertions against the descriptor's tag index
pub fn validate_tags(
    descriptor: &dyn ResourceDescriptor,
    assertions: &Assertions,
) -> Vec<ValidationResult> {
    let kind = ResultKind {
        resource: descriptor.kind(),
        target: Target::Tag,
    };

    assertions
        .iter()
        .map(|(key, expected)| {
            ValidationResult::new(kind, key, expected, descriptor.tag(key), None)
        })
        .collect()
}
