//! Test suites
//!
//! A suite file lists the resources to check and the field and tag values
//! each one must carry:
//!
//! ```yaml
//! tests:
//!   - name: web server
//!     type: ec2
//!     query_by: name
//!     instance_name: web-01
//!     fields:
//!       InstanceType: t3.micro
//!       Placement.AvailabilityZone: us-east-1a
//!     tags:
//!       Environment: prod
//! ```
//!
//! Files ending in `.json` are read as JSON, anything else as YAML. Every
//! definition is checked while loading, so a malformed suite fails before
//! any provider call is made.

pub mod runner;

pub use runner::{RunSummary, TestOutcome, TestRunner, TestStatus};

use crate::resource::{Query, ResourceKind};
use crate::validation::Assertions;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("cannot read suite file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML suite: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON suite: {0}")]
    Json(#[from] serde_json::Error),
    #[error("test #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("test `{test}`: {reason}")]
    UnknownType { test: String, reason: String },
    #[error("test `{test}`: unknown query_by `{value}` (expected `name` or `id`)")]
    UnknownQueryMode { test: String, value: String },
    #[error("test `{test}`: query_by {mode} requires `{field}`")]
    MissingIdentifier {
        test: String,
        mode: &'static str,
        field: &'static str,
    },
    #[error("test `{test}`: invalid instance_id `{value}`")]
    InvalidIdentifier { test: String, value: String },
    #[error("duplicate test name `{0}`")]
    DuplicateName(String),
}

/// On-disk shape of a suite
#[derive(Debug, Deserialize)]
struct SuiteFile {
    #[serde(default)]
    tests: Vec<TestDefinition>,
}

/// On-disk shape of one test, before validation
#[derive(Debug, Deserialize)]
struct TestDefinition {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    query_by: String,
    #[serde(default)]
    instance_name: Option<String>,
    #[serde(default)]
    instance_id: Option<String>,
    #[serde(default)]
    fields: Assertions,
    #[serde(default)]
    tags: Assertions,
}

/// One validated test
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub kind: ResourceKind,
    pub query: Query,
    pub fields: Assertions,
    pub tags: Assertions,
}

impl TestCase {
    pub fn assertion_count(&self) -> usize {
        self.fields.len() + self.tags.len()
    }
}

/// A loaded, validated suite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suite {
    pub tests: Vec<TestCase>,
}

impl Suite {
    /// Load a suite file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self, SuiteError> {
        let content = std::fs::read_to_string(path).map_err(|source| SuiteError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        tracing::info!("Loading suite from {:?}", path);

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, SuiteError> {
        let file: SuiteFile = serde_yaml::from_str(content)?;
        Self::from_definitions(file.tests)
    }

    pub fn from_json(content: &str) -> Result<Self, SuiteError> {
        let file: SuiteFile = serde_json::from_str(content)?;
        Self::from_definitions(file.tests)
    }

    fn from_definitions(definitions: Vec<TestDefinition>) -> Result<Self, SuiteError> {
        let mut seen = HashSet::new();
        let mut tests = Vec::with_capacity(definitions.len());

        for (index, definition) in definitions.into_iter().enumerate() {
            let test = definition.validate(index)?;
            if !seen.insert(test.name.clone()) {
                return Err(SuiteError::DuplicateName(test.name));
            }
            tests.push(test);
        }

        tracing::debug!("Loaded {} tests", tests.len());
        Ok(Self { tests })
    }

    /// Tests whose name contains `filter`
    pub fn filtered(&self, filter: Option<&str>) -> Vec<&TestCase> {
        self.tests
            .iter()
            .filter(|t| filter.map_or(true, |f| t.name.contains(f)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

impl TestDefinition {
    fn validate(self, index: usize) -> Result<TestCase, SuiteError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(SuiteError::EmptyName { index });
        }

        let kind = self
            .kind
            .parse::<ResourceKind>()
            .map_err(|reason| SuiteError::UnknownType {
                test: name.clone(),
                reason,
            })?;

        let query = match self.query_by.trim().to_lowercase().as_str() {
            "name" => Query::ByName(required(self.instance_name, &name, "name", "instance_name")?),
            "id" => {
                let id = required(self.instance_id, &name, "id", "instance_id")?;
                if !validate_resource_id(&id) {
                    return Err(SuiteError::InvalidIdentifier {
                        test: name,
                        value: id,
                    });
                }
                Query::ById(id)
            }
            _ => {
                return Err(SuiteError::UnknownQueryMode {
                    test: name,
                    value: self.query_by,
                })
            }
        };

        Ok(TestCase {
            name,
            kind,
            query,
            fields: self.fields,
            tags: self.tags,
        })
    }
}

fn required(
    value: Option<String>,
    test: &str,
    mode: &'static str,
    field: &'static str,
) -> Result<String, SuiteError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SuiteError::MissingIdentifier {
            test: test.to_string(),
            mode,
            field,
        }),
    }
}

/// Resource ids are passed as provider arguments; reject anything that
/// could be read as a flag or split into several ids
fn validate_resource_id(id: &str) -> bool {
    !id.starts_with('-') && !id.chars().any(char::is_whitespace)
}
