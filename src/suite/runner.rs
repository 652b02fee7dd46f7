//! Test Runner
//!
//! Runs suite tests one after another against a caller-owned provider.

use super::{Suite, TestCase};
use crate::aws::Ec2Provider;
use crate::resource::{new_descriptor, DescribeError, Query, ResourceKind};
use crate::validation::{validate_fields, validate_tags, ValidationResult};
use serde::Serialize;

/// How a test ended
#[derive(Debug)]
pub enum TestStatus {
    /// Described, and every assertion matched
    Passed,
    /// Described, with at least one mismatching assertion
    Failed,
    /// The resource could not be described; no assertions were checked
    Aborted(DescribeError),
}

impl TestStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Aborted(_) => "aborted",
        }
    }

    pub fn error(&self) -> Option<&DescribeError> {
        match self {
            TestStatus::Aborted(err) => Some(err),
            _ => None,
        }
    }
}

/// Result of running one test
#[derive(Debug)]
pub struct TestOutcome {
    pub name: String,
    pub kind: ResourceKind,
    pub query: Query,
    pub resource_id: Option<String>,
    pub display_name: Option<String>,
    pub status: TestStatus,
    pub results: Vec<ValidationResult>,
}

impl TestOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TestStatus::Aborted(_))
    }
}

/// Totals across a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub tests: usize,
    pub aborted: usize,
    pub assertions: usize,
    pub passed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[TestOutcome]) -> Self {
        let mut summary = Self {
            tests: outcomes.len(),
            ..Self::default()
        };

        for outcome in outcomes {
            if outcome.is_aborted() {
                summary.aborted += 1;
            }
            summary.assertions += outcome.results.len();
            summary.passed += outcome.results.iter().filter(|r| r.matched).count();
        }
        summary.failed = summary.assertions - summary.passed;

        summary
    }

    /// No failed assertions and no aborted tests
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.aborted == 0
    }
}

/// Sequential runner over a borrowed provider
pub struct TestRunner<'a> {
    provider: &'a dyn Ec2Provider,
    filter: Option<String>,
}

impl<'a> TestRunner<'a> {
    pub fn new(provider: &'a dyn Ec2Provider) -> Self {
        Self {
            provider,
            filter: None,
        }
    }

    /// Only run tests whose name contains `filter`
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    /// Run every selected test, each awaited to completion before the next
    pub async fn run(&self, suite: &Suite) -> Vec<TestOutcome> {
        let selected = suite.filtered(self.filter.as_deref());
        tracing::info!(
            "Running {} of {} tests via {}",
            selected.len(),
            suite.len(),
            self.provider.name()
        );

        let mut outcomes = Vec::with_capacity(selected.len());
        for test in selected {
            outcomes.push(self.run_test(test).await);
        }

        outcomes
    }

    /// Describe the test's resource and check its assertions
    pub async fn run_test(&self, test: &TestCase) -> TestOutcome {
        tracing::info!("Test {}: {} by {}", test.name, test.kind, test.query);

        let mut descriptor = new_descriptor(test.kind);
        let described = descriptor.describe(self.provider, &test.query).await;

        let (status, results) = match described {
            Ok(()) => {
                let mut results = validate_fields(descriptor.as_ref(), &test.fields);
                results.extend(validate_tags(descriptor.as_ref(), &test.tags));

                let failures = results.iter().filter(|r| !r.matched).count();
                tracing::info!(
                    "Test {}: {} of {} assertions matched",
                    test.name,
                    results.len() - failures,
                    results.len()
                );

                let status = if failures == 0 {
                    TestStatus::Passed
                } else {
                    TestStatus::Failed
                };
                (status, results)
            }
            Err(err) => {
                if let DescribeError::Provider(source) = &err {
                    tracing::error!("Test {}: provider error: {}", test.name, source);
                } else {
                    tracing::warn!("Test {} aborted: {}", test.name, err);
                }
                (TestStatus::Aborted(err), Vec::new())
            }
        };

        TestOutcome {
            name: test.name.clone(),
            kind: test.kind,
            query: test.query.clone(),
            resource_id: descriptor.resource_id().map(str::to_string),
            display_name: descriptor.display_name().map(str::to_string),
            status,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::model::{Instance, SecurityGroup, Tag};
    use crate::resource::testing::StaticProvider;

    fn provider() -> StaticProvider {
        StaticProvider::new(
            vec![
                Instance {
                    instance_id: Some("i-1".to_string()),
                    instance_type: Some("t3.micro".to_string()),
                    tags: Some(vec![Tag::new("Name", "web-01"), Tag::new("Env", "prod")]),
                    ..Default::default()
                },
                Instance {
                    instance_id: Some("i-2".to_string()),
                    tags: Some(vec![Tag::new("Name", "twin")]),
                    ..Default::default()
                },
                Instance {
                    instance_id: Some("i-3".to_string()),
                    tags: Some(vec![Tag::new("Name", "twin")]),
                    ..Default::default()
                },
            ],
            vec![SecurityGroup {
                group_id: Some("sg-1".to_string()),
                group_name: Some("web".to_string()),
                ..Default::default()
            }],
        )
    }

    fn suite() -> Suite {
        Suite::from_yaml(
            r#"
tests:
  - name: web passes
    type: ec2
    query_by: name
    instance_name: web-01
    fields: {InstanceType: t3.micro}
    tags: {Env: prod}
  - name: missing instance
    type: ec2
    query_by: id
    instance_id: i-404
    fields: {InstanceType: t3.micro}
  - name: twin instance
    type: ec2
    query_by: name
    instance_name: twin
  - name: sg fails
    type: security_group
    query_by: id
    instance_id: sg-1
    fields: {GroupName: db, Bogus: x}
"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_abort_is_isolated_to_one_test() {
        let provider = provider();
        let outcomes = TestRunner::new(&provider).run(&suite()).await;

        assert_eq!(outcomes.len(), 4);
        assert!(matches!(outcomes[0].status, TestStatus::Passed));
        assert_eq!(outcomes[0].results.len(), 2);
        assert_eq!(outcomes[0].display_name.as_deref(), Some("web-01"));

        assert!(matches!(
            outcomes[1].status,
            TestStatus::Aborted(DescribeError::NotFound { .. })
        ));
        assert!(outcomes[1].results.is_empty());

        assert!(matches!(
            outcomes[2].status,
            TestStatus::Aborted(DescribeError::AmbiguousMatch { .. })
        ));

        assert!(matches!(outcomes[3].status, TestStatus::Failed));
        assert_eq!(outcomes[3].results.len(), 2);
        assert_eq!(outcomes[3].resource_id.as_deref(), Some("sg-1"));
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let provider = provider();
        let outcomes = TestRunner::new(&provider).run(&suite()).await;
        let summary = RunSummary::from_outcomes(&outcomes);

        assert_eq!(
            summary,
            RunSummary {
                tests: 4,
                aborted: 2,
                assertions: 4,
                passed: 2,
                failed: 2,
            }
        );
        assert!(!summary.is_success());
    }

    #[tokio::test]
    async fn test_filter_selects_by_name() {
        let provider = provider();
        let outcomes = TestRunner::new(&provider)
            .with_filter(Some("web".to_string()))
            .run(&suite())
            .await;

        assert_eq!(outcomes.len(), 1);
        assert!(RunSummary::from_outcomes(&outcomes).is_success());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_every_test() {
        let provider = provider().failing();
        let outcomes = TestRunner::new(&provider).run(&suite()).await;

        assert!(outcomes.iter().all(TestOutcome::is_aborted));
        assert_eq!(provider.calls(), 4);
        assert_eq!(outcomes[0].status.label(), "aborted");
        assert!(outcomes[0].status.error().is_some());
    }

    #[tokio::test]
    async fn test_empty_suite() {
        let provider = provider();
        let outcomes = TestRunner::new(&provider).run(&Suite::default()).await;
        let summary = RunSummary::from_outcomes(&outcomes);
        assert_eq!(summary, RunSummary::default());
        assert!(summary.is_success());
    }
}
