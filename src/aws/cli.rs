//! AWS CLI backend
//!
//! Runs `aws ec2 describe-*` with `--output json` and decodes stdout into
//! the typed response shapes.

use super::model::{
    DescribeInstancesOutput, DescribeSecurityGroupsOutput, Instance, SecurityGroup,
};
use super::provider::{Ec2Provider, ProviderError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::process::Stdio;
use tokio::process::Command;

/// Error codes the API returns when the requested identifiers do not exist.
/// These are reported as an empty result rather than a provider failure.
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidInstanceID.NotFound",
    "InvalidInstanceID.Malformed",
    "InvalidGroup.NotFound",
    "InvalidGroupId.Malformed",
];

/// Maximum length of stderr kept in an error message
const MAX_STDERR_LENGTH: usize = 400;

/// Provider that shells out to the `aws` CLI
#[derive(Debug, Clone)]
pub struct AwsCliProvider {
    program: String,
    region: Option<String>,
    profile: Option<String>,
}

impl AwsCliProvider {
    pub fn new(region: Option<&str>, profile: Option<&str>) -> Self {
        Self {
            program: "aws".to_string(),
            region: region.map(str::to_string),
            profile: profile.map(str::to_string),
        }
    }

    /// Use a different executable (e.g. a wrapper script)
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    /// Build the argument list for an `ec2` subcommand
    fn build_args(&self, subcommand: &str, filter_flag: &str, ids: &[String]) -> Vec<String> {
        let mut args = vec![
            "ec2".to_string(),
            subcommand.to_string(),
            "--output".to_string(),
            "json".to_string(),
        ];

        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }

        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }

        if !ids.is_empty() {
            args.push(filter_flag.to_string());
            args.extend(ids.iter().cloned());
        }

        args
    }

    /// Run the CLI and decode stdout. Returns `None` when the API reported
    /// that the requested identifiers do not exist.
    async fn run<T: DeserializeOwned>(&self, args: &[String]) -> Result<Option<T>, ProviderError> {
        let command_line = format!("{} {}", self.program, args.join(" "));
        tracing::debug!("Executing: {}", command_line);

        let output = Command::new(&self.program)
            .args(args)
            .env("AWS_PAGER", "")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ProviderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);

            if is_not_found(&stderr) {
                tracing::debug!("Provider reported no match: {}", stderr.trim());
                return Ok(None);
            }

            tracing::error!("{} failed: {}", command_line, stderr.trim());
            return Err(ProviderError::CommandFailed {
                command: command_line,
                status: output.status.code().unwrap_or(-1),
                stderr: truncate(stderr.trim(), MAX_STDERR_LENGTH),
            });
        }

        let parsed = serde_json::from_slice(&output.stdout)?;
        Ok(Some(parsed))
    }
}

#[async_trait]
impl Ec2Provider for AwsCliProvider {
    async fn describe_instances(&self, ids: &[String]) -> Result<Vec<Instance>, ProviderError> {
        let args = self.build_args("describe-instances", "--instance-ids", ids);
        let output: Option<DescribeInstancesOutput> = self.run(&args).await?;
        Ok(output.map(|o| o.into_instances()).unwrap_or_default())
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, ProviderError> {
        self.describe_instances(&[]).await
    }

    async fn describe_security_groups(
        &self,
        ids: &[String],
    ) -> Result<Vec<SecurityGroup>, ProviderError> {
        let args = self.build_args("describe-security-groups", "--group-ids", ids);
        let output: Option<DescribeSecurityGroupsOutput> = self.run(&args).await?;
        Ok(output.map(|o| o.security_groups).unwrap_or_default())
    }

    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, ProviderError> {
        self.describe_security_groups(&[]).await
    }

    fn name(&self) -> &'static str {
        "aws-cli"
    }
}

fn is_not_found(stderr: &str) -> bool {
    NOT_FOUND_CODES.iter().any(|code| stderr.contains(code))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_with_region_profile_and_ids() {
        let provider = AwsCliProvider::new(Some("eu-west-1"), Some("audit"));
        let args = provider.build_args(
            "describe-instances",
            "--instance-ids",
            &["i-1".to_string(), "i-2".to_string()],
        );

        assert_eq!(
            args,
            vec![
                "ec2",
                "describe-instances",
                "--output",
                "json",
                "--region",
                "eu-west-1",
                "--profile",
                "audit",
                "--instance-ids",
                "i-1",
                "i-2",
            ]
        );
    }

    #[test]
    fn test_build_args_listing_has_no_filter() {
        let provider = AwsCliProvider::new(None, None);
        let args = provider.build_args("describe-security-groups", "--group-ids", &[]);
        assert!(!args.iter().any(|a| a == "--group-ids"));
        assert!(!args.iter().any(|a| a == "--region"));
    }

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found(
            "An error occurred (InvalidInstanceID.NotFound) when calling the \
             DescribeInstances operation"
        ));
        assert!(is_not_found("An error occurred (InvalidGroup.NotFound)"));
        assert!(!is_not_found("An error occurred (UnauthorizedOperation)"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let provider =
            AwsCliProvider::new(None, None).with_program("awscheck-definitely-missing-binary");
        let err = provider.list_instances().await.unwrap_err();
        assert!(matches!(err, ProviderError::Spawn { .. }));
    }
}
