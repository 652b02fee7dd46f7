//! AWS profile and region discovery
//!
//! Resolves the default region and profile from the environment and the
//! shared AWS config file, the same places the AWS CLI looks.

use std::path::{Path, PathBuf};

/// Region used when nothing else is configured
pub const FALLBACK_REGION: &str = "us-east-1";

/// Get the shared AWS config file path
pub fn get_aws_config_path() -> Option<PathBuf> {
    // Check AWS_CONFIG_FILE environment variable first
    if let Ok(path) = std::env::var("AWS_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|p| p.join(".aws").join("config"))
}

/// Validate a region name (e.g. `us-east-1`, `us-gov-west-1`)
/// Lowercase letters, digits, and hyphens; must contain a hyphen and not
/// start or end with one
pub fn validate_region(region: &str) -> bool {
    if region.len() < 4 || region.len() > 32 {
        return false;
    }

    if region.starts_with('-') || region.ends_with('-') || !region.contains('-') {
        return false;
    }

    region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Validate a profile name
/// Security: profile names end up as CLI arguments and config section names
pub fn validate_profile(profile: &str) -> bool {
    !profile.is_empty()
        && profile.len() <= 64
        && profile
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '+'))
}

/// Read the default profile from the environment
pub fn get_default_profile() -> Option<String> {
    for var in ["AWS_PROFILE", "AWS_DEFAULT_PROFILE"] {
        if let Ok(profile) = std::env::var(var) {
            if validate_profile(&profile) {
                return Some(profile);
            }
            tracing::warn!("Invalid profile name in {}", var);
        }
    }

    None
}

/// Read the default region for `profile` from the environment or the
/// shared config file
pub fn get_default_region(profile: Option<&str>) -> Option<String> {
    for var in ["AWS_REGION", "AWS_DEFAULT_REGION"] {
        if let Ok(region) = std::env::var(var) {
            if validate_region(&region) {
                return Some(region);
            }
            tracing::warn!("Invalid region format in {}", var);
        }
    }

    let path = get_aws_config_path()?;
    read_region_from_config(&path, profile.unwrap_or("default"))
}

/// Read `region = ...` from the profile's section of an AWS config file
pub fn read_region_from_config(path: &Path, profile: &str) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_region(&content, profile)
}

/// Find the region in the section belonging to `profile`
///
/// The default profile lives under `[default]`; named profiles under
/// `[profile NAME]` (the credentials-file style `[NAME]` is accepted too).
fn parse_region(content: &str, profile: &str) -> Option<String> {
    let wanted_named = format!("profile {}", profile);
    let mut in_section = false;

    for line in content.lines() {
        let line = line.trim();
        // Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let section = line[1..line.len() - 1].trim();
            in_section = section == wanted_named || section == profile;
            continue;
        }

        if !in_section {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            if key.trim() == "region" {
                let region = value.trim().to_string();
                if validate_region(&region) {
                    return Some(region);
                }
                tracing::warn!("Invalid region format in AWS config profile {}", profile);
                return None;
            }
        }
    }

    None
}
